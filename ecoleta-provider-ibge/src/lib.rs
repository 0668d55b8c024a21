//! Geography provider using the IBGE `localidades` API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use ecoleta_core::{
    model::{CityName, StateCode},
    ports::{GeographyPort, PortError},
};

/// Public IBGE endpoint.
pub const BASE_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";

/// State as returned by /estados
#[derive(Debug, Deserialize)]
struct UfEntry {
    sigla: String,
    // id, nome and regiao exist, we only need the code
}

/// Municipality as returned by /estados/{uf}/municipios
#[derive(Debug, Deserialize)]
struct MunicipioEntry {
    nome: String,
}

/// State and city lookup against IBGE.
pub struct IbgeGeographyPort {
    client: Client,
    base_url: String,
}

impl IbgeGeographyPort {
    /// Create a port against the public IBGE endpoint.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BASE_URL)
    }

    /// Create a port against another deployment of the same API.
    #[must_use]
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl GeographyPort for IbgeGeographyPort {
    async fn states(&self) -> Result<Vec<StateCode>, PortError> {
        let req = self
            .client
            .get(format!("{}/estados", self.base_url))
            .query(&[("orderBy", "nome")]);

        let states = fetch_json::<Vec<UfEntry>>(req).await?;
        tracing::debug!(count = states.len(), "IBGE states fetched");

        Ok(states
            .into_iter()
            .map(|entry| StateCode(entry.sigla))
            .collect())
    }

    async fn cities(&self, state: &StateCode) -> Result<Vec<CityName>, PortError> {
        let uf = state.as_str().trim();
        if uf.is_empty() || !uf.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(PortError::Internal(format!("invalid state code {uf:?}")));
        }

        let req = self
            .client
            .get(format!("{}/estados/{uf}/municipios", self.base_url))
            .query(&[("orderBy", "nome")]);

        let cities = fetch_json::<Vec<MunicipioEntry>>(req).await?;
        tracing::debug!(uf, count = cities.len(), "IBGE cities fetched");

        Ok(cities
            .into_iter()
            .map(|entry| CityName(entry.nome))
            .collect())
    }
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}
