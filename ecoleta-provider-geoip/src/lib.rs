//! Device geolocation providers.
//!
//! A terminal has no positioning hardware, so the "device" position comes from
//! an IP lookup, a fixed coordinate from configuration, or nowhere at all.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use ecoleta_core::{
    model::Coordinate,
    ports::{GeolocationPort, PortError},
};

/// ip-api.com lookup for the caller's own address.
pub const IP_API_URL: &str = "http://ip-api.com/json";

/// Response from ip-api.com
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Approximates the device position from its public IP address.
pub struct IpApiGeolocator {
    client: Client,
    url: String,
}

impl IpApiGeolocator {
    /// Create a geolocator using the public ip-api.com endpoint.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_url(client, IP_API_URL)
    }

    /// Create a geolocator against a compatible endpoint.
    #[must_use]
    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl GeolocationPort for IpApiGeolocator {
    async fn locate(&self) -> Result<Coordinate, PortError> {
        let resp: IpApiResponse = self
            .client
            .get(&self.url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if resp.status != "success" {
            let reason = resp.message.unwrap_or_else(|| resp.status.clone());
            return Err(PortError::Geolocation(reason));
        }

        match (resp.lat, resp.lon) {
            (Some(latitude), Some(longitude)) => {
                tracing::debug!(latitude, longitude, "located via IP lookup");
                Ok(Coordinate::new(latitude, longitude))
            }
            _ => Err(PortError::Geolocation(
                "response carried no coordinates".to_owned(),
            )),
        }
    }
}

/// Always reports the same position.
pub struct FixedGeolocator {
    position: Coordinate,
}

impl FixedGeolocator {
    /// Create a geolocator that answers with `position`.
    #[must_use]
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationPort for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinate, PortError> {
        Ok(self.position)
    }
}

/// Geolocation switched off; every lookup fails.
pub struct DisabledGeolocator;

#[async_trait]
impl GeolocationPort for DisabledGeolocator {
    async fn locate(&self) -> Result<Coordinate, PortError> {
        Err(PortError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_answers_with_its_position() {
        let geolocator = FixedGeolocator::new(Coordinate::new(-3.73, -38.52));
        assert_eq!(
            geolocator.locate().await.ok(),
            Some(Coordinate::new(-3.73, -38.52))
        );
    }

    #[tokio::test]
    async fn disabled_always_fails() {
        assert!(matches!(
            DisabledGeolocator.locate().await,
            Err(PortError::Unavailable)
        ));
    }
}
