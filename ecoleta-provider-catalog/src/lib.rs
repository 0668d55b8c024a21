//! Provider for the Ecoleta items catalog (`GET /items`).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use ecoleta_core::{
    model::{Category, CategoryId},
    ports::{CatalogPort, PortError},
};

/// Address of a locally running Ecoleta API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3333";

/// Single item from /items
#[derive(Debug, Deserialize)]
struct ItemEntry {
    id: u32,
    name: String,
    image_url: String,
}

impl From<ItemEntry> for Category {
    fn from(entry: ItemEntry) -> Self {
        Category {
            id: CategoryId(entry.id),
            name: entry.name,
            icon_url: entry.image_url,
        }
    }
}

/// Catalog implementation over HTTP.
pub struct HttpCatalogPort {
    client: Client,
    base_url: String,
}

impl HttpCatalogPort {
    /// Create a catalog port bound to the given HTTP client and API root.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl CatalogPort for HttpCatalogPort {
    async fn items(&self) -> Result<Vec<Category>, PortError> {
        let req = self.client.get(format!("{}/items", self.base_url));
        let items = fetch_json::<Vec<ItemEntry>>(req).await?;
        tracing::debug!(count = items.len(), "catalog fetched");

        // Keep the server's order; the grid renders it as-is.
        Ok(items.into_iter().map(Category::from).collect())
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
