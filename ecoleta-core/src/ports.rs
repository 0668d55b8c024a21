//! Traits describing backend capabilities and the shared error type.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{Category, CityName, Coordinate, StateCode};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the catalog, geography, or geolocation backends.
pub enum PortError {
    /// Network layer failed, including non-2xx statuses and JSON decoding.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The call did not finish within its deadline.
    #[error("Timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
    /// The geolocation backend answered but could not locate the device.
    #[error("Geolocation failed: {0}")]
    Geolocation(String),
    /// The capability is switched off.
    #[error("Unavailable")]
    Unavailable,
    /// Internal backend error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PortError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            PortError::Network(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.status().is_some_and(|status| status.is_server_error())
            }
            PortError::Timeout(_) => true,
            PortError::Geolocation(_) | PortError::Unavailable | PortError::Internal(_) => false,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
/// Read-only items catalog.
pub trait CatalogPort: Send + Sync {
    /// Fetch every selectable category in server order.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request or decoding fails.
    async fn items(&self) -> Result<Vec<Category>, PortError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
/// Read-only state and city lookup.
pub trait GeographyPort: Send + Sync {
    /// Fetch state codes, ordered by the full state name.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request or decoding fails.
    async fn states(&self) -> Result<Vec<StateCode>, PortError>;

    /// Fetch the names of the cities in `state`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request or decoding fails.
    async fn cities(&self, state: &StateCode) -> Result<Vec<CityName>, PortError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
/// Single-shot device location lookup.
pub trait GeolocationPort: Send + Sync {
    /// Resolve the current position.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the position cannot be determined.
    async fn locate(&self) -> Result<Coordinate, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_transient() {
        assert!(PortError::Timeout(Duration::from_millis(10)).is_transient());
        assert!(!PortError::Unavailable.is_transient());
        assert!(!PortError::Geolocation("denied".into()).is_transient());
    }

    #[test]
    fn timeout_message_is_in_millis() {
        let err = PortError::Timeout(Duration::from_secs(4));
        assert_eq!(err.to_string(), "Timed out after 4000 ms");
    }
}
