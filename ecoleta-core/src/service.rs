//! High-level service facade combining all backends.

use std::sync::Arc;
use std::time::Duration;

use crate::form::{Effect, FormEvent};
use crate::model::{Category, CityName, Coordinate, StateCode};
use crate::ports::{CatalogPort, GeographyPort, GeolocationPort, PortError};
use crate::retry::RetryPolicy;

/// Default deadline for a geolocation lookup.
pub const DEFAULT_LOCATE_TIMEOUT: Duration = Duration::from_millis(4000);

/// Backends the service talks to.
pub struct Backends {
    /// Items catalog.
    pub catalog: Arc<dyn CatalogPort>,
    /// States and cities lookup.
    pub geography: Arc<dyn GeographyPort>,
    /// Device position lookup.
    pub geolocation: Arc<dyn GeolocationPort>,
}

/// Public entry point for loading reference data and running form effects.
pub struct EcoletaService {
    backends: Backends,
    retry: RetryPolicy,
    locate_timeout: Duration,
}

impl EcoletaService {
    /// Create a service over `backends` with the default retry policy and timeout.
    #[must_use]
    pub fn new(backends: Backends) -> Self {
        Self {
            backends,
            retry: RetryPolicy::default(),
            locate_timeout: DEFAULT_LOCATE_TIMEOUT,
        }
    }

    /// Replace the retry policy used for catalog and geography calls.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the geolocation deadline.
    #[must_use]
    pub fn with_locate_timeout(mut self, timeout: Duration) -> Self {
        self.locate_timeout = timeout;
        self
    }

    /// Load the items catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] once the retry policy gives up.
    pub async fn items(&self) -> Result<Vec<Category>, PortError> {
        self.retry
            .run("items", || self.backends.catalog.items())
            .await
    }

    /// Load all state codes.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] once the retry policy gives up.
    pub async fn states(&self) -> Result<Vec<StateCode>, PortError> {
        self.retry
            .run("states", || self.backends.geography.states())
            .await
    }

    /// Load the cities of `state`.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] once the retry policy gives up.
    pub async fn cities(&self, state: &StateCode) -> Result<Vec<CityName>, PortError> {
        self.retry
            .run("cities", || self.backends.geography.cities(state))
            .await
    }

    /// Ask for the device position, bounded by the locate timeout. Not retried.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Timeout`] when the deadline passes, or the port's own error.
    pub async fn locate(&self) -> Result<Coordinate, PortError> {
        tracing::debug!(timeout_ms = self.locate_timeout.as_millis(), "locating device");
        tokio::time::timeout(self.locate_timeout, self.backends.geolocation.locate())
            .await
            .map_err(|_elapsed| PortError::Timeout(self.locate_timeout))?
    }

    /// Run `effect` and turn its outcome into the event the form expects.
    pub async fn perform(&self, effect: Effect) -> FormEvent {
        match effect {
            Effect::Locate => FormEvent::Located(self.locate().await),
            Effect::FetchCatalog => FormEvent::CatalogLoaded(self.items().await),
            Effect::FetchStates => FormEvent::StatesLoaded(self.states().await),
            Effect::FetchCities { ticket, state } => FormEvent::CitiesLoaded {
                ticket,
                result: self.cities(&state).await,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::form::RequestTicket;
    use crate::model::CategoryId;
    use crate::ports::{MockCatalogPort, MockGeographyPort, MockGeolocationPort};

    fn service(
        catalog: MockCatalogPort,
        geography: MockGeographyPort,
        geolocation: MockGeolocationPort,
    ) -> EcoletaService {
        EcoletaService::new(Backends {
            catalog: Arc::new(catalog),
            geography: Arc::new(geography),
            geolocation: Arc::new(geolocation),
        })
        .with_retry(RetryPolicy {
            attempts: 3,
            base_delay: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn cities_effect_echoes_ticket() {
        let mut geography = MockGeographyPort::new();
        geography
            .expect_cities()
            .withf(|state| state.as_str() == "SP")
            .times(1)
            .returning(|_| Ok(vec![CityName::from("Campinas"), CityName::from("Santos")]));
        let svc = service(
            MockCatalogPort::new(),
            geography,
            MockGeolocationPort::new(),
        );

        let event = svc
            .perform(Effect::FetchCities {
                ticket: RequestTicket(7),
                state: StateCode::from("SP"),
            })
            .await;

        match event {
            FormEvent::CitiesLoaded { ticket, result } => {
                assert_eq!(ticket, RequestTicket(7));
                assert_eq!(result.ok().map(|cities| cities.len()), Some(2));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn catalog_is_retried_on_transient_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let mut catalog = MockCatalogPort::new();
        catalog.expect_items().times(2).returning(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(PortError::Timeout(Duration::from_millis(5)))
            } else {
                Ok(vec![Category {
                    id: CategoryId(1),
                    name: "Lâmpadas".into(),
                    icon_url: "lampadas.svg".into(),
                }])
            }
        });
        let svc = service(catalog, MockGeographyPort::new(), MockGeolocationPort::new());

        let items = svc.items().await;
        assert_eq!(items.ok().map(|items| items.len()), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn states_fail_after_permanent_error() {
        let mut geography = MockGeographyPort::new();
        geography
            .expect_states()
            .times(1)
            .returning(|| Err(PortError::Internal("bad json".into())));
        let svc = service(MockCatalogPort::new(), geography, MockGeolocationPort::new());

        assert!(matches!(svc.states().await, Err(PortError::Internal(_))));
    }

    #[tokio::test]
    async fn geolocation_failure_is_passed_through() {
        let mut geolocation = MockGeolocationPort::new();
        geolocation
            .expect_locate()
            .times(1)
            .returning(|| Err(PortError::Geolocation("private range".into())));
        let svc = service(MockCatalogPort::new(), MockGeographyPort::new(), geolocation);

        let event = svc.perform(Effect::Locate).await;
        assert!(matches!(
            event,
            FormEvent::Located(Err(PortError::Geolocation(_)))
        ));
    }

    struct SlowGeolocator;

    #[async_trait::async_trait]
    impl GeolocationPort for SlowGeolocator {
        async fn locate(&self) -> Result<Coordinate, PortError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Coordinate::new(1.0, 1.0))
        }
    }

    #[tokio::test]
    async fn slow_geolocation_times_out() {
        let svc = EcoletaService::new(Backends {
            catalog: Arc::new(MockCatalogPort::new()),
            geography: Arc::new(MockGeographyPort::new()),
            geolocation: Arc::new(SlowGeolocator),
        })
        .with_locate_timeout(Duration::from_millis(20));

        let result = svc.locate().await;
        assert!(matches!(result, Err(PortError::Timeout(timeout)) if timeout == Duration::from_millis(20)));
    }
}
