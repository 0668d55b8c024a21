//! Domain data structures for categories, geography, and the collection-point draft.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
/// Identifier of a recyclable-material category in the items catalog.
pub struct CategoryId(pub u32);

impl fmt::Display for CategoryId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Recyclable-material category offered by the catalog.
pub struct Category {
    /// Unique identifier.
    pub id: CategoryId,
    /// Display name, e.g. “Lâmpadas”.
    pub name: String,
    /// Remote icon reference.
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
/// Two-letter federative unit code (UF), such as `SP`.
pub struct StateCode(pub String);

impl StateCode {
    /// Borrow the raw code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for StateCode {
    fn from(code: &str) -> Self {
        StateCode(code.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
/// Name of a municipality inside a state.
pub struct CityName(pub String);

impl CityName {
    /// Borrow the raw name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for CityName {
    fn from(name: &str) -> Self {
        CityName(name.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
/// Geographic position in decimal degrees.
pub struct Coordinate {
    /// Latitude, positive north.
    pub latitude: f64,
    /// Longitude, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Sentinel used before geolocation resolves or the user clicks the map.
    pub const ORIGIN: Coordinate = Coordinate {
        latitude: 0.0,
        longitude: 0.0,
    };

    /// Construct a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether this is still the (0, 0) sentinel.
    #[must_use]
    pub fn is_origin(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
/// Collection point being filled in by the user. Never persisted.
pub struct CollectionPoint {
    /// Entity name.
    pub name: String,
    /// Contact e-mail.
    pub email: String,
    /// Contact WhatsApp number.
    pub whatsapp: String,
    /// Selected state; `None` while unselected.
    pub state: Option<StateCode>,
    /// Selected city; only meaningful relative to `state`.
    pub city: Option<CityName>,
    /// Marker position picked on the map.
    pub position: Coordinate,
    /// Selected category ids.
    pub items: BTreeSet<CategoryId>,
}

impl CollectionPoint {
    /// Add `id` when absent, remove it when present.
    ///
    /// Returns `true` when the id is selected afterwards.
    pub fn toggle_item(&mut self, id: CategoryId) -> bool {
        if self.items.remove(&id) {
            false
        } else {
            self.items.insert(id);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_item_round_trips() {
        let mut draft = CollectionPoint::default();
        draft.items.insert(CategoryId(3));
        let before = draft.items.clone();

        assert!(draft.toggle_item(CategoryId(7)));
        assert!(!draft.toggle_item(CategoryId(7)));
        assert_eq!(draft.items, before);
    }

    #[test]
    fn origin_is_default() {
        assert!(Coordinate::default().is_origin());
        assert!(!Coordinate::new(-23.55, -46.63).is_origin());
    }

    #[test]
    fn draft_serializes_selected_items_in_order() -> Result<(), serde_json::Error> {
        let mut draft = CollectionPoint::default();
        draft.toggle_item(CategoryId(5));
        draft.toggle_item(CategoryId(2));
        let json = serde_json::to_value(&draft)?;
        assert_eq!(json["items"], serde_json::json!([2, 5]));
        Ok(())
    }
}
