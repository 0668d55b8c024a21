//! Viewport math for the location picker: visible bounds, cell picking, and slippy tiles.

use crate::model::Coordinate;

/// Closest zoom level, showing the whole world.
pub const MIN_ZOOM: u8 = 0;
/// Deepest zoom level supported by common tile providers.
pub const MAX_ZOOM: u8 = 18;
/// Latitude limit of the Web Mercator projection.
const MERCATOR_MAX_LATITUDE: f64 = 85.051_128_78;
/// Public OpenStreetMap tile template.
pub const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
/// Attribution required by OpenStreetMap tiles.
pub const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";

#[derive(Debug, Clone, Copy, PartialEq)]
/// Portion of the world visible in the map widget.
pub struct MapView {
    /// Coordinate at the middle of the viewport.
    pub center: Coordinate,
    /// Zoom level, where each step halves the visible span.
    pub zoom: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Slippy-map tile address.
pub struct TileIndex {
    /// Zoom level.
    pub z: u8,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl MapView {
    /// Build a viewport, clamping `zoom` into the supported range.
    #[must_use]
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Visible longitude range in degrees.
    #[must_use]
    pub fn longitude_span(&self) -> f64 {
        360.0 / f64::from(1_u32 << self.zoom.min(MAX_ZOOM))
    }

    /// Visible latitude range in degrees. Terminal cells are about twice as tall as wide.
    #[must_use]
    pub fn latitude_span(&self) -> f64 {
        (self.longitude_span() / 2.0).min(180.0)
    }

    /// Longitude bounds `[west, east]`.
    #[must_use]
    pub fn x_bounds(&self) -> [f64; 2] {
        window(self.center.longitude, self.longitude_span(), -180.0, 180.0)
    }

    /// Latitude bounds `[south, north]`.
    #[must_use]
    pub fn y_bounds(&self) -> [f64; 2] {
        window(self.center.latitude, self.latitude_span(), -90.0, 90.0)
    }

    /// Whether `coordinate` falls inside the viewport.
    #[must_use]
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        let [west, east] = self.x_bounds();
        let [south, north] = self.y_bounds();
        (west..=east).contains(&coordinate.longitude)
            && (south..=north).contains(&coordinate.latitude)
    }

    /// Coordinate under the middle of a cell of a `width` x `height` grid.
    ///
    /// Returns `None` for an empty grid or a cell outside it.
    #[must_use]
    pub fn coordinate_at(&self, column: u16, row: u16, width: u16, height: u16) -> Option<Coordinate> {
        if width == 0 || height == 0 || column >= width || row >= height {
            return None;
        }
        let [west, east] = self.x_bounds();
        let [south, north] = self.y_bounds();
        let fx = (f64::from(column) + 0.5) / f64::from(width);
        let fy = (f64::from(row) + 0.5) / f64::from(height);
        Some(Coordinate::new(
            north - fy * (north - south),
            west + fx * (east - west),
        ))
    }

    /// One zoom level closer.
    #[must_use]
    pub fn zoomed_in(self) -> Self {
        Self::new(self.center, self.zoom.saturating_add(1))
    }

    /// One zoom level further out.
    #[must_use]
    pub fn zoomed_out(self) -> Self {
        Self::new(self.center, self.zoom.saturating_sub(1))
    }

    /// Tile containing the viewport centre.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "values are clamped to the tile grid before casting"
    )]
    pub fn center_tile(&self) -> TileIndex {
        let zoom = self.zoom.min(MAX_ZOOM);
        let tiles = f64::from(1_u32 << zoom);
        let max_index = tiles - 1.0;
        let latitude = self
            .center
            .latitude
            .clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE)
            .to_radians();
        let x = ((self.center.longitude + 180.0) / 360.0 * tiles)
            .floor()
            .clamp(0.0, max_index);
        let y = ((1.0 - latitude.tan().asinh() / std::f64::consts::PI) / 2.0 * tiles)
            .floor()
            .clamp(0.0, max_index);
        TileIndex {
            z: zoom,
            x: x as u32,
            y: y as u32,
        }
    }
}

/// Expand a `{s}`/`{z}`/`{x}`/`{y}` tile template.
#[must_use]
pub fn tile_url(template: &str, tile: TileIndex) -> String {
    let subdomain = match (tile.x + tile.y) % 3 {
        0 => "a",
        1 => "b",
        _ => "c",
    };
    template
        .replace("{s}", subdomain)
        .replace("{z}", &tile.z.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}

// Range of length `span` around `center`, shifted to stay inside `[min, max]`.
fn window(center: f64, span: f64, min: f64, max: f64) -> [f64; 2] {
    if span >= max - min {
        return [min, max];
    }
    let low = (center - span / 2.0).clamp(min, max - span);
    [low, low + span]
}
