// Web-Mercator camera over the fog canvas
use crate::config::{DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};
use crate::geo::{GeoPoint, meters_to_pixels};

const TILE_PX: f64 = 256.0;

#[derive(Debug, Clone)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
    pub panning: bool,
    pub last_x: f64,
    pub last_y: f64,
    /// Set once the pointer moved far enough during a press to count as a drag.
    pub dragged: bool,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: crate::config::DEFAULT_LOCATION,
            zoom: DEFAULT_ZOOM,
            width: 800.0,
            height: 600.0,
            panning: false,
            last_x: 0.0,
            last_y: 0.0,
            dragged: false,
        }
    }
}

fn world_size(zoom: f64) -> f64 {
    TILE_PX * 2f64.powf(zoom)
}

fn to_world(p: GeoPoint, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let x = (p.lng + 180.0) / 360.0 * size;
    let lat = p.lat.to_radians();
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * size;
    (x, y)
}

fn from_world(x: f64, y: f64, zoom: f64) -> GeoPoint {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * y / size);
    let lat = n.sinh().atan().to_degrees();
    GeoPoint::new(lng, lat)
}

impl MapView {
    /// Screen pixel position of a geographic point.
    pub fn project(&self, p: GeoPoint) -> (f64, f64) {
        let (wx, wy) = to_world(p, self.zoom);
        let (cx, cy) = to_world(self.center, self.zoom);
        (wx - cx + self.width * 0.5, wy - cy + self.height * 0.5)
    }

    pub fn unproject(&self, x: f64, y: f64) -> GeoPoint {
        let (cx, cy) = to_world(self.center, self.zoom);
        from_world(cx + x - self.width * 0.5, cy + y - self.height * 0.5, self.zoom)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let (cx, cy) = to_world(self.center, self.zoom);
        self.center = from_world(cx - dx, cy - dy, self.zoom);
    }

    /// Zooms around a screen point so the location under it stays put.
    pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
        let anchor = self.unproject(x, y);
        self.zoom = (self.zoom + factor.log2()).clamp(MIN_ZOOM, MAX_ZOOM);
        let (ax, ay) = self.project(anchor);
        self.pan_by(x - ax, y - ay);
    }

    pub fn recenter(&mut self, p: GeoPoint) {
        self.center = p;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    pub fn is_on_screen(&self, x: f64, y: f64, margin: f64) -> bool {
        x >= -margin && y >= -margin && x <= self.width + margin && y <= self.height + margin
    }

    /// Fog-reveal radius in pixels at the given latitude for the current zoom.
    pub fn radius_px(&self, meters: f64, lat: f64) -> f64 {
        meters_to_pixels(meters, lat, self.zoom)
    }
}
