//! Fixed-cell spatial bucketing for proximity candidate lookup.
//!
//! Cells are sized so that any point within the match radius of a query
//! lies in the query's cell or one of its 8 neighbors. The grid is a
//! pre-filter only; true haversine distance decides acceptance.

use std::collections::HashMap;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Haversine distance in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p = std::f64::consts::PI / 180.0;
    let a = 0.5 - ((lat2 - lat1) * p).cos() / 2.0
        + (lat1 * p).cos() * (lat2 * p).cos() * (1.0 - ((lon2 - lon1) * p).cos()) / 2.0;
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

/// Grid index over points, keyed by opaque ids (pool indices in practice).
#[derive(Debug)]
pub struct GridIndex {
    cells: HashMap<(i64, i64), Vec<usize>>,
    cell_lat_deg: f64,
    cell_lon_deg: f64,
}

impl GridIndex {
    /// `radius_m` is the query radius the 3x3 lookup must cover;
    /// `base_lat` the latitude the longitude cell width is computed at
    /// (degrees of longitude shrink with latitude, so the width uses the
    /// cosine at the city's latitude to stay radius-covering).
    pub fn new(radius_m: f64, base_lat: f64) -> Self {
        let cell_lat_deg = radius_m / METERS_PER_DEG_LAT;
        let cell_lon_deg = radius_m / (METERS_PER_DEG_LAT * base_lat.to_radians().cos());
        GridIndex {
            cells: HashMap::new(),
            cell_lat_deg,
            cell_lon_deg,
        }
    }

    fn cell_of(&self, lat: f64, lon: f64) -> (i64, i64) {
        (
            (lat / self.cell_lat_deg).floor() as i64,
            (lon / self.cell_lon_deg).floor() as i64,
        )
    }

    pub fn insert(&mut self, id: usize, lat: f64, lon: f64) {
        let cell = self.cell_of(lat, lon);
        self.cells.entry(cell).or_default().push(id);
    }

    /// Ids in the query cell and its 8 neighbors. Guaranteed to include
    /// every inserted point within the construction radius of the query;
    /// callers apply the exact distance filter.
    pub fn query_near(&self, lat: f64, lon: f64) -> Vec<usize> {
        let (ci, cj) = self.cell_of(lat, lon);
        let mut out = Vec::new();
        for di in -1..=1 {
            for dj in -1..=1 {
                if let Some(ids) = self.cells.get(&(ci + di, cj + dj)) {
                    out.extend_from_slice(ids);
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
