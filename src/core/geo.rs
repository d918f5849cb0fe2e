//! Purpose: Geographic point and bounding-box types plus their comma-form decoders.
//! Exports: `LatLng`, `LatLngBounds`, `decode_lat_lng`, `decode_lat_lng_bounds`.
//! Role: Coordinate coercion for query keys configured as geographic.
//! Invariants: Decoders return `None` on any malformed input; they never panic.
//! Invariants: `Display` output is accepted by the matching decoder.
use std::fmt;

use serde::{Deserialize, Serialize};

use super::numeral::{canonical_numeral, parse_numeral};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}",
            canonical_numeral(self.lat),
            canonical_numeral(self.lng)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLngBounds {
    pub north_east: LatLng,
    pub south_west: LatLng,
}

impl LatLngBounds {
    pub fn new(north_east: LatLng, south_west: LatLng) -> Self {
        Self {
            north_east,
            south_west,
        }
    }
}

impl fmt::Display for LatLngBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.north_east, self.south_west)
    }
}

/// Decodes `"<lat>,<lng>"`.
pub fn decode_lat_lng(raw: &str) -> Option<LatLng> {
    let parts: Vec<&str> = raw.split(',').collect();
    let [lat, lng] = parts.as_slice() else {
        return None;
    };
    Some(LatLng::new(parse_numeral(lat)?, parse_numeral(lng)?))
}

/// Decodes `"<neLat>,<neLng>,<swLat>,<swLng>"`.
pub fn decode_lat_lng_bounds(raw: &str) -> Option<LatLngBounds> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 4 {
        return None;
    }
    let north_east = decode_lat_lng(&parts[..2].join(","))?;
    let south_west = decode_lat_lng(&parts[2..].join(","))?;
    Some(LatLngBounds::new(north_east, south_west))
}
