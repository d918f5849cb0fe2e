//! Purpose: Define the stable public Rust API boundary for geoquery.
//! Exports: Decoder entry points, value types, and the error model.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: Internal modules remain private and are not directly exposed.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::geo::{LatLng, LatLngBounds, decode_lat_lng, decode_lat_lng_bounds};
pub use crate::core::numeral::{canonical_numeral, parse_numeral, parse_numeral_value};
pub use crate::core::query::{DecodeConfig, DecodedQuery, QueryValue, decode_query, encode_query};
