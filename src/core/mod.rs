// Core modules implementing numeral parsing, geographic coercion, query decoding, and errors.
pub mod error;
pub mod geo;
pub mod numeral;
pub mod query;
