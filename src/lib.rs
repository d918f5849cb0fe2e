//! Purpose: Library crate behind the `geoquery` CLI and its integration tests.
//! Exports: `api` (decoding surface), `notice` (structured stderr diagnostics).
//! Role: Typed query-string decoding with geographic point and bounds coercion.
//! Invariants: Decoding is pure; no I/O or shared state lives in this crate's library half.
//! Invariants: `api` is the only public path to core types.
pub mod api;
mod core;
pub mod notice;
