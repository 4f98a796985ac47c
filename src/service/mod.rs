//! HTTP handlers for Beacon.

pub mod root;
