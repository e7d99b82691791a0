//! Test fixtures for trip-planner.
//!
//! Provides realistic test data including:
//! - Real Berlin and Potsdam landmark locations (from OpenStreetMap)
//! - Distance providers with scripted failures
//! - A canned-response HTTP server standing in for OSRM

#![allow(dead_code)]

pub mod berlin_locations;
pub mod providers;
pub mod table_server;

pub use berlin_locations::*;
