//! trip-planner core
//!
//! Multi-day route planning: destinations are split into one cluster per
//! day, and each day gets a near-shortest route from the depot.

pub mod error;
pub mod location;
pub mod matrix;
pub mod traits;
pub mod osrm;
pub mod haversine;
pub mod cluster;
pub mod solver;
pub mod orchestrator;
pub mod aggregate;
pub mod polyline;
pub mod geocode;
