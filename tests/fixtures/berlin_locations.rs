//! Real Berlin / Potsdam locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

use trip_planner::location::Location;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Landmark {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Landmark {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

pub const DEPOT: Landmark = Landmark::new("Brandenburg Gate", 52.5163, 13.3777);

pub const BERLIN_MITTE: &[Landmark] = &[
    Landmark::new("Alexanderplatz", 52.5218, 13.4132),
    Landmark::new("Berlin Central Station", 52.5250, 13.3685),
    Landmark::new("Berlin Cathedral", 52.5194, 13.4010),
    Landmark::new("East Side Gallery", 52.5050, 13.4399),
    Landmark::new("Checkpoint Charlie", 52.5075, 13.3904),
    Landmark::new("Reichstag", 52.5186, 13.3762),
];

pub const POTSDAM: &[Landmark] = &[
    Landmark::new("Sanssouci Palace", 52.4043, 13.0384),
    Landmark::new("New Palace", 52.4013, 13.0134),
    Landmark::new("Dutch Quarter", 52.4023, 13.0594),
];

/// Depot followed by `landmarks`, ids by position.
pub fn trip(landmarks: &[Landmark]) -> Vec<Location> {
    std::iter::once(&DEPOT)
        .chain(landmarks)
        .enumerate()
        .map(|(id, landmark)| Location::new(id, landmark.lat, landmark.lng))
        .collect()
}

/// Depot plus three Mitte and three Potsdam stops, interleaved.
pub fn two_district_trip() -> Vec<Location> {
    trip(&[
        BERLIN_MITTE[0].clone(),
        POTSDAM[0].clone(),
        BERLIN_MITTE[2].clone(),
        POTSDAM[1].clone(),
        BERLIN_MITTE[3].clone(),
        POTSDAM[2].clone(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_in_berlin_area() {
        for landmark in BERLIN_MITTE.iter().chain(POTSDAM) {
            let name = landmark.name;
            assert!(landmark.lat > 52.3 && landmark.lat < 52.6, "{name} lat out of range");
            assert!(landmark.lng > 13.0 && landmark.lng < 13.5, "{name} lng out of range");
        }
    }
}
