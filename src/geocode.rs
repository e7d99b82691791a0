//! Address resolution ahead of planning.

use url::Url;

use crate::error::GeocodingError;
use crate::location::Location;
use crate::traits::Geocoder;

/// Resolves addresses that are already written as `"lat,lng"`, the form map
/// links use for dropped pins.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateGeocoder;

impl Geocoder for CoordinateGeocoder {
    fn geocode(&self, address: &str) -> Result<(f64, f64), GeocodingError> {
        let unresolved = |reason: &str| GeocodingError::Unresolved {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        let (lat, lng) = address
            .split_once(',')
            .ok_or_else(|| unresolved("expected \"lat,lng\""))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| unresolved("latitude is not a number"))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| unresolved("longitude is not a number"))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(unresolved("latitude out of range"));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(unresolved("longitude out of range"));
        }
        Ok((lat, lng))
    }
}

/// Address segments of a shared directions link, in route order.
///
/// Takes the path segments after `dir` up to the map viewport (`@lat,lng,zoom`)
/// or `data=` segment, decoding `+` and percent escapes:
/// `https://www.google.com/maps/dir/Alexanderplatz/52.5163,13.3777/@52.5,13.4,13z`
/// gives `["Alexanderplatz", "52.5163,13.3777"]`.
pub fn map_link_addresses(link: &str) -> Result<Vec<String>, GeocodingError> {
    let invalid = |reason: &str| GeocodingError::InvalidMapLink {
        url: link.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(link.trim()).map_err(|err| invalid(&err.to_string()))?;
    let mut segments = url.path_segments().ok_or_else(|| invalid("link has no path"))?;
    if !segments.any(|segment| segment == "dir") {
        return Err(invalid("no /dir/ segment"));
    }

    let addresses: Vec<String> = segments
        .take_while(|segment| !segment.starts_with('@') && !segment.starts_with("data="))
        .filter(|segment| !segment.is_empty())
        .map(decode_segment)
        .collect();

    if addresses.is_empty() {
        return Err(invalid("no addresses after /dir/"));
    }
    Ok(addresses)
}

fn decode_segment(segment: &str) -> String {
    url::form_urlencoded::parse(segment.as_bytes())
        .map(|(key, value)| {
            if value.is_empty() {
                key.into_owned()
            } else {
                format!("{key}={value}")
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Resolve every address in order; ids are input positions.
///
/// Stops at the first address that cannot be resolved.
pub fn resolve_all<G, S>(geocoder: &G, addresses: &[S]) -> Result<Vec<Location>, GeocodingError>
where
    G: Geocoder + ?Sized,
    S: AsRef<str>,
{
    addresses
        .iter()
        .enumerate()
        .map(|(id, address)| {
            let (lat, lng) = geocoder.geocode(address.as_ref())?;
            Ok(Location::new(id, lat, lng))
        })
        .collect()
}
