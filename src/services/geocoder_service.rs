use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::get_config;
use crate::error::{Error, Result};

pub const EARTH_RADIUS_MILES: f64 = 3963.0;

/// Converts a search radius in miles into the angular distance the
/// great-circle predicate in SQL compares against.
pub fn miles_to_radians(miles: f64) -> f64 {
    miles / EARTH_RADIUS_MILES
}

/// Geo fields resolved for a free-form address or zipcode.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    locations: Vec<GeocodeCandidate>,
}

// MapQuest candidate shape: coordinates under latLng, address parts spread
// over the adminArea fields.
#[derive(Debug, Deserialize)]
struct GeocodeCandidate {
    #[serde(rename = "latLng")]
    lat_lng: LatLng,
    street: Option<String>,
    #[serde(rename = "adminArea5")]
    city: Option<String>,
    #[serde(rename = "postalCode")]
    postal_code: Option<String>,
    #[serde(rename = "adminArea1")]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Clone)]
pub struct GeocoderService {
    client: Client,
}

impl GeocoderService {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;
        Ok(Self { client })
    }

    /// Forward-geocodes a location string. The first candidate wins; an
    /// empty candidate list surfaces as an upstream fault instead of a
    /// silent default coordinate.
    pub async fn geocode(&self, location: &str) -> Result<GeoLocation> {
        let config = get_config();
        let response = self
            .client
            .get(format!("{}/address", config.geocoder_url))
            .query(&[
                ("key", config.geocoder_api_key.as_str()),
                ("location", location),
            ])
            .send()
            .await?
            .error_for_status()?;

        let decoded: GeocodeResponse = response.json().await?;
        let candidate = decoded
            .results
            .into_iter()
            .flat_map(|result| result.locations)
            .next()
            .ok_or_else(|| Error::Upstream(format!("no geocoding result for '{}'", location)))?;

        Ok(GeoLocation {
            latitude: candidate.lat_lng.lat,
            longitude: candidate.lat_lng.lng,
            formatted_address: candidate.street,
            city: candidate.city,
            zipcode: candidate.postal_code,
            country: candidate.country,
        })
    }
}
