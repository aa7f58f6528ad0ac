use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

use super::http::check_response;

/// Address fields used to build a geocoding query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressQuery {
    pub street_1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub post_code: Option<String>,
}

impl AddressQuery {
    /// Comma-joined non-blank parts, or `None` when there is nothing to look up.
    pub fn query_text(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.street_1, &self.city, &self.state, &self.post_code]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Coordinates {
    pub const MISSING: Coordinates = Coordinates {
        latitude: None,
        longitude: None,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding was cancelled")]
    Cancelled,
    #[error("geocoding failed: {0}")]
    Failed(String),
}

/// Resolves an address to coordinates.
pub trait Geocoder: Send + Sync {
    fn geocode(
        &self,
        address: &AddressQuery,
    ) -> impl Future<Output = Result<Coordinates, GeocodeError>> + Send;
}

/// Church search around a city, as typed by a user looking for websites to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChurchSearchQuery {
    pub city: String,
    pub state: Option<String>,
    pub country: String,
}

impl ChurchSearchQuery {
    pub const DEFAULT_COUNTRY: &'static str = "USA";

    /// `None` when the city is missing or blank.
    pub fn new(city: Option<&str>, state: Option<&str>, country: Option<&str>) -> Option<Self> {
        let city = non_blank(city)?;
        Some(Self {
            city,
            state: non_blank(state),
            country: non_blank(country).unwrap_or_else(|| Self::DEFAULT_COUNTRY.to_string()),
        })
    }

    pub fn query_text(&self) -> String {
        let mut parts = vec!["churches", self.city.as_str()];
        if let Some(state) = &self.state {
            parts.push(state);
        }
        parts.push(&self.country);
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateAddress {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// A place the search provider believes is a church.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchCandidate {
    pub id: String,
    pub name: String,
    pub display_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: CandidateAddress,
    pub website: Option<String>,
    pub osm_type: Option<String>,
    pub osm_id: Option<i64>,
}

pub const SEARCH_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search provider unavailable: {0}")]
    Unavailable(String),
    #[error("church search failed: {0}")]
    Failed(String),
}

/// Finds candidate churches near a place.
pub trait ChurchLocator: Send + Sync {
    fn search(
        &self,
        query: &ChurchSearchQuery,
    ) -> impl Future<Output = Result<Vec<ChurchCandidate>, SearchError>> + Send;
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Fires the paired [`AbortSignal`]s.
#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

/// Caller-supplied cancellation for an evaluation run.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn pair() -> (AbortHandle, AbortSignal) {
        let (tx, rx) = watch::channel(false);
        (AbortHandle { tx }, AbortSignal { rx })
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the handle fires. Never resolves if the handle is dropped unfired.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|aborted| *aborted).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Geocode one address under the adapter contract.
///
/// Blank addresses skip the provider entirely. Provider failures degrade to missing
/// coordinates; only cancellation is returned as an error.
pub async fn geocode_or_missing<G: Geocoder>(
    geocoder: &G,
    address: &AddressQuery,
    signal: Option<&AbortSignal>,
) -> Result<Coordinates, GeocodeError> {
    if address.query_text().is_none() {
        return Ok(Coordinates::MISSING);
    }

    let outcome = match signal {
        Some(signal) => {
            if signal.is_aborted() {
                return Err(GeocodeError::Cancelled);
            }
            tokio::select! {
                result = geocoder.geocode(address) => result,
                _ = signal.aborted() => Err(GeocodeError::Cancelled),
            }
        }
        None => geocoder.geocode(address).await,
    };

    match outcome {
        Ok(coordinates) => Ok(coordinates),
        Err(GeocodeError::Cancelled) => Err(GeocodeError::Cancelled),
        Err(GeocodeError::Failed(reason)) => {
            warn!(reason = %reason, "geocoding degraded to missing coordinates");
            Ok(Coordinates::MISSING)
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
}

/// Geocoder backed by the Nominatim search API.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            timeout,
        }
    }
}

impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &AddressQuery) -> Result<Coordinates, GeocodeError> {
        let Some(query) = address.query_text() else {
            return Ok(Coordinates::MISSING);
        };

        let q = format!("{query} church");
        let resp = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("limit", "1"), ("q", q.as_str())])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| GeocodeError::Failed(err.to_string()))?;
        let resp = check_response(resp)
            .await
            .map_err(|failure| GeocodeError::Failed(format!("status {}", failure.status)))?;
        let places: Vec<NominatimPlace> = resp
            .json()
            .await
            .map_err(|err| GeocodeError::Failed(err.to_string()))?;

        Ok(places
            .into_iter()
            .next()
            .map(coordinates_from_place)
            .unwrap_or(Coordinates::MISSING))
    }
}

#[derive(Debug, Default, Deserialize)]
struct NominatimHitAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
    church: Option<String>,
    place: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimHitTags {
    website: Option<String>,
    #[serde(rename = "contact:website")]
    contact_website: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimHit {
    #[serde(default)]
    place_id: serde_json::Value,
    display_name: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    name: Option<String>,
    osm_type: Option<String>,
    osm_id: Option<i64>,
    #[serde(default)]
    address: Option<NominatimHitAddress>,
    #[serde(default)]
    extratags: Option<NominatimHitTags>,
}

impl ChurchLocator for NominatimGeocoder {
    async fn search(&self, query: &ChurchSearchQuery) -> Result<Vec<ChurchCandidate>, SearchError> {
        let q = query.query_text();
        let limit = SEARCH_LIMIT.to_string();
        let resp = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", q.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("addressdetails", "1"),
                ("extratags", "1"),
            ])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| SearchError::Unavailable(err.to_string()))?;
        let resp = check_response(resp)
            .await
            .map_err(|failure| SearchError::Unavailable(format!("status {}", failure.status)))?;
        let hits: Vec<NominatimHit> = resp
            .json()
            .await
            .map_err(|err| SearchError::Failed(err.to_string()))?;

        Ok(hits
            .into_iter()
            .take(SEARCH_LIMIT)
            .map(candidate_from_hit)
            .collect())
    }
}

fn candidate_from_hit(hit: NominatimHit) -> ChurchCandidate {
    let address = hit.address.unwrap_or_default();
    let tags = hit.extratags.unwrap_or_default();
    let name = [
        hit.name.as_deref(),
        address.church.as_deref(),
        address.place.as_deref(),
        hit.display_name.as_deref(),
    ]
    .into_iter()
    .find_map(non_blank)
    .unwrap_or_else(|| "Unknown".to_string());

    ChurchCandidate {
        id: match hit.place_id {
            serde_json::Value::String(id) => id,
            other => other.to_string(),
        },
        name,
        display_name: hit.display_name,
        latitude: parse_degrees(hit.lat.as_deref()),
        longitude: parse_degrees(hit.lon.as_deref()),
        address: CandidateAddress {
            city: non_blank(address.city.as_deref())
                .or_else(|| non_blank(address.town.as_deref()))
                .or_else(|| non_blank(address.village.as_deref())),
            state: address.state,
            country: address.country,
        },
        website: non_blank(tags.website.as_deref())
            .or_else(|| non_blank(tags.contact_website.as_deref())),
        osm_type: hit.osm_type,
        osm_id: hit.osm_id,
    }
}

fn coordinates_from_place(place: NominatimPlace) -> Coordinates {
    Coordinates {
        latitude: parse_degrees(place.lat.as_deref()),
        longitude: parse_degrees(place.lon.as_deref()),
    }
}

fn parse_degrees(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|degrees| degrees.is_finite())
}
