use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::domain::{
    Badge, BestPages, ChurchEvaluationRaw, CoreDoctrineMap, EvaluationStatus, ProcessedEvaluation,
    SecondaryDoctrines, TertiaryDoctrines,
};
use super::geocode::{AddressQuery, Coordinates};
use super::repository::ChurchId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid website URL: {input:?}")]
pub struct InvalidWebsite {
    pub input: String,
}

/// Canonical form of a user-supplied website, used as the church's unique key.
///
/// Inputs without an `http`/`https` scheme are retried with `https://`.
pub fn normalize_website(input: &str) -> Result<String, InvalidWebsite> {
    let trimmed = input.trim();
    let invalid = || InvalidWebsite {
        input: input.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let parsed = Url::parse(trimmed)
        .ok()
        .filter(is_web_url)
        .or_else(|| Url::parse(&format!("https://{trimmed}")).ok().filter(is_web_url))
        .ok_or_else(invalid)?;

    Ok(parsed.to_string())
}

fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|host| !host.is_empty())
}

/// Host without a leading `www.`, used when the extractor could not name the church.
pub fn fallback_name(website: &str) -> String {
    Url::parse(website)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .unwrap_or_else(|| website.to_string())
}

/// Scalar church fields written on create and overwritten on re-evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchProfile {
    pub name: String,
    pub website: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub denomination_label: Option<String>,
    pub denomination_confidence: Option<f64>,
    pub denomination_signals: Vec<String>,
    pub confession_adopted: bool,
    pub confession_name: Option<String>,
    pub confession_source_url: Option<String>,
    pub best_pages: BestPages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressWrite {
    pub street_1: Option<String>,
    pub street_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub post_code: Option<String>,
    pub source_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_primary: bool,
}

/// Everything one evaluation run persists, applied as a single atomic unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationWrite {
    pub profile: ChurchProfile,
    pub addresses: Vec<AddressWrite>,
    pub service_times: Vec<String>,
    pub raw: ChurchEvaluationRaw,
    pub processed: ProcessedEvaluation,
}

/// Geocoding queries for each extracted address, in extraction order.
pub fn address_queries(raw: &ChurchEvaluationRaw) -> Vec<AddressQuery> {
    raw.church
        .addresses
        .iter()
        .map(|address| AddressQuery {
            street_1: address.street_1.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            post_code: address.post_code.clone(),
        })
        .collect()
}

/// Build the persistence unit. `coordinates` is indexed like the extracted addresses.
pub fn assemble_write(
    website: &str,
    raw: ChurchEvaluationRaw,
    processed: ProcessedEvaluation,
    coordinates: &[Coordinates],
) -> EvaluationWrite {
    let church = &raw.church;

    let name = church
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback_name(website));

    let profile = ChurchProfile {
        name,
        website: website.to_string(),
        phone: church.contacts.phone.clone(),
        email: church.contacts.email.clone(),
        denomination_label: church.denomination.label.clone(),
        denomination_confidence: Some(church.denomination.confidence),
        denomination_signals: church.denomination.signals.clone(),
        confession_adopted: church.confession.adopted,
        confession_name: church.confession.name.clone(),
        confession_source_url: church.confession.source_url.clone(),
        best_pages: church.best_pages_for.clone(),
    };

    let addresses = church
        .addresses
        .iter()
        .enumerate()
        .map(|(index, address)| {
            let coords = coordinates.get(index).copied().unwrap_or(Coordinates::MISSING);
            AddressWrite {
                street_1: address.street_1.clone(),
                street_2: address.street_2.clone(),
                city: address.city.clone(),
                state: address.state.clone(),
                post_code: address.post_code.clone(),
                source_url: address.source_url.clone(),
                latitude: coords.latitude,
                longitude: coords.longitude,
                is_primary: index == 0,
            }
        })
        .collect();

    let service_times = church.service_times.clone();

    EvaluationWrite {
        profile,
        addresses,
        service_times,
        raw,
        processed,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchAddress {
    pub id: i64,
    pub street_1: Option<String>,
    pub street_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub post_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source_url: Option<String>,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTime {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenominationSummary {
    pub label: Option<String>,
    pub confidence: Option<f64>,
    pub signals: Vec<String>,
}

/// One row of a church's append-only evaluation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: i64,
    pub status: EvaluationStatus,
    pub badges: Vec<Badge>,
    pub coverage_ratio: f64,
    pub core_on_site_count: u32,
    pub core_total_count: u32,
    pub false_count: u32,
    pub confession_adopted: bool,
    pub core_doctrines: CoreDoctrineMap,
    pub secondary: SecondaryDoctrines,
    pub tertiary: TertiaryDoctrines,
    pub raw: ChurchEvaluationRaw,
    pub created_at: DateTime<Utc>,
}

/// Full read-side projection of a church with its latest evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchDetail {
    pub id: ChurchId,
    pub name: String,
    pub website: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub denomination: DenominationSummary,
    pub confession_adopted: bool,
    pub confession_name: Option<String>,
    pub confession_source_url: Option<String>,
    pub best_pages: BestPages,
    pub addresses: Vec<ChurchAddress>,
    pub service_times: Vec<ServiceTime>,
    pub evaluation: Option<EvaluationRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChurchDetail {
    /// The flagged primary address, or the first address when none is flagged.
    pub fn primary_address(&self) -> Option<&ChurchAddress> {
        self.addresses
            .iter()
            .find(|address| address.is_primary)
            .or_else(|| self.addresses.first())
    }

    pub fn status(&self) -> Option<EvaluationStatus> {
        self.evaluation.as_ref().map(|evaluation| evaluation.status)
    }

    pub fn to_list_item(&self) -> ChurchListItem {
        let primary = self.primary_address();
        ChurchListItem {
            id: self.id,
            name: self.name.clone(),
            website: self.website.clone(),
            city: primary.and_then(|address| address.city.clone()),
            state: primary.and_then(|address| address.state.clone()),
            latitude: primary.and_then(|address| address.latitude),
            longitude: primary.and_then(|address| address.longitude),
            confession_adopted: self.confession_adopted,
            denomination: self.denomination.clone(),
            status: self.status(),
            coverage_ratio: self.evaluation.as_ref().map(|evaluation| evaluation.coverage_ratio),
            badges: self
                .evaluation
                .as_ref()
                .map(|evaluation| evaluation.badges.clone())
                .unwrap_or_default(),
            service_times: self.service_times.clone(),
        }
    }
}

/// Directory card projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchListItem {
    pub id: ChurchId,
    pub name: String,
    pub website: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub confession_adopted: bool,
    pub denomination: DenominationSummary,
    pub status: Option<EvaluationStatus>,
    pub coverage_ratio: Option<f64>,
    pub badges: Vec<Badge>,
    pub service_times: Vec<ServiceTime>,
}
