use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::Utc;
use serde_json::{json, Value};

use crate::workflows::churches::dedup::{CrawlPage, CrawlResult};
use crate::workflows::churches::domain::{
    BestPages, ChurchEvaluationRaw, ChurchExtraction, Confession, Contacts, CoreDoctrineKey,
    Denomination, ExtractedAddress, RawDoctrineAnswers, SecondaryDoctrines, TertiaryDoctrines,
};
use crate::workflows::churches::mapping::{
    ChurchAddress, ChurchDetail, DenominationSummary, EvaluationRecord, EvaluationWrite,
    ServiceTime,
};
use crate::workflows::churches::{
    church_router, AddressQuery, CandidateAddress, ChurchCandidate, ChurchEvaluationService,
    ChurchId, ChurchLocator, ChurchSearchQuery, ChurchStore, ConfessionCatalog, Coordinates,
    CrawlError, CrawlProvider, DoctrinalExtractor, ExtractionError, GeocodeError, Geocoder,
    SearchError, StoreError,
};

pub(super) const WEBSITE: &str = "https://gracechurch.example/";
pub(super) const ADMIN_ID: &str = "admin-1";

pub(super) type TestService =
    ChurchEvaluationService<FakeCrawler, FakeExtractor, FakeGeocoder, MemoryStore>;

/// Extractor answers with `true_count` trues, `false_count` falses, and the rest unknown.
pub(super) fn core_answers(true_count: usize, false_count: usize) -> RawDoctrineAnswers {
    let mut answers = RawDoctrineAnswers::new();
    for (index, key) in CoreDoctrineKey::ALL.iter().enumerate() {
        let value = if index < true_count {
            "true"
        } else if index < true_count + false_count {
            "false"
        } else {
            "unknown"
        };
        answers.insert(key.as_str().to_string(), json!(value));
    }
    answers
}

pub(super) fn address(street: &str, city: &str, state: &str) -> ExtractedAddress {
    ExtractedAddress {
        street_1: Some(street.to_string()),
        city: Some(city.to_string()),
        state: Some(state.to_string()),
        post_code: Some("62701".to_string()),
        ..ExtractedAddress::default()
    }
}

pub(super) fn raw_evaluation(true_count: usize, false_count: usize) -> ChurchEvaluationRaw {
    ChurchEvaluationRaw {
        church: ChurchExtraction {
            name: Some("Grace Community Church".to_string()),
            website: WEBSITE.to_string(),
            addresses: vec![address("100 Main St", "Springfield", "IL")],
            contacts: Contacts {
                phone: Some("555-0100".to_string()),
                email: Some("office@gracechurch.example".to_string()),
            },
            service_times: vec!["Sunday 9:00 AM".to_string(), "Sunday 11:00 AM".to_string()],
            best_pages_for: BestPages {
                beliefs: Some(format!("{WEBSITE}beliefs")),
                ..BestPages::default()
            },
            denomination: Denomination {
                label: Some("Baptist".to_string()),
                confidence: 0.8,
                signals: vec!["SBC member".to_string()],
            },
            confession: Confession::default(),
            core_doctrines: core_answers(true_count, false_count),
            secondary: SecondaryDoctrines {
                baptism: Some("believer".to_string()),
                ..SecondaryDoctrines::default()
            },
            tertiary: TertiaryDoctrines::default(),
            badges: Vec::new(),
            notes: Vec::new(),
        },
    }
}

pub(super) fn confessional_raw() -> ChurchEvaluationRaw {
    let mut raw = raw_evaluation(0, 0);
    raw.church.confession = Confession {
        adopted: true,
        name: Some("Westminster Confession of Faith".to_string()),
        source_url: Some(format!("{WEBSITE}confession")),
    };
    raw
}

pub(super) fn pages() -> Vec<CrawlPage> {
    vec![
        CrawlPage::new(WEBSITE, "Welcome to Grace Community Church."),
        CrawlPage::new(format!("{WEBSITE}beliefs"), "We believe in one God in three persons."),
        CrawlPage::new(format!("{WEBSITE}beliefs#trinity"), "We believe in one God in three persons."),
    ]
}

pub(super) struct FakeCrawler {
    pages: Vec<CrawlPage>,
    missing_key: bool,
    pub(super) calls: AtomicUsize,
}

impl FakeCrawler {
    pub(super) fn with_pages(pages: Vec<CrawlPage>) -> Self {
        Self {
            pages,
            missing_key: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn unconfigured() -> Self {
        Self {
            pages: Vec::new(),
            missing_key: true,
            calls: AtomicUsize::new(0),
        }
    }
}

impl CrawlProvider for FakeCrawler {
    async fn crawl(&self, website: &str) -> Result<CrawlResult, CrawlError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.missing_key {
            return Err(CrawlError::MissingCredential {
                variable: "TAVILY_API_KEY",
            });
        }
        Ok(CrawlResult {
            base_url: website.to_string(),
            pages: self.pages.clone(),
        })
    }
}

pub(super) struct FakeExtractor {
    raw: Option<ChurchEvaluationRaw>,
    pub(super) calls: AtomicUsize,
    pub(super) seen_pages: Mutex<Vec<String>>,
}

impl FakeExtractor {
    pub(super) fn returning(raw: ChurchEvaluationRaw) -> Self {
        Self {
            raw: Some(raw),
            calls: AtomicUsize::new(0),
            seen_pages: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            raw: None,
            calls: AtomicUsize::new(0),
            seen_pages: Mutex::new(Vec::new()),
        }
    }
}

impl DoctrinalExtractor for FakeExtractor {
    async fn extract(&self, pages: &[CrawlPage]) -> Result<ChurchEvaluationRaw, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_pages
            .lock()
            .expect("pages mutex poisoned")
            .extend(pages.iter().map(|page| page.url.clone()));
        self.raw
            .clone()
            .ok_or_else(|| ExtractionError::InvalidPayload("missing field `church`".to_string()))
    }
}

pub(super) fn candidate(id: usize, website: Option<&str>) -> ChurchCandidate {
    ChurchCandidate {
        id: id.to_string(),
        name: format!("Church {id}"),
        display_name: Some(format!("Church {id}, Springfield, Illinois, USA")),
        latitude: Some(39.78),
        longitude: Some(-89.65),
        address: CandidateAddress {
            city: Some("Springfield".to_string()),
            state: Some("Illinois".to_string()),
            country: Some("USA".to_string()),
        },
        website: website.map(str::to_string),
        osm_type: Some("node".to_string()),
        osm_id: Some(id as i64),
    }
}

/// Resolves every address to fixed coordinates except the configured streets.
#[derive(Default)]
pub(super) struct FakeGeocoder {
    failing_streets: HashSet<String>,
    hanging_streets: HashSet<String>,
    candidates: Vec<ChurchCandidate>,
    search_outage: bool,
    pub(super) calls: AtomicUsize,
    pub(super) searches: Mutex<Vec<ChurchSearchQuery>>,
}

impl FakeGeocoder {
    pub(super) fn failing_on(street: &str) -> Self {
        Self {
            failing_streets: HashSet::from([street.to_string()]),
            ..Self::default()
        }
    }

    pub(super) fn hanging_on(street: &str) -> Self {
        Self {
            hanging_streets: HashSet::from([street.to_string()]),
            ..Self::default()
        }
    }

    pub(super) fn finding(candidates: Vec<ChurchCandidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }

    pub(super) fn search_offline() -> Self {
        Self {
            search_outage: true,
            ..Self::default()
        }
    }
}

impl Geocoder for FakeGeocoder {
    async fn geocode(&self, address: &AddressQuery) -> Result<Coordinates, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let street = address.street_1.clone().unwrap_or_default();
        if self.hanging_streets.contains(&street) {
            std::future::pending::<()>().await;
        }
        if self.failing_streets.contains(&street) {
            return Err(GeocodeError::Failed("request timed out".to_string()));
        }
        Ok(Coordinates::new(39.78, -89.65))
    }
}

impl ChurchLocator for FakeGeocoder {
    async fn search(&self, query: &ChurchSearchQuery) -> Result<Vec<ChurchCandidate>, SearchError> {
        self.searches
            .lock()
            .expect("searches mutex poisoned")
            .push(query.clone());
        if self.search_outage {
            return Err(SearchError::Unavailable("status 503".to_string()));
        }
        Ok(self.candidates.clone())
    }
}

#[derive(Default)]
struct MemoryState {
    next_church: i64,
    next_row: i64,
    churches: BTreeMap<ChurchId, ChurchDetail>,
    history: BTreeMap<ChurchId, Vec<EvaluationRecord>>,
}

impl MemoryState {
    fn row_id(&mut self) -> i64 {
        self.next_row += 1;
        self.next_row
    }
}

/// In-memory [`ChurchStore`] mirroring the upsert and history semantics of the SQLite store.
#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub(super) fn church_count(&self) -> usize {
        self.state.lock().expect("store mutex poisoned").churches.len()
    }

    pub(super) fn evaluation_count(&self) -> usize {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .history
            .values()
            .map(Vec::len)
            .sum()
    }
}

impl ChurchStore for MemoryStore {
    fn record_evaluation(&self, write: EvaluationWrite) -> Result<ChurchDetail, StoreError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let now = Utc::now();

        let existing = state
            .churches
            .values()
            .find(|church| church.website == write.profile.website)
            .map(|church| (church.id, church.created_at));
        let (id, created_at) = match existing {
            Some(found) => found,
            None => {
                state.next_church += 1;
                (ChurchId(state.next_church), now)
            }
        };

        let profile = write.profile;
        let mut addresses = Vec::new();
        for address in write.addresses {
            addresses.push(ChurchAddress {
                id: state.row_id(),
                street_1: address.street_1,
                street_2: address.street_2,
                city: address.city,
                state: address.state,
                post_code: address.post_code,
                latitude: address.latitude,
                longitude: address.longitude,
                source_url: address.source_url,
                is_primary: address.is_primary,
            });
        }
        let mut service_times = Vec::new();
        for label in write.service_times {
            service_times.push(ServiceTime {
                id: state.row_id(),
                label,
            });
        }

        let processed = write.processed;
        let record = EvaluationRecord {
            id: state.row_id(),
            status: processed.status,
            badges: processed.badges,
            coverage_ratio: processed.coverage_ratio,
            core_on_site_count: processed.core_on_site_count,
            core_total_count: processed.core_total_count,
            false_count: processed.false_count,
            confession_adopted: processed.confession_adopted,
            core_doctrines: processed.normalized_core,
            secondary: processed.secondary,
            tertiary: processed.tertiary,
            raw: write.raw,
            created_at: now,
        };

        let detail = ChurchDetail {
            id,
            name: profile.name,
            website: profile.website,
            phone: profile.phone,
            email: profile.email,
            denomination: DenominationSummary {
                label: profile.denomination_label,
                confidence: profile.denomination_confidence,
                signals: profile.denomination_signals,
            },
            confession_adopted: profile.confession_adopted,
            confession_name: profile.confession_name,
            confession_source_url: profile.confession_source_url,
            best_pages: profile.best_pages,
            addresses,
            service_times,
            evaluation: Some(record.clone()),
            created_at,
            updated_at: now,
        };

        state.history.entry(id).or_default().push(record);
        state.churches.insert(id, detail.clone());
        Ok(detail)
    }

    fn find_by_website(&self, website: &str) -> Result<Option<ChurchDetail>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .churches
            .values()
            .find(|church| church.website == website)
            .cloned())
    }

    fn fetch(&self, id: ChurchId) -> Result<Option<ChurchDetail>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.churches.get(&id).cloned())
    }

    fn history(&self, id: ChurchId) -> Result<Vec<EvaluationRecord>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        let mut records = state.history.get(&id).cloned().unwrap_or_default();
        records.reverse();
        Ok(records)
    }

    fn all(&self) -> Result<Vec<ChurchDetail>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.churches.values().cloned().collect())
    }

    fn delete(&self, id: ChurchId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        state.history.remove(&id);
        Ok(state.churches.remove(&id).is_some())
    }
}

pub(super) struct UnavailableStore;

impl ChurchStore for UnavailableStore {
    fn record_evaluation(&self, _write: EvaluationWrite) -> Result<ChurchDetail, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn find_by_website(&self, _website: &str) -> Result<Option<ChurchDetail>, StoreError> {
        Ok(None)
    }

    fn fetch(&self, _id: ChurchId) -> Result<Option<ChurchDetail>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn history(&self, _id: ChurchId) -> Result<Vec<EvaluationRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<ChurchDetail>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: ChurchId) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Store whose reads hold the calling thread, like a contended SQLite connection.
pub(super) struct SlowStore {
    pub(super) delay: Duration,
}

impl ChurchStore for SlowStore {
    fn record_evaluation(&self, _write: EvaluationWrite) -> Result<ChurchDetail, StoreError> {
        Err(StoreError::Unavailable("read-only".to_string()))
    }

    fn find_by_website(&self, _website: &str) -> Result<Option<ChurchDetail>, StoreError> {
        std::thread::sleep(self.delay);
        Ok(None)
    }

    fn fetch(&self, _id: ChurchId) -> Result<Option<ChurchDetail>, StoreError> {
        std::thread::sleep(self.delay);
        Ok(None)
    }

    fn history(&self, _id: ChurchId) -> Result<Vec<EvaluationRecord>, StoreError> {
        std::thread::sleep(self.delay);
        Ok(Vec::new())
    }

    fn all(&self) -> Result<Vec<ChurchDetail>, StoreError> {
        std::thread::sleep(self.delay);
        Ok(Vec::new())
    }

    fn delete(&self, _id: ChurchId) -> Result<bool, StoreError> {
        std::thread::sleep(self.delay);
        Ok(false)
    }
}

/// Store that loses every insert race on the website key.
pub(super) struct RacedStore;

impl ChurchStore for RacedStore {
    fn record_evaluation(&self, write: EvaluationWrite) -> Result<ChurchDetail, StoreError> {
        Err(StoreError::Conflict(format!(
            "UNIQUE constraint failed: churches.website ({})",
            write.profile.website
        )))
    }

    fn find_by_website(&self, _website: &str) -> Result<Option<ChurchDetail>, StoreError> {
        Ok(None)
    }

    fn fetch(&self, _id: ChurchId) -> Result<Option<ChurchDetail>, StoreError> {
        Ok(None)
    }

    fn history(&self, _id: ChurchId) -> Result<Vec<EvaluationRecord>, StoreError> {
        Ok(Vec::new())
    }

    fn all(&self) -> Result<Vec<ChurchDetail>, StoreError> {
        Ok(Vec::new())
    }

    fn delete(&self, _id: ChurchId) -> Result<bool, StoreError> {
        Ok(false)
    }
}

pub(super) fn service_with<S: ChurchStore + 'static>(
    crawler: FakeCrawler,
    extractor: FakeExtractor,
    geocoder: FakeGeocoder,
    store: Arc<S>,
) -> ChurchEvaluationService<FakeCrawler, FakeExtractor, FakeGeocoder, S> {
    ChurchEvaluationService::new(
        Arc::new(crawler),
        Arc::new(extractor),
        Arc::new(geocoder),
        store,
        Arc::new(ConfessionCatalog::standard()),
    )
}

pub(super) fn build_service(raw: ChurchEvaluationRaw) -> (TestService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = service_with(
        FakeCrawler::with_pages(pages()),
        FakeExtractor::returning(raw),
        FakeGeocoder::default(),
        store.clone(),
    );
    (service, store)
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    church_router(Arc::new(service), Some(ADMIN_ID.to_string()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
