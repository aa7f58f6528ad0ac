//! Church website evaluation: crawl, extraction, scoring, geocoding, and the directory store.
//!
//! Providers sit behind the `CrawlProvider`, `DoctrinalExtractor`, `Geocoder`/`ChurchLocator`,
//! and `ChurchStore` seams so the service and router can be driven by fakes in tests.

pub mod confession;
pub mod crawl;
pub mod dedup;
pub mod directory;
pub mod domain;
pub mod extractor;
pub mod geocode;
pub(crate) mod http;
pub mod mapping;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use confession::{
    apply_confession_to_core, apply_confession_to_secondary, ConfessionCatalog, ConfessionEntry,
};
pub use crawl::{CrawlError, CrawlProvider, TavilyCrawler};
pub use dedup::{drop_anchor_dupes, CrawlPage, CrawlResult};
pub use directory::{
    ChurchFilter, ChurchMeta, ChurchPage, DirectoryTotals, ExistenceCheck, StatusFilter, PAGE_SIZE,
};
pub use domain::{
    Badge, BestPages, ChurchEvaluationRaw, ChurchExtraction, Confession, Contacts,
    CoreDoctrineKey, CoreDoctrineMap, Denomination, DoctrineStatus, EvaluationStatus,
    EvidenceNote, ExtractedAddress, ProcessedEvaluation, RawDoctrineAnswers, SecondaryDoctrines,
    TertiaryDoctrines,
};
pub use extractor::{DoctrinalExtractor, ExtractionError, OpenAiExtractor};
pub use geocode::{
    AbortHandle, AbortSignal, AddressQuery, CandidateAddress, ChurchCandidate, ChurchLocator,
    ChurchSearchQuery, Coordinates, GeocodeError, Geocoder, NominatimGeocoder, SearchError,
    SEARCH_LIMIT,
};
pub use mapping::{
    normalize_website, ChurchAddress, ChurchDetail, ChurchListItem, EvaluationRecord,
    EvaluationWrite, InvalidWebsite,
};
pub use repository::{ChurchId, ChurchStore, StoreError};
pub use router::church_router;
pub use scoring::EvaluationEngine;
pub use service::{ChurchEvaluationService, EvaluationError};
pub use sqlite::SqliteChurchStore;
