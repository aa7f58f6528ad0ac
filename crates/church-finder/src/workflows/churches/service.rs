use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use super::confession::ConfessionCatalog;
use super::crawl::{CrawlError, CrawlProvider};
use super::dedup::drop_anchor_dupes;
use super::directory::{self, ChurchFilter, ChurchMeta, ChurchPage, ExistenceCheck};
use super::extractor::{DoctrinalExtractor, ExtractionError};
use super::geocode::{
    geocode_or_missing, AbortSignal, AddressQuery, ChurchCandidate, ChurchLocator,
    ChurchSearchQuery, Coordinates, Geocoder, SearchError, SEARCH_LIMIT,
};
use super::mapping::{
    address_queries, assemble_write, normalize_website, ChurchDetail, EvaluationRecord,
    InvalidWebsite,
};
use super::repository::{ChurchId, ChurchStore, StoreError};
use super::scoring::EvaluationEngine;

/// Runs one evaluation end to end: crawl, dedup, extract, score, geocode, persist.
pub struct ChurchEvaluationService<C, X, G, S> {
    crawler: Arc<C>,
    extractor: Arc<X>,
    geocoder: Arc<G>,
    store: Arc<S>,
    engine: Arc<EvaluationEngine>,
}

impl<C, X, G, S> ChurchEvaluationService<C, X, G, S>
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + 'static,
    S: ChurchStore + 'static,
{
    pub fn new(
        crawler: Arc<C>,
        extractor: Arc<X>,
        geocoder: Arc<G>,
        store: Arc<S>,
        catalog: Arc<ConfessionCatalog>,
    ) -> Self {
        Self {
            crawler,
            extractor,
            geocoder,
            store,
            engine: Arc::new(EvaluationEngine::new(catalog)),
        }
    }

    pub fn engine(&self) -> &EvaluationEngine {
        &self.engine
    }

    pub fn crawler(&self) -> &C {
        &self.crawler
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Evaluate a website and persist the result.
    pub async fn evaluate(&self, website: &str) -> Result<ChurchDetail, EvaluationError> {
        self.evaluate_with_signal(website, None).await
    }

    /// Evaluate a website, aborting at the next suspension point once `signal` fires.
    ///
    /// Fatal failures leave previously stored state untouched. The store write itself is
    /// never interrupted once started.
    pub async fn evaluate_with_signal(
        &self,
        website: &str,
        signal: Option<&AbortSignal>,
    ) -> Result<ChurchDetail, EvaluationError> {
        let website = normalize_website(website)?;

        let crawl = until_aborted(self.crawler.crawl(&website), signal).await??;
        let crawled = crawl.pages.len();
        let cleaned = drop_anchor_dupes(crawl);
        info!(
            website = %website,
            crawled,
            kept = cleaned.pages.len(),
            "crawl deduplicated"
        );
        if cleaned.pages.is_empty() {
            return Err(EvaluationError::NoContent);
        }

        info!(website = %website, "extraction started");
        let raw = until_aborted(self.extractor.extract(&cleaned.pages), signal).await??;
        let processed = self.engine.process(&raw);
        info!(
            website = %website,
            status = processed.status.label(),
            coverage = processed.coverage_ratio,
            "extraction finished"
        );

        let coordinates = self.geocode_all(&address_queries(&raw), signal).await?;
        if signal.is_some_and(AbortSignal::is_aborted) {
            return Err(EvaluationError::Cancelled);
        }

        let write = assemble_write(&website, raw, processed, &coordinates);
        let detail = self
            .with_store(move |store| store.record_evaluation(write))
            .await?;

        if let Some(evaluation) = &detail.evaluation {
            info!(
                church_id = %detail.id,
                status = evaluation.status.label(),
                coverage = evaluation.coverage_ratio,
                "evaluation persisted"
            );
        }
        Ok(detail)
    }

    async fn geocode_all(
        &self,
        queries: &[AddressQuery],
        signal: Option<&AbortSignal>,
    ) -> Result<Vec<Coordinates>, EvaluationError> {
        let results = join_all(
            queries
                .iter()
                .map(|query| geocode_or_missing(self.geocoder.as_ref(), query, signal)),
        )
        .await;

        let mut coordinates = Vec::with_capacity(results.len());
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(coords) => {
                    if coords.latitude.is_none() && queries[index].query_text().is_some() {
                        warn!(address_index = index, "address stored without coordinates");
                    }
                    coordinates.push(coords);
                }
                // only cancellation escapes geocode_or_missing
                Err(_) => return Err(EvaluationError::Cancelled),
            }
        }
        Ok(coordinates)
    }

    /// Run a store call on the blocking pool; the store serializes on a sync lock.
    async fn with_store<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?
    }

    /// Existing church for a website, if any.
    pub async fn find_existing(
        &self,
        website: &str,
    ) -> Result<Option<ChurchDetail>, EvaluationError> {
        let website = normalize_website(website)?;
        Ok(self
            .with_store(move |store| store.find_by_website(&website))
            .await?)
    }

    pub async fn check(&self, website: &str) -> Result<ExistenceCheck, EvaluationError> {
        let existing = self.find_existing(website).await?;
        Ok(directory::existence(existing.as_ref()))
    }

    pub async fn get(&self, id: ChurchId) -> Result<Option<ChurchDetail>, StoreError> {
        self.with_store(move |store| store.fetch(id)).await
    }

    /// Evaluation history, newest first. `None` when the church does not exist.
    pub async fn history(
        &self,
        id: ChurchId,
    ) -> Result<Option<Vec<EvaluationRecord>>, StoreError> {
        self.with_store(move |store| {
            if store.fetch(id)?.is_none() {
                return Ok(None);
            }
            store.history(id).map(Some)
        })
        .await
    }

    pub async fn directory(&self, filter: &ChurchFilter) -> Result<ChurchPage, StoreError> {
        let churches = self.with_store(|store| store.all()).await?;
        Ok(directory::list(&churches, filter))
    }

    pub async fn meta(&self) -> Result<ChurchMeta, StoreError> {
        let churches = self.with_store(|store| store.all()).await?;
        Ok(directory::meta(&churches))
    }

    pub async fn delete(&self, id: ChurchId) -> Result<bool, StoreError> {
        self.with_store(move |store| store.delete(id)).await
    }
}

impl<C, X, G, S> ChurchEvaluationService<C, X, G, S>
where
    G: ChurchLocator,
{
    /// Candidate churches near a place, capped at [`SEARCH_LIMIT`].
    pub async fn search(
        &self,
        query: &ChurchSearchQuery,
    ) -> Result<Vec<ChurchCandidate>, SearchError> {
        let mut candidates = self.geocoder.search(query).await?;
        candidates.truncate(SEARCH_LIMIT);
        info!(query = %query.query_text(), found = candidates.len(), "church search finished");
        Ok(candidates)
    }
}

async fn until_aborted<F: Future>(
    future: F,
    signal: Option<&AbortSignal>,
) -> Result<F::Output, EvaluationError> {
    match signal {
        None => Ok(future.await),
        Some(signal) => {
            if signal.is_aborted() {
                return Err(EvaluationError::Cancelled);
            }
            tokio::select! {
                output = future => Ok(output),
                _ = signal.aborted() => Err(EvaluationError::Cancelled),
            }
        }
    }
}

/// Error raised by an evaluation run or a directory read.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    InvalidWebsite(#[from] InvalidWebsite),
    #[error("Unable to gather website content for evaluation. The website may be blocking crawlers or may not have accessible content.")]
    NoContent,
    #[error("{variable} is not configured")]
    Configuration { variable: &'static str },
    #[error(transparent)]
    Crawl(CrawlError),
    #[error(transparent)]
    ExtractionFailed(ExtractionError),
    #[error("evaluation was cancelled")]
    Cancelled,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CrawlError> for EvaluationError {
    fn from(value: CrawlError) -> Self {
        match value {
            CrawlError::MissingCredential { variable } => Self::Configuration { variable },
            other => Self::Crawl(other),
        }
    }
}

impl From<ExtractionError> for EvaluationError {
    fn from(value: ExtractionError) -> Self {
        match value {
            ExtractionError::MissingCredential { variable } => Self::Configuration { variable },
            other => Self::ExtractionFailed(other),
        }
    }
}
