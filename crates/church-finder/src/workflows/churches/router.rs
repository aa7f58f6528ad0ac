use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::crawl::CrawlProvider;
use super::directory::{ChurchFilter, StatusFilter};
use super::extractor::DoctrinalExtractor;
use super::geocode::{ChurchLocator, ChurchSearchQuery, Geocoder, SearchError};
use super::repository::{ChurchId, ChurchStore, StoreError};
use super::service::{ChurchEvaluationService, EvaluationError};

/// Shared handler state: the service plus the operator id allowed to force re-evaluation.
pub struct ChurchRouterState<C, X, G, S> {
    service: Arc<ChurchEvaluationService<C, X, G, S>>,
    admin_id: Option<Arc<str>>,
}

impl<C, X, G, S> Clone for ChurchRouterState<C, X, G, S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            admin_id: self.admin_id.clone(),
        }
    }
}

impl<C, X, G, S> ChurchRouterState<C, X, G, S> {
    fn is_admin(&self, user_id: Option<&str>) -> bool {
        match (self.admin_id.as_deref(), user_id) {
            (Some(admin), Some(user)) => !admin.is_empty() && admin == user,
            _ => false,
        }
    }
}

/// Router builder exposing the church directory and evaluation endpoints.
pub fn church_router<C, X, G, S>(
    service: Arc<ChurchEvaluationService<C, X, G, S>>,
    admin_id: Option<String>,
) -> Router
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + ChurchLocator + 'static,
    S: ChurchStore + 'static,
{
    let state = ChurchRouterState {
        service,
        admin_id: admin_id.map(Arc::from),
    };

    Router::new()
        .route(
            "/api/v1/churches",
            get(list_handler::<C, X, G, S>).post(create_handler::<C, X, G, S>),
        )
        .route("/api/v1/churches/meta", get(meta_handler::<C, X, G, S>))
        .route("/api/v1/churches/check", get(check_handler::<C, X, G, S>))
        .route("/api/v1/churches/search", get(search_handler::<C, X, G, S>))
        .route(
            "/api/v1/churches/:church_id",
            get(detail_handler::<C, X, G, S>).delete(delete_handler::<C, X, G, S>),
        )
        .route(
            "/api/v1/churches/:church_id/evaluations",
            get(history_handler::<C, X, G, S>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateChurchRequest {
    #[serde(default)]
    website: Option<String>,
    #[serde(default, alias = "forceReEvaluate")]
    force_re_evaluate: bool,
    #[serde(default, alias = "userId")]
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdminRequest {
    #[serde(default, alias = "userId")]
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    page: Option<String>,
    state: Option<String>,
    city: Option<String>,
    denomination: Option<String>,
    confessional: Option<String>,
    status: Option<String>,
}

impl ListParams {
    fn into_filter(self) -> ChurchFilter {
        ChurchFilter {
            page: self.page.and_then(|page| page.trim().parse::<i64>().ok()),
            state: self.state,
            city: self.city,
            denomination: self.denomination,
            confessional: self.confessional.and_then(|value| {
                match value.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                }
            }),
            status: self.status.as_deref().and_then(StatusFilter::parse),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CheckParams {
    website: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchParams {
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

const NO_CONTENT_MESSAGE: &str = "Could not access the church website. The site may be blocking crawlers, offline, or require authentication. Please verify the URL and try again.";

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn not_found() -> Response {
    error_body(StatusCode::NOT_FOUND, "Church not found")
}

fn parse_church_id(raw: &str) -> Option<ChurchId> {
    raw.trim().parse::<i64>().ok().map(ChurchId)
}

fn evaluation_error_response(err: EvaluationError) -> Response {
    match err {
        EvaluationError::InvalidWebsite(_) => {
            error_body(StatusCode::BAD_REQUEST, "Invalid website URL")
        }
        EvaluationError::NoContent => {
            error_body(StatusCode::UNPROCESSABLE_ENTITY, NO_CONTENT_MESSAGE)
        }
        EvaluationError::Configuration { variable } => {
            error!(variable, "church evaluation is missing a provider credential");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Service configuration error")
        }
        EvaluationError::Crawl(_) | EvaluationError::ExtractionFailed(_) => {
            error!(error = %err, "church evaluation provider failed");
            error_body(StatusCode::BAD_GATEWAY, err.to_string())
        }
        EvaluationError::Cancelled => error_body(StatusCode::REQUEST_TIMEOUT, err.to_string()),
        EvaluationError::Store(StoreError::Conflict(_)) => {
            error_body(StatusCode::CONFLICT, "Church already exists")
        }
        EvaluationError::Store(_) => {
            error!(error = %err, "church evaluation could not be persisted");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn store_error_response(err: impl std::fmt::Display) -> Response {
    error!(error = %err, "church store read failed");
    error_body(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub(crate) async fn create_handler<C, X, G, S>(
    State(state): State<ChurchRouterState<C, X, G, S>>,
    payload: Result<Json<CreateChurchRequest>, JsonRejection>,
) -> Response
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + 'static,
    S: ChurchStore + 'static,
{
    let Ok(Json(request)) = payload else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid JSON payload");
    };

    let website = request.website.as_deref().map(str::trim).unwrap_or_default();
    if website.is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "website is required");
    }

    let existing = match state.service.find_existing(website).await {
        Ok(existing) => existing,
        Err(err) => return evaluation_error_response(err),
    };

    if let Some(church) = existing {
        if !request.force_re_evaluate {
            let payload = json!({
                "error": "Church already exists",
                "church_id": church.id,
                "exists": true,
            });
            return (StatusCode::CONFLICT, Json(payload)).into_response();
        }
    }

    if request.force_re_evaluate && !state.is_admin(request.user_id.as_deref()) {
        return error_body(
            StatusCode::FORBIDDEN,
            "Unauthorized: Only admins can re-evaluate churches",
        );
    }

    match state.service.evaluate(website).await {
        Ok(detail) => (StatusCode::CREATED, Json(detail)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn list_handler<C, X, G, S>(
    State(state): State<ChurchRouterState<C, X, G, S>>,
    Query(params): Query<ListParams>,
) -> Response
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + 'static,
    S: ChurchStore + 'static,
{
    match state.service.directory(&params.into_filter()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn meta_handler<C, X, G, S>(
    State(state): State<ChurchRouterState<C, X, G, S>>,
) -> Response
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + 'static,
    S: ChurchStore + 'static,
{
    match state.service.meta().await {
        Ok(meta) => (StatusCode::OK, Json(meta)).into_response(),
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn check_handler<C, X, G, S>(
    State(state): State<ChurchRouterState<C, X, G, S>>,
    Query(params): Query<CheckParams>,
) -> Response
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + 'static,
    S: ChurchStore + 'static,
{
    let website = params.website.as_deref().map(str::trim).unwrap_or_default();
    if website.is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "website parameter is required");
    }

    match state.service.check(website).await {
        Ok(check) => (StatusCode::OK, Json(check)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn search_handler<C, X, G, S>(
    State(state): State<ChurchRouterState<C, X, G, S>>,
    Query(params): Query<SearchParams>,
) -> Response
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + ChurchLocator + 'static,
    S: ChurchStore + 'static,
{
    let Some(query) = ChurchSearchQuery::new(
        params.city.as_deref(),
        params.state.as_deref(),
        params.country.as_deref(),
    ) else {
        return error_body(StatusCode::BAD_REQUEST, "city query parameter is required");
    };

    match state.service.search(&query).await {
        Ok(candidates) => (StatusCode::OK, Json(candidates)).into_response(),
        Err(err @ SearchError::Unavailable(_)) => {
            error!(error = %err, "church search provider unavailable");
            error_body(StatusCode::BAD_GATEWAY, "Search service unavailable")
        }
        Err(err @ SearchError::Failed(_)) => {
            error!(error = %err, "church search failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Unable to search for churches")
        }
    }
}

pub(crate) async fn detail_handler<C, X, G, S>(
    State(state): State<ChurchRouterState<C, X, G, S>>,
    Path(church_id): Path<String>,
) -> Response
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + 'static,
    S: ChurchStore + 'static,
{
    let Some(id) = parse_church_id(&church_id) else {
        return not_found();
    };
    match state.service.get(id).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail)).into_response(),
        Ok(None) => not_found(),
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn history_handler<C, X, G, S>(
    State(state): State<ChurchRouterState<C, X, G, S>>,
    Path(church_id): Path<String>,
) -> Response
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + 'static,
    S: ChurchStore + 'static,
{
    let Some(id) = parse_church_id(&church_id) else {
        return not_found();
    };
    match state.service.history(id).await {
        Ok(Some(history)) => (StatusCode::OK, Json(history)).into_response(),
        Ok(None) => not_found(),
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn delete_handler<C, X, G, S>(
    State(state): State<ChurchRouterState<C, X, G, S>>,
    Path(church_id): Path<String>,
    payload: Option<Json<AdminRequest>>,
) -> Response
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + 'static,
    S: ChurchStore + 'static,
{
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    if !state.is_admin(request.user_id.as_deref()) {
        return error_body(
            StatusCode::FORBIDDEN,
            "Unauthorized: Only admins can delete churches",
        );
    }

    let Some(id) = parse_church_id(&church_id) else {
        return not_found();
    };
    match state.service.delete(id).await {
        Ok(true) => (StatusCode::OK, Json(json!({ "ok": true, "id": id }))).into_response(),
        Ok(false) => not_found(),
        Err(err) => store_error_response(err),
    }
}
