use church_finder::config::AppConfig;
use church_finder::error::AppError;
use church_finder::workflows::churches::{
    ChurchEvaluationRaw, ChurchEvaluationService, ConfessionCatalog, NominatimGeocoder,
    OpenAiExtractor, SqliteChurchStore, TavilyCrawler,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ChurchService =
    ChurchEvaluationService<TavilyCrawler, OpenAiExtractor, NominatimGeocoder, SqliteChurchStore>;

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Wire the production providers and the SQLite store from configuration.
pub(crate) fn build_service(
    config: &AppConfig,
    client: reqwest::Client,
) -> Result<ChurchService, AppError> {
    let providers = &config.providers;

    let crawler = TavilyCrawler::new(
        client.clone(),
        providers.tavily_api_key.clone(),
        providers.tavily_base_url.clone(),
    );
    let extractor = OpenAiExtractor::new(
        client.clone(),
        providers.openai_api_key.clone(),
        providers.openai_base_url.clone(),
        providers.openai_model.clone(),
    );
    let geocoder = NominatimGeocoder::new(
        client,
        providers.nominatim_base_url.clone(),
        providers.nominatim_user_agent.clone(),
        providers.geocode_timeout,
    );

    let store = SqliteChurchStore::open(&config.storage.database_path)?;
    info!(path = %config.storage.database_path.display(), "church store opened");

    Ok(ChurchEvaluationService::new(
        Arc::new(crawler),
        Arc::new(extractor),
        Arc::new(geocoder),
        Arc::new(store),
        Arc::new(ConfessionCatalog::standard()),
    ))
}

pub(crate) fn load_raw_evaluation(path: &Path) -> Result<ChurchEvaluationRaw, AppError> {
    let contents = std::fs::read_to_string(path)?;
    parse_raw_evaluation(&contents)
}

fn parse_raw_evaluation(contents: &str) -> Result<ChurchEvaluationRaw, AppError> {
    serde_json::from_str(contents).map_err(|err| {
        AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_raw_evaluation_is_invalid_data() {
        match parse_raw_evaluation("{\"church\": 1}") {
            Err(AppError::Io(err)) => assert_eq!(err.kind(), std::io::ErrorKind::InvalidData),
            other => panic!("expected invalid data, got {other:?}"),
        }
    }

    #[test]
    fn missing_raw_file_is_an_io_error() {
        let result = load_raw_evaluation(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
