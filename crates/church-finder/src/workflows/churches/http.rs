//! Status-code checks shared by the provider clients.

/// Non-success response body captured for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiFailure {
    pub status: u16,
    pub message: String,
}

/// Return the response unchanged on success, otherwise capture its status and body.
pub(crate) async fn check_response(
    resp: reqwest::Response,
) -> Result<reqwest::Response, ApiFailure> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    Err(ApiFailure {
        status: status.as_u16(),
        message: resp.text().await.unwrap_or_default(),
    })
}
