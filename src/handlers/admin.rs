use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use super::malformed;
use crate::errors::{ApiResult, AppError};
use crate::models::Court;
use crate::services::reservation::RegisterCourtRequest;
use crate::state::AppState;

pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// POST /api/admin/courts
pub async fn register_court(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RegisterCourtRequest>, JsonRejection>,
) -> Result<ApiResult<Court>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    Ok(match payload {
        Ok(Json(req)) => state.api.register_court(req).await,
        Err(rejection) => malformed(rejection),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn test_check_auth() {
        assert!(check_auth(&headers("Bearer secret"), "secret").is_ok());
        assert!(check_auth(&headers("Bearer nope"), "secret").is_err());
        assert!(check_auth(&headers("secret"), "secret").is_err());
        assert!(check_auth(&HeaderMap::new(), "secret").is_err());
    }
}
