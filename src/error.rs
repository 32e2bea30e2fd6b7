//! Errors raised by HTML page handlers.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::design::ConfigurationError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Error page template
#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    message: String,
}

const FALLBACK_PAGE: &str =
    "<!doctype html><title>Breakwater Design</title><p>Something went wrong.</p>";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Template(e) => {
                tracing::error!("Template error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "The page could not be rendered.".to_string())
            }
            AppError::Configuration(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        };

        let page = ErrorTemplate { message }.render().unwrap_or_else(|e| {
            tracing::error!("Error page could not be rendered: {}", e);
            FALLBACK_PAGE.to_string()
        });
        (status, Html(page)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_configuration_error_page_is_escaped() {
        let error: AppError = ConfigurationError::UnknownBreakwaterType("<pier>".to_string()).into();
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("unknown breakwater type &#x27;&lt;pier&gt;&#x27;"));
        assert!(!html.contains("<pier>"));
        assert!(html.contains("href=\"/\""));
    }
}
