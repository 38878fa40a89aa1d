use std::path::PathBuf;

use anyhow::Error as AnyError;
use serde_json::json;
use thiserror::Error;

use crate::body::Body;
use crate::http::{header::CONTENT_TYPE, HeaderValue, Response, StatusCode};
use crate::response::{response_with_body, IntoResponse};

/// Errors raised while resolving, invoking or bridging a wrapped application.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("module `{module}` not found in search path [{}]", display_paths(.searched))]
    ModuleNotFound {
        module: String,
        searched: Vec<PathBuf>,
    },
    #[error("module `{module}` failed to load: {message}")]
    ModuleLoad { module: String, message: String },
    #[error("{message}")]
    BadRequest { message: String },
    #[error("start_response: {message}")]
    StartResponse { message: String },
    #[error("application error: {source}")]
    Application { source: AnyError },
    #[error("internal error: {source}")]
    Internal {
        #[from]
        source: AnyError,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl BridgeError {
    pub fn module_not_found(module: impl Into<String>, searched: Vec<PathBuf>) -> Self {
        BridgeError::ModuleNotFound {
            module: module.into(),
            searched,
        }
    }

    pub fn module_load(module: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::ModuleLoad {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        BridgeError::BadRequest {
            message: message.into(),
        }
    }

    pub fn start_response(message: impl Into<String>) -> Self {
        BridgeError::StartResponse {
            message: message.into(),
        }
    }

    /// Wrap an error raised by the wrapped application itself.
    pub fn application<E>(error: E) -> Self
    where
        E: Into<AnyError>,
    {
        BridgeError::Application {
            source: error.into(),
        }
    }

    pub fn internal<E>(error: E) -> Self
    where
        E: Into<AnyError>,
    {
        BridgeError::Internal {
            source: error.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BridgeError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            BridgeError::ModuleNotFound { .. }
            | BridgeError::ModuleLoad { .. }
            | BridgeError::StartResponse { .. }
            | BridgeError::Application { .. }
            | BridgeError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::ModuleNotFound { .. } | BridgeError::ModuleLoad { .. }
        )
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": {
                "status": self.status().as_u16(),
                "message": self.message(),
            }
        });

        let body = Body::json(&payload).unwrap_or_else(|_| Body::text("internal error"));
        let mut response = response_with_body(self.status(), body);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
