use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use log::*;
use serde_json::json;

use portal_core::CoreError;

/// Request-fatal errors. Version-control failure is deliberately not
/// represented here: the publisher's failure is downgraded to a warning
/// string at the call site, because the authoritative artifact has
/// already been written.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("missing required fields: {}", fields.join(", "))]
    Validation { fields: Vec<String> },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("persistence failure")]
    Persistence { cause: String },
}

impl ServerError {
    pub fn missing(fields: Vec<&'static str>) -> Self {
        ServerError::Validation {
            fields: fields.into_iter().map(str::to_owned).collect(),
        }
    }
}

impl actix_web::error::ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation { .. } => StatusCode::BAD_REQUEST,
            ServerError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // detail stays server-side; 404/500 bodies are generic
        let body = match self {
            ServerError::Validation { .. } => self.to_string(),
            ServerError::NotFound { what } => {
                warn!("not found: {}", what);
                "not found".to_owned()
            }
            ServerError::Persistence { cause } => {
                error!("persistence failure: {}", cause);
                "internal server error".to_owned()
            }
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": body }))
    }
}

impl From<CoreError> for ServerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SourceNotFound(what) => ServerError::NotFound { what },
            CoreError::UnknownEntityType(name) => ServerError::Validation {
                fields: vec![format!("entityType ({})", name)],
            },
            other => ServerError::Persistence {
                cause: other.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Persistence {
            cause: err.to_string(),
        }
    }
}
