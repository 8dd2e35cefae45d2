pub mod login;
pub mod metrics;
pub mod packages;

pub use login::login_handler;
pub use metrics::metrics_handler;
pub use packages::{list_packages_handler, package_by_consignment_handler};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use package_tracker_domain::services::{AuthError, ListingError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Every failure that reaches an HTTP handler. Only `NotFound` maps to a
/// client status; everything else is reported as 500 with its message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Listing(ListingError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    InvalidParameters(String),
}

impl From<ListingError> for ApiError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::NotFound(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Listing(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Listing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Existing clients expect 500 for rejected credentials.
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidParameters(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        HttpResponse::build(status).json(ErrorBody {
            message: self.to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Routes served on the public listener.
pub fn configure_public(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::InvalidParameters(err.to_string()).into()
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _req| {
        ApiError::InvalidParameters(err.to_string()).into()
    }))
    .route("/packages", web::get().to(list_packages_handler))
    .route(
        "/packages/{consignment_number}",
        web::get().to(package_by_consignment_handler),
    )
    .route("/login", web::post().to(login_handler));
}
