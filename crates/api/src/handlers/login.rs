use actix_web::{web, Either, HttpResponse};
use metrics::counter;
use package_tracker_domain::services::AuthError;
use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;

use crate::state::AppState;

use super::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
enum LoginOutcome {
    Issued,
    Rejected,
    Failed,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginParams {
    pub username: String,
    pub password: String,
}

/// `POST /login` with `username`/`password` as a url-encoded form body or as
/// query parameters; the form wins when both are present. Answers with the
/// bare token as text.
pub async fn login_handler(
    state: web::Data<AppState>,
    params: Either<web::Form<LoginParams>, web::Query<LoginParams>>,
) -> Result<HttpResponse, ApiError> {
    let params = match params {
        Either::Left(form) => form.into_inner(),
        Either::Right(query) => query.into_inner(),
    };
    let result = state
        .issuer()
        .authenticate(&params.username, &params.password);

    let outcome = match &result {
        Ok(_) => LoginOutcome::Issued,
        Err(AuthError::InvalidCredentials) => LoginOutcome::Rejected,
        Err(_) => LoginOutcome::Failed,
    };
    counter!("api_login_requests_total", "outcome" => outcome.as_ref().to_owned()).increment(1);

    let issued = result?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(issued.token))
}
