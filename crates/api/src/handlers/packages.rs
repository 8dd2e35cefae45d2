use actix_web::{web, HttpResponse};
use metrics::counter;

use crate::state::AppState;

use super::ApiError;

pub async fn list_packages_handler(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let views = state.listing().list_all().await.inspect_err(|_| {
        counter!("api_packages_requests_total", "endpoint" => "list", "status" => "error")
            .increment(1);
    })?;
    counter!("api_packages_requests_total", "endpoint" => "list", "status" => "ok").increment(1);
    Ok(HttpResponse::Ok().json(views))
}

pub async fn package_by_consignment_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let consignment_number = path.into_inner();
    let view = state
        .listing()
        .find_by_consignment_number(&consignment_number)
        .await
        .map_err(ApiError::from)
        .inspect_err(|err| {
            let status = match err {
                ApiError::NotFound(_) => "not_found",
                _ => "error",
            };
            counter!("api_packages_requests_total", "endpoint" => "lookup", "status" => status)
                .increment(1);
        })?;
    counter!("api_packages_requests_total", "endpoint" => "lookup", "status" => "ok")
        .increment(1);
    Ok(HttpResponse::Ok().json(view))
}
