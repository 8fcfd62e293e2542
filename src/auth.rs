use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::middleware::Next;
use actix_web::Error;
use tracing::debug;

use crate::errors::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// Format check on the `Authorization` header.
///
/// A missing header passes; a present header must start with `Bearer `.
/// The credential itself is never verified.
pub fn check_authorization(headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(());
    };

    match value.to_str() {
        Ok(v) if v.starts_with(BEARER_PREFIX) => Ok(()),
        _ => Err(ApiError::Unauthorized("Invalid authorization header".to_string())),
    }
}

/// Middleware running `check_authorization` before the wrapped handlers
pub async fn auth_gate(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if let Err(rejection) = check_authorization(req.headers()) {
        debug!("Auth gate rejected {} {}", req.method(), req.path());
        return Ok(req.error_response(rejection).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
