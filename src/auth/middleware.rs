use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;

fn bearer_token(req: &ServiceRequest) -> Result<&str, &'static str> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or("Missing Authorization header")?;
    let value = header
        .to_str()
        .map_err(|_| "Invalid Authorization header encoding")?;
    value
        .strip_prefix("Bearer ")
        .ok_or("Authorization header must start with Bearer")
}

fn unauthorized(req: ServiceRequest, error: &str) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(json!({ "error": error }));
    req.into_response(resp.map_into_boxed_body())
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let claims = match bearer_token(&req) {
        Ok(token) => match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return Ok(unauthorized(req, "Invalid or expired token")),
        },
        Err(msg) => return Ok(unauthorized(req, msg)),
    };

    let Some(role) = Role::from_id(claims.role) else {
        return Ok(unauthorized(req, "Invalid role"));
    };

    let auth_user = AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        teacher_id: claims.teacher_id,
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
