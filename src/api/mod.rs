use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::str::FromStr;

pub mod operator;
pub mod telegram;

const X_USER_ID: &str = "X-User-ID";
const BEARER: &str = "Bearer ";

/// Chat identity of the caller, taken from the `X-User-ID` header.
#[derive(Debug)]
pub struct ExtractUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, (StatusCode, &'static str)> {
        if let Some(user_id) = parts.headers.get(X_USER_ID) {
            let user_id = user_id
                .to_str()
                .map_err(|_| (StatusCode::BAD_REQUEST, "invalid user id"))?;
            let user_id = i64::from_str(user_id.trim())
                .map_err(|_| (StatusCode::BAD_REQUEST, "invalid user id"))?;
            Ok(ExtractUser(user_id))
        } else {
            Err((StatusCode::BAD_REQUEST, "`X-User-ID` header is missing"))
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header.
#[derive(Debug)]
pub struct ExtractBearer(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractBearer
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, (StatusCode, &'static str)> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or((StatusCode::UNAUTHORIZED, "bearer token is missing"))?;
        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix(BEARER))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or((StatusCode::UNAUTHORIZED, "invalid bearer token"))?;

        Ok(ExtractBearer(token.to_owned()))
    }
}
