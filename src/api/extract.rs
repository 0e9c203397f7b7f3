//! Request extractors whose rejections use the `{ error, message }` envelope.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Json, Path, Query};

use crate::error::StorefrontError;

#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(StorefrontError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(StorefrontError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(StorefrontError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for StorefrontError {
    fn from(rejection: JsonRejection) -> Self {
        StorefrontError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for StorefrontError {
    fn from(rejection: PathRejection) -> Self {
        StorefrontError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for StorefrontError {
    fn from(rejection: QueryRejection) -> Self {
        StorefrontError::Validation(rejection.body_text())
    }
}
