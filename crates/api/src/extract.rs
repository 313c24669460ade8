//! Request extractors whose rejections use the API's JSON error shape.

use axum::extract::{FromRequest, OptionalFromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body. A body that is missing, malformed or of the wrong
/// shape is rejected as a 400 validation error instead of axum's plain-text
/// 400/415/422 responses.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Option<AppJson<T>>` is `None` when the request carries no JSON content
/// type, and a validation error when it carries a bad JSON body.
impl<T, S> OptionalFromRequest<S> for AppJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let body = <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?;
        Ok(body.map(|Json(value)| AppJson(value)))
    }
}
