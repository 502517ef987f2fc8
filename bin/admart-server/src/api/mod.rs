pub mod applications;
pub mod creatives;
pub mod deals;

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// The success half of the response envelope; the error half lives in
/// [`crate::error::ApiError`].
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": data,
    }))
}
