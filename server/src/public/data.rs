use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenDataResponse {
    pub message: String,
}

/// GET /api/data: public endpoint, no auth required
pub async fn open_data() -> Json<OpenDataResponse> {
    Json(OpenDataResponse {
        message: "This data is open for everyone!".to_string(),
    })
}
