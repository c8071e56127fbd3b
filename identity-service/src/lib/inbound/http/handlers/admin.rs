use axum::http::StatusCode;

use super::ApiSuccess;
use super::MessageResponseData;

/// Admin-only landing endpoint; the role check happens in the route layer.
pub async fn admin_dashboard() -> ApiSuccess<MessageResponseData> {
    ApiSuccess::new(StatusCode::OK, MessageResponseData::new("Welcome, Admin!"))
}
