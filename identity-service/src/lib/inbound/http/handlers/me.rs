use auth::Principal;
use auth::Role;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiSuccess;

pub async fn current_user(
    Extension(principal): Extension<Principal>,
) -> ApiSuccess<CurrentUserResponseData> {
    ApiSuccess::new(StatusCode::OK, principal.into())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUserResponseData {
    pub id: String,
    pub role: Role,
}

impl From<Principal> for CurrentUserResponseData {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.subject,
            role: principal.role,
        }
    }
}
