use serde::{Deserialize, Serialize};

use hrms_auth::{Capability, Principal};
use hrms_infra::session::SessionClaims;

// -------------------------
// Request DTOs
// -------------------------

// No `Debug` on bodies that carry credentials or session values.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub id_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySessionRequest {
    pub session_cookie: String,
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub capability: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub const OK: SuccessResponse = SuccessResponse { success: true };
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: Principal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub principal: Principal,
    pub capabilities: Vec<Capability>,
    pub session: SessionClaims,
}
