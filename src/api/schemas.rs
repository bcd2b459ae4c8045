use crate::domain::session::SessionStatus;
use crate::services::exchange_service::ExchangeOutcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ExchangeQuery {
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VehicleQuery {
    #[serde(default)]
    pub diagnostics: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub success: bool,
    pub has_vehicles: bool,
    pub vehicle_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<ExchangeOutcome> for ExchangeResponse {
    fn from(outcome: ExchangeOutcome) -> Self {
        Self {
            success: true,
            has_vehicles: outcome.has_vehicles(),
            vehicle_count: outcome.vehicle_count,
            message: (!outcome.has_vehicles()).then_some("No vehicles found in the user account"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: &'static str,
    pub has_token: bool,
    pub has_vehicle_id: bool,
    pub access_token_fragment: Option<String>,
    pub vehicle_id_fragment: Option<String>,
}

impl From<SessionStatus> for StatusResponse {
    fn from(status: SessionStatus) -> Self {
        Self {
            status: "running",
            has_token: status.has_access_token,
            has_vehicle_id: status.has_vehicle_id,
            access_token_fragment: status.access_token_fragment,
            vehicle_id_fragment: status.vehicle_id_fragment,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugResponse {
    pub has_access_token: bool,
    pub access_token_fragment: Option<String>,
    pub has_refresh_token: bool,
    pub has_vehicle_id: bool,
    pub vehicle_id_fragment: Option<String>,
}

impl From<SessionStatus> for DebugResponse {
    fn from(status: SessionStatus) -> Self {
        Self {
            has_access_token: status.has_access_token,
            access_token_fragment: status.access_token_fragment,
            has_refresh_token: status.has_refresh_token,
            has_vehicle_id: status.has_vehicle_id,
            vehicle_id_fragment: status.vehicle_id_fragment,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub env: &'static str,
}
