use crate::api::AppState;
use crate::api::middleware::ClientSession;
use crate::api::schemas::VehicleQuery;
use crate::error::Result;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};

pub async fn vehicle(
    State(state): State<AppState>,
    client: ClientSession,
    query: std::result::Result<Query<VehicleQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let snapshot = state.vehicle_service.snapshot(&client.session).await?;
    Ok(Json(snapshot.to_json(query.diagnostics)))
}
