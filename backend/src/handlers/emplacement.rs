//! HTTP handlers for the storage location registry

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::services::emplacement::{EmplacementInfo, EmplacementService};
use crate::AppState;

/// List every location with its occupancy
pub async fn list_emplacements(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EmplacementInfo>>> {
    let service = EmplacementService::new(state.db);
    let emplacements = service.lister().await?;
    Ok(Json(emplacements))
}

/// List the free locations
pub async fn list_emplacements_disponibles(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EmplacementInfo>>> {
    let service = EmplacementService::new(state.db);
    let emplacements = service.lister_disponibles().await?;
    Ok(Json(emplacements))
}

/// Occupancy of one location
pub async fn get_disponibilite_emplacement(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let service = EmplacementService::new(state.db);
    let disponible = service.est_disponible(&code).await?;
    Ok(Json(serde_json::json!({
        "code": code,
        "disponible": disponible,
    })))
}
