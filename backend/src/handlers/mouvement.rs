//! HTTP handlers for the movement journal

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::services::mouvement::{MouvementFilters, MouvementService};
use crate::AppState;
use crate::models::Mouvement;

/// Query the journal, most recent first
pub async fn list_mouvements(
    State(state): State<AppState>,
    Query(filters): Query<MouvementFilters>,
) -> AppResult<Json<Vec<Mouvement>>> {
    let service = MouvementService::new(state.db);
    let mouvements = service.query(filters).await?;
    Ok(Json(mouvements))
}
