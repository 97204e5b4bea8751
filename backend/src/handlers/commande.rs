//! HTTP handlers for order ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::commande::{
    CommandeService, CommandeStats, CreateCommandeInput, ExportFilters, UpdateCommandeInput,
};
use crate::AppState;
use crate::models::{Commande, CommandeDetail};

/// Cancellation payload
#[derive(Debug, Deserialize)]
pub struct AnnulationInput {
    pub motif: Option<String>,
}

/// Create a draft order
pub async fn create_commande(
    State(state): State<AppState>,
    Json(input): Json<CreateCommandeInput>,
) -> AppResult<Json<CommandeDetail>> {
    let service = CommandeService::new(state.db);
    let commande = service.creer(input).await?;
    Ok(Json(commande))
}

/// Get an order with its lines
pub async fn get_commande(
    State(state): State<AppState>,
    Path(commande_id): Path<Uuid>,
) -> AppResult<Json<CommandeDetail>> {
    let service = CommandeService::new(state.db);
    let commande = service.get(commande_id).await?;
    Ok(Json(commande))
}

/// List all orders
pub async fn list_commandes(State(state): State<AppState>) -> AppResult<Json<Vec<Commande>>> {
    let service = CommandeService::new(state.db);
    let commandes = service.lister().await?;
    Ok(Json(commandes))
}

/// List the orders of one client
pub async fn list_commandes_by_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> AppResult<Json<Vec<Commande>>> {
    let service = CommandeService::new(state.db);
    let commandes = service.lister_par_client(client_id).await?;
    Ok(Json(commandes))
}

/// Update a draft order
pub async fn update_commande(
    State(state): State<AppState>,
    Path(commande_id): Path<Uuid>,
    Json(input): Json<UpdateCommandeInput>,
) -> AppResult<Json<CommandeDetail>> {
    let service = CommandeService::new(state.db);
    let commande = service.mettre_a_jour(commande_id, input).await?;
    Ok(Json(commande))
}

/// Validate a draft order
pub async fn valider_commande(
    State(state): State<AppState>,
    Path(commande_id): Path<Uuid>,
) -> AppResult<Json<CommandeDetail>> {
    let service = CommandeService::new(state.db);
    let commande = service.valider(commande_id).await?;
    Ok(Json(commande))
}

/// Cancel an order
pub async fn annuler_commande(
    State(state): State<AppState>,
    Path(commande_id): Path<Uuid>,
    Json(input): Json<AnnulationInput>,
) -> AppResult<Json<CommandeDetail>> {
    let service = CommandeService::new(state.db);
    let commande = service.annuler(commande_id, input.motif).await?;
    Ok(Json(commande))
}

/// Delete a draft order
pub async fn delete_commande(
    State(state): State<AppState>,
    Path(commande_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = CommandeService::new(state.db);
    service.supprimer(commande_id).await?;
    Ok(Json(()))
}

/// Order statistics
pub async fn get_commande_stats(
    State(state): State<AppState>,
) -> AppResult<Json<CommandeStats>> {
    let service = CommandeService::new(state.db);
    let stats = service.stats().await?;
    Ok(Json(stats))
}

/// Export orders as CSV
pub async fn export_commandes(
    State(state): State<AppState>,
    Query(filters): Query<ExportFilters>,
) -> AppResult<impl IntoResponse> {
    let service = CommandeService::new(state.db);
    let csv = service.exporter_csv(filters).await?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv))
}
