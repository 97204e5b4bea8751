//! HTTP handlers for delivery ledger endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::livraison::{
    CreateLivraisonInput, LivraisonService, LivraisonStats, StatutDetails,
};
use crate::AppState;
use crate::models::{BonLivraison, Livraison, LivraisonDetail, StatutLivraison};

/// Status change payload
#[derive(Debug, Deserialize)]
pub struct ChangementStatutInput {
    pub statut: StatutLivraison,
    #[serde(flatten)]
    pub details: StatutDetails,
}

/// Cancellation payload
#[derive(Debug, Deserialize)]
pub struct AnnulationLivraisonInput {
    pub motif: Option<String>,
}

/// Schedule a delivery for an order
pub async fn create_livraison(
    State(state): State<AppState>,
    Json(input): Json<CreateLivraisonInput>,
) -> AppResult<Json<LivraisonDetail>> {
    let service = LivraisonService::new(state.db);
    let livraison = service.creer(input).await?;
    Ok(Json(livraison))
}

/// Get a delivery with its lines
pub async fn get_livraison(
    State(state): State<AppState>,
    Path(livraison_id): Path<Uuid>,
) -> AppResult<Json<LivraisonDetail>> {
    let service = LivraisonService::new(state.db);
    let livraison = service.get(livraison_id).await?;
    Ok(Json(livraison))
}

/// List all deliveries
pub async fn list_livraisons(State(state): State<AppState>) -> AppResult<Json<Vec<Livraison>>> {
    let service = LivraisonService::new(state.db);
    let livraisons = service.lister().await?;
    Ok(Json(livraisons))
}

/// Transition a delivery through its status machine
pub async fn update_statut_livraison(
    State(state): State<AppState>,
    Path(livraison_id): Path<Uuid>,
    Json(input): Json<ChangementStatutInput>,
) -> AppResult<Json<LivraisonDetail>> {
    let service = LivraisonService::new(state.db);
    let livraison = service
        .changer_statut(livraison_id, input.statut, input.details)
        .await?;
    Ok(Json(livraison))
}

/// Cancel a delivery
pub async fn annuler_livraison(
    State(state): State<AppState>,
    Path(livraison_id): Path<Uuid>,
    Json(input): Json<AnnulationLivraisonInput>,
) -> AppResult<Json<LivraisonDetail>> {
    let service = LivraisonService::new(state.db);
    let livraison = service.annuler(livraison_id, input.motif).await?;
    Ok(Json(livraison))
}

/// Delivery statistics
pub async fn get_livraison_stats(
    State(state): State<AppState>,
) -> AppResult<Json<LivraisonStats>> {
    let service = LivraisonService::new(state.db);
    let stats = service.stats().await?;
    Ok(Json(stats))
}

/// Structured delivery note
pub async fn get_bon_livraison(
    State(state): State<AppState>,
    Path(livraison_id): Path<Uuid>,
) -> AppResult<Json<BonLivraison>> {
    let service = LivraisonService::new(state.db);
    let bon = service.bon_livraison(livraison_id).await?;
    Ok(Json(bon))
}
