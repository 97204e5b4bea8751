//! HTTP handler for the aggregate dashboard

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::services::commande::CommandeStats;
use crate::services::livraison::LivraisonStats;
use crate::services::{CommandeService, LivraisonService, StockService};
use crate::AppState;
use crate::models::StockStats;

/// Combined statistics for the dashboard view
#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub stock: StockStats,
    pub commandes: CommandeStats,
    pub livraisons: LivraisonStats,
}

/// Aggregate stock, order and delivery statistics
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardData>> {
    let stock = StockService::new(state.db.clone()).stats().await?;
    let commandes = CommandeService::new(state.db.clone()).stats().await?;
    let livraisons = LivraisonService::new(state.db).stats().await?;

    Ok(Json(DashboardData {
        stock,
        commandes,
        livraisons,
    }))
}
