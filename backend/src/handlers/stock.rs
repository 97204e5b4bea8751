//! HTTP handlers for stock ledger endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::stock::{
    EntreeInput, ReceptionNavireInput, ReceptionResult, SortieInput, StockService, TransfertInput,
};
use crate::AppState;
use crate::models::{AlerteStock, Prelevement, StockRecord, StockStats};

/// Record a stock entry
pub async fn entree_stock(
    State(state): State<AppState>,
    Json(input): Json<EntreeInput>,
) -> AppResult<Json<StockRecord>> {
    let service = StockService::new(state.db);
    let record = service.entree(input).await?;
    Ok(Json(record))
}

/// Record a FIFO stock exit
pub async fn sortie_stock(
    State(state): State<AppState>,
    Json(input): Json<SortieInput>,
) -> AppResult<Json<Vec<Prelevement>>> {
    let service = StockService::new(state.db);
    let prelevements = service.sortie(input).await?;
    Ok(Json(prelevements))
}

/// Transfer stock between locations
pub async fn transfert_stock(
    State(state): State<AppState>,
    Json(input): Json<TransfertInput>,
) -> AppResult<Json<()>> {
    let service = StockService::new(state.db);
    service.transfert(input).await?;
    Ok(Json(()))
}

/// Receive a ship cargo dispatched across locations
pub async fn reception_navire(
    State(state): State<AppState>,
    Json(input): Json<ReceptionNavireInput>,
) -> AppResult<Json<ReceptionResult>> {
    let service = StockService::new(state.db);
    let reception = service.reception_navire(input).await?;
    Ok(Json(reception))
}

/// List every stock record
pub async fn list_stock(State(state): State<AppState>) -> AppResult<Json<Vec<StockRecord>>> {
    let service = StockService::new(state.db);
    let records = service.lister().await?;
    Ok(Json(records))
}

/// List the stock records of one product
pub async fn get_stock_by_produit(
    State(state): State<AppState>,
    Path(produit_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockRecord>>> {
    let service = StockService::new(state.db);
    let records = service.lister_par_produit(produit_id).await?;
    Ok(Json(records))
}

/// Scan for threshold and expiration alerts
pub async fn get_alertes(State(state): State<AppState>) -> AppResult<Json<Vec<AlerteStock>>> {
    let service = StockService::new(state.db);
    let alertes = service.alertes().await?;
    Ok(Json(alertes))
}

/// Global stock statistics
pub async fn get_stock_stats(State(state): State<AppState>) -> AppResult<Json<StockStats>> {
    let service = StockService::new(state.db);
    let stats = service.stats().await?;
    Ok(Json(stats))
}
