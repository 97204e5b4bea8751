//! HTTP handlers for the product referential

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::produit::{CreateProduitInput, ProduitService, UpdateProduitInput};
use crate::AppState;
use crate::models::Produit;

/// Create a product
pub async fn create_produit(
    State(state): State<AppState>,
    Json(input): Json<CreateProduitInput>,
) -> AppResult<Json<Produit>> {
    let service = ProduitService::new(state.db);
    let produit = service.creer(input).await?;
    Ok(Json(produit))
}

/// Get a product
pub async fn get_produit(
    State(state): State<AppState>,
    Path(produit_id): Path<Uuid>,
) -> AppResult<Json<Produit>> {
    let service = ProduitService::new(state.db);
    let produit = service.get(produit_id).await?;
    Ok(Json(produit))
}

/// List all products
pub async fn list_produits(State(state): State<AppState>) -> AppResult<Json<Vec<Produit>>> {
    let service = ProduitService::new(state.db);
    let produits = service.lister().await?;
    Ok(Json(produits))
}

/// Update a product
pub async fn update_produit(
    State(state): State<AppState>,
    Path(produit_id): Path<Uuid>,
    Json(input): Json<UpdateProduitInput>,
) -> AppResult<Json<Produit>> {
    let service = ProduitService::new(state.db);
    let produit = service.mettre_a_jour(produit_id, input).await?;
    Ok(Json(produit))
}

/// Delete an unreferenced product
pub async fn delete_produit(
    State(state): State<AppState>,
    Path(produit_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ProduitService::new(state.db);
    service.supprimer(produit_id).await?;
    Ok(Json(()))
}
