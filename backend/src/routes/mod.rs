//! Route definitions for the Entrepot Maritime platform
//!
//! Authentication is handled upstream by the gateway; handlers receive the
//! acting user in request payloads.

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Stock ledger
        .nest("/stock", stock_routes())
        // Movement journal
        .nest("/mouvements", mouvement_routes())
        // Order ledger
        .nest("/commandes", commande_routes())
        // Delivery ledger
        .nest("/livraisons", livraison_routes())
        // Storage location registry
        .nest("/emplacements", emplacement_routes())
        // Referentials
        .nest("/produits", produit_routes())
        .nest("/clients", client_routes())
        // Dashboard
        .route("/dashboard", get(handlers::get_dashboard))
}

/// Stock ledger routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock))
        .route("/entree", post(handlers::entree_stock))
        .route("/sortie", post(handlers::sortie_stock))
        .route("/transfert", post(handlers::transfert_stock))
        .route("/reception-navire", post(handlers::reception_navire))
        .route("/produit/:produit_id", get(handlers::get_stock_by_produit))
        .route("/alertes", get(handlers::get_alertes))
        .route("/stats", get(handlers::get_stock_stats))
}

/// Movement journal routes
fn mouvement_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_mouvements))
}

/// Order ledger routes
fn commande_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_commandes).post(handlers::create_commande))
        .route("/stats", get(handlers::get_commande_stats))
        .route("/export", get(handlers::export_commandes))
        .route("/client/:client_id", get(handlers::list_commandes_by_client))
        .route(
            "/:commande_id",
            get(handlers::get_commande)
                .put(handlers::update_commande)
                .delete(handlers::delete_commande),
        )
        .route("/:commande_id/valider", post(handlers::valider_commande))
        .route("/:commande_id/annuler", post(handlers::annuler_commande))
}

/// Delivery ledger routes
fn livraison_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_livraisons).post(handlers::create_livraison))
        .route("/stats", get(handlers::get_livraison_stats))
        .route("/:livraison_id", get(handlers::get_livraison))
        .route("/:livraison_id/statut", put(handlers::update_statut_livraison))
        .route("/:livraison_id/annuler", post(handlers::annuler_livraison))
        .route("/:livraison_id/bon-livraison", get(handlers::get_bon_livraison))
}

/// Storage location registry routes
fn emplacement_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_emplacements))
        .route("/disponibles", get(handlers::list_emplacements_disponibles))
        .route("/:code/disponibilite", get(handlers::get_disponibilite_emplacement))
}

/// Product referential routes
fn produit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_produits).post(handlers::create_produit))
        .route(
            "/:produit_id",
            get(handlers::get_produit)
                .put(handlers::update_produit)
                .delete(handlers::delete_produit),
        )
}

/// Client referential routes
fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_clients).post(handlers::create_client))
        .route(
            "/:client_id",
            get(handlers::get_client).put(handlers::update_client),
        )
}
