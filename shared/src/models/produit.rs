//! Product referential models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Unite;

/// A product in the referential
///
/// Identity (id, reference) is immutable once created; pricing and the
/// alert threshold may change over the product's life.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Produit {
    pub id: Uuid,
    pub nom: String,
    /// Unique reference code, e.g. `RIZ-1025`
    pub reference: String,
    pub categorie: String,
    pub unite: Unite,
    /// Purchase price per unit, in FCFA
    pub prix_achat: Decimal,
    /// Sale price per unit, in FCFA
    pub prix_vente: Decimal,
    /// On-hand quantity at or below this value raises a `stock_bas` alert
    pub seuil_alerte: Decimal,
    /// Product is active in the catalogue
    pub actif: bool,
    /// Product may be dispatched to client orders
    pub en_distribution: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
