//! Movement journal models
//!
//! The journal is append-only: entries are never updated or deleted.
//! Corrections are compensating entries with an `ajustement` motif.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeMouvement {
    Entree,
    Sortie,
    Transfert,
}

impl TypeMouvement {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeMouvement::Entree => "entree",
            TypeMouvement::Sortie => "sortie",
            TypeMouvement::Transfert => "transfert",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "entree" => Some(TypeMouvement::Entree),
            "sortie" => Some(TypeMouvement::Sortie),
            "transfert" => Some(TypeMouvement::Transfert),
            _ => None,
        }
    }

    /// Reference prefix used when numbering a movement of this kind
    pub fn prefixe_reference(&self) -> &'static str {
        match self {
            TypeMouvement::Entree => "ENT",
            TypeMouvement::Sortie => "SOR",
            TypeMouvement::Transfert => "TRF",
        }
    }
}

/// One immutable journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mouvement {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub type_mouvement: TypeMouvement,
    pub produit_id: Uuid,
    pub quantite: Decimal,
    pub motif: String,
    /// Movement reference code, e.g. `SOR-250601-0042`
    pub reference: String,
    pub utilisateur: String,
    pub date: DateTime<Utc>,
    /// Free-form payload: locations, lots, draw breakdown, counterparties
    pub details: serde_json::Value,
}
