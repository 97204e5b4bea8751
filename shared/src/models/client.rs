//! Client referential models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TypeClient {
    #[default]
    Entreprise,
    Particulier,
    Gouvernement,
}

impl TypeClient {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeClient::Entreprise => "entreprise",
            TypeClient::Particulier => "particulier",
            TypeClient::Gouvernement => "gouvernement",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "entreprise" => Some(TypeClient::Entreprise),
            "particulier" => Some(TypeClient::Particulier),
            "gouvernement" => Some(TypeClient::Gouvernement),
            _ => None,
        }
    }
}

/// A client of the warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub nom: String,
    /// Unique contact email
    pub email: String,
    pub telephone: String,
    pub type_client: TypeClient,
    pub adresse: String,
    pub ville: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
