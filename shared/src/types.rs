//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Measurement unit for a product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unite {
    #[default]
    Tonnes,
    Kg,
    Sacs,
    Conteneurs,
    Litres,
}

impl Unite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unite::Tonnes => "tonnes",
            Unite::Kg => "kg",
            Unite::Sacs => "sacs",
            Unite::Conteneurs => "conteneurs",
            Unite::Litres => "litres",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tonnes" => Some(Unite::Tonnes),
            "kg" => Some(Unite::Kg),
            "sacs" => Some(Unite::Sacs),
            "conteneurs" => Some(Unite::Conteneurs),
            "litres" => Some(Unite::Litres),
            _ => None,
        }
    }

    /// Label shown on printed documents
    pub fn label(&self) -> &'static str {
        match self {
            Unite::Tonnes => "Tonnes",
            Unite::Kg => "Kilogrammes",
            Unite::Sacs => "Sacs",
            Unite::Conteneurs => "Conteneurs",
            Unite::Litres => "Litres",
        }
    }
}
