//! Delivery models, status machine and delivery note

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery status
///
/// ```text
/// programmee -> en_chargement -> en_route -> livree
/// en_route -> retournee
/// {en_chargement, en_route} -> incident -> {en_route, retournee, annulee}
/// {programmee, en_chargement} -> annulee
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatutLivraison {
    Programmee,
    EnChargement,
    EnRoute,
    Livree,
    Retournee,
    Incident,
    Annulee,
}

impl StatutLivraison {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatutLivraison::Programmee => "programmee",
            StatutLivraison::EnChargement => "en_chargement",
            StatutLivraison::EnRoute => "en_route",
            StatutLivraison::Livree => "livree",
            StatutLivraison::Retournee => "retournee",
            StatutLivraison::Incident => "incident",
            StatutLivraison::Annulee => "annulee",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "programmee" => Some(StatutLivraison::Programmee),
            "en_chargement" => Some(StatutLivraison::EnChargement),
            "en_route" => Some(StatutLivraison::EnRoute),
            "livree" => Some(StatutLivraison::Livree),
            "retournee" => Some(StatutLivraison::Retournee),
            "incident" => Some(StatutLivraison::Incident),
            "annulee" => Some(StatutLivraison::Annulee),
            _ => None,
        }
    }

    /// Statuses reachable from `self` in one transition
    pub fn transitions(&self) -> &'static [StatutLivraison] {
        match self {
            StatutLivraison::Programmee => {
                &[StatutLivraison::EnChargement, StatutLivraison::Annulee]
            }
            StatutLivraison::EnChargement => &[
                StatutLivraison::EnRoute,
                StatutLivraison::Incident,
                StatutLivraison::Annulee,
            ],
            StatutLivraison::EnRoute => &[
                StatutLivraison::Livree,
                StatutLivraison::Retournee,
                StatutLivraison::Incident,
            ],
            StatutLivraison::Incident => &[
                StatutLivraison::EnRoute,
                StatutLivraison::Retournee,
                StatutLivraison::Annulee,
            ],
            StatutLivraison::Livree | StatutLivraison::Retournee | StatutLivraison::Annulee => &[],
        }
    }

    pub fn peut_transiter_vers(&self, cible: StatutLivraison) -> bool {
        self.transitions().contains(&cible)
    }

    /// Cancellation is forbidden once delivered or returned
    pub fn est_annulable(&self) -> bool {
        !matches!(self, StatutLivraison::Livree | StatutLivraison::Retournee)
    }
}

/// One delivery line, copied from the order at creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LigneLivraison {
    pub produit_id: Uuid,
    pub quantite: Decimal,
    pub prix_unitaire: Decimal,
}

/// A delivery tied to one order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Livraison {
    pub id: Uuid,
    /// Delivery number, `LIV-YYYYMM-NNNN`
    pub numero: String,
    pub commande_id: Uuid,
    pub client_id: Uuid,
    pub statut: StatutLivraison,
    /// Scheduled date
    pub date_livraison: DateTime<Utc>,
    pub transporteur: String,
    pub nom_chauffeur: String,
    pub numero_camion: String,
    pub adresse_livraison: String,
    pub contact_livraison: String,
    pub telephone_livraison: String,
    pub observation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_chargement: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_depart: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_livraison_effective: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signataire_nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_retour: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motif_retour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_incident: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_incident: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_incident: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_annulation: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motif_annulation: Option<String>,
    pub utilisateur_creation: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A delivery with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivraisonDetail {
    #[serde(flatten)]
    pub livraison: Livraison,
    pub lignes: Vec<LigneLivraison>,
}

/// Client block on a printed delivery note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocClient {
    pub nom: String,
    pub adresse: String,
    pub contact: String,
    pub telephone: String,
}

/// One article line on a printed delivery note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleBonLivraison {
    pub reference: String,
    pub designation: String,
    pub quantite: Decimal,
    pub unite: String,
}

/// Structured delivery note (bon de livraison)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonLivraison {
    pub numero: String,
    pub date: DateTime<Utc>,
    pub client: BlocClient,
    pub transporteur: String,
    pub nom_chauffeur: String,
    pub numero_camion: String,
    pub articles: Vec<ArticleBonLivraison>,
    pub observation: String,
    pub prepare_par: String,
    pub recu_par: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chemin_nominal() {
        assert!(StatutLivraison::Programmee.peut_transiter_vers(StatutLivraison::EnChargement));
        assert!(StatutLivraison::EnChargement.peut_transiter_vers(StatutLivraison::EnRoute));
        assert!(StatutLivraison::EnRoute.peut_transiter_vers(StatutLivraison::Livree));
    }

    #[test]
    fn test_retour_et_incident() {
        assert!(StatutLivraison::EnRoute.peut_transiter_vers(StatutLivraison::Retournee));
        assert!(StatutLivraison::EnChargement.peut_transiter_vers(StatutLivraison::Incident));
        assert!(StatutLivraison::EnRoute.peut_transiter_vers(StatutLivraison::Incident));
        assert!(StatutLivraison::Incident.peut_transiter_vers(StatutLivraison::EnRoute));
        assert!(StatutLivraison::Incident.peut_transiter_vers(StatutLivraison::Retournee));
        assert!(StatutLivraison::Incident.peut_transiter_vers(StatutLivraison::Annulee));
    }

    #[test]
    fn test_annulation() {
        assert!(StatutLivraison::Programmee.peut_transiter_vers(StatutLivraison::Annulee));
        assert!(StatutLivraison::EnChargement.peut_transiter_vers(StatutLivraison::Annulee));
        assert!(!StatutLivraison::EnRoute.peut_transiter_vers(StatutLivraison::Annulee));
    }

    #[test]
    fn test_etats_terminaux() {
        assert!(StatutLivraison::Livree.transitions().is_empty());
        assert!(StatutLivraison::Retournee.transitions().is_empty());
        assert!(StatutLivraison::Annulee.transitions().is_empty());
    }

    #[test]
    fn test_livree_est_terminal_pas_de_double_sortie() {
        // A second transition into `livree` is rejected by the table, so the
        // stock deduction attached to the first transition cannot run twice.
        assert!(!StatutLivraison::Livree.peut_transiter_vers(StatutLivraison::Livree));
    }

    #[test]
    fn test_programmee_ne_saute_pas_d_etape() {
        assert!(!StatutLivraison::Programmee.peut_transiter_vers(StatutLivraison::EnRoute));
        assert!(!StatutLivraison::Programmee.peut_transiter_vers(StatutLivraison::Livree));
        assert!(!StatutLivraison::Programmee.peut_transiter_vers(StatutLivraison::Incident));
    }
}
