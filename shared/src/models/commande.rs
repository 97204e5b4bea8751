//! Order models, status machine and totals computation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default VAT rate (percent) applied when an order does not carry one
pub const TAUX_TVA_DEFAUT: Decimal = Decimal::from_parts(18, 0, 0, false, 0);

/// Order status
///
/// ```text
/// brouillon -> validee -> en-preparation -> livree -> facturee
/// brouillon -> annulee
/// validee   -> annulee
/// ```
/// `livree`, `facturee` and `annulee` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatutCommande {
    #[serde(rename = "brouillon")]
    Brouillon,
    #[serde(rename = "validee")]
    Validee,
    #[serde(rename = "en-preparation")]
    EnPreparation,
    #[serde(rename = "livree")]
    Livree,
    #[serde(rename = "facturee")]
    Facturee,
    #[serde(rename = "annulee")]
    Annulee,
}

impl StatutCommande {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatutCommande::Brouillon => "brouillon",
            StatutCommande::Validee => "validee",
            StatutCommande::EnPreparation => "en-preparation",
            StatutCommande::Livree => "livree",
            StatutCommande::Facturee => "facturee",
            StatutCommande::Annulee => "annulee",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "brouillon" => Some(StatutCommande::Brouillon),
            "validee" => Some(StatutCommande::Validee),
            "en-preparation" => Some(StatutCommande::EnPreparation),
            "livree" => Some(StatutCommande::Livree),
            "facturee" => Some(StatutCommande::Facturee),
            "annulee" => Some(StatutCommande::Annulee),
            _ => None,
        }
    }

    /// Statuses reachable from `self` in one transition
    pub fn transitions(&self) -> &'static [StatutCommande] {
        match self {
            StatutCommande::Brouillon => {
                &[StatutCommande::Validee, StatutCommande::Annulee]
            }
            StatutCommande::Validee => {
                &[StatutCommande::EnPreparation, StatutCommande::Annulee]
            }
            StatutCommande::EnPreparation => &[StatutCommande::Livree],
            StatutCommande::Livree => &[StatutCommande::Facturee],
            StatutCommande::Facturee | StatutCommande::Annulee => &[],
        }
    }

    pub fn peut_transiter_vers(&self, cible: StatutCommande) -> bool {
        self.transitions().contains(&cible)
    }

    /// Only draft orders may be edited or deleted
    pub fn est_modifiable(&self) -> bool {
        matches!(self, StatutCommande::Brouillon)
    }

    /// Cancellation is forbidden once delivered, invoiced or cancelled
    pub fn est_annulable(&self) -> bool {
        !matches!(
            self,
            StatutCommande::Livree | StatutCommande::Facturee | StatutCommande::Annulee
        )
    }
}

/// One order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LigneCommande {
    pub id: Uuid,
    pub produit_id: Uuid,
    pub quantite: Decimal,
    pub prix_unitaire: Decimal,
    /// quantite x prix_unitaire, fixed at write time
    pub total: Decimal,
    pub observation: String,
}

/// Computed money amounts of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotauxCommande {
    pub sous_total: Decimal,
    pub montant_tva: Decimal,
    pub montant_total: Decimal,
}

/// Compute subtotal, VAT and total from order lines.
///
/// sous_total = sum(quantite x prix_unitaire); tva = sous_total x taux / 100.
/// Recomputing from the same lines and rate always yields the same amounts.
pub fn calculer_totaux(lignes: &[(Decimal, Decimal)], taux_tva: Decimal) -> TotauxCommande {
    let sous_total: Decimal = lignes
        .iter()
        .map(|(quantite, prix_unitaire)| quantite * prix_unitaire)
        .sum();
    let montant_tva = sous_total * taux_tva / Decimal::from(100);
    TotauxCommande {
        sous_total,
        montant_tva,
        montant_total: sous_total + montant_tva,
    }
}

/// A client order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commande {
    pub id: Uuid,
    /// Order number, `CMD-YYYYMM-NNNN`
    pub numero: String,
    pub client_id: Uuid,
    pub date_commande: DateTime<Utc>,
    pub statut: StatutCommande,
    pub sous_total: Decimal,
    pub taux_tva: Decimal,
    pub montant_tva: Decimal,
    pub montant_total: Decimal,
    pub adresse_livraison: String,
    pub contact_livraison: String,
    pub telephone_livraison: String,
    pub observation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_validation: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_livraison: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_annulation: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motif_annulation: Option<String>,
    pub utilisateur_creation: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandeDetail {
    #[serde(flatten)]
    pub commande: Commande,
    pub lignes: Vec<LigneCommande>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_totaux_exemple() {
        // 3 x 1000 + 1 x 500 at 18% VAT
        let totaux = calculer_totaux(&[(dec(3), dec(1000)), (dec(1), dec(500))], dec(18));
        assert_eq!(totaux.sous_total, dec(3500));
        assert_eq!(totaux.montant_tva, dec(630));
        assert_eq!(totaux.montant_total, dec(4130));
    }

    #[test]
    fn test_totaux_sans_lignes() {
        let totaux = calculer_totaux(&[], dec(18));
        assert_eq!(totaux.sous_total, Decimal::ZERO);
        assert_eq!(totaux.montant_total, Decimal::ZERO);
    }

    #[test]
    fn test_transitions_nominales() {
        assert!(StatutCommande::Brouillon.peut_transiter_vers(StatutCommande::Validee));
        assert!(StatutCommande::Validee.peut_transiter_vers(StatutCommande::EnPreparation));
        assert!(StatutCommande::EnPreparation.peut_transiter_vers(StatutCommande::Livree));
        assert!(StatutCommande::Livree.peut_transiter_vers(StatutCommande::Facturee));
    }

    #[test]
    fn test_transitions_annulation() {
        assert!(StatutCommande::Brouillon.peut_transiter_vers(StatutCommande::Annulee));
        assert!(StatutCommande::Validee.peut_transiter_vers(StatutCommande::Annulee));
        assert!(!StatutCommande::Livree.peut_transiter_vers(StatutCommande::Annulee));
        assert!(!StatutCommande::Facturee.peut_transiter_vers(StatutCommande::Annulee));
    }

    #[test]
    fn test_etats_terminaux() {
        assert!(StatutCommande::Facturee.transitions().is_empty());
        assert!(StatutCommande::Annulee.transitions().is_empty());
    }

    #[test]
    fn test_pas_de_retour_arriere() {
        assert!(!StatutCommande::Validee.peut_transiter_vers(StatutCommande::Brouillon));
        assert!(!StatutCommande::Livree.peut_transiter_vers(StatutCommande::EnPreparation));
    }

    #[test]
    fn test_annulable() {
        assert!(StatutCommande::Brouillon.est_annulable());
        assert!(StatutCommande::Validee.est_annulable());
        assert!(StatutCommande::EnPreparation.est_annulable());
        assert!(!StatutCommande::Livree.est_annulable());
        assert!(!StatutCommande::Annulee.est_annulable());
    }
}
