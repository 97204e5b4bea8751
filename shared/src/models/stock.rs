//! Stock ledger models and pure consumption logic
//!
//! A `StockRecord` is one (produit, emplacement, lot) holding. The aggregate
//! on-hand quantity of a product is the sum over its records. Exhausted
//! records are kept as zero-quantity rows; every availability computation
//! filters on `quantite > 0`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days before expiration at which a record starts raising alerts
pub const FENETRE_EXPIRATION_JOURS: i64 = 30;

/// One stock holding: a product quantity at a location, under a lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: Uuid,
    pub produit_id: Uuid,
    /// Location code, `Z-AA-PP`
    pub emplacement: String,
    /// Lot code, `LOT-YYMMDD-NNN`
    pub lot: String,
    pub quantite: Decimal,
    /// Price per unit at receipt; valuation falls back to the product
    /// purchase price when absent
    pub prix_unitaire: Option<Decimal>,
    pub date_expiration: Option<NaiveDate>,
    pub date_reception: DateTime<Utc>,
}

/// One draw against a stock record, as planned by a FIFO exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prelevement {
    pub record_id: Uuid,
    pub emplacement: String,
    pub lot: String,
    pub quantite: Decimal,
}

/// Plan a FIFO exit of `demande` units across `records`.
///
/// Records must belong to a single product. Consumption order is ascending
/// `date_reception`, tie-broken by ascending record id so the plan is
/// deterministic. Returns the per-record draws, or the available aggregate
/// as the error when stock is insufficient. Planning never mutates records;
/// applying the draws is the caller's job.
pub fn planifier_sortie_fifo(
    records: &[StockRecord],
    demande: Decimal,
) -> Result<Vec<Prelevement>, Decimal> {
    let disponible: Decimal = records.iter().map(|r| r.quantite).sum();
    if demande > disponible {
        return Err(disponible);
    }

    let mut tri: Vec<&StockRecord> = records.iter().filter(|r| r.quantite > Decimal::ZERO).collect();
    tri.sort_by(|a, b| {
        a.date_reception
            .cmp(&b.date_reception)
            .then(a.id.cmp(&b.id))
    });

    let mut restante = demande;
    let mut prelevements = Vec::new();
    for record in tri {
        if restante <= Decimal::ZERO {
            break;
        }
        let prelevee = record.quantite.min(restante);
        prelevements.push(Prelevement {
            record_id: record.id,
            emplacement: record.emplacement.clone(),
            lot: record.lot.clone(),
            quantite: prelevee,
        });
        restante -= prelevee;
    }
    Ok(prelevements)
}

/// Alert level of a product aggregate against its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NiveauStock {
    Rupture,
    StockBas,
    Ok,
}

impl NiveauStock {
    pub fn as_str(&self) -> &'static str {
        match self {
            NiveauStock::Rupture => "rupture",
            NiveauStock::StockBas => "stock_bas",
            NiveauStock::Ok => "ok",
        }
    }
}

/// Classify an aggregate quantity against the product threshold.
///
/// Zero is `rupture`; anything positive up to and including the threshold
/// is `stock_bas`.
pub fn classifier_niveau(quantite: Decimal, seuil: Decimal) -> NiveauStock {
    if quantite <= Decimal::ZERO {
        NiveauStock::Rupture
    } else if quantite <= seuil {
        NiveauStock::StockBas
    } else {
        NiveauStock::Ok
    }
}

/// True when the record expires within [`FENETRE_EXPIRATION_JOURS`] of `aujourd_hui`
pub fn expire_bientot(record: &StockRecord, aujourd_hui: NaiveDate) -> bool {
    match record.date_expiration {
        Some(expiration) => {
            record.quantite > Decimal::ZERO
                && expiration <= aujourd_hui + chrono::Duration::days(FENETRE_EXPIRATION_JOURS)
        }
        None => false,
    }
}

/// Kind of stock alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeAlerte {
    Rupture,
    StockBas,
    Expiration,
}

/// A stock alert as returned by the alert scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlerteStock {
    #[serde(rename = "type")]
    pub type_alerte: TypeAlerte,
    pub produit_id: Uuid,
    pub produit_nom: String,
    pub quantite_actuelle: Decimal,
    pub seuil: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_expiration: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emplacement: Option<String>,
    pub message: String,
}

/// Global stock statistics for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockStats {
    pub total_produits: i64,
    pub quantite_totale: Decimal,
    pub valeur_totale: Decimal,
    pub entrees_aujourd_hui: i64,
    pub sorties_aujourd_hui: i64,
    pub produits_en_alerte: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(days_ago: i64, quantite: i64) -> StockRecord {
        let date_reception = Utc
            .with_ymd_and_hms(2025, 6, 1, 8, 0, 0)
            .unwrap()
            - chrono::Duration::days(days_ago);
        StockRecord {
            id: Uuid::new_v4(),
            produit_id: Uuid::nil(),
            emplacement: "A-01-01".to_string(),
            lot: "LOT-250601-001".to_string(),
            quantite: Decimal::from(quantite),
            prix_unitaire: None,
            date_expiration: None,
            date_reception,
        }
    }

    #[test]
    fn test_fifo_consumes_oldest_first() {
        let r1 = record(2, 5);
        let r2 = record(1, 5);
        let plan = planifier_sortie_fifo(&[r2.clone(), r1.clone()], Decimal::from(7)).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].record_id, r1.id);
        assert_eq!(plan[0].quantite, Decimal::from(5));
        assert_eq!(plan[1].record_id, r2.id);
        assert_eq!(plan[1].quantite, Decimal::from(2));
    }

    #[test]
    fn test_fifo_tie_break_by_id() {
        let mut r1 = record(1, 5);
        let mut r2 = record(1, 5);
        r2.date_reception = r1.date_reception;
        if r2.id < r1.id {
            std::mem::swap(&mut r1, &mut r2);
        }
        let plan = planifier_sortie_fifo(&[r2.clone(), r1.clone()], Decimal::from(3)).unwrap();
        assert_eq!(plan[0].record_id, r1.id);
    }

    #[test]
    fn test_insufficient_stock_reports_available() {
        let records = [record(1, 4), record(2, 3)];
        let err = planifier_sortie_fifo(&records, Decimal::from(8)).unwrap_err();
        assert_eq!(err, Decimal::from(7));
    }

    #[test]
    fn test_zero_rows_are_skipped() {
        let empty = record(5, 0);
        let full = record(1, 10);
        let plan = planifier_sortie_fifo(&[empty, full.clone()], Decimal::from(4)).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].record_id, full.id);
    }

    #[test]
    fn test_niveau_boundaries() {
        let seuil = Decimal::from(50);
        assert_eq!(classifier_niveau(Decimal::ZERO, seuil), NiveauStock::Rupture);
        assert_eq!(classifier_niveau(Decimal::from(50), seuil), NiveauStock::StockBas);
        assert_eq!(classifier_niveau(Decimal::from(51), seuil), NiveauStock::Ok);
        assert_eq!(classifier_niveau(Decimal::from(1), seuil), NiveauStock::StockBas);
    }

    #[test]
    fn test_expiration_window() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut r = record(1, 5);

        r.date_expiration = Some(NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());
        assert!(expire_bientot(&r, today));

        r.date_expiration = Some(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert!(expire_bientot(&r, today)); // exactly 30 days out

        r.date_expiration = Some(NaiveDate::from_ymd_opt(2025, 7, 2).unwrap());
        assert!(!expire_bientot(&r, today));

        r.date_expiration = None;
        assert!(!expire_bientot(&r, today));
    }

    #[test]
    fn test_expired_but_empty_record_is_silent() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut r = record(10, 0);
        r.date_expiration = Some(NaiveDate::from_ymd_opt(2025, 6, 5).unwrap());
        assert!(!expire_bientot(&r, today));
    }
}
