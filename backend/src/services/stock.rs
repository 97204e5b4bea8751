//! Stock ledger service
//!
//! Entries, FIFO exits, transfers and ship-cargo receptions. Every mutation
//! runs in a single transaction that also appends the matching journal
//! entries, and locks the affected product's stock rows (`FOR UPDATE`) so
//! concurrent exits and entries on one product serialize.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::mouvement::{MouvementService, NouveauMouvement};
use crate::services::sequence::{self, SequenceService, SEQ_LOTS, SEQ_RECEPTIONS};
use crate::models::{
    classifier_niveau, expire_bientot, planifier_sortie_fifo, AlerteStock, NiveauStock,
    Prelevement, StockRecord, StockStats, TypeAlerte, TypeMouvement,
};
use shared::validation;

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Input for a stock entry
#[derive(Debug, Deserialize)]
pub struct EntreeInput {
    pub produit_id: Uuid,
    pub quantite: Decimal,
    pub emplacement: String,
    /// Lot code; generated (`LOT-YYMMDD-NNN`) when absent
    pub lot: Option<String>,
    pub prix_unitaire: Option<Decimal>,
    pub date_expiration: Option<NaiveDate>,
    pub fournisseur: Option<String>,
    pub motif: Option<String>,
    pub utilisateur: Option<String>,
}

/// Input for a stock exit
#[derive(Debug, Deserialize)]
pub struct SortieInput {
    pub produit_id: Uuid,
    pub quantite: Decimal,
    pub motif: Option<String>,
    pub client_id: Option<Uuid>,
    pub utilisateur: Option<String>,
}

/// Input for a transfer between locations
#[derive(Debug, Deserialize)]
pub struct TransfertInput {
    pub record_id: Uuid,
    pub quantite: Decimal,
    pub nouvel_emplacement: String,
    pub motif: Option<String>,
    pub utilisateur: Option<String>,
}

/// One product of a ship cargo receipt, dispatched across locations
#[derive(Debug, Deserialize)]
pub struct ReceptionProduit {
    pub produit_id: Uuid,
    pub lot: Option<String>,
    pub prix_unitaire: Option<Decimal>,
    pub date_expiration: Option<NaiveDate>,
    pub dispatch: Vec<DispatchEmplacement>,
}

/// Quantity assigned to one location by a dispatch
#[derive(Debug, Deserialize)]
pub struct DispatchEmplacement {
    pub emplacement: String,
    pub quantite: Decimal,
}

/// Input for a ship cargo receipt
#[derive(Debug, Deserialize)]
pub struct ReceptionNavireInput {
    pub navire: String,
    pub fournisseur: String,
    pub produits: Vec<ReceptionProduit>,
    pub utilisateur: Option<String>,
}

/// Outcome of a ship cargo receipt
#[derive(Debug, Serialize)]
pub struct ReceptionResult {
    /// Reference shared by every journal entry of this receipt
    pub reference: String,
    pub navire: String,
    pub entrees: usize,
}

type StockRow = (
    Uuid,
    Uuid,
    String,
    String,
    Decimal,
    Option<Decimal>,
    Option<NaiveDate>,
    DateTime<Utc>,
);

const STOCK_COLUMNS: &str =
    "id, produit_id, emplacement, lot, quantite, prix_unitaire, date_expiration, date_reception";

fn record_from_row(row: StockRow) -> StockRecord {
    StockRecord {
        id: row.0,
        produit_id: row.1,
        emplacement: row.2,
        lot: row.3,
        quantite: row.4,
        prix_unitaire: row.5,
        date_expiration: row.6,
        date_reception: row.7,
    }
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn verifier_produit(&self, produit_id: Uuid) -> AppResult<()> {
        let existe =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM produits WHERE id = $1)")
                .bind(produit_id)
                .fetch_one(&self.db)
                .await?;
        if !existe {
            return Err(AppError::NotFound("Produit".to_string()));
        }
        Ok(())
    }

    async fn verifier_emplacement(&self, code: &str) -> AppResult<()> {
        let existe =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM emplacements WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.db)
                .await?;
        if !existe {
            return Err(AppError::NotFound("Emplacement".to_string()));
        }
        Ok(())
    }

    fn valider_quantite(quantite: Decimal) -> AppResult<()> {
        if let Err(msg) = validation::validate_quantite(quantite) {
            return Err(AppError::Validation {
                field: "quantite".to_string(),
                message: "Quantity must be positive".to_string(),
                message_fr: msg.to_string(),
            });
        }
        Ok(())
    }

    /// Record a stock entry: a new record plus its journal entry
    pub async fn entree(&self, input: EntreeInput) -> AppResult<StockRecord> {
        Self::valider_quantite(input.quantite)?;
        self.verifier_produit(input.produit_id).await?;
        self.verifier_emplacement(&input.emplacement).await?;

        let mut tx = self.db.begin().await?;

        let lot = match input.lot {
            Some(lot) if !lot.trim().is_empty() => lot,
            _ => {
                let seq = SequenceService::suivant_dans_tx(&mut tx, SEQ_LOTS).await?;
                sequence::numero_lot(seq, Utc::now())
            }
        };

        let row = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            INSERT INTO stock_records (produit_id, emplacement, lot, quantite, prix_unitaire,
                                       date_expiration)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            STOCK_COLUMNS
        ))
        .bind(input.produit_id)
        .bind(&input.emplacement)
        .bind(&lot)
        .bind(input.quantite)
        .bind(input.prix_unitaire)
        .bind(input.date_expiration)
        .fetch_one(&mut *tx)
        .await?;

        MouvementService::append_dans_tx(
            &mut tx,
            NouveauMouvement {
                type_mouvement: TypeMouvement::Entree,
                produit_id: input.produit_id,
                quantite: input.quantite,
                motif: input.motif.unwrap_or_else(|| "Entree de stock".to_string()),
                reference: None,
                utilisateur: input.utilisateur.unwrap_or_else(|| "Systeme".to_string()),
                details: serde_json::json!({
                    "emplacement": input.emplacement,
                    "lot": lot,
                    "fournisseur": input.fournisseur,
                    "prix_unitaire": input.prix_unitaire,
                }),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(record_from_row(row))
    }

    /// Record a FIFO stock exit across the product's records
    pub async fn sortie(&self, input: SortieInput) -> AppResult<Vec<Prelevement>> {
        Self::valider_quantite(input.quantite)?;
        self.verifier_produit(input.produit_id).await?;

        let mut tx = self.db.begin().await?;
        let prelevements = Self::appliquer_sortie(
            &mut tx,
            input.produit_id,
            input.quantite,
            input.motif.unwrap_or_else(|| "Sortie de stock".to_string()),
            input.utilisateur.unwrap_or_else(|| "Systeme".to_string()),
            serde_json::json!({ "client_id": input.client_id }),
            None,
        )
        .await?;
        tx.commit().await?;

        Ok(prelevements)
    }

    /// Apply a FIFO exit inside the caller's transaction.
    ///
    /// Locks the product's non-empty records, plans the draws oldest-first,
    /// decrements each drawn record and appends one `sortie` journal entry
    /// carrying the full draw breakdown. Fails without touching anything
    /// when the aggregate is insufficient.
    pub(crate) async fn appliquer_sortie(
        tx: &mut Transaction<'_, Postgres>,
        produit_id: Uuid,
        quantite: Decimal,
        motif: String,
        utilisateur: String,
        details_extra: serde_json::Value,
        reference: Option<String>,
    ) -> AppResult<Vec<Prelevement>> {
        let rows = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            SELECT {}
            FROM stock_records
            WHERE produit_id = $1 AND quantite > 0
            ORDER BY date_reception ASC, id ASC
            FOR UPDATE
            "#,
            STOCK_COLUMNS
        ))
        .bind(produit_id)
        .fetch_all(&mut **tx)
        .await?;

        let records: Vec<StockRecord> = rows.into_iter().map(record_from_row).collect();

        let prelevements = planifier_sortie_fifo(&records, quantite).map_err(|disponible| {
            AppError::InsufficientStock {
                disponible,
                demande: quantite,
            }
        })?;

        for prelevement in &prelevements {
            sqlx::query("UPDATE stock_records SET quantite = quantite - $1 WHERE id = $2")
                .bind(prelevement.quantite)
                .bind(prelevement.record_id)
                .execute(&mut **tx)
                .await?;
        }

        let mut details = serde_json::json!({ "prelevements": prelevements });
        if let (Some(objet), Some(extra)) = (details.as_object_mut(), details_extra.as_object()) {
            for (cle, valeur) in extra {
                objet.insert(cle.clone(), valeur.clone());
            }
        }

        MouvementService::append_dans_tx(
            tx,
            NouveauMouvement {
                type_mouvement: TypeMouvement::Sortie,
                produit_id,
                quantite,
                motif,
                reference,
                utilisateur,
                details,
            },
        )
        .await?;

        Ok(prelevements)
    }

    /// Move stock between locations without changing the aggregate.
    ///
    /// A full-quantity transfer relocates the record in place; a partial
    /// transfer splits it, the new record keeping the source lot, price,
    /// expiration and receipt date so FIFO age is preserved.
    pub async fn transfert(&self, input: TransfertInput) -> AppResult<()> {
        Self::valider_quantite(input.quantite)?;
        self.verifier_emplacement(&input.nouvel_emplacement).await?;

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, StockRow>(&format!(
            "SELECT {} FROM stock_records WHERE id = $1 FOR UPDATE",
            STOCK_COLUMNS
        ))
        .bind(input.record_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;
        let record = record_from_row(row);

        if input.quantite > record.quantite {
            return Err(AppError::InsufficientStock {
                disponible: record.quantite,
                demande: input.quantite,
            });
        }

        let occupe = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM stock_records
                WHERE emplacement = $1 AND produit_id <> $2 AND quantite > 0
            )
            "#,
        )
        .bind(&input.nouvel_emplacement)
        .bind(record.produit_id)
        .fetch_one(&mut *tx)
        .await?;

        if occupe {
            return Err(AppError::Validation {
                field: "nouvel_emplacement".to_string(),
                message: "Destination location is occupied by another product".to_string(),
                message_fr: "Emplacement de destination non disponible".to_string(),
            });
        }

        if input.quantite == record.quantite {
            sqlx::query("UPDATE stock_records SET emplacement = $1 WHERE id = $2")
                .bind(&input.nouvel_emplacement)
                .bind(record.id)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("UPDATE stock_records SET quantite = quantite - $1 WHERE id = $2")
                .bind(input.quantite)
                .bind(record.id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO stock_records (produit_id, emplacement, lot, quantite, prix_unitaire,
                                           date_expiration, date_reception)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(record.produit_id)
            .bind(&input.nouvel_emplacement)
            .bind(&record.lot)
            .bind(input.quantite)
            .bind(record.prix_unitaire)
            .bind(record.date_expiration)
            .bind(record.date_reception)
            .execute(&mut *tx)
            .await?;
        }

        MouvementService::append_dans_tx(
            &mut tx,
            NouveauMouvement {
                type_mouvement: TypeMouvement::Transfert,
                produit_id: record.produit_id,
                quantite: input.quantite,
                motif: input
                    .motif
                    .unwrap_or_else(|| "Transfert d'emplacement".to_string()),
                reference: None,
                utilisateur: input.utilisateur.unwrap_or_else(|| "Systeme".to_string()),
                details: serde_json::json!({
                    "ancien_emplacement": record.emplacement,
                    "nouvel_emplacement": input.nouvel_emplacement,
                    "record_id": record.id,
                    "lot": record.lot,
                }),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Receive a ship cargo, dispatching each product across locations.
    ///
    /// Creates one stock record and one journal entry per dispatch line,
    /// all sharing a single `REC-` reference, atomically.
    pub async fn reception_navire(
        &self,
        input: ReceptionNavireInput,
    ) -> AppResult<ReceptionResult> {
        if input.navire.trim().is_empty() {
            return Err(AppError::Validation {
                field: "navire".to_string(),
                message: "Ship name cannot be empty".to_string(),
                message_fr: "Le nom du navire est obligatoire".to_string(),
            });
        }
        if input.produits.is_empty() {
            return Err(AppError::ValidationError(
                "A reception must carry at least one product".to_string(),
            ));
        }
        for produit in &input.produits {
            self.verifier_produit(produit.produit_id).await?;
            if produit.dispatch.is_empty() {
                return Err(AppError::ValidationError(
                    "Each product must be dispatched to at least one location".to_string(),
                ));
            }
            for dispatch in &produit.dispatch {
                Self::valider_quantite(dispatch.quantite)?;
                self.verifier_emplacement(&dispatch.emplacement).await?;
            }
        }

        let utilisateur = input.utilisateur.unwrap_or_else(|| "Systeme".to_string());
        let mut tx = self.db.begin().await?;

        let seq = SequenceService::suivant_dans_tx(&mut tx, SEQ_RECEPTIONS).await?;
        let reference = sequence::reference_reception(seq, Utc::now());
        let mut entrees = 0;

        for produit in &input.produits {
            let lot = match &produit.lot {
                Some(lot) if !lot.trim().is_empty() => lot.clone(),
                _ => {
                    let seq = SequenceService::suivant_dans_tx(&mut tx, SEQ_LOTS).await?;
                    sequence::numero_lot(seq, Utc::now())
                }
            };

            for dispatch in &produit.dispatch {
                sqlx::query(
                    r#"
                    INSERT INTO stock_records (produit_id, emplacement, lot, quantite,
                                               prix_unitaire, date_expiration)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(produit.produit_id)
                .bind(&dispatch.emplacement)
                .bind(&lot)
                .bind(dispatch.quantite)
                .bind(produit.prix_unitaire)
                .bind(produit.date_expiration)
                .execute(&mut *tx)
                .await?;

                MouvementService::append_dans_tx(
                    &mut tx,
                    NouveauMouvement {
                        type_mouvement: TypeMouvement::Entree,
                        produit_id: produit.produit_id,
                        quantite: dispatch.quantite,
                        motif: format!("Reception navire {}", input.navire),
                        reference: Some(reference.clone()),
                        utilisateur: utilisateur.clone(),
                        details: serde_json::json!({
                            "emplacement": dispatch.emplacement,
                            "lot": lot,
                            "navire": input.navire,
                            "fournisseur": input.fournisseur,
                            "prix_unitaire": produit.prix_unitaire,
                        }),
                    },
                )
                .await?;

                entrees += 1;
            }
        }

        tx.commit().await?;

        tracing::info!(
            "Reception {} recorded: {} entries from {}",
            reference,
            entrees,
            input.navire
        );

        Ok(ReceptionResult {
            reference,
            navire: input.navire,
            entrees,
        })
    }

    /// Aggregate on-hand quantity for a product
    pub async fn quantite_disponible(&self, produit_id: Uuid) -> AppResult<Decimal> {
        let quantite = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(quantite), 0) FROM stock_records WHERE produit_id = $1",
        )
        .bind(produit_id)
        .fetch_one(&self.db)
        .await?;
        Ok(quantite)
    }

    /// List every stock record, most recent receipt first
    pub async fn lister(&self) -> AppResult<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRow>(&format!(
            "SELECT {} FROM stock_records ORDER BY date_reception DESC, id DESC",
            STOCK_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(record_from_row).collect())
    }

    /// List the records of one product in FIFO order (zero rows included)
    pub async fn lister_par_produit(&self, produit_id: Uuid) -> AppResult<Vec<StockRecord>> {
        self.verifier_produit(produit_id).await?;

        let rows = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            SELECT {} FROM stock_records
            WHERE produit_id = $1
            ORDER BY date_reception ASC, id ASC
            "#,
            STOCK_COLUMNS
        ))
        .bind(produit_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(record_from_row).collect())
    }

    /// Scan the whole stock for threshold and expiration alerts; no side
    /// effects
    pub async fn alertes(&self) -> AppResult<Vec<AlerteStock>> {
        let aggregats = sqlx::query_as::<_, (Uuid, String, Decimal, Decimal)>(
            r#"
            SELECT p.id, p.nom, p.seuil_alerte, COALESCE(SUM(s.quantite), 0)
            FROM produits p
            LEFT JOIN stock_records s ON s.produit_id = p.id
            GROUP BY p.id, p.nom, p.seuil_alerte
            ORDER BY p.nom
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut alertes = Vec::new();
        for (produit_id, nom, seuil, quantite) in aggregats {
            match classifier_niveau(quantite, seuil) {
                NiveauStock::Rupture => alertes.push(AlerteStock {
                    type_alerte: TypeAlerte::Rupture,
                    produit_id,
                    produit_nom: nom,
                    quantite_actuelle: quantite,
                    seuil,
                    date_expiration: None,
                    emplacement: None,
                    message: "Produit en rupture de stock".to_string(),
                }),
                NiveauStock::StockBas => alertes.push(AlerteStock {
                    type_alerte: TypeAlerte::StockBas,
                    produit_id,
                    produit_nom: nom,
                    quantite_actuelle: quantite,
                    seuil,
                    date_expiration: None,
                    emplacement: None,
                    message: format!("Stock faible ({} restants)", quantite),
                }),
                NiveauStock::Ok => {}
            }
        }

        let candidats = sqlx::query_as::<_, (Uuid, Uuid, String, String, Decimal, Option<NaiveDate>, DateTime<Utc>, String, Decimal)>(
            r#"
            SELECT s.id, s.produit_id, s.emplacement, s.lot, s.quantite, s.date_expiration,
                   s.date_reception, p.nom, p.seuil_alerte
            FROM stock_records s
            JOIN produits p ON p.id = s.produit_id
            WHERE s.date_expiration IS NOT NULL AND s.quantite > 0
            ORDER BY s.date_expiration ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let aujourd_hui = Utc::now().date_naive();
        for (id, produit_id, emplacement, lot, quantite, date_expiration, date_reception, nom, seuil) in
            candidats
        {
            let record = StockRecord {
                id,
                produit_id,
                emplacement,
                lot,
                quantite,
                prix_unitaire: None,
                date_expiration,
                date_reception,
            };
            let expiration = match record.date_expiration {
                Some(expiration) => expiration,
                None => continue,
            };
            if expire_bientot(&record, aujourd_hui) {
                alertes.push(AlerteStock {
                    type_alerte: TypeAlerte::Expiration,
                    produit_id: record.produit_id,
                    produit_nom: nom,
                    quantite_actuelle: record.quantite,
                    seuil,
                    date_expiration: Some(expiration),
                    emplacement: Some(record.emplacement),
                    message: format!("Produit expirant bientot ({})", expiration),
                });
            }
        }

        Ok(alertes)
    }

    /// Global stock statistics for the dashboard
    pub async fn stats(&self) -> AppResult<StockStats> {
        let total_produits =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM produits")
                .fetch_one(&self.db)
                .await?;

        let (quantite_totale, valeur_totale) = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(s.quantite), 0),
                   COALESCE(SUM(s.quantite * COALESCE(s.prix_unitaire, p.prix_achat)), 0)
            FROM stock_records s
            JOIN produits p ON p.id = s.produit_id
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let entrees_aujourd_hui = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM mouvements WHERE type_mouvement = 'entree' AND date >= CURRENT_DATE",
        )
        .fetch_one(&self.db)
        .await?;

        let sorties_aujourd_hui = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM mouvements WHERE type_mouvement = 'sortie' AND date >= CURRENT_DATE",
        )
        .fetch_one(&self.db)
        .await?;

        let aggregats = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT p.seuil_alerte, COALESCE(SUM(s.quantite), 0)
            FROM produits p
            LEFT JOIN stock_records s ON s.produit_id = p.id
            GROUP BY p.id, p.seuil_alerte
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let produits_en_alerte = aggregats
            .into_iter()
            .filter(|(seuil, quantite)| classifier_niveau(*quantite, *seuil) != NiveauStock::Ok)
            .count() as i64;

        Ok(StockStats {
            total_produits,
            quantite_totale,
            valeur_totale,
            entrees_aujourd_hui,
            sorties_aujourd_hui,
            produits_en_alerte,
        })
    }
}
