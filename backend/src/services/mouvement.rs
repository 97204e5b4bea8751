//! Movement journal service
//!
//! The journal is the audit trail of the stock ledger: append-only, written
//! exclusively inside the ledger transactions that mutate stock records.
//! There is no update or delete path; corrections are compensating entries
//! with an `ajustement` motif.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::sequence::{self, SequenceService, SEQ_MOUVEMENTS};
use crate::models::{Mouvement, TypeMouvement};

/// Movement journal service
#[derive(Clone)]
pub struct MouvementService {
    db: PgPool,
}

/// A journal entry to append
#[derive(Debug)]
pub struct NouveauMouvement {
    pub type_mouvement: TypeMouvement,
    pub produit_id: Uuid,
    pub quantite: Decimal,
    pub motif: String,
    /// Externally supplied reference (e.g. a reception code); a movement
    /// reference is generated when absent
    pub reference: Option<String>,
    pub utilisateur: String,
    pub details: serde_json::Value,
}

/// Journal query filters
#[derive(Debug, Default, Deserialize)]
pub struct MouvementFilters {
    #[serde(rename = "type")]
    pub type_mouvement: Option<TypeMouvement>,
    pub produit_id: Option<Uuid>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
}

type MouvementRow = (
    Uuid,
    String,
    Uuid,
    Decimal,
    String,
    String,
    String,
    DateTime<Utc>,
    serde_json::Value,
);

fn mouvement_from_row(row: MouvementRow) -> AppResult<Mouvement> {
    let type_mouvement = TypeMouvement::from_str(&row.1).ok_or_else(|| {
        AppError::Internal(format!("Unknown movement type in database: {}", row.1))
    })?;
    Ok(Mouvement {
        id: row.0,
        type_mouvement,
        produit_id: row.2,
        quantite: row.3,
        motif: row.4,
        reference: row.5,
        utilisateur: row.6,
        date: row.7,
        details: row.8,
    })
}

impl MouvementService {
    /// Create a new MouvementService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append a journal entry inside the caller's ledger transaction.
    ///
    /// This is the journal's sole write operation.
    pub(crate) async fn append_dans_tx(
        tx: &mut Transaction<'_, Postgres>,
        nouveau: NouveauMouvement,
    ) -> AppResult<Mouvement> {
        let reference = match nouveau.reference {
            Some(reference) => reference,
            None => {
                let seq = SequenceService::suivant_dans_tx(tx, SEQ_MOUVEMENTS).await?;
                sequence::reference_mouvement(
                    nouveau.type_mouvement.prefixe_reference(),
                    seq,
                    Utc::now(),
                )
            }
        };

        let row = sqlx::query_as::<_, MouvementRow>(
            r#"
            INSERT INTO mouvements (type_mouvement, produit_id, quantite, motif, reference,
                                    utilisateur, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, type_mouvement, produit_id, quantite, motif, reference, utilisateur,
                      date, details
            "#,
        )
        .bind(nouveau.type_mouvement.as_str())
        .bind(nouveau.produit_id)
        .bind(nouveau.quantite)
        .bind(&nouveau.motif)
        .bind(&reference)
        .bind(&nouveau.utilisateur)
        .bind(&nouveau.details)
        .fetch_one(&mut **tx)
        .await?;

        mouvement_from_row(row)
    }

    /// Query the journal, most recent first
    pub async fn query(&self, filters: MouvementFilters) -> AppResult<Vec<Mouvement>> {
        let rows = sqlx::query_as::<_, MouvementRow>(
            r#"
            SELECT id, type_mouvement, produit_id, quantite, motif, reference, utilisateur,
                   date, details
            FROM mouvements
            WHERE ($1::text IS NULL OR type_mouvement = $1)
              AND ($2::uuid IS NULL OR produit_id = $2)
              AND ($3::timestamptz IS NULL OR date >= $3)
              AND ($4::timestamptz IS NULL OR date <= $4)
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(filters.type_mouvement.map(|t| t.as_str()))
        .bind(filters.produit_id)
        .bind(filters.date_debut)
        .bind(filters.date_fin)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(mouvement_from_row).collect()
    }
}
