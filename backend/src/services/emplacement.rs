//! Storage location registry service
//!
//! The location grid is static; occupancy is always derived from stock
//! records, so nothing here is ever mutated after the initial seed.

use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::generer_emplacements;

/// Location registry service
#[derive(Clone)]
pub struct EmplacementService {
    db: PgPool,
}

/// A location with its derived occupancy
#[derive(Debug, Clone, Serialize)]
pub struct EmplacementInfo {
    pub code: String,
    pub zone: String,
    pub allee: i16,
    pub position: i16,
    pub capacite: i32,
    pub disponible: bool,
}

impl EmplacementService {
    /// Create a new EmplacementService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Seed the static grid; returns the number of locations inserted
    pub async fn initialiser(&self) -> AppResult<u64> {
        let mut inseres = 0;
        for emplacement in generer_emplacements() {
            let result = sqlx::query(
                r#"
                INSERT INTO emplacements (code, zone, allee, position, capacite)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (code) DO NOTHING
                "#,
            )
            .bind(&emplacement.code)
            .bind(emplacement.zone.to_string())
            .bind(emplacement.allee as i16)
            .bind(emplacement.position as i16)
            .bind(emplacement.capacite as i32)
            .execute(&self.db)
            .await?;
            inseres += result.rows_affected();
        }
        Ok(inseres)
    }

    /// List every location with its occupancy
    pub async fn lister(&self) -> AppResult<Vec<EmplacementInfo>> {
        let rows = sqlx::query_as::<_, (String, String, i16, i16, i32, bool)>(
            r#"
            SELECT e.code, e.zone, e.allee, e.position, e.capacite,
                   NOT EXISTS(
                       SELECT 1 FROM stock_records s
                       WHERE s.emplacement = e.code AND s.quantite > 0
                   ) AS disponible
            FROM emplacements e
            ORDER BY e.code
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| EmplacementInfo {
                code: r.0,
                zone: r.1,
                allee: r.2,
                position: r.3,
                capacite: r.4,
                disponible: r.5,
            })
            .collect())
    }

    /// True iff no stock record at `code` holds a positive quantity
    pub async fn est_disponible(&self, code: &str) -> AppResult<bool> {
        let connu = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM emplacements WHERE code = $1)",
        )
        .bind(code)
        .fetch_one(&self.db)
        .await?;

        if !connu {
            return Err(AppError::NotFound("Emplacement".to_string()));
        }

        let occupe = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stock_records WHERE emplacement = $1 AND quantite > 0)",
        )
        .bind(code)
        .fetch_one(&self.db)
        .await?;

        Ok(!occupe)
    }

    /// List the free locations
    pub async fn lister_disponibles(&self) -> AppResult<Vec<EmplacementInfo>> {
        let tous = self.lister().await?;
        Ok(tous.into_iter().filter(|e| e.disponible).collect())
    }
}
