//! Product referential service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Produit;
use shared::types::Unite;
use shared::validation;

/// Product referential service
#[derive(Clone)]
pub struct ProduitService {
    db: PgPool,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProduitInput {
    pub nom: String,
    pub reference: String,
    pub categorie: String,
    pub unite: Unite,
    pub prix_achat: Decimal,
    pub prix_vente: Decimal,
    pub seuil_alerte: Decimal,
    pub actif: Option<bool>,
    pub en_distribution: Option<bool>,
}

/// Input for updating a product
///
/// The reference is the product's identity and cannot change.
#[derive(Debug, Deserialize)]
pub struct UpdateProduitInput {
    pub nom: Option<String>,
    pub categorie: Option<String>,
    pub unite: Option<Unite>,
    pub prix_achat: Option<Decimal>,
    pub prix_vente: Option<Decimal>,
    pub seuil_alerte: Option<Decimal>,
    pub actif: Option<bool>,
    pub en_distribution: Option<bool>,
}

type ProduitRow = (
    Uuid,
    String,
    String,
    String,
    String,
    Decimal,
    Decimal,
    Decimal,
    bool,
    bool,
    DateTime<Utc>,
    DateTime<Utc>,
);

const PRODUIT_COLUMNS: &str = "id, nom, reference, categorie, unite, prix_achat, prix_vente, \
                               seuil_alerte, actif, en_distribution, created_at, updated_at";

fn produit_from_row(row: ProduitRow) -> AppResult<Produit> {
    let unite = Unite::from_str(&row.4)
        .ok_or_else(|| AppError::Internal(format!("Unknown unit in database: {}", row.4)))?;
    Ok(Produit {
        id: row.0,
        nom: row.1,
        reference: row.2,
        categorie: row.3,
        unite,
        prix_achat: row.5,
        prix_vente: row.6,
        seuil_alerte: row.7,
        actif: row.8,
        en_distribution: row.9,
        created_at: row.10,
        updated_at: row.11,
    })
}

impl ProduitService {
    /// Create a new ProduitService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn valider(input: &CreateProduitInput) -> AppResult<()> {
        if input.nom.trim().is_empty() {
            return Err(AppError::Validation {
                field: "nom".to_string(),
                message: "Product name cannot be empty".to_string(),
                message_fr: "Le nom du produit est obligatoire".to_string(),
            });
        }
        if let Err(msg) = validation::validate_reference_produit(&input.reference) {
            return Err(AppError::Validation {
                field: "reference".to_string(),
                message: "Invalid product reference format (ex: RIZ-1025)".to_string(),
                message_fr: msg.to_string(),
            });
        }
        for (champ, prix) in [
            ("prix_achat", input.prix_achat),
            ("prix_vente", input.prix_vente),
            ("seuil_alerte", input.seuil_alerte),
        ] {
            if prix < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: champ.to_string(),
                    message: format!("{} cannot be negative", champ),
                    message_fr: format!("{} ne peut pas etre negatif", champ),
                });
            }
        }
        Ok(())
    }

    /// Create a product; the reference must be unique (case-insensitive)
    pub async fn creer(&self, input: CreateProduitInput) -> AppResult<Produit> {
        Self::valider(&input)?;

        let existe = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM produits WHERE LOWER(reference) = LOWER($1))",
        )
        .bind(&input.reference)
        .fetch_one(&self.db)
        .await?;

        if existe {
            return Err(AppError::DuplicateEntry("reference".to_string()));
        }

        let row = sqlx::query_as::<_, ProduitRow>(&format!(
            r#"
            INSERT INTO produits (nom, reference, categorie, unite, prix_achat, prix_vente,
                                  seuil_alerte, actif, en_distribution)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PRODUIT_COLUMNS
        ))
        .bind(&input.nom)
        .bind(&input.reference)
        .bind(&input.categorie)
        .bind(input.unite.as_str())
        .bind(input.prix_achat)
        .bind(input.prix_vente)
        .bind(input.seuil_alerte)
        .bind(input.actif.unwrap_or(true))
        .bind(input.en_distribution.unwrap_or(true))
        .fetch_one(&self.db)
        .await?;

        produit_from_row(row)
    }

    /// Get a product by id
    pub async fn get(&self, produit_id: Uuid) -> AppResult<Produit> {
        let row = sqlx::query_as::<_, ProduitRow>(&format!(
            "SELECT {} FROM produits WHERE id = $1",
            PRODUIT_COLUMNS
        ))
        .bind(produit_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Produit".to_string()))?;

        produit_from_row(row)
    }

    /// List all products
    pub async fn lister(&self) -> AppResult<Vec<Produit>> {
        let rows = sqlx::query_as::<_, ProduitRow>(&format!(
            "SELECT {} FROM produits ORDER BY nom",
            PRODUIT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(produit_from_row).collect()
    }

    /// Update mutable product fields (pricing, threshold, flags)
    pub async fn mettre_a_jour(
        &self,
        produit_id: Uuid,
        input: UpdateProduitInput,
    ) -> AppResult<Produit> {
        let existing = self.get(produit_id).await?;

        let nom = input.nom.unwrap_or(existing.nom);
        if nom.trim().is_empty() {
            return Err(AppError::Validation {
                field: "nom".to_string(),
                message: "Product name cannot be empty".to_string(),
                message_fr: "Le nom du produit est obligatoire".to_string(),
            });
        }
        let categorie = input.categorie.unwrap_or(existing.categorie);
        let unite = input.unite.unwrap_or(existing.unite);
        let prix_achat = input.prix_achat.unwrap_or(existing.prix_achat);
        let prix_vente = input.prix_vente.unwrap_or(existing.prix_vente);
        let seuil_alerte = input.seuil_alerte.unwrap_or(existing.seuil_alerte);
        if prix_achat < Decimal::ZERO || prix_vente < Decimal::ZERO || seuil_alerte < Decimal::ZERO
        {
            return Err(AppError::ValidationError(
                "Prices and threshold cannot be negative".to_string(),
            ));
        }
        let actif = input.actif.unwrap_or(existing.actif);
        let en_distribution = input.en_distribution.unwrap_or(existing.en_distribution);

        let row = sqlx::query_as::<_, ProduitRow>(&format!(
            r#"
            UPDATE produits
            SET nom = $1, categorie = $2, unite = $3, prix_achat = $4, prix_vente = $5,
                seuil_alerte = $6, actif = $7, en_distribution = $8, updated_at = NOW()
            WHERE id = $9
            RETURNING {}
            "#,
            PRODUIT_COLUMNS
        ))
        .bind(&nom)
        .bind(&categorie)
        .bind(unite.as_str())
        .bind(prix_achat)
        .bind(prix_vente)
        .bind(seuil_alerte)
        .bind(actif)
        .bind(en_distribution)
        .bind(produit_id)
        .fetch_one(&self.db)
        .await?;

        produit_from_row(row)
    }

    /// Delete a product with no stock records or order lines referencing it
    pub async fn supprimer(&self, produit_id: Uuid) -> AppResult<()> {
        let reference = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM stock_records WHERE produit_id = $1)
                OR EXISTS(SELECT 1 FROM lignes_commande WHERE produit_id = $1)
                OR EXISTS(SELECT 1 FROM mouvements WHERE produit_id = $1)
            "#,
        )
        .bind(produit_id)
        .fetch_one(&self.db)
        .await?;

        if reference {
            return Err(AppError::ValidationError(
                "Product is referenced by stock records, movements or order lines".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM produits WHERE id = $1")
            .bind(produit_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Produit".to_string()));
        }

        Ok(())
    }
}
