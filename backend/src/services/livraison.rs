//! Delivery ledger service
//!
//! A delivery belongs to exactly one order. Fulfillment (`livree`) is the
//! point where stock actually leaves the warehouse: the first transition
//! into `livree` runs one FIFO exit per delivery line and marks the parent
//! order delivered, all in the same transaction. `livree` is terminal, so
//! the deduction can never run twice.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::commande::CommandeService;
use crate::services::sequence::{self, SequenceService, SEQ_LIVRAISONS};
use crate::services::stock::StockService;
use crate::models::{
    ArticleBonLivraison, BlocClient, BonLivraison, LigneLivraison, Livraison, LivraisonDetail,
    StatutCommande, StatutLivraison,
};

/// Delivery ledger service
#[derive(Clone)]
pub struct LivraisonService {
    db: PgPool,
}

/// Input for scheduling a delivery
#[derive(Debug, Deserialize)]
pub struct CreateLivraisonInput {
    pub commande_id: Uuid,
    /// Scheduled date; defaults to now
    pub date_livraison: Option<DateTime<Utc>>,
    pub transporteur: Option<String>,
    pub nom_chauffeur: Option<String>,
    pub numero_camion: Option<String>,
    /// Defaults to the order's delivery address
    pub adresse_livraison: Option<String>,
    pub contact_livraison: Option<String>,
    pub telephone_livraison: Option<String>,
    pub observation: Option<String>,
    pub utilisateur: Option<String>,
}

/// Status-specific fields supplied alongside a transition
#[derive(Debug, Default, Deserialize)]
pub struct StatutDetails {
    pub signataire_nom: Option<String>,
    pub motif_retour: Option<String>,
    pub type_incident: Option<String>,
    pub description_incident: Option<String>,
    pub motif_annulation: Option<String>,
    pub utilisateur: Option<String>,
}

/// Delivery statistics
#[derive(Debug, Serialize)]
pub struct LivraisonStats {
    pub total: i64,
    pub par_statut: HashMap<String, i64>,
    pub livraisons_aujourd_hui: i64,
    pub livraisons_cette_semaine: i64,
    /// livree / (livree + retournee + incident), in percent
    pub taux_succes: f64,
    /// Mean days between scheduled and effective date, completed deliveries
    pub delai_moyen_jours: f64,
    pub transporteurs: HashMap<String, i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct LivraisonRow {
    id: Uuid,
    numero: String,
    commande_id: Uuid,
    client_id: Uuid,
    statut: String,
    date_livraison: DateTime<Utc>,
    transporteur: String,
    nom_chauffeur: String,
    numero_camion: String,
    adresse_livraison: String,
    contact_livraison: String,
    telephone_livraison: String,
    observation: String,
    date_chargement: Option<DateTime<Utc>>,
    date_depart: Option<DateTime<Utc>>,
    date_livraison_effective: Option<DateTime<Utc>>,
    signataire_nom: Option<String>,
    date_retour: Option<DateTime<Utc>>,
    motif_retour: Option<String>,
    date_incident: Option<DateTime<Utc>>,
    type_incident: Option<String>,
    description_incident: Option<String>,
    date_annulation: Option<DateTime<Utc>>,
    motif_annulation: Option<String>,
    utilisateur_creation: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const LIVRAISON_COLUMNS: &str = "id, numero, commande_id, client_id, statut, date_livraison, \
     transporteur, nom_chauffeur, numero_camion, adresse_livraison, contact_livraison, \
     telephone_livraison, observation, date_chargement, date_depart, date_livraison_effective, \
     signataire_nom, date_retour, motif_retour, date_incident, type_incident, \
     description_incident, date_annulation, motif_annulation, utilisateur_creation, \
     created_at, updated_at";

fn statut_from_str(statut: &str) -> AppResult<StatutLivraison> {
    StatutLivraison::from_str(statut).ok_or_else(|| {
        AppError::Internal(format!("Unknown delivery status in database: {}", statut))
    })
}

fn livraison_from_row(row: LivraisonRow) -> AppResult<Livraison> {
    let statut = statut_from_str(&row.statut)?;
    Ok(Livraison {
        id: row.id,
        numero: row.numero,
        commande_id: row.commande_id,
        client_id: row.client_id,
        statut,
        date_livraison: row.date_livraison,
        transporteur: row.transporteur,
        nom_chauffeur: row.nom_chauffeur,
        numero_camion: row.numero_camion,
        adresse_livraison: row.adresse_livraison,
        contact_livraison: row.contact_livraison,
        telephone_livraison: row.telephone_livraison,
        observation: row.observation,
        date_chargement: row.date_chargement,
        date_depart: row.date_depart,
        date_livraison_effective: row.date_livraison_effective,
        signataire_nom: row.signataire_nom,
        date_retour: row.date_retour,
        motif_retour: row.motif_retour,
        date_incident: row.date_incident,
        type_incident: row.type_incident,
        description_incident: row.description_incident,
        date_annulation: row.date_annulation,
        motif_annulation: row.motif_annulation,
        utilisateur_creation: row.utilisateur_creation,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl LivraisonService {
    /// Create a new LivraisonService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn lignes_de(&self, livraison_id: Uuid) -> AppResult<Vec<LigneLivraison>> {
        let rows = sqlx::query_as::<_, (Uuid, Decimal, Decimal)>(
            r#"
            SELECT produit_id, quantite, prix_unitaire
            FROM lignes_livraison
            WHERE livraison_id = $1
            ORDER BY id
            "#,
        )
        .bind(livraison_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LigneLivraison {
                produit_id: r.0,
                quantite: r.1,
                prix_unitaire: r.2,
            })
            .collect())
    }

    /// Schedule a delivery for a validated order.
    ///
    /// Line items and address fields are copied from the order unless
    /// overridden; the order moves to `en-preparation`.
    pub async fn creer(&self, input: CreateLivraisonInput) -> AppResult<LivraisonDetail> {
        let mut tx = self.db.begin().await?;

        let commande = sqlx::query_as::<_, (String, Uuid, String, String, String)>(
            r#"
            SELECT statut, client_id, adresse_livraison, contact_livraison, telephone_livraison
            FROM commandes
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(input.commande_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Commande".to_string()))?;

        let statut_commande = StatutCommande::from_str(&commande.0).ok_or_else(|| {
            AppError::Internal(format!("Unknown order status in database: {}", commande.0))
        })?;
        if !matches!(
            statut_commande,
            StatutCommande::Validee | StatutCommande::EnPreparation
        ) {
            return Err(AppError::InvalidStateTransition(
                "The order must be validated before it can be delivered".to_string(),
            ));
        }

        let adresse = match input.adresse_livraison {
            Some(adresse) if !adresse.trim().is_empty() => adresse,
            _ => commande.2,
        };
        if adresse.trim().is_empty() {
            return Err(AppError::Validation {
                field: "adresse_livraison".to_string(),
                message: "Delivery address is required".to_string(),
                message_fr: "L'adresse de livraison est obligatoire".to_string(),
            });
        }

        let seq = SequenceService::suivant_dans_tx(&mut tx, SEQ_LIVRAISONS).await?;
        let numero = sequence::numero_livraison(seq, Utc::now());

        let row = sqlx::query_as::<_, LivraisonRow>(&format!(
            r#"
            INSERT INTO livraisons (numero, commande_id, client_id, statut, date_livraison,
                                    transporteur, nom_chauffeur, numero_camion, adresse_livraison,
                                    contact_livraison, telephone_livraison, observation,
                                    utilisateur_creation)
            VALUES ($1, $2, $3, 'programmee', $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            LIVRAISON_COLUMNS
        ))
        .bind(&numero)
        .bind(input.commande_id)
        .bind(commande.1)
        .bind(input.date_livraison.unwrap_or_else(Utc::now))
        .bind(input.transporteur.unwrap_or_default())
        .bind(input.nom_chauffeur.unwrap_or_default())
        .bind(input.numero_camion.unwrap_or_default())
        .bind(&adresse)
        .bind(input.contact_livraison.unwrap_or(commande.3))
        .bind(input.telephone_livraison.unwrap_or(commande.4))
        .bind(input.observation.unwrap_or_default())
        .bind(input.utilisateur.unwrap_or_else(|| "Systeme".to_string()))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO lignes_livraison (livraison_id, produit_id, quantite, prix_unitaire)
            SELECT $1, produit_id, quantite, prix_unitaire
            FROM lignes_commande
            WHERE commande_id = $2
            "#,
        )
        .bind(row.id)
        .bind(input.commande_id)
        .execute(&mut *tx)
        .await?;

        if statut_commande == StatutCommande::Validee {
            CommandeService::changer_statut_dans_tx(
                &mut tx,
                input.commande_id,
                StatutCommande::EnPreparation,
            )
            .await?;
        }

        tx.commit().await?;

        let lignes = self.lignes_de(row.id).await?;
        Ok(LivraisonDetail {
            livraison: livraison_from_row(row)?,
            lignes,
        })
    }

    /// Get a delivery with its lines
    pub async fn get(&self, livraison_id: Uuid) -> AppResult<LivraisonDetail> {
        let row = sqlx::query_as::<_, LivraisonRow>(&format!(
            "SELECT {} FROM livraisons WHERE id = $1",
            LIVRAISON_COLUMNS
        ))
        .bind(livraison_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Livraison".to_string()))?;

        let lignes = self.lignes_de(livraison_id).await?;
        Ok(LivraisonDetail {
            livraison: livraison_from_row(row)?,
            lignes,
        })
    }

    /// List all deliveries, most recent first
    pub async fn lister(&self) -> AppResult<Vec<Livraison>> {
        let rows = sqlx::query_as::<_, LivraisonRow>(&format!(
            "SELECT {} FROM livraisons ORDER BY date_livraison DESC",
            LIVRAISON_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(livraison_from_row).collect()
    }

    /// Transition a delivery, stamping the status-specific fields.
    ///
    /// Transitioning into `livree` deducts stock for every line and marks
    /// the parent order delivered, atomically with the status change.
    pub async fn changer_statut(
        &self,
        livraison_id: Uuid,
        nouveau_statut: StatutLivraison,
        details: StatutDetails,
    ) -> AppResult<LivraisonDetail> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, LivraisonRow>(&format!(
            "SELECT {} FROM livraisons WHERE id = $1 FOR UPDATE",
            LIVRAISON_COLUMNS
        ))
        .bind(livraison_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Livraison".to_string()))?;

        let statut = statut_from_str(&row.statut)?;
        if !statut.peut_transiter_vers(nouveau_statut) {
            return Err(AppError::InvalidStateTransition(format!(
                "{} -> {}",
                statut.as_str(),
                nouveau_statut.as_str()
            )));
        }

        match nouveau_statut {
            StatutLivraison::EnChargement => {
                sqlx::query(
                    "UPDATE livraisons SET statut = $1, date_chargement = NOW(), updated_at = NOW() WHERE id = $2",
                )
                .bind(nouveau_statut.as_str())
                .bind(livraison_id)
                .execute(&mut *tx)
                .await?;
            }
            StatutLivraison::EnRoute => {
                sqlx::query(
                    "UPDATE livraisons SET statut = $1, date_depart = NOW(), updated_at = NOW() WHERE id = $2",
                )
                .bind(nouveau_statut.as_str())
                .bind(livraison_id)
                .execute(&mut *tx)
                .await?;
            }
            StatutLivraison::Livree => {
                sqlx::query(
                    r#"
                    UPDATE livraisons
                    SET statut = $1, date_livraison_effective = NOW(), signataire_nom = $2,
                        updated_at = NOW()
                    WHERE id = $3
                    "#,
                )
                .bind(nouveau_statut.as_str())
                .bind(details.signataire_nom.clone().unwrap_or_default())
                .bind(livraison_id)
                .execute(&mut *tx)
                .await?;
            }
            StatutLivraison::Retournee => {
                sqlx::query(
                    r#"
                    UPDATE livraisons
                    SET statut = $1, date_retour = NOW(), motif_retour = $2, updated_at = NOW()
                    WHERE id = $3
                    "#,
                )
                .bind(nouveau_statut.as_str())
                .bind(details.motif_retour.clone().unwrap_or_default())
                .bind(livraison_id)
                .execute(&mut *tx)
                .await?;
            }
            StatutLivraison::Incident => {
                sqlx::query(
                    r#"
                    UPDATE livraisons
                    SET statut = $1, date_incident = NOW(), type_incident = $2,
                        description_incident = $3, updated_at = NOW()
                    WHERE id = $4
                    "#,
                )
                .bind(nouveau_statut.as_str())
                .bind(details.type_incident.clone().unwrap_or_default())
                .bind(details.description_incident.clone().unwrap_or_default())
                .bind(livraison_id)
                .execute(&mut *tx)
                .await?;
            }
            StatutLivraison::Annulee => {
                sqlx::query(
                    r#"
                    UPDATE livraisons
                    SET statut = $1, date_annulation = NOW(), motif_annulation = $2,
                        updated_at = NOW()
                    WHERE id = $3
                    "#,
                )
                .bind(nouveau_statut.as_str())
                .bind(details.motif_annulation.clone().unwrap_or_default())
                .bind(livraison_id)
                .execute(&mut *tx)
                .await?;
            }
            StatutLivraison::Programmee => {
                // unreachable through the transition table, which has no
                // edge back into programmee
                return Err(AppError::InvalidStateTransition(format!(
                    "{} -> {}",
                    statut.as_str(),
                    nouveau_statut.as_str()
                )));
            }
        }

        if nouveau_statut == StatutLivraison::Livree {
            let utilisateur = details
                .utilisateur
                .clone()
                .unwrap_or_else(|| "Systeme".to_string());

            let lignes = sqlx::query_as::<_, (Uuid, Decimal)>(
                "SELECT produit_id, quantite FROM lignes_livraison WHERE livraison_id = $1",
            )
            .bind(livraison_id)
            .fetch_all(&mut *tx)
            .await?;

            for (produit_id, quantite) in lignes {
                StockService::appliquer_sortie(
                    &mut tx,
                    produit_id,
                    quantite,
                    format!("Livraison {}", row.numero),
                    utilisateur.clone(),
                    serde_json::json!({
                        "livraison_id": livraison_id,
                        "commande_id": row.commande_id,
                        "client_id": row.client_id,
                    }),
                    Some(row.numero.clone()),
                )
                .await?;
            }

            CommandeService::changer_statut_dans_tx(
                &mut tx,
                row.commande_id,
                StatutCommande::Livree,
            )
            .await?;

            tracing::info!("Delivery {} fulfilled, order stock deducted", row.numero);
        }

        tx.commit().await?;

        self.get(livraison_id).await
    }

    /// Cancel a delivery; forbidden once delivered or returned
    pub async fn annuler(
        &self,
        livraison_id: Uuid,
        motif: Option<String>,
    ) -> AppResult<LivraisonDetail> {
        let mut tx = self.db.begin().await?;

        let statut_brut = sqlx::query_scalar::<_, String>(
            "SELECT statut FROM livraisons WHERE id = $1 FOR UPDATE",
        )
        .bind(livraison_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Livraison".to_string()))?;

        let statut = statut_from_str(&statut_brut)?;
        if !statut.est_annulable() {
            return Err(AppError::InvalidStateTransition(
                "This delivery can no longer be cancelled".to_string(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE livraisons
            SET statut = 'annulee', motif_annulation = $1, date_annulation = NOW(),
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(motif.unwrap_or_default())
        .bind(livraison_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(livraison_id).await
    }

    /// Delivery statistics
    pub async fn stats(&self) -> AppResult<LivraisonStats> {
        let rows = sqlx::query_as::<_, (String, DateTime<Utc>, Option<DateTime<Utc>>, String)>(
            r#"
            SELECT statut, date_livraison, date_livraison_effective, transporteur
            FROM livraisons
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let aujourd_hui = Utc::now().date_naive();
        let debut_semaine = aujourd_hui
            - chrono::Duration::days(aujourd_hui.weekday().num_days_from_sunday() as i64);

        let mut par_statut: HashMap<String, i64> = HashMap::new();
        let mut livraisons_aujourd_hui = 0;
        let mut livraisons_cette_semaine = 0;
        let mut transporteurs: HashMap<String, i64> = HashMap::new();
        let mut total_delai_jours = 0.0;
        let mut livraisons_avec_delai = 0;

        for (statut, date_livraison, date_effective, transporteur) in &rows {
            *par_statut.entry(statut.clone()).or_insert(0) += 1;

            let date = date_livraison.date_naive();
            if date == aujourd_hui {
                livraisons_aujourd_hui += 1;
            }
            if date >= debut_semaine {
                livraisons_cette_semaine += 1;
            }

            if !transporteur.is_empty() {
                *transporteurs.entry(transporteur.clone()).or_insert(0) += 1;
            }

            if statut == StatutLivraison::Livree.as_str() {
                if let Some(effective) = date_effective {
                    let delai = (*effective - *date_livraison).num_seconds() as f64 / 86_400.0;
                    total_delai_jours += delai;
                    livraisons_avec_delai += 1;
                }
            }
        }

        let livrees = par_statut
            .get(StatutLivraison::Livree.as_str())
            .copied()
            .unwrap_or(0);
        let terminees = livrees
            + par_statut
                .get(StatutLivraison::Retournee.as_str())
                .copied()
                .unwrap_or(0)
            + par_statut
                .get(StatutLivraison::Incident.as_str())
                .copied()
                .unwrap_or(0);
        let taux_succes = if terminees > 0 {
            livrees as f64 / terminees as f64 * 100.0
        } else {
            0.0
        };
        let delai_moyen_jours = if livraisons_avec_delai > 0 {
            total_delai_jours / livraisons_avec_delai as f64
        } else {
            0.0
        };

        Ok(LivraisonStats {
            total: rows.len() as i64,
            par_statut,
            livraisons_aujourd_hui,
            livraisons_cette_semaine,
            taux_succes,
            delai_moyen_jours,
            transporteurs,
        })
    }

    /// Build the structured delivery note (bon de livraison)
    pub async fn bon_livraison(&self, livraison_id: Uuid) -> AppResult<BonLivraison> {
        let detail = self.get(livraison_id).await?;
        let livraison = detail.livraison;

        let client_nom = sqlx::query_scalar::<_, String>("SELECT nom FROM clients WHERE id = $1")
            .bind(livraison.client_id)
            .fetch_optional(&self.db)
            .await?
            .unwrap_or_else(|| "Client inconnu".to_string());

        let articles = sqlx::query_as::<_, (String, String, Decimal, String)>(
            r#"
            SELECT p.reference, p.nom, ll.quantite, p.unite
            FROM lignes_livraison ll
            JOIN produits p ON p.id = ll.produit_id
            WHERE ll.livraison_id = $1
            ORDER BY ll.id
            "#,
        )
        .bind(livraison_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|r| ArticleBonLivraison {
            reference: r.0,
            designation: r.1,
            quantite: r.2,
            unite: r.3,
        })
        .collect();

        Ok(BonLivraison {
            numero: livraison.numero,
            date: livraison.date_livraison,
            client: BlocClient {
                nom: client_nom,
                adresse: livraison.adresse_livraison,
                contact: livraison.contact_livraison,
                telephone: livraison.telephone_livraison,
            },
            transporteur: livraison.transporteur,
            nom_chauffeur: livraison.nom_chauffeur,
            numero_camion: livraison.numero_camion,
            articles,
            observation: livraison.observation,
            prepare_par: livraison.utilisateur_creation,
            recu_par: livraison
                .signataire_nom
                .unwrap_or_else(|| "_________________".to_string()),
        })
    }
}
