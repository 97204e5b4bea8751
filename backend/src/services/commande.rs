//! Order ledger service
//!
//! Orders are mutable only while in `brouillon`; every status change goes
//! through the one-directional status machine. Validation checks stock
//! availability at that point in time; the reservation itself only happens
//! when the delivery is fulfilled.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::sequence::{self, SequenceService, SEQ_COMMANDES};
use crate::models::{
    calculer_totaux, Commande, CommandeDetail, LigneCommande, StatutCommande, TAUX_TVA_DEFAUT,
};
use shared::validation;

/// Order ledger service
#[derive(Clone)]
pub struct CommandeService {
    db: PgPool,
}

/// One order line as submitted
#[derive(Debug, Deserialize)]
pub struct LigneInput {
    pub produit_id: Uuid,
    pub quantite: Decimal,
    pub prix_unitaire: Decimal,
    pub observation: Option<String>,
}

/// Input for creating an order
#[derive(Debug, Deserialize)]
pub struct CreateCommandeInput {
    pub client_id: Uuid,
    pub lignes: Vec<LigneInput>,
    pub taux_tva: Option<Decimal>,
    pub adresse_livraison: Option<String>,
    pub contact_livraison: Option<String>,
    pub telephone_livraison: Option<String>,
    pub observation: Option<String>,
    pub utilisateur: Option<String>,
}

/// Input for updating a draft order
#[derive(Debug, Deserialize)]
pub struct UpdateCommandeInput {
    pub lignes: Option<Vec<LigneInput>>,
    pub taux_tva: Option<Decimal>,
    pub adresse_livraison: Option<String>,
    pub contact_livraison: Option<String>,
    pub telephone_livraison: Option<String>,
    pub observation: Option<String>,
}

/// Export filters for the CSV listing
#[derive(Debug, Default, Deserialize)]
pub struct ExportFilters {
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub statut: Option<StatutCommande>,
    pub client_id: Option<Uuid>,
}

/// Order statistics
#[derive(Debug, Serialize)]
pub struct CommandeStats {
    pub total: i64,
    pub par_statut: HashMap<String, i64>,
    pub commandes_aujourd_hui: i64,
    pub commandes_cette_semaine: i64,
    pub commandes_ce_mois: i64,
    /// Revenue excluding cancelled orders
    pub montant_total: Decimal,
    pub montant_ce_mois: Decimal,
    pub top_clients: Vec<TopClient>,
}

/// One of the top-5 clients by revenue
#[derive(Debug, Serialize)]
pub struct TopClient {
    pub client_id: Uuid,
    pub montant: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct CommandeRow {
    id: Uuid,
    numero: String,
    client_id: Uuid,
    date_commande: DateTime<Utc>,
    statut: String,
    sous_total: Decimal,
    taux_tva: Decimal,
    montant_tva: Decimal,
    montant_total: Decimal,
    adresse_livraison: String,
    contact_livraison: String,
    telephone_livraison: String,
    observation: String,
    date_validation: Option<DateTime<Utc>>,
    date_livraison: Option<DateTime<Utc>>,
    date_annulation: Option<DateTime<Utc>>,
    motif_annulation: Option<String>,
    utilisateur_creation: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const COMMANDE_COLUMNS: &str = "id, numero, client_id, date_commande, statut, sous_total, \
     taux_tva, montant_tva, montant_total, adresse_livraison, contact_livraison, \
     telephone_livraison, observation, date_validation, date_livraison, date_annulation, \
     motif_annulation, utilisateur_creation, created_at, updated_at";

fn statut_from_str(statut: &str) -> AppResult<StatutCommande> {
    StatutCommande::from_str(statut)
        .ok_or_else(|| AppError::Internal(format!("Unknown order status in database: {}", statut)))
}

fn commande_from_row(row: CommandeRow) -> AppResult<Commande> {
    let statut = statut_from_str(&row.statut)?;
    Ok(Commande {
        id: row.id,
        numero: row.numero,
        client_id: row.client_id,
        date_commande: row.date_commande,
        statut,
        sous_total: row.sous_total,
        taux_tva: row.taux_tva,
        montant_tva: row.montant_tva,
        montant_total: row.montant_total,
        adresse_livraison: row.adresse_livraison,
        contact_livraison: row.contact_livraison,
        telephone_livraison: row.telephone_livraison,
        observation: row.observation,
        date_validation: row.date_validation,
        date_livraison: row.date_livraison,
        date_annulation: row.date_annulation,
        motif_annulation: row.motif_annulation,
        utilisateur_creation: row.utilisateur_creation,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl CommandeService {
    /// Create a new CommandeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn valider_lignes(&self, lignes: &[LigneInput]) -> AppResult<()> {
        if lignes.is_empty() {
            return Err(AppError::ValidationError(
                "An order must contain at least one line".to_string(),
            ));
        }
        for ligne in lignes {
            if validation::validate_quantite(ligne.quantite).is_err() {
                return Err(AppError::Validation {
                    field: "quantite".to_string(),
                    message: "Line quantity must be positive".to_string(),
                    message_fr: "La quantite doit etre superieure a 0".to_string(),
                });
            }
            if ligne.prix_unitaire <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "prix_unitaire".to_string(),
                    message: "Line unit price must be positive".to_string(),
                    message_fr: "Le prix unitaire doit etre superieur a 0".to_string(),
                });
            }
            let existe = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM produits WHERE id = $1)",
            )
            .bind(ligne.produit_id)
            .fetch_one(&self.db)
            .await?;
            if !existe {
                return Err(AppError::NotFound("Produit".to_string()));
            }
        }
        Ok(())
    }

    async fn inserer_lignes(
        tx: &mut Transaction<'_, Postgres>,
        commande_id: Uuid,
        lignes: &[LigneInput],
    ) -> AppResult<Vec<LigneCommande>> {
        let mut inserees = Vec::with_capacity(lignes.len());
        for ligne in lignes {
            let total = ligne.quantite * ligne.prix_unitaire;
            let observation = ligne.observation.clone().unwrap_or_default();
            let id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO lignes_commande (commande_id, produit_id, quantite, prix_unitaire,
                                             total, observation)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(commande_id)
            .bind(ligne.produit_id)
            .bind(ligne.quantite)
            .bind(ligne.prix_unitaire)
            .bind(total)
            .bind(&observation)
            .fetch_one(&mut **tx)
            .await?;

            inserees.push(LigneCommande {
                id,
                produit_id: ligne.produit_id,
                quantite: ligne.quantite,
                prix_unitaire: ligne.prix_unitaire,
                total,
                observation,
            });
        }
        Ok(inserees)
    }

    async fn lignes_de(&self, commande_id: Uuid) -> AppResult<Vec<LigneCommande>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, Decimal, Decimal, Decimal, String)>(
            r#"
            SELECT id, produit_id, quantite, prix_unitaire, total, observation
            FROM lignes_commande
            WHERE commande_id = $1
            ORDER BY id
            "#,
        )
        .bind(commande_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LigneCommande {
                id: r.0,
                produit_id: r.1,
                quantite: r.2,
                prix_unitaire: r.3,
                total: r.4,
                observation: r.5,
            })
            .collect())
    }

    /// Create a draft order
    pub async fn creer(&self, input: CreateCommandeInput) -> AppResult<CommandeDetail> {
        let client_existe = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM clients WHERE id = $1)",
        )
        .bind(input.client_id)
        .fetch_one(&self.db)
        .await?;
        if !client_existe {
            return Err(AppError::NotFound("Client".to_string()));
        }

        self.valider_lignes(&input.lignes).await?;

        let taux_tva = input.taux_tva.unwrap_or(TAUX_TVA_DEFAUT);
        if let Err(msg) = validation::validate_taux_tva(taux_tva) {
            return Err(AppError::Validation {
                field: "taux_tva".to_string(),
                message: "VAT rate must be between 0 and 100".to_string(),
                message_fr: msg.to_string(),
            });
        }

        let montants: Vec<(Decimal, Decimal)> = input
            .lignes
            .iter()
            .map(|l| (l.quantite, l.prix_unitaire))
            .collect();
        let totaux = calculer_totaux(&montants, taux_tva);

        let mut tx = self.db.begin().await?;

        let seq = SequenceService::suivant_dans_tx(&mut tx, SEQ_COMMANDES).await?;
        let numero = sequence::numero_commande(seq, Utc::now());

        let row = sqlx::query_as::<_, CommandeRow>(&format!(
            r#"
            INSERT INTO commandes (numero, client_id, statut, sous_total, taux_tva, montant_tva,
                                   montant_total, adresse_livraison, contact_livraison,
                                   telephone_livraison, observation, utilisateur_creation)
            VALUES ($1, $2, 'brouillon', $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            COMMANDE_COLUMNS
        ))
        .bind(&numero)
        .bind(input.client_id)
        .bind(totaux.sous_total)
        .bind(taux_tva)
        .bind(totaux.montant_tva)
        .bind(totaux.montant_total)
        .bind(input.adresse_livraison.unwrap_or_default())
        .bind(input.contact_livraison.unwrap_or_default())
        .bind(input.telephone_livraison.unwrap_or_default())
        .bind(input.observation.unwrap_or_default())
        .bind(input.utilisateur.unwrap_or_else(|| "Systeme".to_string()))
        .fetch_one(&mut *tx)
        .await?;

        let lignes = Self::inserer_lignes(&mut tx, row.id, &input.lignes).await?;

        tx.commit().await?;

        Ok(CommandeDetail {
            commande: commande_from_row(row)?,
            lignes,
        })
    }

    /// Get an order with its lines
    pub async fn get(&self, commande_id: Uuid) -> AppResult<CommandeDetail> {
        let row = sqlx::query_as::<_, CommandeRow>(&format!(
            "SELECT {} FROM commandes WHERE id = $1",
            COMMANDE_COLUMNS
        ))
        .bind(commande_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Commande".to_string()))?;

        let lignes = self.lignes_de(commande_id).await?;

        Ok(CommandeDetail {
            commande: commande_from_row(row)?,
            lignes,
        })
    }

    /// List all orders, most recent first
    pub async fn lister(&self) -> AppResult<Vec<Commande>> {
        let rows = sqlx::query_as::<_, CommandeRow>(&format!(
            "SELECT {} FROM commandes ORDER BY date_commande DESC",
            COMMANDE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(commande_from_row).collect()
    }

    /// List the orders of one client, most recent first
    pub async fn lister_par_client(&self, client_id: Uuid) -> AppResult<Vec<Commande>> {
        let rows = sqlx::query_as::<_, CommandeRow>(&format!(
            "SELECT {} FROM commandes WHERE client_id = $1 ORDER BY date_commande DESC",
            COMMANDE_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(commande_from_row).collect()
    }

    /// Update a draft order; totals are recomputed when lines change
    pub async fn mettre_a_jour(
        &self,
        commande_id: Uuid,
        input: UpdateCommandeInput,
    ) -> AppResult<CommandeDetail> {
        if let Some(lignes) = &input.lignes {
            self.valider_lignes(lignes).await?;
        }
        if let Some(taux) = input.taux_tva {
            if let Err(msg) = validation::validate_taux_tva(taux) {
                return Err(AppError::Validation {
                    field: "taux_tva".to_string(),
                    message: "VAT rate must be between 0 and 100".to_string(),
                    message_fr: msg.to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, CommandeRow>(&format!(
            "SELECT {} FROM commandes WHERE id = $1 FOR UPDATE",
            COMMANDE_COLUMNS
        ))
        .bind(commande_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Commande".to_string()))?;

        let statut = statut_from_str(&row.statut)?;
        if !statut.est_modifiable() {
            return Err(AppError::InvalidStateTransition(
                "Only draft orders can be modified".to_string(),
            ));
        }

        let taux_tva = input.taux_tva.unwrap_or(row.taux_tva);
        let (sous_total, montant_tva, montant_total) = match &input.lignes {
            Some(lignes) => {
                sqlx::query("DELETE FROM lignes_commande WHERE commande_id = $1")
                    .bind(commande_id)
                    .execute(&mut *tx)
                    .await?;
                Self::inserer_lignes(&mut tx, commande_id, lignes).await?;

                let montants: Vec<(Decimal, Decimal)> =
                    lignes.iter().map(|l| (l.quantite, l.prix_unitaire)).collect();
                let totaux = calculer_totaux(&montants, taux_tva);
                (totaux.sous_total, totaux.montant_tva, totaux.montant_total)
            }
            None => (row.sous_total, row.montant_tva, row.montant_total),
        };

        let updated = sqlx::query_as::<_, CommandeRow>(&format!(
            r#"
            UPDATE commandes
            SET sous_total = $1, taux_tva = $2, montant_tva = $3, montant_total = $4,
                adresse_livraison = $5, contact_livraison = $6, telephone_livraison = $7,
                observation = $8, updated_at = NOW()
            WHERE id = $9
            RETURNING {}
            "#,
            COMMANDE_COLUMNS
        ))
        .bind(sous_total)
        .bind(taux_tva)
        .bind(montant_tva)
        .bind(montant_total)
        .bind(input.adresse_livraison.unwrap_or(row.adresse_livraison))
        .bind(input.contact_livraison.unwrap_or(row.contact_livraison))
        .bind(input.telephone_livraison.unwrap_or(row.telephone_livraison))
        .bind(input.observation.unwrap_or(row.observation))
        .bind(commande_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let lignes = self.lignes_de(commande_id).await?;
        Ok(CommandeDetail {
            commande: commande_from_row(updated)?,
            lignes,
        })
    }

    /// Validate a draft order after checking stock availability per line.
    ///
    /// The check is a point-in-time availability test, not a reservation:
    /// stock is only deducted when the delivery is fulfilled.
    pub async fn valider(&self, commande_id: Uuid) -> AppResult<CommandeDetail> {
        let mut tx = self.db.begin().await?;

        let statut_brut = sqlx::query_scalar::<_, String>(
            "SELECT statut FROM commandes WHERE id = $1 FOR UPDATE",
        )
        .bind(commande_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Commande".to_string()))?;

        let statut = statut_from_str(&statut_brut)?;
        if statut != StatutCommande::Brouillon {
            return Err(AppError::InvalidStateTransition(
                "Only draft orders can be validated".to_string(),
            ));
        }

        let lignes = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT produit_id, quantite FROM lignes_commande WHERE commande_id = $1",
        )
        .bind(commande_id)
        .fetch_all(&mut *tx)
        .await?;

        for (produit_id, quantite) in lignes {
            let disponible = sqlx::query_scalar::<_, Decimal>(
                "SELECT COALESCE(SUM(quantite), 0) FROM stock_records WHERE produit_id = $1",
            )
            .bind(produit_id)
            .fetch_one(&mut *tx)
            .await?;

            if disponible < quantite {
                return Err(AppError::InsufficientStock {
                    disponible,
                    demande: quantite,
                });
            }
        }

        sqlx::query(
            r#"
            UPDATE commandes
            SET statut = 'validee', date_validation = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(commande_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(commande_id).await
    }

    /// Cancel an order; prior stock movements are never reversed
    pub async fn annuler(&self, commande_id: Uuid, motif: Option<String>) -> AppResult<CommandeDetail> {
        let mut tx = self.db.begin().await?;

        let statut_brut = sqlx::query_scalar::<_, String>(
            "SELECT statut FROM commandes WHERE id = $1 FOR UPDATE",
        )
        .bind(commande_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Commande".to_string()))?;

        let statut = statut_from_str(&statut_brut)?;
        if !statut.est_annulable() {
            return Err(AppError::InvalidStateTransition(
                "This order can no longer be cancelled".to_string(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE commandes
            SET statut = 'annulee', motif_annulation = $1, date_annulation = NOW(),
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(motif.unwrap_or_else(|| "Annulation par l'utilisateur".to_string()))
        .bind(commande_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(commande_id).await
    }

    /// Delete a draft order and its lines
    pub async fn supprimer(&self, commande_id: Uuid) -> AppResult<()> {
        let statut_brut =
            sqlx::query_scalar::<_, String>("SELECT statut FROM commandes WHERE id = $1")
                .bind(commande_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Commande".to_string()))?;

        let statut = statut_from_str(&statut_brut)?;
        if !statut.est_modifiable() {
            return Err(AppError::InvalidStateTransition(
                "Only draft orders can be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM commandes WHERE id = $1")
            .bind(commande_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Transition an order inside the caller's transaction, enforcing the
    /// status machine. Used by the delivery ledger.
    pub(crate) async fn changer_statut_dans_tx(
        tx: &mut Transaction<'_, Postgres>,
        commande_id: Uuid,
        cible: StatutCommande,
    ) -> AppResult<()> {
        let statut_brut = sqlx::query_scalar::<_, String>(
            "SELECT statut FROM commandes WHERE id = $1 FOR UPDATE",
        )
        .bind(commande_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Commande".to_string()))?;

        let statut = statut_from_str(&statut_brut)?;
        if !statut.peut_transiter_vers(cible) {
            return Err(AppError::InvalidStateTransition(format!(
                "{} -> {}",
                statut.as_str(),
                cible.as_str()
            )));
        }

        let date_livraison = if cible == StatutCommande::Livree {
            Some(Utc::now())
        } else {
            None
        };

        sqlx::query(
            r#"
            UPDATE commandes
            SET statut = $1, date_livraison = COALESCE($2, date_livraison), updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(cible.as_str())
        .bind(date_livraison)
        .bind(commande_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Order statistics
    pub async fn stats(&self) -> AppResult<CommandeStats> {
        let rows = sqlx::query_as::<_, (String, DateTime<Utc>, Decimal, Uuid)>(
            "SELECT statut, date_commande, montant_total, client_id FROM commandes",
        )
        .fetch_all(&self.db)
        .await?;

        let maintenant = Utc::now();
        let aujourd_hui = maintenant.date_naive();
        let debut_semaine = aujourd_hui
            - chrono::Duration::days(aujourd_hui.weekday().num_days_from_sunday() as i64);
        let debut_mois = aujourd_hui.with_day(1).unwrap_or(aujourd_hui);

        let mut par_statut: HashMap<String, i64> = HashMap::new();
        let mut commandes_aujourd_hui = 0;
        let mut commandes_cette_semaine = 0;
        let mut commandes_ce_mois = 0;
        let mut montant_total = Decimal::ZERO;
        let mut montant_ce_mois = Decimal::ZERO;
        let mut par_client: HashMap<Uuid, Decimal> = HashMap::new();

        for (statut, date_commande, montant, client_id) in &rows {
            *par_statut.entry(statut.clone()).or_insert(0) += 1;

            let date = date_commande.date_naive();
            if date == aujourd_hui {
                commandes_aujourd_hui += 1;
            }
            if date >= debut_semaine {
                commandes_cette_semaine += 1;
            }
            if date >= debut_mois {
                commandes_ce_mois += 1;
            }

            if statut != StatutCommande::Annulee.as_str() {
                montant_total += *montant;
                if date >= debut_mois {
                    montant_ce_mois += *montant;
                }
                *par_client.entry(*client_id).or_insert(Decimal::ZERO) += *montant;
            }
        }

        let mut top_clients: Vec<TopClient> = par_client
            .into_iter()
            .map(|(client_id, montant)| TopClient { client_id, montant })
            .collect();
        top_clients.sort_by(|a, b| b.montant.cmp(&a.montant));
        top_clients.truncate(5);

        Ok(CommandeStats {
            total: rows.len() as i64,
            par_statut,
            commandes_aujourd_hui,
            commandes_cette_semaine,
            commandes_ce_mois,
            montant_total,
            montant_ce_mois,
            top_clients,
        })
    }

    /// Export orders as CSV, with optional filters
    pub async fn exporter_csv(&self, filters: ExportFilters) -> AppResult<Vec<u8>> {
        let rows = sqlx::query_as::<_, (String, DateTime<Utc>, String, Decimal, Decimal, Decimal, String)>(
            r#"
            SELECT c.numero, c.date_commande, cl.nom, c.sous_total, c.montant_tva,
                   c.montant_total, c.statut
            FROM commandes c
            JOIN clients cl ON cl.id = c.client_id
            WHERE ($1::timestamptz IS NULL OR c.date_commande >= $1)
              AND ($2::timestamptz IS NULL OR c.date_commande <= $2)
              AND ($3::text IS NULL OR c.statut = $3)
              AND ($4::uuid IS NULL OR c.client_id = $4)
            ORDER BY c.date_commande DESC
            "#,
        )
        .bind(filters.date_debut)
        .bind(filters.date_fin)
        .bind(filters.statut.map(|s| s.as_str()))
        .bind(filters.client_id)
        .fetch_all(&self.db)
        .await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Numero", "Date", "Client", "Montant HT", "TVA", "Montant TTC", "Statut"])
            .map_err(|e| AppError::Internal(e.to_string()))?;
        for (numero, date, client, sous_total, tva, total, statut) in rows {
            writer
                .write_record([
                    numero,
                    date.format("%d/%m/%Y").to_string(),
                    client,
                    sous_total.to_string(),
                    tva.to_string(),
                    total.to_string(),
                    statut,
                ])
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
