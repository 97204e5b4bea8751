//! Client referential service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Client, TypeClient};
use shared::validation;

/// Client referential service
#[derive(Clone)]
pub struct ClientService {
    db: PgPool,
}

/// Input for creating a client
#[derive(Debug, Deserialize)]
pub struct CreateClientInput {
    pub nom: String,
    pub email: String,
    pub telephone: String,
    pub type_client: Option<TypeClient>,
    pub adresse: Option<String>,
    pub ville: Option<String>,
}

/// Input for updating a client
#[derive(Debug, Deserialize)]
pub struct UpdateClientInput {
    pub nom: Option<String>,
    pub telephone: Option<String>,
    pub type_client: Option<TypeClient>,
    pub adresse: Option<String>,
    pub ville: Option<String>,
}

type ClientRow = (
    Uuid,
    String,
    String,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

const CLIENT_COLUMNS: &str =
    "id, nom, email, telephone, type_client, adresse, ville, created_at, updated_at";

fn client_from_row(row: ClientRow) -> AppResult<Client> {
    let type_client = TypeClient::from_str(&row.4)
        .ok_or_else(|| AppError::Internal(format!("Unknown client type in database: {}", row.4)))?;
    Ok(Client {
        id: row.0,
        nom: row.1,
        email: row.2,
        telephone: row.3,
        type_client,
        adresse: row.5,
        ville: row.6,
        created_at: row.7,
        updated_at: row.8,
    })
}

impl ClientService {
    /// Create a new ClientService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a client; the email must be unique (case-insensitive)
    pub async fn creer(&self, input: CreateClientInput) -> AppResult<Client> {
        if input.nom.trim().is_empty() {
            return Err(AppError::Validation {
                field: "nom".to_string(),
                message: "Client name cannot be empty".to_string(),
                message_fr: "Le nom du client est obligatoire".to_string(),
            });
        }
        if let Err(msg) = validation::validate_email(&input.email) {
            return Err(AppError::Validation {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
                message_fr: msg.to_string(),
            });
        }
        if let Err(msg) = validation::validate_telephone(&input.telephone) {
            return Err(AppError::Validation {
                field: "telephone".to_string(),
                message: "Invalid phone number format".to_string(),
                message_fr: msg.to_string(),
            });
        }

        let existe = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM clients WHERE LOWER(email) = LOWER($1))",
        )
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;

        if existe {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let row = sqlx::query_as::<_, ClientRow>(&format!(
            r#"
            INSERT INTO clients (nom, email, telephone, type_client, adresse, ville)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(&input.nom)
        .bind(&input.email)
        .bind(&input.telephone)
        .bind(input.type_client.unwrap_or_default().as_str())
        .bind(input.adresse.unwrap_or_default())
        .bind(input.ville.unwrap_or_default())
        .fetch_one(&self.db)
        .await?;

        client_from_row(row)
    }

    /// Get a client by id
    pub async fn get(&self, client_id: Uuid) -> AppResult<Client> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {} FROM clients WHERE id = $1",
            CLIENT_COLUMNS
        ))
        .bind(client_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        client_from_row(row)
    }

    /// List all clients
    pub async fn lister(&self) -> AppResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {} FROM clients ORDER BY nom",
            CLIENT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(client_from_row).collect()
    }

    /// Update a client; the email is the client's identity and cannot change
    pub async fn mettre_a_jour(
        &self,
        client_id: Uuid,
        input: UpdateClientInput,
    ) -> AppResult<Client> {
        let existing = self.get(client_id).await?;

        let nom = input.nom.unwrap_or(existing.nom);
        if nom.trim().is_empty() {
            return Err(AppError::Validation {
                field: "nom".to_string(),
                message: "Client name cannot be empty".to_string(),
                message_fr: "Le nom du client est obligatoire".to_string(),
            });
        }
        let telephone = input.telephone.unwrap_or(existing.telephone);
        if let Err(msg) = validation::validate_telephone(&telephone) {
            return Err(AppError::Validation {
                field: "telephone".to_string(),
                message: "Invalid phone number format".to_string(),
                message_fr: msg.to_string(),
            });
        }
        let type_client = input.type_client.unwrap_or(existing.type_client);
        let adresse = input.adresse.unwrap_or(existing.adresse);
        let ville = input.ville.unwrap_or(existing.ville);

        let row = sqlx::query_as::<_, ClientRow>(&format!(
            r#"
            UPDATE clients
            SET nom = $1, telephone = $2, type_client = $3, adresse = $4, ville = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(&nom)
        .bind(&telephone)
        .bind(type_client.as_str())
        .bind(&adresse)
        .bind(&ville)
        .bind(client_id)
        .fetch_one(&self.db)
        .await?;

        client_from_row(row)
    }
}
