use async_trait::async_trait;
use common::{AppointmentId, ClientId, InvoiceId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{Draft, DraftId, DraftStore, DraftStoreError, Result, Stage};

/// PostgreSQL-backed draft store implementation.
#[derive(Clone)]
pub struct PostgresDraftStore {
    pool: PgPool,
}

impl PostgresDraftStore {
    /// Creates a new PostgreSQL draft store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_draft(row: PgRow) -> Result<Draft> {
        let stage: String = row.try_get("stage")?;
        let form_data: serde_json::Value = row.try_get("form_data")?;

        Ok(Draft {
            id: DraftId::from_uuid(row.try_get::<Uuid, _>("id")?),
            stage: stage.parse()?,
            client_id: row
                .try_get::<Option<Uuid>, _>("client_id")?
                .map(ClientId::from_uuid),
            appointment_id: row
                .try_get::<Option<Uuid>, _>("appointment_id")?
                .map(AppointmentId::from_uuid),
            invoice_id: row
                .try_get::<Option<Uuid>, _>("invoice_id")?
                .map(InvoiceId::from_uuid),
            form_data: serde_json::from_value(form_data)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl DraftStore for PostgresDraftStore {
    #[tracing::instrument(skip(self, draft), fields(draft_id = %draft.id, stage = %draft.stage))]
    async fn save(&self, draft: &Draft) -> Result<()> {
        let form_data = serde_json::to_value(&draft.form_data)?;

        // client_id is only ever filled in, never overwritten with another client
        sqlx::query(
            r#"
            INSERT INTO drafts (id, stage, client_id, appointment_id, invoice_id, form_data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                stage = EXCLUDED.stage,
                client_id = COALESCE(drafts.client_id, EXCLUDED.client_id),
                appointment_id = EXCLUDED.appointment_id,
                invoice_id = EXCLUDED.invoice_id,
                form_data = EXCLUDED.form_data,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(draft.id.as_uuid())
        .bind(draft.stage.as_str())
        .bind(draft.client_id.map(|id| id.as_uuid()))
        .bind(draft.appointment_id.map(|id| id.as_uuid()))
        .bind(draft.invoice_id.map(|id| id.as_uuid()))
        .bind(form_data)
        .bind(draft.created_at)
        .bind(draft.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!("draft saved");
        Ok(())
    }

    async fn load(&self, id: DraftId) -> Result<Option<Draft>> {
        let row = sqlx::query(
            r#"
            SELECT id, stage, client_id, appointment_id, invoice_id, form_data, created_at, updated_at
            FROM drafts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_draft).transpose()
    }

    async fn list_pending(&self) -> Result<Vec<Draft>> {
        let rows = sqlx::query(
            r#"
            SELECT id, stage, client_id, appointment_id, invoice_id, form_data, created_at, updated_at
            FROM drafts
            WHERE stage <> $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(Stage::Completed.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_draft).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: DraftId) -> Result<()> {
        let result = sqlx::query("DELETE FROM drafts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("no draft to delete");
            return Err(DraftStoreError::NotFound(id));
        }
        Ok(())
    }
}
