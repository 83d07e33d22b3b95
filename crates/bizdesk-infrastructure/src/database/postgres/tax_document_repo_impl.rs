// ============================================================================
// BizDesk Infrastructure - PostgreSQL Tax Document Repository
// File: crates/bizdesk-infrastructure/src/database/postgres/tax_document_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use bizdesk_core::domain::{Direction, TaxDocument, TaxDocumentItem, UpsertOutcome};
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::{TaxDocumentFilter, TaxDocumentRepository};

use crate::database::db_error;

pub struct PgTaxDocumentRepository {
    pool: PgPool,
}

impl PgTaxDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    tenant_id: Uuid,
    direction: String,
    document_type: i32,
    folio: i64,
    emitter_rut: String,
    emitter_name: String,
    receiver_rut: Option<String>,
    issue_date: NaiveDate,
    net_amount: i64,
    exempt_amount: i64,
    tax_amount: i64,
    total_amount: i64,
    raw: serde_json::Value,
    synced_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl DocumentRow {
    fn into_document(self, items: Vec<TaxDocumentItem>) -> TaxDocument {
        TaxDocument {
            id: self.id,
            tenant_id: self.tenant_id,
            direction: Direction::from_str(&self.direction).unwrap_or_default(),
            document_type: self.document_type,
            folio: self.folio,
            emitter_rut: self.emitter_rut,
            emitter_name: self.emitter_name,
            receiver_rut: self.receiver_rut,
            issue_date: self.issue_date,
            net_amount: self.net_amount,
            exempt_amount: self.exempt_amount,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
            raw: self.raw,
            synced_at: self.synced_at,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    tax_document_id: Uuid,
    line_number: i32,
    name: String,
    description: Option<String>,
    quantity: f64,
    unit_price: f64,
    amount: i64,
}

impl From<ItemRow> for TaxDocumentItem {
    fn from(row: ItemRow) -> Self {
        TaxDocumentItem {
            id: row.id,
            tax_document_id: row.tax_document_id,
            line_number: row.line_number,
            name: row.name,
            description: row.description,
            quantity: row.quantity,
            unit_price: row.unit_price,
            amount: row.amount,
        }
    }
}

const COLUMNS: &str = r#"id, tenant_id, direction, document_type, folio, emitter_rut, emitter_name,
    receiver_rut, issue_date, net_amount, exempt_amount, tax_amount, total_amount, raw, synced_at,
    created_at, updated_at, is_deleted, deleted_at"#;

// `raw` is left out of list results; lists return an empty object in its place.
const LIST_COLUMNS: &str = r#"id, tenant_id, direction, document_type, folio, emitter_rut, emitter_name,
    receiver_rut, issue_date, net_amount, exempt_amount, tax_amount, total_amount, '{}'::jsonb AS raw,
    synced_at, created_at, updated_at, is_deleted, deleted_at"#;

const ITEM_COLUMNS: &str =
    "id, tax_document_id, line_number, name, description, quantity, unit_price, amount";

const FILTER: &str = r#"
    WHERE tenant_id = $1 AND NOT is_deleted
      AND ($2::date IS NULL OR issue_date >= $2)
      AND ($3::date IS NULL OR issue_date <= $3)
      AND ($4::int IS NULL OR document_type = $4)
      AND ($5::text IS NULL OR direction = $5)
"#;

#[async_trait]
impl TaxDocumentRepository for PgTaxDocumentRepository {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &TaxDocumentFilter,
        pagination: Pagination,
    ) -> Result<Page<TaxDocument>, DomainError> {
        let direction = filter.direction.map(|d| d.as_str());

        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tax_documents {} ORDER BY issue_date DESC, folio DESC LIMIT $6 OFFSET $7",
            LIST_COLUMNS, FILTER
        ))
        .bind(tenant_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.document_type)
        .bind(direction)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("tax document", e))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM tax_documents {}", FILTER))
            .bind(tenant_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.document_type)
            .bind(direction)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("tax document", e))?;

        let documents = rows.into_iter().map(|r| r.into_document(Vec::new())).collect();
        Ok(Page::new(documents, pagination, total))
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<TaxDocument>, DomainError> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tax_documents WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("tax document", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tax_document_items WHERE tax_document_id = $1 ORDER BY line_number",
            ITEM_COLUMNS
        ))
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("tax document item", e))?;

        Ok(Some(row.into_document(items.into_iter().map(Into::into).collect())))
    }

    async fn upsert(&self, document: &TaxDocument) -> Result<UpsertOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error("tax document", e))?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            r#"SELECT id FROM tax_documents
               WHERE tenant_id = $1 AND emitter_rut = $2 AND folio = $3
               FOR UPDATE"#,
        )
        .bind(document.tenant_id)
        .bind(&document.emitter_rut)
        .bind(document.folio)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("tax document", e))?;

        let (document_id, outcome) = match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE tax_documents
                    SET direction = $2, document_type = $3, emitter_name = $4, receiver_rut = $5,
                        issue_date = $6, net_amount = $7, exempt_amount = $8, tax_amount = $9,
                        total_amount = $10, raw = $11, synced_at = $12, updated_at = NOW(),
                        is_deleted = FALSE, deleted_at = NULL
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(document.direction.as_str())
                .bind(document.document_type)
                .bind(&document.emitter_name)
                .bind(&document.receiver_rut)
                .bind(document.issue_date)
                .bind(document.net_amount)
                .bind(document.exempt_amount)
                .bind(document.tax_amount)
                .bind(document.total_amount)
                .bind(&document.raw)
                .bind(document.synced_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("tax document", e))?;

                sqlx::query("DELETE FROM tax_document_items WHERE tax_document_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| db_error("tax document item", e))?;

                (id, UpsertOutcome::Updated)
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO tax_documents ({})
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
                    "#,
                    COLUMNS
                ))
                .bind(document.id)
                .bind(document.tenant_id)
                .bind(document.direction.as_str())
                .bind(document.document_type)
                .bind(document.folio)
                .bind(&document.emitter_rut)
                .bind(&document.emitter_name)
                .bind(&document.receiver_rut)
                .bind(document.issue_date)
                .bind(document.net_amount)
                .bind(document.exempt_amount)
                .bind(document.tax_amount)
                .bind(document.total_amount)
                .bind(&document.raw)
                .bind(document.synced_at)
                .bind(document.created_at)
                .bind(document.updated_at)
                .bind(document.is_deleted)
                .bind(document.deleted_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("tax document", e))?;

                (document.id, UpsertOutcome::Created)
            }
        };

        for item in &document.items {
            sqlx::query(&format!(
                "INSERT INTO tax_document_items ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                ITEM_COLUMNS
            ))
            .bind(Uuid::new_v4())
            .bind(document_id)
            .bind(item.line_number)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.amount)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("tax document item", e))?;
        }

        tx.commit().await.map_err(|e| db_error("tax document", e))?;
        debug!(
            tenant_id = %document.tenant_id,
            folio = document.folio,
            outcome = ?outcome,
            "Tax document stored"
        );

        Ok(outcome)
    }
}
