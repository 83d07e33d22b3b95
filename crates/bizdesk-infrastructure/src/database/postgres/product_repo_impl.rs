// ============================================================================
// BizDesk Infrastructure - PostgreSQL Product Repository
// File: crates/bizdesk-infrastructure/src/database/postgres/product_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use bizdesk_core::domain::{Product, ProductVariant};
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::{ProductFilter, ProductRepository};

use crate::database::{db_error, like_pattern};

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    sku: Option<String>,
    description: Option<String>,
    category: Option<String>,
    brand: Option<String>,
    tags: Vec<String>,
    price: i64,
    cost: i64,
    stock: i32,
    image_urls: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            sku: row.sku,
            description: row.description,
            category: row.category,
            brand: row.brand,
            tags: row.tags,
            price: row.price,
            cost: row.cost,
            stock: row.stock,
            image_urls: row.image_urls,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct VariantRow {
    id: Uuid,
    tenant_id: Uuid,
    product_id: Uuid,
    name: String,
    sku: Option<String>,
    attributes: serde_json::Value,
    price_override: Option<i64>,
    stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<VariantRow> for ProductVariant {
    fn from(row: VariantRow) -> Self {
        ProductVariant {
            id: row.id,
            tenant_id: row.tenant_id,
            product_id: row.product_id,
            name: row.name,
            sku: row.sku,
            attributes: row.attributes,
            price_override: row.price_override,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = r#"id, tenant_id, name, sku, description, category, brand, tags, price, cost,
    stock, image_urls, is_active, created_at, updated_at, is_deleted, deleted_at"#;

const PRODUCT_FILTER: &str = r#"
    WHERE tenant_id = $1 AND NOT is_deleted
      AND ($2::text IS NULL OR name ILIKE $2 OR sku ILIKE $2)
      AND ($3::text IS NULL OR LOWER(category) = LOWER($3))
"#;

const VARIANT_COLUMNS: &str = r#"id, tenant_id, product_id, name, sku, attributes, price_override, stock,
    created_at, updated_at, is_deleted, deleted_at"#;

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, DomainError> {
        let search = like_pattern(&filter.search);
        let category = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty());

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products {} ORDER BY name LIMIT $4 OFFSET $5",
            PRODUCT_COLUMNS, PRODUCT_FILTER
        ))
        .bind(tenant_id)
        .bind(&search)
        .bind(category)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("product", e))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products {}", PRODUCT_FILTER))
            .bind(tenant_id)
            .bind(&search)
            .bind(category)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("product", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), pagination, total))
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Product>, DomainError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            PRODUCT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("product", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, product: &Product) -> Result<Product, DomainError> {
        let row: ProductRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO products (
                id, tenant_id, name, sku, description, category, brand, tags, price, cost,
                stock, image_urls, is_active, created_at, updated_at, is_deleted, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(product.id)
        .bind(product.tenant_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.tags)
        .bind(product.price)
        .bind(product.cost)
        .bind(product.stock)
        .bind(&product.image_urls)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.is_deleted)
        .bind(product.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("product SKU", e))?;

        info!(tenant_id = %row.tenant_id, product_id = %row.id, "Product created");
        Ok(row.into())
    }

    async fn update(&self, product: &Product) -> Result<Product, DomainError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            r#"
            UPDATE products
            SET name = $3, sku = $4, description = $5, category = $6, brand = $7, tags = $8,
                price = $9, cost = $10, stock = $11, image_urls = $12, is_active = $13, updated_at = $14
            WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(product.tenant_id)
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.tags)
        .bind(product.price)
        .bind(product.cost)
        .bind(product.stock)
        .bind(&product.image_urls)
        .bind(product.is_active)
        .bind(product.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("product SKU", e))?;

        row.map(Into::into).ok_or_else(|| DomainError::not_found("Product"))
    }

    async fn soft_delete(&self, tenant_id: &Uuid, id: &Uuid) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error("product", e))?;

        let deleted = sqlx::query(
            r#"
            UPDATE products SET is_deleted = TRUE, deleted_at = NOW(), updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("product", e))?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::not_found("Product"));
        }

        let variants = sqlx::query(
            r#"
            UPDATE product_variants SET is_deleted = TRUE, deleted_at = NOW(), updated_at = NOW()
            WHERE tenant_id = $1 AND product_id = $2 AND NOT is_deleted
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("product variant", e))?;

        tx.commit().await.map_err(|e| db_error("product", e))?;
        info!(
            tenant_id = %tenant_id,
            product_id = %id,
            variants = variants.rows_affected(),
            "Product deleted"
        );
        Ok(())
    }

    async fn list_variants(&self, tenant_id: &Uuid, product_id: &Uuid) -> Result<Vec<ProductVariant>, DomainError> {
        let rows: Vec<VariantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM product_variants WHERE tenant_id = $1 AND product_id = $2 AND NOT is_deleted ORDER BY name",
            VARIANT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("product variant", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_variant(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<ProductVariant>, DomainError> {
        let row: Option<VariantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM product_variants WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            VARIANT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("product variant", e))?;

        Ok(row.map(Into::into))
    }

    async fn create_variant(&self, variant: &ProductVariant) -> Result<ProductVariant, DomainError> {
        let row: VariantRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO product_variants (
                id, tenant_id, product_id, name, sku, attributes, price_override, stock,
                created_at, updated_at, is_deleted, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            VARIANT_COLUMNS
        ))
        .bind(variant.id)
        .bind(variant.tenant_id)
        .bind(variant.product_id)
        .bind(&variant.name)
        .bind(&variant.sku)
        .bind(&variant.attributes)
        .bind(variant.price_override)
        .bind(variant.stock)
        .bind(variant.created_at)
        .bind(variant.updated_at)
        .bind(variant.is_deleted)
        .bind(variant.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("product variant", e))?;

        Ok(row.into())
    }

    async fn update_variant(&self, variant: &ProductVariant) -> Result<ProductVariant, DomainError> {
        let row: Option<VariantRow> = sqlx::query_as(&format!(
            r#"
            UPDATE product_variants
            SET name = $3, sku = $4, attributes = $5, price_override = $6, stock = $7,
                updated_at = $8, is_deleted = $9, deleted_at = $10
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            VARIANT_COLUMNS
        ))
        .bind(variant.tenant_id)
        .bind(variant.id)
        .bind(&variant.name)
        .bind(&variant.sku)
        .bind(&variant.attributes)
        .bind(variant.price_override)
        .bind(variant.stock)
        .bind(variant.updated_at)
        .bind(variant.is_deleted)
        .bind(variant.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("product variant", e))?;

        row.map(Into::into).ok_or_else(|| DomainError::not_found("Product variant"))
    }
}
