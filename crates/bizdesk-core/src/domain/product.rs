// ============================================================================
// BizDesk Core - Product Entities
// File: crates/bizdesk-core/src/domain/product.rs
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Product name must be between 1 and 200 characters"))]
    pub name: String,

    #[validate(length(max = 64, message = "SKU too long"))]
    pub sku: Option<String>,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    pub category: Option<String>,
    pub brand: Option<String>,
    pub tags: Vec<String>,

    /// Sale price in CLP.
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: i64,

    #[validate(range(min = 0, message = "Cost cannot be negative"))]
    pub cost: i64,

    pub stock: i32,
    pub image_urls: Vec<String>,
    pub is_active: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(tenant_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.trim().to_string(),
            sku: None,
            description: None,
            category: None,
            brand: None,
            tags: Vec::new(),
            price: 0,
            cost: 0,
            stock: 0,
            image_urls: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn add_image(&mut self, url: String) {
        if !self.image_urls.contains(&url) {
            self.image_urls.push(url);
        }
        self.touch();
    }

    /// Tags trimmed, lower-cased, de-duplicated, order kept.
    pub fn set_tags(&mut self, tags: Vec<String>) {
        let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            let t = tag.trim().to_lowercase();
            if !t.is_empty() && !cleaned.contains(&t) {
                cleaned.push(t);
            }
        }
        self.tags = cleaned;
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductVariant {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Variant name must be between 1 and 200 characters"))]
    pub name: String,

    #[validate(length(max = 64, message = "SKU too long"))]
    pub sku: Option<String>,

    /// Free-form attributes such as `{"size": "L", "color": "red"}`.
    pub attributes: serde_json::Value,

    pub price_override: Option<i64>,
    pub stock: i32,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProductVariant {
    pub fn new(product: &Product, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: product.tenant_id,
            product_id: product.id,
            name: name.trim().to_string(),
            sku: None,
            attributes: serde_json::Value::Object(Default::default()),
            price_override: None,
            stock: 0,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn effective_price(&self, product: &Product) -> i64 {
        self.price_override.unwrap_or(product.price)
    }

    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}
