//! Common types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub type EntityId = Uuid;

pub fn new_id() -> EntityId {
    Uuid::new_v4()
}

/// Page request as it arrives in a query string. Out-of-range values are
/// clamped rather than refused.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, per_page: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }.normalized()
    }

    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.normalized().per_page)
    }

    pub fn offset(&self) -> i64 {
        let p = self.normalized();
        i64::from(p.page - 1) * i64::from(p.per_page)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: i64) -> Self {
        let p = pagination.normalized();
        Self {
            items,
            page: p.page,
            per_page: p.per_page,
            total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination::new(0, 1000);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, MAX_PAGE_SIZE);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_offset() {
        let p = Pagination::new(3, 20);
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn test_page_map_keeps_counts() {
        let page = Page::new(vec![1, 2, 3], Pagination::new(2, 3), 9);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.total, 9);
    }
}
