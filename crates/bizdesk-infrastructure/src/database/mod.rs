//! Database module (PostgreSQL adapters)

pub mod connection;
pub mod postgres;

pub use connection::{create_pool, run_migrations};

use bizdesk_core::error::DomainError;
use tracing::error;

/// Maps a sqlx error. Unique violations become `Conflict` naming `what`.
pub(crate) fn db_error(what: &str, e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return DomainError::Conflict(format!("{} already exists", what));
        }
    }
    error!("Database error on {}: {}", what, e);
    DomainError::DatabaseError(e.to_string())
}

/// `%term%` for ILIKE, with the wildcard characters of `term` escaped.
pub(crate) fn like_pattern(term: &Option<String>) -> Option<String> {
    term.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            let escaped = t.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            format!("%{}%", escaped)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(&Some(" 50%_off ".into())), Some("%50\\%\\_off%".into()));
        assert_eq!(like_pattern(&Some("   ".into())), None);
        assert_eq!(like_pattern(&None), None);
    }
}
