//! # BizDesk Infrastructure
//!
//! PostgreSQL repositories and outbound HTTP / SMTP adapters for the
//! ports declared in `bizdesk-core`.

pub mod database;
pub mod gateways;

pub use database::{create_pool, run_migrations};
pub use database::postgres::*;
pub use gateways::{
    GeminiGenerator, GoogleWebResearcher, ImgbbImageHost, OpenAiGenerator, OpenFacturaSource, SmtpMailer,
};
