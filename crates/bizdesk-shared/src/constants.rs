//! Application-wide constants

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 3600;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

pub const HEADER_TENANT_ID: &str = "x-tenant-id";
pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Upper bound for a single tax document sync request.
pub const MAX_SYNC_SPAN_DAYS: i64 = 366;
/// Pages fetched per sync chunk, whatever `last_page` the aggregator reports.
pub const MAX_SYNC_PAGES_PER_CHUNK: u32 = 500;
/// Upper bound for a notification rule delay (one week).
pub const MAX_NOTIFICATION_DELAY_MINUTES: i32 = 10_080;
/// Ceiling for one monthly amount (salary or bonus), CLP.
pub const MAX_MONTHLY_AMOUNT_CLP: i64 = 1_000_000_000_000;
/// Product image uploads.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_REQUEST_BODY_BYTES: usize = 12 * 1024 * 1024;
