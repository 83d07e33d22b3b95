//! # BizDesk Security
//! 
//! Security utilities: tenant-scoped JWT and password hashing.

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtError, JwtService};
pub use password::{PasswordError, PasswordService};
