//! Credential & session authority.
//!
//! Password hashing ([`PasswordHasher`]), token issuance and validation
//! ([`TokenAuthority`]), and the Axum middleware that gates routes on them.

pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::{AuthUser, require_admin, require_auth};
pub use password::PasswordHasher;
pub use token::{Claims, TokenAuthority};
