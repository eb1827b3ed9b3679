//! `elecpos-auth` — authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: claims are
//! validated deterministically, and role gates are pure functions over the
//! roles carried in the token.

pub mod claims;
pub mod jwt;
pub mod roles;

pub use claims::{validate_claims, JwtClaims, TokenValidationError, UserId};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use roles::{require_role, AuthzError, Role};
