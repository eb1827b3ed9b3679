//! Shared handler helpers: role gates and query parsing.

use axum::http::StatusCode;
use chrono::NaiveDate;

use elecpos_auth::{require_role, Role};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Roles allowed to write catalog, invoices, and accounting data.
pub const BACK_OFFICE: &[Role] = &[Role::Admin, Role::Manager];

/// Roles allowed to run the register (sales checkout).
pub const REGISTER: &[Role] = &[Role::Admin, Role::Manager, Role::Cashier];

/// Backup and user administration.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Gate a handler on the caller's roles; the error is a ready 403 response.
pub fn authorize(
    principal: &PrincipalContext,
    allowed: &[Role],
) -> Result<(), axum::response::Response> {
    require_role(principal.roles(), allowed).map_err(errors::authz_error_to_response)
}

/// Parse an optional `YYYY-MM-DD` query parameter.
pub fn parse_date(
    name: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, axum::response::Response> {
    match value {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_date",
                    format!("{name} must be YYYY-MM-DD"),
                )
            }),
    }
}
