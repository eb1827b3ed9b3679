//! Purchase invoice-number allocation.
//!
//! Invoice numbers are stored as strings but carry a numeric sequence: the
//! next number is the digit portion of the latest number plus one. Uniqueness
//! is enforced by the backend's constraint on `invoice_no`; allocation races
//! are resolved by a bounded retry loop that re-reads the latest number and
//! retries only on duplicate-key conflicts.

use std::future::Future;

/// Attempt budget for invoice-number allocation.
pub const MAX_ALLOCATE_ATTEMPTS: u32 = 5;

/// Compute the next invoice number from the latest stored one.
///
/// Non-digit characters are ignored, so `"INV-0042"` is followed by `"43"`.
/// With no prior invoices (or a number without digits) the sequence starts
/// at `"1"`.
pub fn next_invoice_no(latest: Option<&str>) -> String {
    let numeric = latest
        .map(|raw| raw.chars().filter(|c| c.is_ascii_digit()).collect::<String>())
        .filter(|digits| !digits.is_empty())
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or(0);

    (numeric + 1).to_string()
}

/// Run `attempt` up to `max_attempts` times, retrying only when `is_duplicate`
/// classifies the error as a duplicate-key conflict. Any other error aborts
/// immediately; an exhausted budget returns the last conflict error.
pub async fn allocate_with_retry<T, E, F, Fut>(
    max_attempts: u32,
    mut attempt: F,
    is_duplicate: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut n = 0;
    loop {
        match attempt(n).await {
            Ok(v) => return Ok(v),
            Err(e) if is_duplicate(&e) && n + 1 < max_attempts => n += 1,
            Err(e) => return Err(e),
        }
    }
}
