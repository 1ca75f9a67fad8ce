pub mod checkout;
pub mod debug;
pub mod health;
pub mod status;
pub mod worker;

use axum::http::HeaderMap;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};

/// Whether the request carries `Authorization: Bearer <secret>`.
pub(crate) fn bearer_matches(headers: &HeaderMap, secret: &str) -> bool {
    headers.typed_get::<Authorization<Bearer>>().is_some_and(|auth| {
        !secret.is_empty() && constant_time_eq(auth.token().as_bytes(), secret.as_bytes())
    })
}

/// Timing depends on the lengths only, never on where the first differing byte is.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}
