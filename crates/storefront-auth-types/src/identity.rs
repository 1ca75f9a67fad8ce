//! Gateway-injected identity headers extractor.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

use storefront_domain::user::UserRole;

pub const X_STOREFRONT_USER_ID: &str = "x-storefront-user-id";
pub const X_STOREFRONT_USER_ROLE: &str = "x-storefront-user-role";
pub const X_STOREFRONT_USER_EMAIL: &str = "x-storefront-user-email";
pub const X_STOREFRONT_USER_NAME: &str = "x-storefront-user-name";

/// Caller identity injected by the gateway after session validation.
///
/// Returns 401 if `x-storefront-user-id` or `x-storefront-user-role` is absent or
/// unparsable. Contact headers are optional. Role enforcement (403) is done by
/// handlers after extraction.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    pub user_id: Uuid,
    pub user_role: u8,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl IdentityHeaders {
    pub fn is_admin(&self) -> bool {
        UserRole::from_u8(self.user_role).is_some_and(UserRole::is_admin)
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 defines this as `fn -> impl Future + Send`; extract synchronously
    // and return a 'static async block so no borrow of `parts` is captured.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = header_str(parts, X_STOREFRONT_USER_ID).and_then(|s| s.parse::<Uuid>().ok());
        let user_role =
            header_str(parts, X_STOREFRONT_USER_ROLE).and_then(|s| s.parse::<u8>().ok());
        let email = header_str(parts, X_STOREFRONT_USER_EMAIL)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let name = header_str(parts, X_STOREFRONT_USER_NAME)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        async move {
            let user_id = user_id.ok_or(StatusCode::UNAUTHORIZED)?;
            let user_role = user_role.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self {
                user_id,
                user_role,
                email,
                name,
            })
        }
    }
}
