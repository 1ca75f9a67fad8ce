//! Mock gateway identity for integration tests.
//!
//! Services behind the gateway receive `x-storefront-user-*` headers injected after
//! session validation. `MockAuth` produces those headers directly so no gateway is needed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use storefront_auth_types::identity::{
    X_STOREFRONT_USER_EMAIL, X_STOREFRONT_USER_ID, X_STOREFRONT_USER_NAME,
    X_STOREFRONT_USER_ROLE,
};
use storefront_domain::user::UserRole;

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: Uuid,
    pub role: UserRole,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl MockAuth {
    pub fn customer(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: UserRole::Customer,
            email: Some("buyer@example.com".to_owned()),
            name: None,
        }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: UserRole::Admin,
            email: None,
            name: None,
        }
    }

    /// Return headers as if the gateway injected them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(X_STOREFRONT_USER_ID),
            HeaderValue::from_str(&self.user_id.to_string()).unwrap(),
        );
        map.insert(
            HeaderName::from_static(X_STOREFRONT_USER_ROLE),
            HeaderValue::from_str(&self.role.as_u8().to_string()).unwrap(),
        );
        if let Some(email) = &self.email {
            map.insert(
                HeaderName::from_static(X_STOREFRONT_USER_EMAIL),
                HeaderValue::from_str(email).unwrap(),
            );
        }
        if let Some(name) = &self.name {
            map.insert(
                HeaderName::from_static(X_STOREFRONT_USER_NAME),
                HeaderValue::from_str(name).unwrap(),
            );
        }
        map
    }
}
