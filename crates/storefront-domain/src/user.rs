//! User domain types.

use serde::{Deserialize, Serialize};

/// User permission level.
///
/// Wire format: `u8` (0 = Customer, 1 = Admin). Unknown values are treated as the
/// lowest privilege by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer = 0,
    Admin = 1,
}

impl UserRole {
    /// Convert from `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Customer),
            1 => Some(Self::Admin),
            _ => None,
        }
    }

    /// Convert to `u8` wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_admin(self) -> bool {
        self >= Self::Admin
    }
}
