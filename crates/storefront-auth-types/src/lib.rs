//! Auth types shared across storefront services.
//!
//! Session handling lives in the gateway; services only see the identity it injects.

pub mod identity;
