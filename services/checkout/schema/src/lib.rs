//! sea-orm entities owned by the checkout service.

pub mod orders;
pub mod product_variants;
