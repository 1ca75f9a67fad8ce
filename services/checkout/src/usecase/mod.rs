pub mod checkout;
pub mod inspect;
pub mod queue;
pub mod status;
pub mod worker;
