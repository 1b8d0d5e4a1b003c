pub mod action;
pub mod errors;
pub mod events;
pub mod payments;
pub mod session;
pub mod status;
pub mod threeds2;
pub mod types;
