pub mod api;
pub mod callback;
pub mod delegate;
pub mod redirect;
pub mod saved_state;
pub mod sdk;
pub mod threeds2;
