//! Session backed checkout: the session RPCs, the merchant "taken over" gate in front of them,
//! and the ambient setup (configuration, logging) of a host embedding the SDK.

pub mod configs;
pub mod consts;
pub mod error;
pub mod event_handler;
pub mod interactor;
pub mod logger;
pub mod repository;
pub mod result;

pub use event_handler::{SessionComponentEventHandler, SessionSavedState};
pub use interactor::{FlowState, SessionInteractor};
pub use repository::{DefaultSessionRepository, SessionRepository};
