//! Action handling core: concrete delegates for every action type, the type keyed dispatch and
//! the generic orchestrator that keeps one stable set of streams for the hosting component.

pub mod delegates;
pub mod generic;
pub mod host;
pub mod observer;
pub mod provider;
pub mod redirect_handler;
pub mod repositories;

pub use generic::DefaultGenericActionDelegate;
pub use host::ActionHost;
pub use provider::ActionDelegateProvider;
