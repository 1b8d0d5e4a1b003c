pub mod consts;
pub mod errors;
pub mod ext_traits;
pub mod request;
pub mod types;

#[cfg(feature = "async_ext")]
pub mod channel;
#[cfg(feature = "async_ext")]
pub mod scope;

pub use errors::CustomResult;
