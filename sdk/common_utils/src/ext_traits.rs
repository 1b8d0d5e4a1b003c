//! Extension traits for parsing and encoding the Checkout API payloads.

use error_stack::ResultExt;
use serde::{Deserialize, Serialize};

use crate::errors::{self, CustomResult};

/// Extending functionalities of `bytes::Bytes`
pub trait BytesExt {
    /// Convert `bytes::Bytes` into type `<T>` using `serde::Deserialize`
    fn parse_struct<'de, T>(&'de self, type_name: &'static str) -> CustomResult<T, errors::ParsingError>
    where
        T: Deserialize<'de>;
}

impl BytesExt for bytes::Bytes {
    fn parse_struct<'de, T>(&'de self, type_name: &'static str) -> CustomResult<T, errors::ParsingError>
    where
        T: Deserialize<'de>,
    {
        serde_json::from_slice::<T>(self.as_ref())
            .change_context(errors::ParsingError::StructParseFailure(type_name))
            .attach_printable_lazy(|| format!("Unable to parse {type_name} from bytes"))
    }
}

/// Extending functionalities of `String` for base64 wrapped JSON payloads
pub trait StringExt {
    /// Decode a standard base64 string and parse the JSON inside it.
    fn parse_base64_struct<T>(&self, type_name: &'static str) -> CustomResult<T, errors::ParsingError>
    where
        T: serde::de::DeserializeOwned;
}

impl StringExt for str {
    fn parse_base64_struct<T>(&self, type_name: &'static str) -> CustomResult<T, errors::ParsingError>
    where
        T: serde::de::DeserializeOwned,
    {
        use base64::Engine;

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(self.trim())
            .change_context(errors::ParsingError::Base64DecodeError)
            .attach_printable_lazy(|| format!("Unable to decode {type_name}"))?;
        serde_json::from_slice::<T>(&decoded)
            .change_context(errors::ParsingError::StructParseFailure(type_name))
    }
}

/// Extending functionalities of `Wrapper types`
#[cfg(feature = "async_ext")]
#[async_trait::async_trait]
pub trait AsyncExt<A, B> {
    /// Output type of the map function
    type WrappedSelf<T>;

    /// Extending map by allowing functions which are async
    async fn async_map<F, Fut>(self, func: F) -> Self::WrappedSelf<B>
    where
        F: FnOnce(A) -> Fut + Send,
        Fut: futures::Future<Output = B> + Send;
}

#[cfg(feature = "async_ext")]
#[async_trait::async_trait]
impl<A: Send, B, E: Send> AsyncExt<A, B> for Result<A, E> {
    type WrappedSelf<T> = Result<T, E>;

    async fn async_map<F, Fut>(self, func: F) -> Self::WrappedSelf<B>
    where
        F: FnOnce(A) -> Fut + Send,
        Fut: futures::Future<Output = B> + Send,
    {
        match self {
            Ok(a) => Ok(func(a).await),
            Err(err) => Err(err),
        }
    }
}

/// Encode a serializable value into standard base64 JSON.
pub fn encode_base64_json<T: Serialize>(value: &T) -> CustomResult<String, errors::ParsingError> {
    use base64::Engine;

    let json = serde_json::to_vec(value).change_context(errors::ParsingError::EncodeError("json"))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}
