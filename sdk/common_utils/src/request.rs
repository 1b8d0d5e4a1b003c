use hyperswitch_masking::Maskable;
use serde::{Deserialize, Serialize};

pub type Headers = std::collections::HashSet<(String, Maskable<String>)>;

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

fn default_request_headers() -> [(String, Maskable<String>); 1] {
    [(
        crate::consts::CONTENT_TYPE.to_string(),
        crate::consts::APPLICATION_JSON.to_string().into(),
    )]
}

#[derive(Debug)]
pub struct Request {
    pub url: String,
    pub headers: Headers,
    pub method: Method,
    pub body: Option<RequestContent>,
}

pub enum RequestContent {
    Json(Box<dyn hyperswitch_masking::ErasedMaskSerialize + Send>),
}

impl std::fmt::Debug for RequestContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Json(_) => "JsonRequestBody",
        })
    }
}

impl RequestContent {
    pub fn json<T>(body: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Self::Json(Box::new(body))
    }

    /// Body rendered for logs, with every masked field hidden.
    pub fn masked_value(&self) -> serde_json::Value {
        match self {
            Self::Json(body) => body
                .masked_serialize()
                .unwrap_or(serde_json::json!({ "error": "failed to mask serialize request" })),
        }
    }
}

#[derive(Debug)]
pub struct RequestBuilder {
    pub url: String,
    pub headers: Headers,
    pub method: Method,
    pub body: Option<RequestContent>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: Method::Get,
            url: String::with_capacity(1024),
            headers: std::collections::HashSet::new(),
            body: None,
        }
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = url.into();
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn attach_default_headers(mut self) -> Self {
        self.headers.extend(default_request_headers());
        self
    }

    pub fn set_body<T: Into<RequestContent>>(mut self, body: T) -> Self {
        self.body.replace(body.into());
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw HTTP response handed back by an `ApiClient`.
#[derive(Clone, Debug)]
pub struct Response {
    pub headers: Option<reqwest::header::HeaderMap>,
    pub response: bytes::Bytes,
    pub status_code: u16,
}

impl Response {
    pub fn json(status_code: u16, body: &serde_json::Value) -> Self {
        Self {
            headers: None,
            response: bytes::Bytes::from(body.to_string()),
            status_code,
        }
    }
}

/// Builds `{base}{path}?{query_key}={value}` with the value percent encoded.
pub fn build_url(
    base_url: &str,
    path: &str,
    query: &[(&str, &str)],
) -> Result<url::Url, url::ParseError> {
    let base = url::Url::parse(base_url)?;
    let mut url = base.join(path)?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.iter());
    }
    Ok(url)
}
