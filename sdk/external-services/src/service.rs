use std::{str::FromStr, time::Duration};

use common_utils::{
    ext_traits::{AsyncExt, BytesExt},
    request::{Headers, Method, Request, RequestContent, Response},
    CustomResult,
};
use domain_types::{errors::ApiClientError, types::Proxy};
use error_stack::{report, ResultExt};
use hyperswitch_masking::Maskable;
use interfaces::api::ApiClient;
use once_cell::sync::OnceCell;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use serde_json::Value;
use tracing::{field::Empty, Instrument};

use crate::shared_metrics;

/// reqwest backed [`ApiClient`], sharing one connection pool per proxy setup.
#[derive(Clone, Debug, Default)]
pub struct HttpApiClient {
    proxy: Proxy,
}

impl HttpApiClient {
    pub fn new(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

#[async_trait::async_trait]
impl ApiClient for HttpApiClient {
    async fn execute(
        &self,
        request: Request,
    ) -> CustomResult<Result<Response, Response>, ApiClientError> {
        call_checkout_api(&self.proxy, request).await
    }
}

/// Error body returned by the Checkout API.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutApiErrorResponse {
    error_code: Option<String>,
    message: Option<String>,
    error_type: Option<String>,
}

/// Sends `request` through `client` and decodes a JSON success body into `Resp`.
///
/// Error responses become [`ApiClientError::ErrorResponseReceived`] carrying the server message.
pub async fn execute_checkout_api_call<Resp>(
    client: &dyn ApiClient,
    request: Request,
    flow: &'static str,
) -> CustomResult<Resp, ApiClientError>
where
    Resp: serde::de::DeserializeOwned,
{
    let span = tracing::info_span!(
        "checkout_outgoing_api",
        flow,
        request_headers = Empty,
        request_body = Empty,
        status_code = Empty,
        latency = Empty,
        url = Empty,
        method = Empty,
    );
    async move {
        let start = tokio::time::Instant::now();

        let masked_headers = mask_headers(&request.headers);
        let masked_body = request.body.as_ref().map(RequestContent::masked_value);
        let method = request.method.to_string();
        tracing::Span::current().record("url", tracing::field::display(redact_query(&request.url)));
        tracing::Span::current().record("method", tracing::field::display(&method));

        shared_metrics::CHECKOUT_API_CALLS_TOTAL
            .with_label_values(&[flow, &method])
            .inc();

        let response = client
            .execute(request)
            .await
            .inspect_err(|error| {
                tracing::warn!(?error, "Failed getting response from the Checkout API");
            });

        let result = match response {
            Ok(Ok(body)) => {
                tracing::Span::current().record("status_code", body.status_code);
                body.response
                    .parse_struct::<Resp>(flow)
                    .change_context(ApiClientError::ResponseDeserializationFailed(flow))
            }
            Ok(Err(body)) => {
                tracing::Span::current().record("status_code", body.status_code);
                Err(error_response(&body))
            }
            Err(err) => Err(err),
        };

        let elapsed = start.elapsed();
        shared_metrics::CHECKOUT_API_CALL_LATENCY
            .with_label_values(&[flow])
            .observe(elapsed.as_secs_f64());
        if let Err(error) = &result {
            shared_metrics::CHECKOUT_API_CALL_ERRORS
                .with_label_values(&[flow, error_label(error.current_context())])
                .inc();
        }

        if let Some(body) = masked_body {
            tracing::Span::current().record("request_body", tracing::field::display(body));
        }
        tracing::Span::current().record("request_headers", tracing::field::display(masked_headers));
        tracing::Span::current().record("latency", elapsed.as_millis());
        tracing::info!(tag = "outgoing_api", log_type = "api", "Outgoing Request completed");
        result
    }
    .instrument(span)
    .await
}

fn error_response(body: &Response) -> error_stack::Report<ApiClientError> {
    let message = body
        .response
        .parse_struct::<CheckoutApiErrorResponse>("CheckoutApiErrorResponse")
        .map(|error| {
            [error.error_code, error.error_type, error.message]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" - ")
        })
        .unwrap_or_else(|_| String::from_utf8_lossy(&body.response).into_owned());

    report!(ApiClientError::ErrorResponseReceived {
        status_code: body.status_code,
        message,
    })
}

fn error_label(error: &ApiClientError) -> &'static str {
    match error {
        ApiClientError::ErrorResponseReceived { .. } => "error_response",
        ApiClientError::ResponseDeserializationFailed(_) | ApiClientError::ResponseDecodingFailed => {
            "invalid_response"
        }
        ApiClientError::RequestTimeoutReceived => "timeout",
        _ => "transport",
    }
}

fn mask_headers(headers: &Headers) -> Value {
    let masked = headers
        .iter()
        .fold(serde_json::Map::new(), |mut acc, (k, v)| {
            let value = match v {
                Maskable::Masked(_) => Value::String("*** alloc::string::String ***".to_string()),
                Maskable::Normal(iv) => Value::String(iv.to_owned()),
            };
            acc.insert(k.clone(), value);
            acc
        });
    Value::Object(masked)
}

/// Client keys travel in the query string, keep them out of the logs.
fn redact_query(url: &str) -> String {
    url.split_once('?')
        .map(|(path, _)| format!("{path}?***"))
        .unwrap_or_else(|| url.to_string())
}

/// Sends `request` with the pooled client matching the proxy setup.
pub async fn call_checkout_api(
    proxy: &Proxy,
    request: Request,
) -> CustomResult<Result<Response, Response>, ApiClientError> {
    let url =
        reqwest::Url::parse(&request.url).change_context(ApiClientError::UrlEncodingFailed)?;
    let bypass_proxy = proxy.bypass_proxy_urls.contains(&url.to_string());
    let client = pooled_client(proxy, bypass_proxy)?;
    let headers = header_map(request.headers)?;

    let builder = match request.method {
        Method::Get => client.get(url),
        Method::Post => client.post(url),
    }
    .headers(headers);
    let builder = match request.body {
        Some(RequestContent::Json(payload)) => builder.json(&payload),
        None => builder,
    };

    let response = builder.send().await.map_err(|error| {
        tracing::warn!(%error, "Unable to send request to the Checkout API");
        if error.is_timeout() {
            report!(ApiClientError::RequestTimeoutReceived)
        } else {
            report!(ApiClientError::RequestNotSent(error.to_string()))
        }
    });

    response.async_map(read_response).await?
}

static DIRECT_CLIENT: OnceCell<Client> = OnceCell::new();
static PROXIED_CLIENT: OnceCell<Client> = OnceCell::new();

/// One connection pool for direct traffic, one for proxied traffic.
fn pooled_client(proxy: &Proxy, bypass_proxy: bool) -> CustomResult<Client, ApiClientError> {
    let is_direct = bypass_proxy || (proxy.http_url.is_none() && proxy.https_url.is_none());
    let cell = if is_direct {
        &DIRECT_CLIENT
    } else {
        &PROXIED_CLIENT
    };
    cell.get_or_try_init(|| {
        client_builder(proxy, is_direct)?
            .build()
            .change_context(ApiClientError::ClientConstructionFailed)
            .inspect_err(|error| tracing::error!(?error, "Failed to construct http client"))
    })
    .cloned()
}

fn client_builder(
    proxy: &Proxy,
    is_direct: bool,
) -> CustomResult<reqwest::ClientBuilder, ApiClientError> {
    let idle_timeout = Duration::from_secs(proxy.idle_pool_connection_timeout.unwrap_or_default());
    let mut builder = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_idle_timeout(idle_timeout);
    if is_direct {
        return Ok(builder);
    }

    if let Some(url) = proxy.https_url.as_deref() {
        let https_proxy = reqwest::Proxy::https(url)
            .change_context(ApiClientError::InvalidProxyConfiguration)
            .attach_printable("invalid https proxy url")?;
        builder = builder.proxy(https_proxy);
    }
    if let Some(url) = proxy.http_url.as_deref() {
        let http_proxy = reqwest::Proxy::http(url)
            .change_context(ApiClientError::InvalidProxyConfiguration)
            .attach_printable("invalid http proxy url")?;
        builder = builder.proxy(http_proxy);
    }
    Ok(builder)
}

/// Success and redirect answers are `Ok`, client and server errors `Err`, anything else fails.
async fn read_response(
    response: reqwest::Response,
) -> CustomResult<Result<Response, Response>, ApiClientError> {
    let status_code = response.status().as_u16();
    let is_success = matches!(status_code, 200..=202 | 204 | 302);
    if !is_success && !(400..=599).contains(&status_code) {
        tracing::warn!(status_code, "Unexpected response from the Checkout API");
        return Err(report!(ApiClientError::UnexpectedServerResponse));
    }

    let headers = Some(response.headers().to_owned());
    let body = response
        .bytes()
        .await
        .change_context(ApiClientError::ResponseDecodingFailed)?;
    let response = Response {
        headers,
        response: body,
        status_code,
    };
    Ok(if is_success {
        Ok(response)
    } else {
        Err(response)
    })
}

fn header_map(headers: Headers) -> CustomResult<HeaderMap, ApiClientError> {
    headers
        .into_iter()
        .try_fold(HeaderMap::new(), |mut header_map, (name, value)| {
            let name = HeaderName::from_str(&name)
                .change_context(ApiClientError::HeaderMapConstructionFailed)?;
            let value = HeaderValue::from_str(&value.into_inner())
                .change_context(ApiClientError::HeaderMapConstructionFailed)?;
            header_map.append(name, value);
            Ok(header_map)
        })
}
