//! Foreman REST API client.
//!
//! [`Client`] wraps a shared `reqwest::Client` with the server's `/api/` root,
//! basic-auth credentials and the [`Endpoints`] templates. The per-object
//! modules build on its `get`/`post`/`put`/`delete`/`query` primitives.

pub mod override_value;
pub mod smart_class_parameter;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use smart_class_parameter::ParameterScope;

/// Maximum length of a response body copied into logs and errors.
const MAX_LOG_BODY_LENGTH: usize = 200;

const USER_AGENT: &str = concat!("foreman-provider/", env!("CARGO_PKG_VERSION"));

fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };
    truncated.replace(|c: char| c.is_control(), "")
}

/// Path templates for the Foreman endpoints, relative to `/api/`.
///
/// Placeholders: `{parameter_id}`, `{parent_kind}` and `{parent_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Collection of override values under a smart class parameter.
    pub override_values: String,
    /// Collection of parameters under a host, host group or environment.
    pub parameters: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            override_values: "smart_class_parameters/{parameter_id}/override_values".to_string(),
            parameters: "{parent_kind}/{parent_id}/parameters".to_string(),
        }
    }
}

impl Endpoints {
    /// `smart_class_parameters/{parameter_id}/override_values`
    pub fn override_values(&self, parameter_id: i64) -> String {
        self.override_values
            .replace("{parameter_id}", &parameter_id.to_string())
    }

    /// A single override value.
    pub fn override_value(&self, parameter_id: i64, id: i64) -> String {
        format!("{}/{}", self.override_values(parameter_id), id)
    }

    /// `{parent_kind}/{parent_id}/parameters`
    pub fn parameters(&self, scope: &ParameterScope) -> String {
        self.parameters
            .replace("{parent_kind}", scope.kind())
            .replace("{parent_id}", &scope.parent_id().to_string())
    }

    /// A single parameter of a parent.
    pub fn parameter(&self, scope: &ParameterScope, id: i64) -> String {
        format!("{}/{}", self.parameters(scope), id)
    }
}

/// A Foreman `search` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter(String);

impl SearchFilter {
    /// `name="<value>"`, with the value quoted literally.
    pub fn name(value: &str) -> Self {
        Self(format!("name=\"{}\"", value))
    }

    /// The expression sent as the `search` query parameter.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Envelope of a Foreman index/search response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResponse<T> {
    /// Number of objects in the collection.
    #[serde(default)]
    pub total: Option<u64>,
    /// Number of objects matching the search.
    #[serde(default)]
    pub subtotal: Option<u64>,
    /// Current page.
    #[serde(default)]
    pub page: Option<u64>,
    /// Page size.
    #[serde(default)]
    pub per_page: Option<u64>,
    /// The search expression Foreman applied.
    #[serde(default)]
    pub search: Option<String>,
    /// The matching objects.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> QueryResponse<T> {
    /// Convert every result, keeping the envelope metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> QueryResponse<U> {
        QueryResponse {
            total: self.total,
            subtotal: self.subtotal,
            page: self.page,
            per_page: self.per_page,
            search: self.search,
            results: self.results.into_iter().map(f).collect(),
        }
    }

    /// Number of matches, preferring Foreman's `subtotal`.
    pub fn match_count(&self) -> u64 {
        self.subtotal.unwrap_or(self.results.len() as u64)
    }

    /// The single match, or a [`ProviderError::Query`] when there are zero or several.
    ///
    /// A `subtotal` of one must agree with the number of results returned.
    pub fn into_single(self, what: &str) -> Result<T, ProviderError> {
        match self.match_count() {
            0 => Err(ProviderError::Query(format!(
                "{} search returned no results",
                what
            ))),
            1 => {
                let returned = self.results.len();
                let mut results = self.results.into_iter();
                match (results.next(), returned) {
                    (Some(single), 1) => Ok(single),
                    _ => Err(ProviderError::Decode(format!(
                        "{} search reported one match but returned {} results",
                        what, returned
                    ))),
                }
            },
            n => Err(ProviderError::Query(format!(
                "{} search returned more than 1 result ({})",
                what, n
            ))),
        }
    }
}

/// Wrap `value` under `key`, e.g. `{"override_value": {...}}`.
pub fn wrap_json<T: Serialize>(key: &str, value: &T) -> Result<Value, ProviderError> {
    let inner = serde_json::to_value(value)?;
    let mut outer = serde_json::Map::new();
    outer.insert(key.to_string(), inner);
    Ok(Value::Object(outer))
}

/// Decode a JSON scalar of any type into its string form.
///
/// Foreman returns `value` and `default_value` typed by the parameter's
/// `parameter_type`; the provider always handles them as strings.
pub(crate) fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    })
}

/// HTTP client for one Foreman server.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base: Url,
    endpoints: Endpoints,
    username: Option<String>,
    password: Option<String>,
    default_query: Vec<(&'static str, String)>,
}

impl Client {
    /// Build a client from the provider configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base = config.api_base()?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(config.tls_insecure.unwrap_or(false))
            .build()?;

        let mut default_query = Vec::new();
        if let Some(id) = config.location_id {
            default_query.push(("location_id", id.to_string()));
        }
        if let Some(id) = config.organization_id {
            default_query.push(("organization_id", id.to_string()));
        }

        Ok(Self {
            http,
            base,
            endpoints: Endpoints::default(),
            username: config.username.clone(),
            password: config.password.clone(),
            default_query,
        })
    }

    /// Replace the endpoint templates.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// The endpoint templates in use.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Resolve an endpoint path against the `/api/` root.
    pub fn url(&self, path: &str) -> Result<Url, ProviderError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&self.default_query);
        if let Some(user) = &self.username {
            req = req.basic_auth(user, self.password.as_ref());
        }
        req
    }

    /// GET `path` and decode the body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let body = self.send(self.request(Method::GET, url.clone()), &url).await?;
        decode(&url, &body)
    }

    /// POST a JSON body to `path` and decode the response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let payload = serde_json::to_vec(body)?;
        debug!("POST {} body={}", url, String::from_utf8_lossy(&payload));
        let req = self
            .request(Method::POST, url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        let body = self.send(req, &url).await?;
        decode(&url, &body)
    }

    /// PUT a JSON body to `path` and decode the response.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let payload = serde_json::to_vec(body)?;
        debug!("PUT {} body={}", url, String::from_utf8_lossy(&payload));
        let req = self
            .request(Method::PUT, url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        let body = self.send(req, &url).await?;
        decode(&url, &body)
    }

    /// DELETE `path`; the response body is ignored.
    pub async fn delete(&self, path: &str) -> Result<(), ProviderError> {
        let url = self.url(path)?;
        debug!("DELETE {}", url);
        self.send(self.request(Method::DELETE, url.clone()), &url)
            .await
            .map(|_| ())
    }

    /// GET `path` with a `search` parameter and decode the typed result set.
    pub async fn query<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: &SearchFilter,
    ) -> Result<QueryResponse<T>, ProviderError> {
        let url = self.url(path)?;
        debug!("GET {} search={}", url, filter.as_str());
        let req = self
            .request(Method::GET, url.clone())
            .query(&[("search", filter.as_str())]);
        let body = self.send(req, &url).await?;
        decode(&url, &body)
    }

    async fn send(&self, req: RequestBuilder, url: &Url) -> Result<String, ProviderError> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            debug!(status = status.as_u16(), "response {}", sanitize_for_log(&body));
            return Ok(body);
        }

        error!("API error: {} {} - {}", status, url.path(), sanitize_for_log(&body));
        Err(match status {
            StatusCode::NOT_FOUND => ProviderError::NotFound(url.path().to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::PermissionDenied(format!("{} {}", status, url.path()))
            },
            _ => ProviderError::Api {
                status: status.as_u16(),
                message: sanitize_for_log(&body),
            },
        })
    }
}

fn decode<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body)
        .map_err(|e| ProviderError::Decode(format!("{}: {}", url.path(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> Client {
        Client::new(&ProviderConfig {
            server_url: Some("https://foreman.example.com".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_templates() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.override_values(7),
            "smart_class_parameters/7/override_values"
        );
        assert_eq!(
            endpoints.override_value(7, 12),
            "smart_class_parameters/7/override_values/12"
        );
        assert_eq!(
            endpoints.parameter(&ParameterScope::HostGroup(3), 41),
            "hostgroups/3/parameters/41"
        );
    }

    #[test]
    fn test_url_resolution() {
        let client = client();
        assert_eq!(
            client.url("/hosts/1/parameters").unwrap().as_str(),
            "https://foreman.example.com/api/hosts/1/parameters"
        );
    }

    #[test]
    fn test_custom_endpoints() {
        let client = client().with_endpoints(Endpoints {
            override_values: "v2/params/{parameter_id}/overrides".to_string(),
            ..Endpoints::default()
        });
        assert_eq!(
            client.endpoints().override_values(5),
            "v2/params/5/overrides"
        );
    }

    #[test]
    fn test_search_filter_quotes_literally() {
        assert_eq!(SearchFilter::name("os=RedHat").as_str(), "name=\"os=RedHat\"");
    }

    #[test]
    fn test_wrap_json() {
        let wrapped = wrap_json("override_value", &json!({"match": "a"})).unwrap();
        assert_eq!(wrapped, json!({"override_value": {"match": "a"}}));
    }

    #[test]
    fn test_query_response_into_single() {
        let one: QueryResponse<u32> =
            serde_json::from_value(json!({"total": 4, "subtotal": 1, "results": [9]})).unwrap();
        assert_eq!(one.into_single("thing").unwrap(), 9);

        let none: QueryResponse<u32> =
            serde_json::from_value(json!({"subtotal": 0, "results": []})).unwrap();
        assert!(matches!(none.into_single("thing"), Err(ProviderError::Query(_))));

        let many: QueryResponse<u32> =
            serde_json::from_value(json!({"subtotal": 2, "results": [1, 2]})).unwrap();
        let err = many.into_single("thing").unwrap_err();
        assert!(err.to_string().contains("more than 1"));
    }

    #[test]
    fn test_query_response_subtotal_must_match_results() {
        let short: QueryResponse<u32> =
            serde_json::from_value(json!({"subtotal": 1, "results": []})).unwrap();
        assert!(matches!(short.into_single("thing"), Err(ProviderError::Decode(_))));

        let long: QueryResponse<u32> =
            serde_json::from_value(json!({"subtotal": 1, "results": [1, 2]})).unwrap();
        let err = long.into_single("thing").unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
        assert!(err.to_string().contains("returned 2 results"));
    }

    #[test]
    fn test_query_response_without_subtotal_counts_results() {
        let resp: QueryResponse<u32> = serde_json::from_value(json!({"results": [3]})).unwrap();
        assert_eq!(resp.match_count(), 1);
    }

    #[test]
    fn test_sanitize_for_log_truncates() {
        let long = "x".repeat(500);
        let out = sanitize_for_log(&long);
        assert!(out.contains("[truncated, 500 bytes total]"));
        assert_eq!(sanitize_for_log("a\nb"), "ab");
    }
}
