//! Request facade.
//!
//! # Responsibilities
//! - Read-mostly view over the raw incoming descriptor
//! - Derived properties (protocol, host, ips, subdomains, negotiation, freshness)
//!   recomputed on every access
//! - URL/path/query rewrites for internal routing-style middleware
//!
//! # Design Decisions
//! - Forwarded headers are only honoured when the application trusts proxies
//! - The parsed query is cached per exact query string
//! - `original_url` is captured once and never follows rewrites

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};

use axum::body::Bytes;
use axum::http::uri::PathAndQuery;
use axum::http::{header, HeaderMap, Method, Uri, Version};
use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::http::{accepts, fresh, mime};
use crate::net::raw::RawRequest;

/// Parsed query string, preserving pair order and repeated keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn parse(querystring: &str) -> Self {
        let pairs = form_urlencoded::parse(querystring.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Serialize back into `a=1&b=2` form.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Incoming request facade.
#[derive(Debug)]
pub struct Request {
    raw: RawRequest,
    proxy: bool,
    subdomain_offset: usize,
    original_url: String,
    body_used: bool,
    query_cache: Mutex<HashMap<String, Arc<Query>>>,
}

impl Request {
    pub fn new(raw: RawRequest, config: &AppConfig) -> Self {
        let original_url = raw.uri.to_string();
        Self {
            raw,
            proxy: config.proxy,
            subdomain_offset: config.subdomain_offset,
            original_url,
            body_used: false,
            query_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn raw(&self) -> &RawRequest {
        &self.raw
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.raw.headers
    }

    /// Header lookup; `Referer` and `Referrer` are interchangeable.
    pub fn get(&self, field: &str) -> Option<&str> {
        let field = field.to_ascii_lowercase();
        match field.as_str() {
            "referer" | "referrer" => self
                .header_str("referrer")
                .or_else(|| self.header_str("referer")),
            name => self.header_str(name),
        }
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.raw.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn method(&self) -> &Method {
        &self.raw.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.raw.method = method;
    }

    pub fn version(&self) -> Version {
        self.raw.version
    }

    /// Request target as received (path and query).
    pub fn url(&self) -> &str {
        self.raw
            .uri
            .path_and_query()
            .map(PathAndQuery::as_str)
            .unwrap_or("/")
    }

    pub fn set_url(&mut self, url: &str) -> Result<()> {
        self.raw.uri = url
            .parse::<Uri>()
            .map_err(|e| Error::InvalidUri(e.to_string()))?;
        Ok(())
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn origin(&self) -> String {
        format!("{}://{}", self.protocol(), self.host())
    }

    /// Full URL; an absolute original URL is returned as is.
    pub fn href(&self) -> String {
        let lower = self.original_url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return self.original_url.clone();
        }
        format!("{}{}", self.origin(), self.original_url)
    }

    pub fn path(&self) -> &str {
        self.raw.uri.path()
    }

    pub fn set_path(&mut self, path: &str) -> Result<()> {
        if self.path() == path {
            return Ok(());
        }
        let query = self.raw.uri.query().map(str::to_string);
        self.rewrite(path, query.as_deref())
    }

    pub fn querystring(&self) -> &str {
        self.raw.uri.query().unwrap_or("")
    }

    pub fn set_querystring(&mut self, querystring: &str) -> Result<()> {
        if self.querystring() == querystring {
            return Ok(());
        }
        let path = self.path().to_string();
        self.rewrite(&path, Some(querystring))
    }

    /// `?` plus the query string, or empty.
    pub fn search(&self) -> String {
        match self.querystring() {
            "" => String::new(),
            qs => format!("?{qs}"),
        }
    }

    pub fn set_search(&mut self, search: &str) -> Result<()> {
        self.set_querystring(search.strip_prefix('?').unwrap_or(search))
    }

    /// Parsed query, cached by the exact query string.
    pub fn query(&self) -> Arc<Query> {
        let querystring = self.querystring();
        let mut cache = self
            .query_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(querystring.to_string())
            .or_insert_with(|| Arc::new(Query::parse(querystring)))
            .clone()
    }

    pub fn set_query(&mut self, query: &Query) -> Result<()> {
        self.set_querystring(&query.to_query_string())
    }

    fn rewrite(&mut self, path: &str, query: Option<&str>) -> Result<()> {
        let target = match query {
            Some(q) if !q.is_empty() => format!("{path}?{q}"),
            _ => path.to_string(),
        };
        let mut parts = self.raw.uri.clone().into_parts();
        parts.path_and_query = Some(
            target
                .parse::<PathAndQuery>()
                .map_err(|e| Error::InvalidUri(e.to_string()))?,
        );
        self.raw.uri = Uri::from_parts(parts).map_err(|e| Error::InvalidUri(e.to_string()))?;
        Ok(())
    }

    /// Request `Content-Length`, if present and numeric.
    pub fn length(&self) -> Option<u64> {
        self.header_str("content-length")?.trim().parse().ok()
    }

    /// `https` on encrypted channels; forwarded proto only behind a trusted proxy.
    pub fn protocol(&self) -> &str {
        if self.raw.encrypted {
            return "https";
        }
        if !self.proxy {
            return "http";
        }
        self.header_str("x-forwarded-proto")
            .and_then(|proto| proto.split(',').next())
            .map(str::trim)
            .filter(|proto| !proto.is_empty())
            .unwrap_or("http")
    }

    pub fn secure(&self) -> bool {
        self.protocol() == "https"
    }

    /// Host including port. Empty when unknown.
    pub fn host(&self) -> &str {
        let forwarded = if self.proxy {
            self.header_str("x-forwarded-host")
        } else {
            None
        };
        let host = forwarded
            .or_else(|| self.header_str("host"))
            .or_else(|| self.raw.uri.authority().map(|a| a.as_str()))
            .unwrap_or("");
        host.split(',').next().unwrap_or("").trim()
    }

    /// Host without port; IPv6 literals keep their brackets.
    pub fn hostname(&self) -> &str {
        let host = self.host();
        if host.starts_with('[') {
            return match host.find(']') {
                Some(end) => &host[..=end],
                None => host,
            };
        }
        host.split(':').next().unwrap_or("")
    }

    /// Client chain from `X-Forwarded-For`, only behind a trusted proxy.
    pub fn ips(&self) -> Vec<&str> {
        if !self.proxy {
            return Vec::new();
        }
        self.header_str("x-forwarded-for")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First forwarded address, or the socket peer.
    pub fn ip(&self) -> String {
        if let Some(first) = self.ips().first() {
            return (*first).to_string();
        }
        self.raw
            .remote_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default()
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.raw.remote_addr
    }

    /// Subdomain labels, most significant first, with the configured
    /// number of trailing labels dropped. Empty for IP hosts.
    pub fn subdomains(&self) -> Vec<String> {
        let hostname = self.hostname();
        if hostname.is_empty() {
            return Vec::new();
        }
        let bare = hostname.trim_start_matches('[').trim_end_matches(']');
        if bare.parse::<IpAddr>().is_ok() {
            return Vec::new();
        }
        hostname
            .split('.')
            .rev()
            .skip(self.subdomain_offset)
            .map(str::to_string)
            .collect()
    }

    /// Request media type without parameters.
    pub fn content_type(&self) -> &str {
        self.header_str("content-type").map(mime::essence).unwrap_or("")
    }

    pub fn charset(&self) -> Option<String> {
        self.header_str("content-type").and_then(mime::charset)
    }

    fn has_body(&self) -> bool {
        self.raw.headers.contains_key(header::TRANSFER_ENCODING) || self.length().is_some()
    }

    /// Match the request content type; `None` when there is no body.
    pub fn is(&self, types: &[&str]) -> Option<String> {
        if !self.has_body() {
            return None;
        }
        mime::type_is(self.header_str("content-type")?, types)
    }

    pub fn accepts<'o>(&self, offers: &[&'o str]) -> Option<&'o str> {
        accepts::media_type(self.header_str("accept"), offers)
    }

    pub fn accepts_encodings<'o>(&self, offers: &[&'o str]) -> Option<&'o str> {
        accepts::encoding(self.header_str("accept-encoding"), offers)
    }

    pub fn accepts_charsets<'o>(&self, offers: &[&'o str]) -> Option<&'o str> {
        accepts::charset(self.header_str("accept-charset"), offers)
    }

    pub fn accepts_languages<'o>(&self, offers: &[&'o str]) -> Option<&'o str> {
        accepts::language(self.header_str("accept-language"), offers)
    }

    pub fn idempotent(&self) -> bool {
        matches!(
            self.raw.method,
            Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS | Method::TRACE
        )
    }

    /// Freshness against the paired response's status and validators.
    pub fn fresh(&self, status: u16, response_headers: &HeaderMap) -> bool {
        if !matches!(self.raw.method, Method::GET | Method::HEAD) {
            return false;
        }
        if (200..300).contains(&status) || status == 304 {
            return fresh::is_fresh(&self.raw.headers, response_headers);
        }
        false
    }

    pub fn stale(&self, status: u16, response_headers: &HeaderMap) -> bool {
        !self.fresh(status, response_headers)
    }

    /// Read the whole body, up to `limit` bytes. The body can be read once.
    pub async fn read_bytes(&mut self, limit: usize) -> Result<Bytes> {
        if self.body_used {
            return Err(Error::BodyRead("body already consumed".into()));
        }
        self.body_used = true;
        match self.raw.body.take() {
            Some(body) => axum::body::to_bytes(body, limit)
                .await
                .map_err(|e| Error::BodyRead(e.to_string())),
            None => Ok(Bytes::new()),
        }
    }

    pub async fn read_text(&mut self, limit: usize) -> Result<String> {
        let bytes = self.read_bytes(limit).await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::BodyRead(e.to_string()))
    }

    /// Read and deserialize a JSON body; malformed JSON is a 400.
    pub async fn read_json<T: DeserializeOwned>(&mut self, limit: usize) -> Result<T> {
        let bytes = self.read_bytes(limit).await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::http(400, format!("invalid JSON body: {e}")))
    }

    pub fn summary(&self) -> serde_json::Value {
        let headers: serde_json::Map<String, serde_json::Value> = self
            .raw
            .headers
            .iter()
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (name.as_str().to_string(), serde_json::Value::String(value))
            })
            .collect();
        serde_json::json!({
            "method": self.raw.method.as_str(),
            "url": self.url(),
            "header": headers,
        })
    }
}
