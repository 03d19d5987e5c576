//! Per-request context.
//!
//! # Responsibilities
//! - Own the request and response facades for one request
//! - Carry a request-scoped state bag
//! - Forward the common facade accessors so middleware rarely needs to
//!   reach for `request()` / `response()` directly
//!
//! # Design Decisions
//! - Forwarding is explicit: every delegated accessor is listed below once
//! - The context never outlives its request and is never pooled

use std::fmt;
use std::sync::Arc;

use axum::http::{Extensions, HeaderMap, Method};
use chrono::{DateTime, Utc};

use crate::app::application::Shared;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::http::{Body, Query, Request, Response};
use crate::net::raw::{RawRequest, RawResponse};

/// State for one request/response cycle.
pub struct Context {
    request: Request,
    response: Response,
    state: Extensions,
    shared: Arc<Shared>,
}

impl Context {
    pub(crate) fn new(request: RawRequest, response: RawResponse, shared: Arc<Shared>) -> Self {
        Self {
            request: Request::new(request, &shared.config),
            response: Response::new(response),
            state: Extensions::new(),
            shared,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Request-scoped values shared between middleware, keyed by type.
    pub fn state(&self) -> &Extensions {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut Extensions {
        &mut self.state
    }

    /// Configuration of the owning application.
    pub fn app(&self) -> &AppConfig {
        &self.shared.config
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    /// The raw sink, for writes that bypass finalization.
    pub fn raw_response_mut(&mut self) -> &mut RawResponse {
        self.response.raw_mut()
    }

    pub(crate) fn into_raw_response(self) -> RawResponse {
        self.response.into_raw()
    }

    /// Fail with an HTTP error unless `condition` holds.
    pub fn assert(&self, condition: bool, status: u16, message: impl Into<String>) -> Result<()> {
        if condition {
            Ok(())
        } else {
            Err(Error::http(status, message))
        }
    }

    // Request side.

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn url(&self) -> &str {
        self.request.url()
    }

    pub fn set_url(&mut self, url: &str) -> Result<()> {
        self.request.set_url(url)
    }

    pub fn original_url(&self) -> &str {
        self.request.original_url()
    }

    pub fn origin(&self) -> String {
        self.request.origin()
    }

    pub fn href(&self) -> String {
        self.request.href()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    pub fn set_path(&mut self, path: &str) -> Result<()> {
        self.request.set_path(path)
    }

    pub fn querystring(&self) -> &str {
        self.request.querystring()
    }

    pub fn set_querystring(&mut self, querystring: &str) -> Result<()> {
        self.request.set_querystring(querystring)
    }

    pub fn search(&self) -> String {
        self.request.search()
    }

    pub fn query(&self) -> Arc<Query> {
        self.request.query()
    }

    pub fn set_query(&mut self, query: &Query) -> Result<()> {
        self.request.set_query(query)
    }

    pub fn request_headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Request header lookup.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.request.get(field)
    }

    pub fn protocol(&self) -> &str {
        self.request.protocol()
    }

    pub fn secure(&self) -> bool {
        self.request.secure()
    }

    pub fn host(&self) -> &str {
        self.request.host()
    }

    pub fn hostname(&self) -> &str {
        self.request.hostname()
    }

    pub fn ip(&self) -> String {
        self.request.ip()
    }

    pub fn ips(&self) -> Vec<&str> {
        self.request.ips()
    }

    pub fn subdomains(&self) -> Vec<String> {
        self.request.subdomains()
    }

    /// Match the request content type.
    pub fn is(&self, types: &[&str]) -> Option<String> {
        self.request.is(types)
    }

    pub fn accepts<'o>(&self, offers: &[&'o str]) -> Option<&'o str> {
        self.request.accepts(offers)
    }

    pub fn accepts_encodings<'o>(&self, offers: &[&'o str]) -> Option<&'o str> {
        self.request.accepts_encodings(offers)
    }

    pub fn accepts_charsets<'o>(&self, offers: &[&'o str]) -> Option<&'o str> {
        self.request.accepts_charsets(offers)
    }

    pub fn accepts_languages<'o>(&self, offers: &[&'o str]) -> Option<&'o str> {
        self.request.accepts_languages(offers)
    }

    pub fn idempotent(&self) -> bool {
        self.request.idempotent()
    }

    /// Whether the client's cached copy matches the response being built.
    pub fn fresh(&self) -> bool {
        self.request
            .fresh(self.response.status(), self.response.headers())
    }

    pub fn stale(&self) -> bool {
        !self.fresh()
    }

    // Response side.

    pub fn status(&self) -> u16 {
        self.response.status()
    }

    pub fn set_status(&mut self, code: u16) -> Result<()> {
        self.response.set_status(code)
    }

    pub fn message(&self) -> &str {
        self.response.message()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.response.set_message(message)
    }

    pub fn body(&self) -> &Body {
        self.response.body()
    }

    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.response.set_body(body)
    }

    pub fn length(&self) -> Option<u64> {
        self.response.length()
    }

    pub fn set_length(&mut self, length: u64) -> Result<()> {
        self.response.set_length(length)
    }

    /// Response media type without parameters.
    pub fn content_type(&self) -> &str {
        self.response.content_type()
    }

    pub fn set_type(&mut self, value: &str) -> Result<()> {
        self.response.set_type(value)
    }

    /// Set a response header.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        self.response.set(name, value)
    }

    pub fn append(&mut self, name: &str, value: &str) -> Result<()> {
        self.response.append(name, value)
    }

    pub fn remove(&mut self, name: &str) {
        self.response.remove(name)
    }

    /// Whether a response header is set.
    pub fn has(&self, name: &str) -> bool {
        self.response.has(name)
    }

    pub fn etag(&self) -> Option<&str> {
        self.response.etag()
    }

    pub fn set_etag(&mut self, tag: &str) -> Result<()> {
        self.response.set_etag(tag)
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.response.last_modified()
    }

    pub fn set_last_modified(&mut self, date: DateTime<Utc>) -> Result<()> {
        self.response.set_last_modified(date)
    }

    pub fn vary(&mut self, field: &str) -> Result<()> {
        self.response.vary(field)
    }

    pub fn attachment(&mut self, filename: Option<&str>) -> Result<()> {
        self.response.attachment(filename)
    }

    /// Redirect to `url`. `"back"` means the referrer, then `alt`, then `/`.
    pub fn redirect(&mut self, url: &str, alt: Option<&str>) -> Result<()> {
        let location = if url == "back" {
            self.request
                .get("referrer")
                .or(alt)
                .unwrap_or("/")
                .to_string()
        } else {
            url.to_string()
        };
        let html = self.request.accepts(&["html"]).is_some();
        self.response.redirect(&location, html)
    }

    pub fn headers_sent(&self) -> bool {
        self.response.headers_sent()
    }

    pub fn writable(&self) -> bool {
        self.response.writable()
    }

    pub fn summary(&self) -> serde_json::Value {
        let app = self.app();
        serde_json::json!({
            "request": self.request.summary(),
            "response": self.response.summary(),
            "app": {
                "env": app.env,
                "proxy": app.proxy,
                "subdomain_offset": app.subdomain_offset,
            },
            "original_url": self.request.original_url(),
        })
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.method())
            .field("url", &self.url())
            .field("status", &self.status())
            .field("body", self.body())
            .finish()
    }
}
