//! Incoming HTTP request type.
//!
//! The body is fully buffered before a handler runs. Query strings and
//! `application/x-www-form-urlencoded` bodies decode into [`FormData`], which
//! keeps repeated keys (`tags=a&tags=b`) in submission order.

use std::collections::HashMap;

use bytes::Bytes;

use crate::method::Method;

/// An incoming HTTP request with its path parameters resolved.
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    body: Bytes,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn from_parts(
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            path: path.to_owned(),
            query: query.map(str::to_owned),
            headers,
            body,
            params: HashMap::new(),
        }
    }

    /// Starts building a request for `target` (`/path?query`), mostly for
    /// driving a [`Router`](crate::Router) in-process.
    pub fn builder(method: Method, target: &str) -> RequestBuilder {
        RequestBuilder {
            method,
            target: target.to_owned(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/post/{slug}/`, `req.param("slug")` on `/post/hello/` returns `Some("hello")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Decoded query string. A malformed query decodes as empty.
    pub fn query(&self) -> FormData {
        self.query.as_deref()
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .map(FormData)
            .unwrap_or_default()
    }

    /// Decoded url-encoded form body.
    pub fn form(&self) -> Result<FormData, serde_urlencoded::de::Error> {
        serde_urlencoded::from_bytes(&self.body).map(FormData)
    }

    /// Value of the cookie `name` from the `cookie` header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
            .flat_map(|(_, v)| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

// ── FormData ──────────────────────────────────────────────────────────────────

/// Decoded `key=value` pairs from a query string or form body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    /// First value submitted for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// First value for `key`, or `""` when absent.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Every value submitted for `key`, in order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ── RequestBuilder ────────────────────────────────────────────────────────────

/// Fluent builder for [`Request`]. Obtain via [`Request::builder()`].
pub struct RequestBuilder {
    method: Method,
    target: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl RequestBuilder {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn cookie(self, name: &str, value: &str) -> Self {
        self.header("cookie", &format!("{name}={value}"))
    }

    /// Url-encodes `fields` as the body and sets the form content type.
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        let encoded = serde_urlencoded::to_string(fields).unwrap_or_default();
        self.body = Bytes::from(encoded);
        self.header("content-type", "application/x-www-form-urlencoded")
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        let (path, query) = match self.target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.target.as_str(), None),
        };
        Request::from_parts(self.method, path, query, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_target_into_path_and_query() {
        let req = Request::builder(Method::Get, "/?search=rust&page=2").build();
        assert_eq!(req.path(), "/");
        let query = req.query();
        assert_eq!(query.get("search"), Some("rust"));
        assert_eq!(query.get("page"), Some("2"));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn form_keeps_repeated_keys_in_order() {
        let req = Request::builder(Method::Post, "/post/create/")
            .form(&[("title", "Hello & bye"), ("tags", "rust"), ("tags", "web")])
            .build();
        let form = req.form().unwrap();
        assert_eq!(form.text("title"), "Hello & bye");
        assert_eq!(form.get_all("tags"), vec!["rust", "web"]);
        assert_eq!(form.text("body"), "");
    }

    #[test]
    fn bare_query_key_decodes_to_empty_value() {
        let req = Request::builder(Method::Get, "/?search").build();
        assert_eq!(req.query().get("search"), Some(""));
        assert_eq!(Request::builder(Method::Get, "/").build().query(), FormData::default());
    }

    #[test]
    fn cookie_lookup_scans_every_pair() {
        let req = Request::builder(Method::Get, "/")
            .header("Cookie", "theme=dark; sessionid=abc123")
            .build();
        assert_eq!(req.cookie("sessionid"), Some("abc123"));
        assert_eq!(req.cookie("theme"), Some("dark"));
        assert_eq!(req.cookie("csrftoken"), None);
    }
}
