//! HTTP request builder shared by the auth, listings and storage clients

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{multipart, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

enum Body {
    Json(Vec<u8>),
    Multipart(multipart::Form),
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    // Ordered multimap: PostgREST range filters repeat the column name.
    query_params: Vec<(String, String)>,
    body: Option<Body>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request. Invalid names or values are skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Append one query parameter; repeated keys are kept
    pub fn query_pair(mut self, key: &str, value: &str) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Append several query parameters in order
    pub fn query(mut self, params: &[(String, String)]) -> Self {
        self.query_params.extend(params.iter().cloned());
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(Body::Json(json));
        Ok(self)
    }

    /// Add a multipart body; the content type header is set by reqwest
    pub fn multipart(mut self, form: multipart::Form) -> Self {
        self.headers.remove("Content-Type");
        self.body = Some(Body::Multipart(form));
        self
    }

    /// Final URL including query parameters
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.url)?;
        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn build(self) -> Result<RequestBuilder> {
        let url = self.url()?;
        debug!("{} {}", self.method, url);

        let mut req = self
            .client
            .request(self.method, url.as_str())
            .headers(self.headers);

        req = match self.body {
            Some(Body::Json(bytes)) => req.body(bytes),
            Some(Body::Multipart(form)) => req.multipart(form),
            None => req,
        };

        Ok(req)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T> {
        let response = self.execute_checked().await?;
        let result = response.json::<T>().await?;
        Ok(result)
    }

    /// Execute the request, failing on a non-success status
    pub async fn execute_checked(self) -> Result<Response> {
        let response = self.execute_raw().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await?;
            return Err(Error::Api { status, message });
        }

        Ok(response)
    }

    /// Execute the request and return the raw response
    pub async fn execute_raw(self) -> Result<Response> {
        let req = self.build()?;
        let response = req.send().await?;
        Ok(response)
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    /// Create a DELETE request
    pub fn delete<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::DELETE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_query_keys_are_kept_in_order() {
        let client = Client::new();
        let url = Fetch::get(&client, "https://cars.example.com/rest/v1/cars")
            .query_pair("name", "gte.ONIX")
            .query_pair("name", "lt.ONIX\u{f8ff}")
            .url()
            .unwrap();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "gte.ONIX".to_string()),
                ("name".to_string(), "lt.ONIX\u{f8ff}".to_string()),
            ]
        );
    }

    #[test]
    fn invalid_header_values_are_skipped() {
        let client = Client::new();
        let builder = Fetch::get(&client, "https://cars.example.com")
            .header("apikey", "bad\nvalue")
            .header("X-Client-Info", "carmarket/test");
        assert!(builder.headers.get("apikey").is_none());
        assert_eq!(
            builder.headers.get("X-Client-Info").unwrap(),
            "carmarket/test"
        );
    }
}
