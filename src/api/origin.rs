use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::filter::QueryParams;

/// Scheme and host the client used to reach us, for absolute links
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(',').next().unwrap_or("").trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let scheme = header_str("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
        let host = header_str("x-forwarded-host")
            .or_else(|| header_str(header::HOST.as_str()))
            .unwrap_or_else(|| "localhost".to_string());

        Self { scheme, host }
    }

    /// Absolute URL for a server-relative path
    pub fn absolute(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.host, path)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Full request URL split into origin, path and decoded query
#[derive(Debug, Clone)]
pub struct RequestUrl {
    pub origin: RequestOrigin,
    pub path: String,
    pub query: QueryParams,
}

impl RequestUrl {
    /// Same origin and path with a replacement query string
    pub fn with_query(&self, query: String) -> String {
        let base = self.origin.absolute(&self.path);
        if query.is_empty() {
            base
        } else {
            format!("{}?{}", base, query)
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestUrl {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            origin: RequestOrigin::from_headers(&parts.headers),
            path: parts.uri.path().to_string(),
            query: QueryParams::parse(parts.uri.query()),
        })
    }
}
