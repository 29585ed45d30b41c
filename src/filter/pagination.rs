use serde::Serialize;

use super::error::FilterError;
use super::query::QueryParams;
use crate::api::origin::RequestUrl;
use crate::config;

const PAGE_PARAM: &str = "page";
const LIMIT_PARAM: &str = "limit";

/// Page-number pagination: `?page=<n>&limit=<size>`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn from_query(query: &QueryParams) -> Result<Self, FilterError> {
        let api = &config::config().api;
        Self::with_bounds(query, api.page_size, api.max_page_size)
    }

    pub fn with_bounds(query: &QueryParams, default_size: i64, max_size: i64) -> Result<Self, FilterError> {
        let page = match query.get(PAGE_PARAM).map(str::trim) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(FilterError::InvalidPage),
            },
        };

        let limit = match query.get_i64_lenient(LIMIT_PARAM) {
            Some(n) if n >= 1 => n.min(max_size.max(1)),
            _ => default_size.max(1),
        };

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn num_pages(&self, count: i64) -> i64 {
        if count <= 0 {
            1
        } else {
            (count + self.limit - 1) / self.limit
        }
    }

    /// The first page always exists, even for an empty listing
    pub fn ensure_in_range(&self, count: i64) -> Result<(), FilterError> {
        if self.page > self.num_pages(count) {
            Err(FilterError::InvalidPage)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(results: Vec<T>, count: i64, page: &PageRequest, url: &RequestUrl) -> Self {
        let next = (page.page < page.num_pages(count))
            .then(|| url.with_query(url.query.encode_with(PAGE_PARAM, Some(&(page.page + 1).to_string()))));

        let previous = match page.page {
            1 => None,
            2 => Some(url.with_query(url.query.encode_with(PAGE_PARAM, None))),
            n => Some(url.with_query(url.query.encode_with(PAGE_PARAM, Some(&(n - 1).to_string())))),
        };

        Self { count, next, previous, results }
    }
}
