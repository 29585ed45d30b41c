use url::form_urlencoded;

use super::error::FilterError;

/// Decoded query string that keeps repeated keys (`?tags=a&tags=b`)
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// Integer parameter; empty counts as absent, garbage is an error
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, FilterError> {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => v.parse::<i64>().map(Some).map_err(|_| FilterError::InvalidParameter {
                name: key.to_string(),
                reason: "Enter a whole number.".to_string(),
            }),
        }
    }

    /// Integer parameter that silently falls back to `None` on garbage
    pub fn get_i64_lenient(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.trim().parse::<i64>().ok())
    }

    /// Numeric flag: any non-zero number, or `true`
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key).map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("true") => true,
            Some(v) => v.parse::<f64>().map(|n| n != 0.0).unwrap_or(false),
            None => false,
        }
    }

    /// Re-encode with `key` replaced by `value`, or removed when `value` is `None`
    pub fn encode_with(&self, key: &str, value: Option<&str>) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut replaced = false;
        for (k, v) in &self.pairs {
            if k == key {
                if let (Some(new_value), false) = (value, replaced) {
                    serializer.append_pair(k, new_value);
                    replaced = true;
                }
                continue;
            }
            serializer.append_pair(k, v);
        }
        if let (Some(new_value), false) = (value, replaced) {
            serializer.append_pair(key, new_value);
        }
        serializer.finish()
    }
}
