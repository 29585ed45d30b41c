use super::types::SqlParam;

/// Accumulates SQL conditions joined with AND, numbering bind parameters as it goes.
///
/// `starting_param_index` reserves the first placeholders for parameters the
/// caller binds itself (for instance the viewer id used by flag subqueries).
pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    /// Register a parameter and return its placeholder
    pub fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }

    /// Add a condition built around a freshly registered placeholder
    pub fn push_with(&mut self, value: SqlParam, build: impl FnOnce(&str) -> String) -> &mut Self {
        let placeholder = self.param(value);
        self.conditions.push(build(&placeholder));
        self
    }

    pub fn push(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn eq(&mut self, column: &str, value: SqlParam) -> &mut Self {
        self.push_with(value, |p| format!("{} = {}", column, p))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Index of the last placeholder handed out
    pub fn param_index(&self) -> usize {
        self.param_index
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.param_values
    }

    /// WHERE body (without the keyword); `1=1` when no condition was added
    pub fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            "1=1".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }
}

/// Escape LIKE metacharacters so user text matches literally
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let filter = FilterWhere::new(0);
        assert_eq!(filter.where_sql(), "1=1");
        assert!(filter.params().is_empty());
    }

    #[test]
    fn placeholders_continue_after_reserved_slots() {
        let mut filter = FilterWhere::new(1);
        filter.eq("r.author_id", SqlParam::Int(5));
        filter.push_with(SqlParam::TextArray(vec!["lunch".into()]), |p| format!("t.slug = ANY({})", p));

        assert_eq!(filter.where_sql(), "r.author_id = $2 AND t.slug = ANY($3)");
        assert_eq!(
            filter.params(),
            &[SqlParam::Int(5), SqlParam::TextArray(vec!["lunch".into()])]
        );
        assert_eq!(filter.param_index(), 3);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("100%_sugar\\"), "100\\%\\_sugar\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
