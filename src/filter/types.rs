/// A bind parameter for a generated SQL fragment
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    /// Bound as NULL when absent; comparisons against it are never true
    OptionalInt(Option<i64>),
    Text(String),
    TextArray(Vec<String>),
}
