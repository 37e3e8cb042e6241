#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The queried class does not exist in the data source.
    UnknownClass(String),
    /// The data source failed while producing rows.
    Source(String),
}

impl QueryError {
    pub fn source(message: impl Into<String>) -> Self {
        QueryError::Source(message.into())
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::UnknownClass(class) => write!(f, "unknown class: {class}"),
            QueryError::Source(msg) => write!(f, "query failed: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}
