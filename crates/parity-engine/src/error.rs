//! Error types for the engine crate.
//!
//! These cover configuration mistakes only. A structural mismatch between
//! the two graphs is never an error; it becomes a `Difference` in the report.

/// Errors raised when validating an engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A rule, strategy, or skip marker was registered with an empty type name.
    #[error("empty type name in {context}")]
    EmptyTypeName { context: &'static str },

    /// A rule, strategy, or skip marker was registered with an empty field name.
    #[error("empty field name for type `{type_name}` in {context}")]
    EmptyFieldName {
        type_name: String,
        context: &'static str,
    },

    /// An identity-keyed strategy was registered without a key field.
    #[error("empty key field for collection `{type_name}.{field}`")]
    EmptyKeyField { type_name: String, field: String },

    /// An exclusion prefix was blank.
    #[error("blank exclusion prefix")]
    BlankExclusion,
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
