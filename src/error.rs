//! Error types for cardwatch operations

/// Result type for cardwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for cardwatch operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// PC/SC error
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// No readers available
    #[error("no readers available")]
    NoReadersAvailable,

    /// Reader not found
    #[error("reader not found: {0}")]
    ReaderNotFound(String),

    /// No card present in reader
    #[error("no card present in reader: {0}")]
    NoCard(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Alias store could not be parsed
    #[error("alias store is not valid JSON: {0}")]
    Store(#[source] serde_json::Error),

    /// Condition document could not be parsed
    #[error("condition document is not well-formed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Condition document lacks a `<condition>` element
    #[error("no <condition> element in condition document")]
    MissingCondition,

    /// `<condition>` element lacks a `<value>` child
    #[error("no <value> element inside <condition>")]
    MissingValue,
}
