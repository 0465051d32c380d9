use thiserror::Error;

/// Errors from building or using an isolated loader.
#[derive(Debug, Error)]
pub enum IsolationError {
    /// A location could not be turned into a symbol source. Raised while
    /// building the loader; no partially built loader is ever returned.
    #[error("Invalid symbol source '{location}': {reason}")]
    InvalidSource { location: String, reason: String },

    /// Neither the loader's own sources nor an unmasked host namespace provide `name`.
    #[error("Symbol '{name}' is not visible from the isolated loader")]
    SymbolNotVisible { name: String },

    #[error("Failed to read '{entry}' from '{location}'")]
    SourceRead {
        location: String,
        entry: String,
        #[source]
        source: std::io::Error,
    },
}
