//! Isolated loader for downloaded engine artifacts.
//!
//! Symbols resolve from the loader's own sources first (caller locations, then
//! batch artifacts). Only when none of them has the symbol is the host asked,
//! and only for namespaces in the unmask set. Everything else on the host
//! stays invisible, so the engine cannot bind to a host copy of a library it
//! ships itself, nor to host internals it was never meant to see.

mod error;
mod loader;
mod source;
mod unmask;

pub use error::IsolationError;
pub use loader::{
    IsolatedLoader, IsolatedLoaderBuilder, Symbol, SymbolOrigin, DEFAULT_SYMBOL_EXTENSION,
};
pub use source::{
    source_from_location, source_from_path, ArchiveSource, DirectorySource, SymbolSource,
    SymbolTable,
};
pub use unmask::{resource_namespace, symbol_namespace, UnmaskSet};
