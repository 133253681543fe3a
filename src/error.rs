// Typed errors for the audioid library boundary. The binary wraps these in
// `anyhow` at `main()`, following the library/thiserror-binary/anyhow split
// seen elsewhere in the example pack.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioIdError {
    #[error("state file bucket count {found} does not match configured bucket count {expected}")]
    ConfigMismatch { expected: usize, found: usize },

    #[error("failed to parse {kind} at {path}:{line}: {message}")]
    ParseError {
        kind: &'static str,
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot add another {what}: limit of {limit} reached")]
    ResourceExhausted { what: String, limit: usize },
}
