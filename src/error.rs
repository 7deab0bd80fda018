use camino::Utf8PathBuf;

/// Error types for the logfilter library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `--first` and `--last` were both given.
    #[error("--first and --last are mutually exclusive")]
    ConflictingBounds,

    /// The named input file could not be opened.
    #[error("failed to open file: {path}")]
    InputOpen {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the input stream failed part way.
    #[error("failed to read from {input}")]
    InputRead {
        input: String,
        #[source]
        source: std::io::Error,
    },

    /// A matcher could not be built.
    #[error(transparent)]
    Matcher(#[from] line_match::Error),

    /// An I/O error occurred while writing output.
    #[error("failed to write output")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using the library error.
pub type Result<T> = std::result::Result<T, Error>;
