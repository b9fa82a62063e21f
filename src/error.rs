use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to {operation} {source_name}: {source}")]
    ReadFailure {
        operation: &'static str,
        source_name: String,
        #[source]
        source: io::Error,
    },

    #[error("{source_name} has no usable index; interval queries are unsupported")]
    QueryUnsupported { source_name: String },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("coordinate {value} exceeds the maximum representable position {max}")]
    RangeOverflow { value: u64, max: u64 },

    #[error("track {track} is closed; cannot {operation}")]
    ClosedTrack {
        track: String,
        operation: &'static str,
    },

    #[error("reader for {0} is already closed")]
    AlreadyClosed(String),

    #[error("{0} cannot be restarted; reopen the source to iterate again")]
    UnsupportedRestart(String),

    #[error("header type mismatch: requested {expected}, source has {actual}")]
    HeaderTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("unknown feature format: {0}")]
    UnknownFormat(String),

    #[error(
        "record at ({contig_id}, {position}) follows ({last_contig_id}, {last_position}) in {sink}"
    )]
    OutOfOrderRecord {
        sink: String,
        contig_id: u32,
        position: u32,
        last_contig_id: u32,
        last_position: u32,
    },

    #[error("{field} value {value} does not fit the sink's fixed-width field")]
    EncodingOverflow { field: &'static str, value: String },

    #[error("invalid reference base: {0:?}")]
    InvalidReferenceBase(char),

    #[error("expected {expected} genotype likelihoods, got {actual}")]
    GenotypeCount { expected: usize, actual: usize },

    #[error("contig not found in sequence dictionary: {0}")]
    UnknownContig(String),

    #[error("contig id {id} is not declared in the sink header ({count} contigs)")]
    UnknownContigId { id: u32, count: usize },

    #[error("write session for {0} failed earlier; the sink must be discarded")]
    SessionPoisoned(String),

    #[error("sink {0} is closed")]
    SinkClosed(String),

    #[error("invalid likelihood sink: {0}")]
    InvalidSink(String),

    #[error("format does not support {0}")]
    UnsupportedFeature(&'static str),

    #[error("unsupported genotype call shape: {0}")]
    UnsupportedCallShape(&'static str),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn read_failure(
        operation: &'static str,
        source_name: impl Into<String>,
        source: io::Error,
    ) -> Self {
        Error::ReadFailure {
            operation,
            source_name: source_name.into(),
            source,
        }
    }

    pub(crate) fn overflow(field: &'static str, value: impl ToString) -> Self {
        Error::EncodingOverflow {
            field,
            value: value.to_string(),
        }
    }

    /// Whether the error stems from a deliberate format limitation rather than
    /// bad input or I/O.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedFeature(_)
                | Error::UnsupportedCallShape(_)
                | Error::QueryUnsupported { .. }
                | Error::UnsupportedRestart(_)
        )
    }
}
