//! Readers that turn a feature file into a stream of [`Feature`]s.
//!
//! Two implementations share the [`FeatureReader`] capability:
//!
//! - [`RangeIndexedReader`] - BGZF file with a tabix/CSI index; supports interval queries
//! - [`StreamReader`] - any other source; iteration only
//!
//! Tracks hold a `Box<dyn FeatureReader>` and discover query support at runtime
//! through [`FeatureReader::supports_query`].

mod indexed;
mod lines;
mod stream;

pub use indexed::RangeIndexedReader;
pub use stream::StreamReader;

use crate::formats::{Header, HeaderType};
use crate::types::{Feature, MAX_POSITION};
use crate::{Error, Result};

/// Lazy, pull-based sequence of features borrowed from a reader
pub type Features<'r> = Box<dyn Iterator<Item = Result<Feature>> + 'r>;

/// Streaming and (optionally) range access over one open feature source
pub trait FeatureReader {
    /// Path or label identifying the source in errors and logs.
    fn source_name(&self) -> &str;

    /// Iterates every feature from the start of the data section.
    fn iterate(&mut self) -> Result<Features<'_>>;

    fn supports_query(&self) -> bool;

    /// Features on `contig` overlapping `[start, stop]`, or fully inside it when
    /// `contained` is set. Coordinates are 1-based and inclusive.
    fn query(&mut self, contig: &str, start: u32, stop: u32, contained: bool)
    -> Result<Features<'_>>;

    fn header(&self) -> Result<&Header>;

    /// Releases the source. Closing twice fails with `AlreadyClosed`.
    fn close(&mut self) -> Result<()>;
}

impl dyn FeatureReader + '_ {
    /// Typed view of the header.
    pub fn header_as<T: HeaderType>(&self) -> Result<&T> {
        self.header()?.get::<T>()
    }
}

pub(crate) fn validate_range(start: u32, stop: u32) -> Result<()> {
    if start == 0 || start > stop {
        return Err(Error::InvalidRange(format!("{}-{}", start, stop)));
    }
    if stop > MAX_POSITION {
        return Err(Error::RangeOverflow {
            value: u64::from(stop),
            max: u64::from(MAX_POSITION),
        });
    }
    Ok(())
}
