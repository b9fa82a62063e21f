use crate::formats::FeatureFormat;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Largest 1-based position a feature or query may carry (tabix/BAM limit).
pub const MAX_POSITION: u32 = i32::MAX as u32;

/// A 1-based, fully closed genomic interval
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicInterval {
    contig: String,
    start: u64,
    stop: u64,
}

impl GenomicInterval {
    pub fn new(contig: impl Into<String>, start: u64, stop: u64) -> Result<Self> {
        let contig = contig.into();
        if start == 0 || start > stop {
            return Err(Error::InvalidRange(format!("{}:{}-{}", contig, start, stop)));
        }
        Ok(Self {
            contig,
            start,
            stop,
        })
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn stop(&self) -> u64 {
        self.stop
    }

    pub fn len(&self) -> u64 {
        self.stop - self.start + 1
    }
}

impl fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.stop)
    }
}

impl FromStr for GenomicInterval {
    type Err = Error;

    /// Parses `contig:start-stop`. Contig names may themselves contain `:`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRange(s.to_string());
        let (contig, range) = s.rsplit_once(':').ok_or_else(invalid)?;
        let (start, stop) = range.split_once('-').ok_or_else(invalid)?;
        let start = start.replace(',', "").parse().map_err(|_| invalid())?;
        let stop = stop.replace(',', "").parse().map_err(|_| invalid())?;
        if contig.is_empty() {
            return Err(invalid());
        }
        Self::new(contig, start, stop)
    }
}

/// Broad kind of record a track produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Interval,
    Variant,
    Annotation,
}

/// Immutable identity of a track: what was declared, what it yields, and its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackIdentity {
    pub declared_type: FeatureFormat,
    pub record_type: RecordKind,
    pub name: String,
}

impl TrackIdentity {
    pub fn new(declared_type: FeatureFormat, name: impl Into<String>) -> Self {
        Self {
            declared_type,
            record_type: declared_type.record_kind(),
            name: name.into(),
        }
    }
}

/// One decoded feature, independent of the reader that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub(crate) contig: String,
    pub(crate) start: u32,
    pub(crate) stop: u32,
    pub(crate) format: FeatureFormat,
    pub(crate) line: String,
}

impl Feature {
    pub fn contig(&self) -> &str {
        &self.contig
    }

    /// 1-based start
    pub fn start(&self) -> u32 {
        self.start
    }

    /// 1-based inclusive stop
    pub fn stop(&self) -> u32 {
        self.stop
    }

    pub fn format(&self) -> FeatureFormat {
        self.format
    }

    /// The undecoded source line.
    pub fn payload(&self) -> &str {
        &self.line
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.line.split('\t')
    }

    pub fn field(&self, i: usize) -> Option<&str> {
        self.fields().nth(i)
    }

    pub fn overlaps(&self, contig: &str, start: u32, stop: u32) -> bool {
        self.contig == contig && self.start <= stop && self.stop >= start
    }

    pub fn is_contained_in(&self, contig: &str, start: u32, stop: u32) -> bool {
        self.contig == contig && self.start >= start && self.stop <= stop
    }
}

/// A feature attributed to the track it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    track_name: Arc<str>,
    feature: Feature,
}

impl FeatureRecord {
    pub fn new(track_name: Arc<str>, feature: Feature) -> Self {
        Self {
            track_name,
            feature,
        }
    }

    pub fn track_name(&self) -> &str {
        &self.track_name
    }

    pub fn contig(&self) -> &str {
        self.feature.contig()
    }

    pub fn start(&self) -> u32 {
        self.feature.start()
    }

    pub fn stop(&self) -> u32 {
        self.feature.stop()
    }

    pub fn payload(&self) -> &str {
        self.feature.payload()
    }

    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    pub fn into_feature(self) -> Feature {
        self.feature
    }
}
