//! Named tracks over feature files.
//!
//! A [`Track`] binds one [`FeatureReader`] to a logical identity. Records read
//! through a track are tagged with its name so that consumers merging several
//! tracks can attribute every record to its source.
//!
//! A track is either open or closed. Closing is a one-way transition: the
//! reader is dropped and every later operation fails with `ClosedTrack`.

use crate::config::TrackOptions;
use crate::dictionary::SequenceDictionary;
use crate::formats::index::{build_index, find_index};
use crate::formats::{FeatureFormat, Header, HeaderType};
use crate::reader::{FeatureReader, Features, RangeIndexedReader, StreamReader};
use crate::types::{FeatureRecord, GenomicInterval, MAX_POSITION, TrackIdentity};
use crate::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Track {
    identity: TrackIdentity,
    name: Arc<str>,
    source_path: PathBuf,
    reader: Option<Box<dyn FeatureReader>>,
    dictionary: Option<SequenceDictionary>,
}

impl Track {
    /// Binds an already-open reader to a track identity.
    pub fn new(
        identity: TrackIdentity,
        source_path: impl Into<PathBuf>,
        reader: Box<dyn FeatureReader>,
        dictionary: Option<SequenceDictionary>,
    ) -> Self {
        Self {
            name: Arc::from(identity.name.as_str()),
            identity,
            source_path: source_path.into(),
            reader: Some(reader),
            dictionary,
        }
    }

    /// Opens a feature file as a track.
    ///
    /// An index found next to the file (or given in `options`) yields a
    /// query-capable track; otherwise the track is stream-only unless
    /// `require_index` is set.
    pub fn open(name: &str, path: impl AsRef<Path>, options: &TrackOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = match options.format {
            Some(format) => format,
            None => FeatureFormat::from_path(path)?,
        };

        let mut index_path = options.index_path.clone().or_else(|| find_index(path));
        if index_path.is_none() && options.create_index && is_bgzf(path) {
            index_path = Some(build_index(path, format)?);
        }

        let reader: Box<dyn FeatureReader> = match index_path {
            Some(index_path) => Box::new(RangeIndexedReader::open(path, &index_path)?),
            None if options.require_index => {
                return Err(Error::QueryUnsupported {
                    source_name: path.display().to_string(),
                });
            }
            None => {
                tracing::warn!(
                    "No index found for {:?}; track {} supports iteration only",
                    path,
                    name
                );
                Box::new(StreamReader::open(path, format)?)
            }
        };

        let dictionary = options
            .dictionary
            .clone()
            .or_else(|| dictionary_from_header(reader.header().ok()?));

        tracing::info!(
            "Opened {} track {} from {:?} (queryable: {})",
            format.name(),
            name,
            path,
            reader.supports_query()
        );

        Ok(Self::new(
            TrackIdentity::new(format, name),
            path,
            reader,
            dictionary,
        ))
    }

    pub fn identity(&self) -> &TrackIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Every record of the track, in file order.
    pub fn get_iterator(&mut self) -> Result<TrackFeatures<'_>> {
        let track = self.name.clone();
        let reader = self.reader_mut("iterate")?;
        let inner = reader.iterate().map_err(|e| attribute(&track, e))?;
        Ok(TrackFeatures { inner, track })
    }

    /// Whether interval queries are available. A closed track answers `false`.
    pub fn supports_query(&self) -> bool {
        self.reader.as_ref().is_some_and(|r| r.supports_query())
    }

    /// Records overlapping `interval`.
    pub fn query(&mut self, interval: &GenomicInterval) -> Result<TrackFeatures<'_>> {
        self.query_with(interval, false)
    }

    /// Records overlapping `interval`, or fully inside it when `contained` is set.
    pub fn query_with(
        &mut self,
        interval: &GenomicInterval,
        contained: bool,
    ) -> Result<TrackFeatures<'_>> {
        let start = to_coordinate(interval.start())?;
        let stop = to_coordinate(interval.stop())?;
        self.query_range_with(interval.contig(), start, stop, contained)
    }

    pub fn query_range(&mut self, contig: &str, start: u32, stop: u32) -> Result<TrackFeatures<'_>> {
        self.query_range_with(contig, start, stop, false)
    }

    pub fn query_range_with(
        &mut self,
        contig: &str,
        start: u32,
        stop: u32,
        contained: bool,
    ) -> Result<TrackFeatures<'_>> {
        let track = self.name.clone();
        let reader = self.reader_mut("query")?;
        let inner = reader
            .query(contig, start, stop, contained)
            .map_err(|e| attribute(&track, e))?;
        Ok(TrackFeatures { inner, track })
    }

    /// The dictionary attached at construction, if any.
    pub fn sequence_dictionary(&self) -> Option<&SequenceDictionary> {
        self.dictionary.as_ref()
    }

    /// The file header as `T`; `HeaderTypeMismatch` if the file has another kind.
    pub fn get_header<T: HeaderType>(&self) -> Result<&T> {
        let reader = self.reader.as_ref().ok_or_else(|| Error::ClosedTrack {
            track: self.name.to_string(),
            operation: "read header",
        })?;
        reader.header_as::<T>()
    }

    pub fn close(&mut self) -> Result<()> {
        let track = self.name.clone();
        self.reader_mut("close")?
            .close()
            .map_err(|e| attribute(&track, e))?;
        self.reader = None;
        tracing::debug!("Closed track {}", track);
        Ok(())
    }

    fn reader_mut(&mut self, operation: &'static str) -> Result<&mut Box<dyn FeatureReader>> {
        self.reader.as_mut().ok_or_else(|| Error::ClosedTrack {
            track: self.name.to_string(),
            operation,
        })
    }
}

impl std::fmt::Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("identity", &self.identity)
            .field("source_path", &self.source_path)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Records of one track, tagged with the track name
pub struct TrackFeatures<'t> {
    inner: Features<'t>,
    track: Arc<str>,
}

impl Iterator for TrackFeatures<'_> {
    type Item = Result<FeatureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(
            item.map(|feature| FeatureRecord::new(self.track.clone(), feature))
                .map_err(|e| attribute(&self.track, e)),
        )
    }
}

/// Adds the track name to read failures coming from its reader.
fn attribute(track: &str, err: Error) -> Error {
    match err {
        Error::ReadFailure {
            operation,
            source_name,
            source,
        } => Error::ReadFailure {
            operation,
            source_name: format!("track {} ({})", track, source_name),
            source,
        },
        other => other,
    }
}

fn to_coordinate(value: u64) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|&v| v <= MAX_POSITION)
        .ok_or(Error::RangeOverflow {
            value,
            max: u64::from(MAX_POSITION),
        })
}

fn dictionary_from_header(header: &Header) -> Option<SequenceDictionary> {
    match header {
        Header::Vcf(vcf_header) if !vcf_header.contigs().is_empty() => {
            Some(SequenceDictionary::from_vcf_header(vcf_header))
        }
        _ => None,
    }
}

/// BGZF members are gzip members with the FEXTRA flag set.
fn is_bgzf(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut file| file.read_exact(&mut magic))
        .is_ok()
        && magic == [0x1f, 0x8b, 0x08, 0x04]
}
