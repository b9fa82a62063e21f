use super::lines::Lines;
use super::{FeatureReader, Features, validate_range};
use crate::formats::index::{read_index, reference_sequence_id};
use crate::formats::{FeatureFormat, Header, HeaderType, Layout, at_line, trim_newline};
use crate::types::Feature;
use crate::{Error, Result};
use noodles::bgzf::{self, VirtualPosition};
use noodles::core::Position;
use noodles::core::region::Interval;
use noodles::csi::binning_index::BinningIndex;
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

/// A BGZF-compressed feature file paired with its tabix/CSI index
pub struct RangeIndexedReader {
    path: PathBuf,
    source_name: String,
    state: Option<OpenState>,
}

struct OpenState {
    reader: bgzf::Reader<File>,
    index: Box<dyn BinningIndex>,
    layout: Layout,
    header: Header,
    data_start: VirtualPosition,
}

impl RangeIndexedReader {
    /// Opens `path` with the index at `index_path`.
    ///
    /// The column layout comes from the index header when it has one (tabix,
    /// and CSI built for text formats); otherwise from the file extension.
    pub fn open(path: &Path, index_path: &Path) -> Result<Self> {
        let source_name = path.display().to_string();
        let index = read_index(index_path)?;

        let layout = match index.header() {
            Some(header) => Layout::from_index_header(header)?,
            None => FeatureFormat::from_path(path)?.layout(),
        };

        let file = File::open(path)
            .map_err(|e| Error::read_failure("open", source_name.clone(), e))?;
        let mut reader = bgzf::Reader::new(file);

        let (lines, data_start) = read_header(&mut reader, &layout)
            .map_err(|e| Error::read_failure("read header of", source_name.clone(), e))?;
        let header = Header::parse(layout.format, lines)
            .map_err(|e| Error::read_failure("read header of", source_name.clone(), e))?;

        tracing::debug!(
            "Opened indexed {} source {:?} (index {:?})",
            layout.format.name(),
            path,
            index_path
        );

        Ok(Self {
            path: path.to_path_buf(),
            source_name,
            state: Some(OpenState {
                reader,
                index,
                layout,
                header,
                data_start,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Option<FeatureFormat> {
        self.state.as_ref().map(|state| state.layout.format)
    }

    /// Typed view of the header, e.g. `reader.header_as::<noodles::vcf::Header>()`.
    pub fn header_as<T: HeaderType>(&self) -> Result<&T> {
        self.header()?.get::<T>()
    }

    fn state(&mut self) -> Result<&mut OpenState> {
        self.state
            .as_mut()
            .ok_or_else(|| Error::AlreadyClosed(self.source_name.clone()))
    }
}

impl FeatureReader for RangeIndexedReader {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn iterate(&mut self) -> Result<Features<'_>> {
        let source_name = self.source_name.clone();
        let state = self.state()?;

        state
            .reader
            .seek(state.data_start)
            .map_err(|e| Error::read_failure("iterate", source_name.clone(), e))?;

        Ok(Box::new(Lines::new(
            &mut state.reader,
            state.layout,
            &source_name,
        )))
    }

    fn supports_query(&self) -> bool {
        self.state.is_some()
    }

    fn query(
        &mut self,
        contig: &str,
        start: u32,
        stop: u32,
        contained: bool,
    ) -> Result<Features<'_>> {
        let source_name = self.source_name.clone();
        let state = self.state()?;
        validate_range(start, stop)?;

        let Some(reference_sequence_id) = reference_sequence_id(state.index.as_ref(), contig)
        else {
            tracing::debug!("Contig {} not present in index of {}", contig, source_name);
            return Ok(Box::new(std::iter::empty()));
        };

        let interval = Interval::from(position(start)?..=position(stop)?);
        let chunks = state
            .index
            .query(reference_sequence_id, interval)
            .map_err(|e| Error::read_failure("query", source_name.clone(), e))?;

        tracing::debug!(
            "Query {}:{}-{} (contained={}) on {} touches {} chunks",
            contig,
            start,
            stop,
            contained,
            source_name,
            chunks.len()
        );

        Ok(Box::new(Query {
            reader: &mut state.reader,
            layout: state.layout,
            chunks: chunks.into_iter(),
            chunk_end: None,
            contig: contig.to_string(),
            start,
            stop,
            contained,
            source_name,
            buf: String::new(),
            done: false,
        }))
    }

    fn header(&self) -> Result<&Header> {
        self.state
            .as_ref()
            .map(|state| &state.header)
            .ok_or_else(|| Error::AlreadyClosed(self.source_name.clone()))
    }

    fn close(&mut self) -> Result<()> {
        match self.state.take() {
            Some(_) => {
                tracing::debug!("Closed {}", self.source_name);
                Ok(())
            }
            None => Err(Error::AlreadyClosed(self.source_name.clone())),
        }
    }
}

fn position(value: u32) -> Result<Position> {
    Position::try_from(value as usize).map_err(|e| Error::InvalidRange(format!("{}: {}", value, e)))
}

/// Consumes the header lines and returns them with the virtual position of the
/// first data line.
fn read_header(
    reader: &mut bgzf::Reader<File>,
    layout: &Layout,
) -> io::Result<(Vec<String>, VirtualPosition)> {
    let mut lines = Vec::new();
    let mut buf = String::new();
    let mut line_number: u64 = 0;

    loop {
        let position = reader.virtual_position();
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            return Ok((lines, position));
        }
        line_number += 1;

        let line = trim_newline(&buf);
        if line_number <= u64::from(layout.skip_lines) || layout.is_header_line(line) {
            lines.push(line.to_string());
        } else {
            return Ok((lines, position));
        }
    }
}

/// Walks the index chunks for one query, filtering by contig and interval
struct Query<'r> {
    reader: &'r mut bgzf::Reader<File>,
    layout: Layout,
    chunks: std::vec::IntoIter<Chunk>,
    chunk_end: Option<VirtualPosition>,
    contig: String,
    start: u32,
    stop: u32,
    contained: bool,
    source_name: String,
    buf: String,
    done: bool,
}

impl Query<'_> {
    fn fail(&mut self, source: io::Error) -> Option<Result<Feature>> {
        self.done = true;
        Some(Err(Error::read_failure(
            "query",
            self.source_name.clone(),
            source,
        )))
    }

    fn matches(&self, feature: &Feature) -> bool {
        if self.contained {
            feature.is_contained_in(&self.contig, self.start, self.stop)
        } else {
            feature.overlaps(&self.contig, self.start, self.stop)
        }
    }
}

impl Iterator for Query<'_> {
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            let chunk_end = match self.chunk_end {
                Some(end) => end,
                None => match self.chunks.next() {
                    Some(chunk) => {
                        if let Err(e) = self.reader.seek(chunk.start()) {
                            return self.fail(e);
                        }
                        self.chunk_end = Some(chunk.end());
                        chunk.end()
                    }
                    None => {
                        self.done = true;
                        return None;
                    }
                },
            };

            if self.reader.virtual_position() >= chunk_end {
                self.chunk_end = None;
                continue;
            }

            let offset = self.reader.virtual_position();
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    self.chunk_end = None;
                    continue;
                }
                Ok(_) => {}
                Err(e) => return self.fail(e),
            }

            let line = trim_newline(&self.buf);
            if line.is_empty() || self.layout.is_header_line(line) {
                continue;
            }

            let feature = match self.layout.decode(line) {
                Ok(feature) => feature,
                Err(e) => {
                    let e = io::Error::new(
                        e.kind(),
                        format!("record at virtual position {:?}: {}", offset, e),
                    );
                    return self.fail(e);
                }
            };

            if feature.contig() == self.contig && feature.start() > self.stop {
                // sorted input: nothing later can overlap
                self.done = true;
                return None;
            }

            if self.matches(&feature) {
                return Some(Ok(feature));
            }
        }
    }
}
