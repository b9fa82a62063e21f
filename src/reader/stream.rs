use super::lines::{Lines, scan_header};
use super::{FeatureReader, Features};
use crate::formats::{FeatureFormat, Header, HeaderType, Layout};
use crate::{Error, Result};
use noodles::bgzf;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// A feature source without an index: iteration only
pub struct StreamReader {
    source_name: String,
    source: Source,
    layout: Layout,
    header: Header,
    closed: bool,
}

enum Source {
    /// Reopened on every iteration
    Path(PathBuf),
    /// Can be consumed once; holds the first data line read while scanning the header
    OneShot {
        reader: Option<Box<dyn BufRead>>,
        pending: Option<String>,
        consumed: usize,
    },
}

impl StreamReader {
    /// Opens a plain-text or BGZF-compressed (`.gz`, `.bgz`) feature file.
    pub fn open(path: &Path, format: FeatureFormat) -> Result<Self> {
        let source_name = path.display().to_string();
        let layout = format.layout();

        let mut reader = open_path(path)
            .map_err(|e| Error::read_failure("open", source_name.clone(), e))?;
        let (lines, _, _) = scan_header(&mut reader, &layout)
            .map_err(|e| Error::read_failure("read header of", source_name.clone(), e))?;
        let header = Header::parse(format, lines)
            .map_err(|e| Error::read_failure("read header of", source_name.clone(), e))?;

        tracing::debug!("Opened {} stream {:?}", format.name(), path);

        Ok(Self {
            source_name,
            source: Source::Path(path.to_path_buf()),
            layout,
            header,
            closed: false,
        })
    }

    /// Wraps an already-open stream, e.g. standard input. It can be iterated once.
    pub fn from_reader(
        name: impl Into<String>,
        format: FeatureFormat,
        mut reader: Box<dyn BufRead>,
    ) -> Result<Self> {
        let source_name = name.into();
        let layout = format.layout();

        let (lines, pending, consumed) = scan_header(&mut reader, &layout)
            .map_err(|e| Error::read_failure("read header of", source_name.clone(), e))?;
        let header = Header::parse(format, lines)
            .map_err(|e| Error::read_failure("read header of", source_name.clone(), e))?;

        Ok(Self {
            source_name,
            source: Source::OneShot {
                reader: Some(reader),
                pending,
                consumed,
            },
            layout,
            header,
            closed: false,
        })
    }

    pub fn format(&self) -> FeatureFormat {
        self.layout.format
    }

    pub fn header_as<T: HeaderType>(&self) -> Result<&T> {
        self.header()?.get::<T>()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::AlreadyClosed(self.source_name.clone()))
        } else {
            Ok(())
        }
    }
}

impl FeatureReader for StreamReader {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn iterate(&mut self) -> Result<Features<'_>> {
        self.ensure_open()?;

        match &mut self.source {
            Source::Path(path) => {
                let reader = open_path(path)
                    .map_err(|e| Error::read_failure("iterate", self.source_name.clone(), e))?;
                Ok(Box::new(
                    Lines::new(reader, self.layout, &self.source_name).from_top(),
                ))
            }
            Source::OneShot {
                reader,
                pending,
                consumed,
            } => {
                let reader = reader
                    .take()
                    .ok_or_else(|| Error::UnsupportedRestart(self.source_name.clone()))?;
                Ok(Box::new(
                    Lines::new(reader, self.layout, &self.source_name)
                        .with_pending(pending.take(), *consumed),
                ))
            }
        }
    }

    fn supports_query(&self) -> bool {
        false
    }

    fn query(
        &mut self,
        _contig: &str,
        _start: u32,
        _stop: u32,
        _contained: bool,
    ) -> Result<Features<'_>> {
        self.ensure_open()?;
        Err(Error::QueryUnsupported {
            source_name: self.source_name.clone(),
        })
    }

    fn header(&self) -> Result<&Header> {
        self.ensure_open()?;
        Ok(&self.header)
    }

    fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        if let Source::OneShot { reader, .. } = &mut self.source {
            reader.take();
        }
        tracing::debug!("Closed {}", self.source_name);
        Ok(())
    }
}

fn open_path(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let compressed = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"));

    if compressed {
        Ok(Box::new(bgzf::Reader::new(file)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
