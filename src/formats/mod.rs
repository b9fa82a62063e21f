//! Feature file formats understood by tracks.
//!
//! Each supported format is a tab-delimited text file sorted by contig and
//! position, optionally BGZF-compressed and tabix/CSI indexed:
//!
//! - [`FeatureFormat::Bed`] - 0-based half-open intervals (`.bed`)
//! - [`FeatureFormat::Vcf`] - variant calls (`.vcf`), stop derived from `REF` or `INFO/END`
//! - [`FeatureFormat::Gff`] - 1-based closed annotations (`.gff`, `.gff3`, `.gtf`)
//!
//! A [`Layout`] maps one text line to a [`Feature`]. Indexed files take their
//! column layout from the index header so that non-standard tabix presets
//! still decode correctly.

mod bed;
mod gff;
mod header;
pub mod index;
mod vcf;

pub use header::{Header, HeaderType, TextHeader};

use crate::types::{Feature, MAX_POSITION, RecordKind};
use crate::{Error, Result};
use noodles::csi::binning_index::index::header::Format as IndexFormat;
use noodles::csi::binning_index::index::header::format::CoordinateSystem;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Feature file formats supported by tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureFormat {
    Bed,
    Vcf,
    Gff,
}

impl FeatureFormat {
    /// Detects the format from a file name, looking through a trailing `.gz`/`.bgz`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_ascii_lowercase())
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;

        let name = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".bgz"))
            .unwrap_or(&name);

        match name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("bed") => Ok(FeatureFormat::Bed),
            Some("vcf") => Ok(FeatureFormat::Vcf),
            Some("gff" | "gff3" | "gtf") => Ok(FeatureFormat::Gff),
            _ => Err(Error::UnknownFormat(path.display().to_string())),
        }
    }

    pub fn record_kind(&self) -> RecordKind {
        match self {
            FeatureFormat::Bed => RecordKind::Interval,
            FeatureFormat::Vcf => RecordKind::Variant,
            FeatureFormat::Gff => RecordKind::Annotation,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureFormat::Bed => "BED",
            FeatureFormat::Vcf => "VCF",
            FeatureFormat::Gff => "GFF",
        }
    }

    /// Default column layout for this format.
    pub fn layout(&self) -> Layout {
        match self {
            FeatureFormat::Bed => bed::LAYOUT,
            FeatureFormat::Vcf => vcf::LAYOUT,
            FeatureFormat::Gff => gff::LAYOUT,
        }
    }
}

/// Start coordinate convention of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinates {
    /// BED style: start is 0-based, end is exclusive
    ZeroBasedHalfOpen,
    /// VCF/GFF style: start and end are 1-based and inclusive
    OneBasedClosed,
}

/// Column layout used to decode feature lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub format: FeatureFormat,
    pub contig_column: usize,
    pub start_column: usize,
    /// `None` for VCF, where the stop is derived from the record itself
    pub end_column: Option<usize>,
    pub coordinates: Coordinates,
    pub comment_prefix: u8,
    pub skip_lines: u32,
}

impl Layout {
    /// Builds a layout from a tabix/CSI index header.
    pub fn from_index_header(
        header: &noodles::csi::binning_index::index::Header,
    ) -> Result<Self> {
        let (format, coordinates) = match header.format() {
            IndexFormat::Vcf => (FeatureFormat::Vcf, Coordinates::OneBasedClosed),
            IndexFormat::Generic(CoordinateSystem::Bed) => {
                (FeatureFormat::Bed, Coordinates::ZeroBasedHalfOpen)
            }
            IndexFormat::Generic(CoordinateSystem::Gff) => {
                (FeatureFormat::Gff, Coordinates::OneBasedClosed)
            }
            _ => {
                return Err(Error::UnknownFormat(
                    "SAM-preset index cannot back a feature track".to_string(),
                ));
            }
        };

        // index headers number columns from 1
        let column = |i: usize| {
            i.checked_sub(1).ok_or_else(|| {
                Error::UnknownFormat("index header declares column 0".to_string())
            })
        };

        let end_column = match format {
            FeatureFormat::Vcf => None,
            _ => header.end_position_index().map(column).transpose()?,
        };

        Ok(Self {
            format,
            contig_column: column(header.reference_sequence_name_index())?,
            start_column: column(header.start_position_index())?,
            end_column,
            coordinates,
            comment_prefix: header.line_comment_prefix(),
            skip_lines: header.line_skip_count(),
        })
    }

    /// Whether a line belongs to the file header rather than the data section.
    pub(crate) fn is_header_line(&self, line: &str) -> bool {
        line.as_bytes().first() == Some(&self.comment_prefix)
            || (self.format == FeatureFormat::Bed && bed::is_browser_line(line))
    }

    /// Decodes one data line.
    pub(crate) fn decode(&self, line: &str) -> io::Result<Feature> {
        let fields: Vec<&str> = line.split('\t').collect();
        let field = |i: usize, name: &str| {
            fields
                .get(i)
                .copied()
                .ok_or_else(|| invalid_data(format!("missing {} column", name)))
        };

        let contig = field(self.contig_column, "contig")?;
        if contig.is_empty() {
            return Err(invalid_data("empty contig".to_string()));
        }

        let raw_start = parse_coordinate(field(self.start_column, "start")?)?;
        if raw_start > u64::from(MAX_POSITION) {
            return Err(invalid_data(format!("start position out of range: {}", raw_start)));
        }
        let start = match self.coordinates {
            Coordinates::ZeroBasedHalfOpen => raw_start + 1,
            Coordinates::OneBasedClosed => raw_start,
        };

        let stop = match self.end_column {
            Some(i) => parse_coordinate(field(i, "end")?)?,
            None => vcf::stop(start, &fields)?,
        };

        if start == 0 || start > u64::from(MAX_POSITION) || stop > u64::from(MAX_POSITION) {
            return Err(invalid_data(format!("position out of range: {}-{}", start, stop)));
        }

        // zero-length BED intervals (insertion points) cover their start base
        let stop = stop.max(start);

        Ok(Feature {
            contig: contig.to_string(),
            start: start as u32,
            stop: stop as u32,
            format: self.format,
            line: line.to_string(),
        })
    }
}

fn parse_coordinate(s: &str) -> io::Result<u64> {
    s.trim()
        .parse::<u64>()
        .map_err(|e| invalid_data(format!("invalid position {:?}: {}", s, e)))
}

pub(crate) fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Prefixes a decode error with the line it came from.
pub(crate) fn at_line(err: io::Error, line_number: usize) -> io::Error {
    io::Error::new(err.kind(), format!("line {}: {}", line_number, err))
}

/// Strips a trailing `\n` or `\r\n`.
pub(crate) fn trim_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_path() {
        let cases = [
            ("calls.vcf.gz", FeatureFormat::Vcf),
            ("calls.vcf", FeatureFormat::Vcf),
            ("peaks.BED", FeatureFormat::Bed),
            ("peaks.bed.bgz", FeatureFormat::Bed),
            ("genes.gtf.gz", FeatureFormat::Gff),
            ("genes.gff3", FeatureFormat::Gff),
        ];
        for (name, expected) in cases {
            assert_eq!(FeatureFormat::from_path(&PathBuf::from(name)).unwrap(), expected);
        }
        assert!(matches!(
            FeatureFormat::from_path(&PathBuf::from("reads.bam")),
            Err(Error::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_decode_bed_is_converted_to_one_based() {
        let feature = FeatureFormat::Bed
            .layout()
            .decode("chr1\t99\t110\tpeak1")
            .unwrap();
        assert_eq!(feature.contig(), "chr1");
        assert_eq!(feature.start(), 100);
        assert_eq!(feature.stop(), 110);
        assert_eq!(feature.field(3), Some("peak1"));
    }

    #[test]
    fn test_decode_zero_length_bed() {
        let feature = FeatureFormat::Bed.layout().decode("chr1\t10\t10").unwrap();
        assert_eq!((feature.start(), feature.stop()), (11, 11));
    }

    #[test]
    fn test_decode_rejects_huge_start() {
        let bed = FeatureFormat::Bed.layout();
        let err = bed.decode("chr1\t18446744073709551615\t5").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let vcf = FeatureFormat::Vcf.layout();
        let err = vcf
            .decode("chr1\t18446744073709551615\t.\tACGT\tA\t.\tPASS\t.")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_decode_gff() {
        let line = "chr2\thavana\texon\t1000\t1200\t.\t+\t.\tgene_id \"g1\";";
        let feature = FeatureFormat::Gff.layout().decode(line).unwrap();
        assert_eq!((feature.start(), feature.stop()), (1000, 1200));
        assert_eq!(feature.format(), FeatureFormat::Gff);
    }

    #[test]
    fn test_decode_rejects_malformed_lines() {
        let layout = FeatureFormat::Bed.layout();
        let err = layout.decode("chr1\tabc\t10").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("abc"));

        assert!(layout.decode("chr1\t10").is_err());
        assert!(layout.decode("chr1\t3000000000\t3000000001").is_err());
    }

    #[test]
    fn test_header_lines() {
        let bed = FeatureFormat::Bed.layout();
        assert!(bed.is_header_line("track name=peaks"));
        assert!(bed.is_header_line("browser position chr1:1-100"));
        assert!(bed.is_header_line("#chrom\tstart\tend"));
        assert!(!bed.is_header_line("chr1\t0\t10"));

        let vcf = FeatureFormat::Vcf.layout();
        assert!(vcf.is_header_line("##fileformat=VCFv4.3"));
        assert!(!vcf.is_header_line("track\t1\t.\tA\tC"));
    }

    #[test]
    fn test_trim_newline() {
        assert_eq!(trim_newline("a\tb\r\n"), "a\tb");
        assert_eq!(trim_newline("a\tb\n"), "a\tb");
        assert_eq!(trim_newline("a\tb"), "a\tb");
    }
}
