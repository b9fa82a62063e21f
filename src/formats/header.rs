use super::{FeatureFormat, invalid_data};
use crate::{Error, Result};
use noodles::vcf;
use std::io;

/// The header of a feature file
#[derive(Debug, Clone)]
pub enum Header {
    /// A parsed VCF header
    Vcf(vcf::Header),
    /// Raw meta lines of a BED or GFF file
    Text(TextHeader),
}

/// Header lines kept verbatim, without trailing newlines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextHeader {
    lines: Vec<String>,
}

impl TextHeader {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Header {
    /// Builds the header for `format` from the lines preceding the data section.
    pub(crate) fn parse(format: FeatureFormat, lines: Vec<String>) -> io::Result<Self> {
        match format {
            FeatureFormat::Vcf => {
                let mut text = lines.join("\n");
                text.push('\n');
                let header: vcf::Header = text
                    .parse()
                    .map_err(|e| invalid_data(format!("invalid VCF header: {}", e)))?;
                Ok(Header::Vcf(header))
            }
            FeatureFormat::Bed | FeatureFormat::Gff => Ok(Header::Text(TextHeader::new(lines))),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Header::Vcf(_) => vcf::Header::NAME,
            Header::Text(_) => TextHeader::NAME,
        }
    }

    /// Returns the header as `T`, or `HeaderTypeMismatch` if it has another shape.
    pub fn get<T: HeaderType>(&self) -> Result<&T> {
        T::from_header(self).ok_or(Error::HeaderTypeMismatch {
            expected: T::NAME,
            actual: self.type_name(),
        })
    }
}

/// A concrete header shape that can be requested from a track
pub trait HeaderType {
    const NAME: &'static str;

    fn from_header(header: &Header) -> Option<&Self>;
}

impl HeaderType for Header {
    const NAME: &'static str = "header";

    fn from_header(header: &Header) -> Option<&Self> {
        Some(header)
    }
}

impl HeaderType for vcf::Header {
    const NAME: &'static str = "VCF header";

    fn from_header(header: &Header) -> Option<&Self> {
        match header {
            Header::Vcf(h) => Some(h),
            Header::Text(_) => None,
        }
    }
}

impl HeaderType for TextHeader {
    const NAME: &'static str = "text header";

    fn from_header(header: &Header) -> Option<&Self> {
        match header {
            Header::Text(h) => Some(h),
            Header::Vcf(_) => None,
        }
    }
}
