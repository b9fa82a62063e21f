use super::{
    GENOTYPE_COUNT, GenotypeLikelihoods, LikelihoodHeader, LikelihoodRecord, MAGIC, RECORD_SIZE,
    VERSION,
};
use crate::dictionary::SequenceDictionary;
use crate::{Error, Result};
use bytes::Buf;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Upper bound on encoded name lengths, so a corrupt header cannot trigger a
/// huge allocation.
const MAX_NAME_LEN: u32 = 1 << 16;

/// Reads back a sink written by [`super::LikelihoodCodec`].
pub struct LikelihoodReader<R> {
    source_name: String,
    inner: R,
    header: LikelihoodHeader,
}

impl LikelihoodReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::read_failure("open", path.display().to_string(), e))?;
        Self::new(BufReader::new(file), path.display().to_string())
    }
}

impl<R: Read> LikelihoodReader<R> {
    /// Reads and validates the header from `inner`.
    pub fn new(mut inner: R, source_name: impl Into<String>) -> Result<Self> {
        let source_name = source_name.into();
        let header = read_header(&mut inner, &source_name)?;
        Ok(Self {
            source_name,
            inner,
            header,
        })
    }

    pub fn header(&self) -> &LikelihoodHeader {
        &self.header
    }

    pub fn records(&mut self) -> Records<'_, R> {
        Records {
            reader: self,
            done: false,
        }
    }
}

pub struct Records<'r, R> {
    reader: &'r mut LikelihoodReader<R>,
    done: bool,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<LikelihoodRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = [0u8; RECORD_SIZE];
        let result = match read_record_bytes(&mut self.reader.inner, &mut buf) {
            Ok(false) => None,
            Ok(true) => Some(Ok(decode_record(&buf))),
            Err(e) => Some(Err(Error::read_failure(
                "read record from",
                self.reader.source_name.clone(),
                e,
            ))),
        };
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}

/// Fills `buf` with one record. `Ok(false)` on a clean end of input, an
/// `UnexpectedEof` error when the input stops inside a record.
fn read_record_bytes<R: Read>(reader: &mut R, buf: &mut [u8; RECORD_SIZE]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < RECORD_SIZE {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("truncated record ({} of {} bytes)", filled, RECORD_SIZE),
                ));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

fn decode_record(mut buf: &[u8]) -> LikelihoodRecord {
    let contig_id = buf.get_u32_le();
    let position = buf.get_u32_le();
    let ref_base = buf.get_u8();
    let mapping_quality = buf.get_u8();
    let read_depth = buf.get_u16_le();

    let mut encoded = [0u16; GENOTYPE_COUNT];
    for slot in encoded.iter_mut() {
        *slot = buf.get_u16_le();
    }

    LikelihoodRecord {
        contig_id,
        position,
        ref_base,
        read_depth: u32::from(read_depth),
        rms_mapping_quality: f32::from(mapping_quality),
        likelihoods: GenotypeLikelihoods::decode(encoded),
    }
}

fn read_header<R: Read>(reader: &mut R, source_name: &str) -> Result<LikelihoodHeader> {
    let wrap = |e: io::Error| Error::read_failure("read header of", source_name, e);

    let mut prefix = [0u8; 8];
    reader.read_exact(&mut prefix).map_err(wrap)?;
    if prefix[..4] != MAGIC {
        return Err(Error::InvalidSink(format!(
            "{}: bad magic {:?}",
            source_name,
            &prefix[..4]
        )));
    }
    if prefix[4] != VERSION {
        return Err(Error::InvalidSink(format!(
            "{}: unsupported version {}",
            source_name, prefix[4]
        )));
    }

    let sample = read_string(reader, source_name)?;
    let count = read_u32(reader).map_err(wrap)?;

    let mut dictionary = SequenceDictionary::new();
    for _ in 0..count {
        let name = read_string(reader, source_name)?;
        let length = read_u32(reader).map_err(wrap)?;
        dictionary.push(name, (length > 0).then_some(length));
    }
    if dictionary.len() != count as usize {
        return Err(Error::InvalidSink(format!(
            "{}: duplicate contig names in header",
            source_name
        )));
    }

    Ok(LikelihoodHeader::new(sample, dictionary))
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_string<R: Read>(reader: &mut R, source_name: &str) -> Result<String> {
    let wrap = |e: io::Error| Error::read_failure("read header of", source_name, e);

    let len = read_u32(reader).map_err(wrap)?;
    if len > MAX_NAME_LEN {
        return Err(Error::InvalidSink(format!(
            "{}: name length {} exceeds {}",
            source_name, len, MAX_NAME_LEN
        )));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).map_err(wrap)?;
    String::from_utf8(buf)
        .map_err(|_| Error::InvalidSink(format!("{}: name is not UTF-8", source_name)))
}
