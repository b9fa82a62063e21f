use super::{LikelihoodRecord, MAGIC, RECORD_SIZE, VERSION, VariableLengthCall};
use crate::dictionary::SequenceDictionary;
use crate::types::MAX_POSITION;
use crate::{Error, Result};
use bytes::{BufMut, BytesMut};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File header of a likelihood sink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikelihoodHeader {
    pub sample: String,
    /// Contig ids in records index into this dictionary
    pub dictionary: SequenceDictionary,
}

impl LikelihoodHeader {
    pub fn new(sample: impl Into<String>, dictionary: SequenceDictionary) -> Self {
        Self {
            sample: sample.into(),
            dictionary,
        }
    }

    pub(crate) fn encode(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u8(VERSION);
        buf.put_bytes(0, 3);
        put_string(&mut buf, "sample name", &self.sample)?;

        let count = u32::try_from(self.dictionary.len())
            .map_err(|_| Error::overflow("contig count", self.dictionary.len()))?;
        buf.put_u32_le(count);
        for contig in self.dictionary.contigs() {
            put_string(&mut buf, "contig name", &contig.name)?;
            buf.put_u32_le(contig.length.unwrap_or(0));
        }
        Ok(buf)
    }
}

fn put_string(buf: &mut BytesMut, field: &'static str, value: &str) -> Result<()> {
    let len = u32::try_from(value.len()).map_err(|_| Error::overflow(field, value.len()))?;
    buf.put_u32_le(len);
    buf.put_slice(value.as_bytes());
    Ok(())
}

/// Writes genotype likelihood records to a fixed-layout sink.
///
/// Records must arrive sorted by `(contig_id, position)`; the codec checks but
/// never reorders. The first failed append poisons the session: the sink's tail
/// is then undefined and the file should be discarded.
///
/// Unlike tracks, closing is idempotent so cleanup paths can always call it.
pub struct LikelihoodCodec {
    path: PathBuf,
    header: LikelihoodHeader,
    writer: Option<BufWriter<File>>,
    last: Option<(u32, u32)>,
    records_written: u64,
    poisoned: bool,
    buf: BytesMut,
}

impl LikelihoodCodec {
    /// Creates (or truncates) `path` and writes `header`.
    pub fn open(path: impl AsRef<Path>, header: LikelihoodHeader) -> Result<Self> {
        let path = path.as_ref();
        let encoded = header.encode()?;

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&encoded)?;

        tracing::debug!(
            "Opened likelihood sink {:?} for sample {} ({} contigs)",
            path,
            header.sample,
            header.dictionary.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            header,
            writer: Some(writer),
            last: None,
            records_written: 0,
            poisoned: false,
            buf: BytesMut::with_capacity(RECORD_SIZE),
        })
    }

    pub fn header(&self) -> &LikelihoodHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Appends one record.
    ///
    /// Any rejection poisons the session, including `UnknownContigId` and
    /// `InvalidReferenceBase`, which are detected before bytes reach the sink.
    pub fn append(&mut self, record: &LikelihoodRecord) -> Result<()> {
        if self.writer.is_none() {
            return Err(Error::SinkClosed(self.sink_name()));
        }
        if self.poisoned {
            return Err(Error::SessionPoisoned(self.sink_name()));
        }

        let result = self.write_record(record);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    /// Always fails: the layout has no room for indel alleles.
    pub fn append_variable_length(&mut self, _call: &VariableLengthCall) -> Result<()> {
        Err(Error::UnsupportedFeature("variable-length allele calls"))
    }

    /// Flushes and closes the sink. Calling it again does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.flush()?;
        writer.get_ref().sync_all()?;

        tracing::info!(
            "Wrote {} likelihood records to {:?}",
            self.records_written,
            self.path
        );
        Ok(())
    }

    fn write_record(&mut self, record: &LikelihoodRecord) -> Result<()> {
        let key = (record.contig_id, record.position);
        if let Some((last_contig_id, last_position)) = self.last {
            if key < (last_contig_id, last_position) {
                return Err(Error::OutOfOrderRecord {
                    sink: self.sink_name(),
                    contig_id: record.contig_id,
                    position: record.position,
                    last_contig_id,
                    last_position,
                });
            }
        }

        self.buf.clear();
        encode_record(&self.header, record, &mut self.buf)?;

        let Some(writer) = self.writer.as_mut() else {
            return Err(Error::SinkClosed(self.sink_name()));
        };
        writer.write_all(&self.buf)?;

        self.last = Some(key);
        self.records_written += 1;
        Ok(())
    }

    fn sink_name(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for LikelihoodCodec {
    fn drop(&mut self) {
        if self.writer.is_some() {
            tracing::debug!("Likelihood sink {:?} dropped without close", self.path);
            if let Err(e) = self.close() {
                tracing::warn!("Failed to finalize {:?}: {}", self.path, e);
            }
        }
    }
}

fn encode_record(
    header: &LikelihoodHeader,
    record: &LikelihoodRecord,
    buf: &mut BytesMut,
) -> Result<()> {
    if header.dictionary.get(record.contig_id).is_none() {
        return Err(Error::UnknownContigId {
            id: record.contig_id,
            count: header.dictionary.len(),
        });
    }

    if record.position == 0 || record.position > MAX_POSITION {
        return Err(Error::overflow("position", record.position));
    }

    if !record.ref_base.is_ascii_alphabetic() {
        return Err(Error::InvalidReferenceBase(char::from(record.ref_base)));
    }

    let read_depth = u16::try_from(record.read_depth)
        .map_err(|_| Error::overflow("read depth", record.read_depth))?;

    let mapping_quality = record.rms_mapping_quality.round();
    if !mapping_quality.is_finite() || !(0.0..=f32::from(u8::MAX)).contains(&mapping_quality) {
        return Err(Error::overflow(
            "RMS mapping quality",
            record.rms_mapping_quality,
        ));
    }

    let likelihoods = record.likelihoods.encode()?;

    buf.put_u32_le(record.contig_id);
    buf.put_u32_le(record.position);
    buf.put_u8(record.ref_base);
    buf.put_u8(mapping_quality as u8);
    buf.put_u16_le(read_depth);
    for value in likelihoods {
        buf.put_u16_le(value);
    }
    debug_assert_eq!(buf.len(), RECORD_SIZE);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::{GENOTYPE_COUNT, GenotypeLikelihoods, Scale};

    fn header() -> LikelihoodHeader {
        LikelihoodHeader::new(
            "NA12878",
            SequenceDictionary::new()
                .with_contig("chr1", Some(1000))
                .with_contig("chr2", Some(500)),
        )
    }

    fn record(contig_id: u32, position: u32) -> LikelihoodRecord {
        LikelihoodRecord {
            contig_id,
            position,
            ref_base: b'A',
            read_depth: 12,
            rms_mapping_quality: 59.6,
            likelihoods: GenotypeLikelihoods::new(Scale::Log10, [-1.5; GENOTYPE_COUNT]),
        }
    }

    #[test]
    fn test_header_layout() {
        let encoded = header().encode().unwrap();
        assert_eq!(&encoded[..4], b"GLK1");
        assert_eq!(encoded[4], VERSION);
        // magic + version + reserved + sample + count + 2 contigs
        assert_eq!(encoded.len(), 4 + 1 + 3 + (4 + 7) + 4 + 2 * (4 + 4 + 4));
    }

    #[test]
    fn test_record_layout() {
        let mut buf = BytesMut::new();
        encode_record(&header(), &record(1, 42), &mut buf).unwrap();
        assert_eq!(buf.len(), RECORD_SIZE);
        assert_eq!(&buf[..4], &1u32.to_le_bytes());
        assert_eq!(&buf[4..8], &42u32.to_le_bytes());
        assert_eq!(buf[8], b'A');
        assert_eq!(buf[9], 60);
        assert_eq!(&buf[10..12], &12u16.to_le_bytes());
        assert_eq!(&buf[12..14], &150u16.to_le_bytes());
    }

    #[test]
    fn test_equal_keys_are_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut codec = LikelihoodCodec::open(dir.path().join("calls.glk"), header()).unwrap();
        codec.append(&record(0, 10)).unwrap();
        codec.append(&record(0, 10)).unwrap();
        codec.append(&record(1, 5)).unwrap();
        assert_eq!(codec.records_written(), 3);
    }

    #[test]
    fn test_regression_fails_and_poisons() {
        let dir = tempfile::tempdir().unwrap();
        let mut codec = LikelihoodCodec::open(dir.path().join("calls.glk"), header()).unwrap();
        codec.append(&record(1, 10)).unwrap();

        let err = codec.append(&record(0, 900)).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfOrderRecord {
                contig_id: 0,
                position: 900,
                last_contig_id: 1,
                last_position: 10,
                ..
            }
        ));
        assert!(matches!(
            codec.append(&record(1, 20)),
            Err(Error::SessionPoisoned(_))
        ));
        codec.close().unwrap();
    }

    #[test]
    fn test_encoding_overflow() {
        let mut buf = BytesMut::new();
        let header = header();

        let mut deep = record(0, 1);
        deep.read_depth = 70_000;
        assert!(matches!(
            encode_record(&header, &deep, &mut buf),
            Err(Error::EncodingOverflow { field: "read depth", .. })
        ));

        let far = record(0, u32::MAX);
        assert!(matches!(
            encode_record(&header, &far, &mut buf),
            Err(Error::EncodingOverflow { field: "position", .. })
        ));

        let mut unlikely = record(0, 1);
        unlikely.likelihoods = GenotypeLikelihoods::new(Scale::Log10, [-1000.0; GENOTYPE_COUNT]);
        assert!(matches!(
            encode_record(&header, &unlikely, &mut buf),
            Err(Error::EncodingOverflow { field: "likelihood", .. })
        ));

        assert!(matches!(
            encode_record(&header, &record(2, 1), &mut buf),
            Err(Error::UnknownContigId { id: 2, count: 2 })
        ));
    }

    #[test]
    fn test_lowercase_reference_base_is_kept() {
        let mut soft_masked = record(0, 7);
        soft_masked.ref_base = b'c';
        let mut buf = BytesMut::new();
        encode_record(&header(), &soft_masked, &mut buf).unwrap();
        assert_eq!(buf[8], b'c');
    }

    #[test]
    fn test_rejected_contig_poisons_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut codec = LikelihoodCodec::open(dir.path().join("calls.glk"), header()).unwrap();
        assert!(matches!(
            codec.append(&record(5, 1)),
            Err(Error::UnknownContigId { id: 5, .. })
        ));
        assert!(matches!(
            codec.append(&record(0, 1)),
            Err(Error::SessionPoisoned(_))
        ));
        assert_eq!(codec.records_written(), 0);
    }

    #[test]
    fn test_variable_length_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let mut codec = LikelihoodCodec::open(dir.path().join("calls.glk"), header()).unwrap();
        let call = VariableLengthCall {
            contig: "chr1".to_string(),
            position: 5,
            ref_base: 'A',
            read_depth: 3,
            rms_mapping_quality: 20.0,
            first_homozygous: crate::likelihood::IndelLikelihood {
                alleles: vec!["AT".to_string()],
                log10_likelihood: -0.1,
                length: 1,
            },
            second_homozygous: None,
            het_likelihood: 7,
        };
        assert!(matches!(
            codec.append_variable_length(&call),
            Err(Error::UnsupportedFeature("variable-length allele calls"))
        ));
        // a format limitation does not poison the session
        codec.append(&record(0, 1)).unwrap();
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut codec = LikelihoodCodec::open(dir.path().join("calls.glk"), header()).unwrap();
        codec.close().unwrap();
        codec.close().unwrap();
        assert!(codec.is_closed());
        assert!(matches!(codec.append(&record(0, 1)), Err(Error::SinkClosed(_))));
    }
}
