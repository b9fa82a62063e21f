use super::{
    GenotypeCall, GenotypeLikelihoods, LikelihoodCodec, LikelihoodHeader, LikelihoodRecord,
    PointCall, Scale, VariableLengthCall,
};
use crate::types::MAX_POSITION;
use crate::{Error, Result};
use std::path::Path;

/// Destination for genotype calls
pub trait GenotypeWriter {
    fn add_call(&mut self, call: &GenotypeCall) -> Result<()>;

    fn add_variable_length_call(&mut self, call: &VariableLengthCall) -> Result<()>;

    fn add_no_call(&mut self, position: u64) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// Turns caller-level genotype calls into fixed-layout likelihood records.
pub struct GenotypeCallAdapter {
    codec: LikelihoodCodec,
}

impl GenotypeCallAdapter {
    pub fn new(codec: LikelihoodCodec) -> Self {
        Self { codec }
    }

    pub fn create(path: impl AsRef<Path>, header: LikelihoodHeader) -> Result<Self> {
        Ok(Self::new(LikelihoodCodec::open(path, header)?))
    }

    pub fn codec(&self) -> &LikelihoodCodec {
        &self.codec
    }

    fn to_record(&self, call: &PointCall) -> Result<LikelihoodRecord> {
        let contig_id = self.codec.header().dictionary.resolve(&call.contig)?;

        let position = u32::try_from(call.position)
            .ok()
            .filter(|p| (1..=MAX_POSITION).contains(p))
            .ok_or_else(|| Error::overflow("position", call.position))?;

        let ref_base = u8::try_from(call.ref_base)
            .ok()
            .filter(u8::is_ascii_alphabetic)
            .ok_or(Error::InvalidReferenceBase(call.ref_base))?;

        Ok(LikelihoodRecord {
            contig_id,
            position,
            ref_base,
            read_depth: call.read_depth,
            rms_mapping_quality: call.rms_mapping_quality as f32,
            likelihoods: GenotypeLikelihoods::from_slice(Scale::Log10, &call.likelihoods)?,
        })
    }
}

impl GenotypeWriter for GenotypeCallAdapter {
    fn add_call(&mut self, call: &GenotypeCall) -> Result<()> {
        let GenotypeCall::Point(point) = call else {
            return Err(Error::UnsupportedCallShape("variable-length call"));
        };
        let record = self.to_record(point)?;
        self.codec.append(&record)
    }

    fn add_variable_length_call(&mut self, call: &VariableLengthCall) -> Result<()> {
        self.codec.append_variable_length(call)
    }

    fn add_no_call(&mut self, _position: u64) -> Result<()> {
        Err(Error::UnsupportedFeature("no-call records"))
    }

    fn close(&mut self) -> Result<()> {
        self.codec.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::SequenceDictionary;
    use crate::likelihood::{GENOTYPE_COUNT, IndelLikelihood, LikelihoodReader};

    fn adapter(dir: &Path) -> GenotypeCallAdapter {
        let header = LikelihoodHeader::new(
            "sample1",
            SequenceDictionary::new()
                .with_contig("chr1", Some(1000))
                .with_contig("chr2", Some(1000)),
        );
        GenotypeCallAdapter::create(dir.join("sample1.glk"), header).unwrap()
    }

    fn point(contig: &str, position: u64) -> PointCall {
        PointCall {
            contig: contig.to_string(),
            position,
            ref_base: 'C',
            read_depth: 8,
            rms_mapping_quality: 37.2,
            likelihoods: vec![-2.0; GENOTYPE_COUNT],
        }
    }

    #[test]
    fn test_point_calls_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = adapter(dir.path());
        writer.add_call(&GenotypeCall::Point(point("chr1", 3))).unwrap();
        writer.add_call(&GenotypeCall::Point(point("chr2", 1))).unwrap();
        assert_eq!(writer.codec().records_written(), 2);
        writer.close().unwrap();
        writer.close().unwrap();

        let mut reader = LikelihoodReader::open(dir.path().join("sample1.glk")).unwrap();
        let records: Vec<LikelihoodRecord> = reader.records().collect::<Result<_>>().unwrap();
        assert_eq!(records[1].contig_id, 1);
        assert_eq!(records[0].ref_base, b'C');
        assert_eq!(records[0].rms_mapping_quality, 37.0);
        assert_eq!(records[0].likelihoods.values()[5], 2.0);
    }

    #[test]
    fn test_unknown_contig() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = adapter(dir.path());
        assert!(matches!(
            writer.add_call(&GenotypeCall::Point(point("chrUn", 3))),
            Err(Error::UnknownContig(_))
        ));
    }

    #[test]
    fn test_genotype_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = adapter(dir.path());
        let mut call = point("chr1", 3);
        call.likelihoods.pop();
        assert!(matches!(
            writer.add_call(&GenotypeCall::Point(call)),
            Err(Error::GenotypeCount {
                expected: 10,
                actual: 9
            })
        ));
    }

    #[test]
    fn test_unsupported_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = adapter(dir.path());
        let indel = VariableLengthCall {
            contig: "chr1".to_string(),
            position: 10,
            ref_base: 'G',
            read_depth: 4,
            rms_mapping_quality: 50.0,
            first_homozygous: IndelLikelihood {
                alleles: vec!["G".to_string(), "GTT".to_string()],
                log10_likelihood: -0.3,
                length: 2,
            },
            second_homozygous: None,
            het_likelihood: 12,
        };

        let err = writer
            .add_call(&GenotypeCall::VariableLength(indel.clone()))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCallShape(_)));
        assert!(matches!(
            writer.add_variable_length_call(&indel),
            Err(Error::UnsupportedFeature(_))
        ));
        assert!(matches!(
            writer.add_no_call(10),
            Err(Error::UnsupportedFeature("no-call records"))
        ));
        assert!(writer.add_no_call(0).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_non_ascii_reference_base() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = adapter(dir.path());
        let mut call = point("chr1", 3);
        call.ref_base = 'é';
        assert!(matches!(
            writer.add_call(&GenotypeCall::Point(call)),
            Err(Error::InvalidReferenceBase('é'))
        ));
    }
}
