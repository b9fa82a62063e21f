//! Writing and reading genotype likelihood sinks

use rodtrack::likelihood::{
    DiploidGenotype, GENOTYPE_COUNT, GenotypeCall, GenotypeCallAdapter, GenotypeLikelihoods,
    GenotypeWriter, LikelihoodCodec, LikelihoodHeader, LikelihoodReader, LikelihoodRecord,
    PointCall, RECORD_SIZE, Scale,
};
use rodtrack::{Error, Result, SequenceDictionary};

fn header() -> LikelihoodHeader {
    LikelihoodHeader::new(
        "NA12878",
        SequenceDictionary::new()
            .with_contig("chr1", Some(248_956_422))
            .with_contig("chr2", Some(242_193_529)),
    )
}

fn call(contig: &str, position: u64, best: DiploidGenotype) -> GenotypeCall {
    let mut likelihoods = vec![-4.0; GENOTYPE_COUNT];
    likelihoods[best.index()] = -0.02;
    GenotypeCall::Point(PointCall {
        contig: contig.to_string(),
        position,
        ref_base: 'A',
        read_depth: 25,
        rms_mapping_quality: 60.0,
        likelihoods,
    })
}

#[test]
fn test_adapter_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("NA12878.glk");

    let mut writer = GenotypeCallAdapter::create(&path, header()).unwrap();
    writer.add_call(&call("chr1", 1_000, DiploidGenotype::AA)).unwrap();
    writer.add_call(&call("chr1", 1_001, DiploidGenotype::AG)).unwrap();
    writer.add_call(&call("chr2", 7, DiploidGenotype::TT)).unwrap();
    writer.close().unwrap();

    let header_len = std::fs::metadata(&path).unwrap().len() as usize - 3 * RECORD_SIZE;
    assert_eq!(&std::fs::read(&path).unwrap()[..4], b"GLK1");
    assert!(header_len > 0);

    let mut reader = LikelihoodReader::open(&path).unwrap();
    assert_eq!(reader.header(), &header());

    let records: Vec<LikelihoodRecord> = reader.records().collect::<Result<_>>().unwrap();
    let keys: Vec<(u32, u32)> = records.iter().map(|r| (r.contig_id, r.position)).collect();
    assert_eq!(keys, vec![(0, 1_000), (0, 1_001), (1, 7)]);

    let best: Vec<DiploidGenotype> = records.iter().map(|r| r.likelihoods.best()).collect();
    assert_eq!(
        best,
        vec![DiploidGenotype::AA, DiploidGenotype::AG, DiploidGenotype::TT]
    );
    assert_eq!(records[2].likelihoods.get(DiploidGenotype::TT), 0.02);
}

#[test]
fn test_ordering_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ordering.glk");

    let mut writer = GenotypeCallAdapter::create(&path, header()).unwrap();
    writer.add_call(&call("chr2", 50, DiploidGenotype::CC)).unwrap();
    // same position again is allowed
    writer.add_call(&call("chr2", 50, DiploidGenotype::CC)).unwrap();

    let err = writer.add_call(&call("chr1", 60, DiploidGenotype::CC)).unwrap_err();
    assert!(matches!(err, Error::OutOfOrderRecord { .. }));
    assert!(matches!(
        writer.add_call(&call("chr2", 51, DiploidGenotype::CC)),
        Err(Error::SessionPoisoned(_))
    ));
    assert_eq!(writer.codec().records_written(), 2);
}

#[test]
fn test_no_calls_are_never_written() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = GenotypeCallAdapter::create(dir.path().join("empty.glk"), header()).unwrap();

    for position in [0, 1, 500, u64::MAX] {
        assert!(matches!(
            writer.add_no_call(position),
            Err(Error::UnsupportedFeature("no-call records"))
        ));
    }
    writer.close().unwrap();

    let mut reader = LikelihoodReader::open(dir.path().join("empty.glk")).unwrap();
    assert_eq!(reader.records().count(), 0);
}

#[test]
fn test_soft_masked_bases_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("masked.glk");
    let mut codec = LikelihoodCodec::open(&path, header()).unwrap();

    for (position, ref_base) in [(1, b'a'), (2, b'C'), (3, b'n')] {
        codec
            .append(&LikelihoodRecord {
                contig_id: 0,
                position,
                ref_base,
                read_depth: 10,
                rms_mapping_quality: 30.0,
                likelihoods: GenotypeLikelihoods::new(Scale::Log10, [-1.0; GENOTYPE_COUNT]),
            })
            .unwrap();
    }
    codec.close().unwrap();

    let mut reader = LikelihoodReader::open(&path).unwrap();
    let bases: Vec<u8> = reader.records().map(|r| r.unwrap().ref_base).collect();
    assert_eq!(bases, b"aCn".to_vec());
}

#[test]
fn test_codec_direct_append() {
    let dir = tempfile::tempdir().unwrap();
    let mut codec = LikelihoodCodec::open(dir.path().join("direct.glk"), header()).unwrap();

    let record = LikelihoodRecord {
        contig_id: 1,
        position: 9,
        ref_base: b'g',
        read_depth: 3,
        rms_mapping_quality: 12.4,
        likelihoods: GenotypeLikelihoods::new(Scale::Linear, [0.1; GENOTYPE_COUNT]),
    };
    codec.append(&record).unwrap();
    codec.close().unwrap();

    let mut reader = LikelihoodReader::open(dir.path().join("direct.glk")).unwrap();
    let read: Vec<LikelihoodRecord> = reader.records().collect::<Result<_>>().unwrap();
    assert_eq!(read[0].ref_base, b'g');
    assert_eq!(read[0].rms_mapping_quality, 12.0);
    assert_eq!(read[0].likelihoods.values(), &[1.0; GENOTYPE_COUNT]);
}
