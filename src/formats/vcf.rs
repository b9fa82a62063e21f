use super::{Coordinates, FeatureFormat, Layout, invalid_data};
use std::io;

const REF_COLUMN: usize = 3;
const INFO_COLUMN: usize = 7;

pub(super) const LAYOUT: Layout = Layout {
    format: FeatureFormat::Vcf,
    contig_column: 0,
    start_column: 1,
    end_column: None,
    coordinates: Coordinates::OneBasedClosed,
    comment_prefix: b'#',
    skip_lines: 0,
};

/// Computes the 1-based inclusive stop of a VCF record.
///
/// `INFO/END` wins when present (symbolic alleles, gVCF blocks); otherwise the
/// record spans its reference allele.
pub(super) fn stop(start: u64, fields: &[&str]) -> io::Result<u64> {
    if let Some(end) = fields
        .get(INFO_COLUMN)
        .and_then(|info| info.split(';').find_map(|entry| entry.strip_prefix("END=")))
    {
        return end
            .parse()
            .map_err(|e| invalid_data(format!("invalid INFO/END {:?}: {}", end, e)));
    }

    let reference_bases = fields
        .get(REF_COLUMN)
        .ok_or_else(|| invalid_data("missing REF column".to_string()))?;

    let len = reference_bases.len().max(1) as u64;
    start
        .checked_add(len - 1)
        .ok_or_else(|| invalid_data(format!("stop position out of range: {} + {}", start, len)))
}
