use super::{Coordinates, FeatureFormat, Layout};

/// seqid, start and end of GFF3/GTF (columns 1, 4 and 5)
pub(super) const LAYOUT: Layout = Layout {
    format: FeatureFormat::Gff,
    contig_column: 0,
    start_column: 3,
    end_column: Some(4),
    coordinates: Coordinates::OneBasedClosed,
    comment_prefix: b'#',
    skip_lines: 0,
};
