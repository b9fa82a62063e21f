use super::{Coordinates, FeatureFormat, Layout};

pub(super) const LAYOUT: Layout = Layout {
    format: FeatureFormat::Bed,
    contig_column: 0,
    start_column: 1,
    end_column: Some(2),
    coordinates: Coordinates::ZeroBasedHalfOpen,
    comment_prefix: b'#',
    skip_lines: 0,
};

/// UCSC `track`/`browser` declarations precede the data lines of a BED file.
pub(super) fn is_browser_line(line: &str) -> bool {
    ["track", "browser"].iter().any(|keyword| {
        line.strip_prefix(keyword)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
    })
}
