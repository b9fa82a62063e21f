//! Locating, loading and building tabix/CSI indexes for feature files.

use super::{FeatureFormat, Layout, at_line, trim_newline};
use crate::{Error, Result};
use noodles::bgzf;
use noodles::core::Position;
use noodles::csi::binning_index::BinningIndex;
use noodles::csi::binning_index::index::header::Builder as IndexHeaderBuilder;
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
use noodles::{csi, tabix};
use std::fs::File;
use std::io::BufRead;
use std::path::{Path, PathBuf};

const INDEX_EXTENSIONS: [&str; 2] = ["tbi", "csi"];

/// Finds an index next to `path`.
///
/// Both the appended (`calls.vcf.gz.tbi`) and the replaced (`calls.vcf.tbi`)
/// naming conventions are checked, tabix before CSI.
pub fn find_index(path: &Path) -> Option<PathBuf> {
    for ext in INDEX_EXTENSIONS {
        let appended = PathBuf::from(format!("{}.{}", path.display(), ext));
        if appended.exists() {
            return Some(appended);
        }
    }

    for ext in INDEX_EXTENSIONS {
        let replaced = path.with_extension(ext);
        if replaced.exists() {
            return Some(replaced);
        }
    }

    None
}

/// Reads a `.tbi` or `.csi` index.
pub fn read_index(index_path: &Path) -> Result<Box<dyn BinningIndex>> {
    let is_csi = index_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csi"));

    let source_name = index_path.display().to_string();

    if is_csi {
        let index = csi::read(index_path)
            .map_err(|e| Error::read_failure("read CSI index", source_name, e))?;
        Ok(Box::new(index))
    } else {
        let index = tabix::read(index_path)
            .map_err(|e| Error::read_failure("read tabix index", source_name, e))?;
        Ok(Box::new(index))
    }
}

/// Position of a contig in the index's reference sequence name list.
pub(crate) fn reference_sequence_id(index: &dyn BinningIndex, contig: &str) -> Option<usize> {
    index.header()?.reference_sequence_names().iter().position(|name| {
        let name: &[u8] = name.as_ref();
        name == contig.as_bytes()
    })
}

/// Builds a tabix index for a BGZF-compressed, sorted feature file and writes it
/// to `<path>.tbi`.
pub fn build_index(path: &Path, format: FeatureFormat) -> Result<PathBuf> {
    let source_name = path.display().to_string();
    let io_err = |e: std::io::Error| Error::read_failure("index", source_name.clone(), e);

    let file = File::open(path).map_err(io_err)?;
    let mut reader = bgzf::Reader::new(file);
    let layout = format.layout();

    let header = match format {
        FeatureFormat::Bed => IndexHeaderBuilder::bed(),
        FeatureFormat::Vcf => IndexHeaderBuilder::vcf(),
        FeatureFormat::Gff => IndexHeaderBuilder::gff(),
    }
    .build();

    let mut indexer = tabix::index::Indexer::default();
    indexer.set_header(header);

    let mut buf = String::new();
    let mut line_number = 0;
    let mut records = 0usize;

    loop {
        let start = reader.virtual_position();
        buf.clear();
        if reader.read_line(&mut buf).map_err(io_err)? == 0 {
            break;
        }
        line_number += 1;
        let end = reader.virtual_position();

        let line = trim_newline(&buf);
        if line.is_empty() || layout.is_header_line(line) {
            continue;
        }

        let feature = layout
            .decode(line)
            .map_err(|e| io_err(at_line(e, line_number)))?;
        let (feature_start, feature_stop) = positions(&layout, feature.start(), feature.stop())?;

        indexer
            .add_record(feature.contig(), feature_start, feature_stop, Chunk::new(start, end))
            .map_err(io_err)?;
        records += 1;
    }

    let index = indexer.build();
    let index_path = PathBuf::from(format!("{}.tbi", path.display()));
    tabix::write(&index_path, &index)
        .map_err(|e| Error::read_failure("write tabix index", index_path.display().to_string(), e))?;

    tracing::info!(
        "Indexed {} {} records from {:?} into {:?}",
        records,
        layout.format.name(),
        path,
        index_path
    );

    Ok(index_path)
}

fn positions(layout: &Layout, start: u32, stop: u32) -> Result<(Position, Position)> {
    let to_position = |value: u32| {
        Position::try_from(value as usize).map_err(|e| {
            Error::InvalidRange(format!("{} position {}: {}", layout.format.name(), value, e))
        })
    };
    Ok((to_position(start)?, to_position(stop)?))
}
