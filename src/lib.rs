pub mod config;
pub mod dictionary;
pub mod error;
pub mod formats;
pub mod likelihood;
pub mod reader;
pub mod track;
pub mod types;

pub use config::TrackOptions;
pub use dictionary::{Contig, SequenceDictionary};
pub use error::{Error, Result};
pub use formats::{FeatureFormat, Header, HeaderType, TextHeader};
pub use reader::{FeatureReader, RangeIndexedReader, StreamReader};
pub use track::{Track, TrackFeatures};
pub use types::{Feature, FeatureRecord, GenomicInterval, RecordKind, TrackIdentity};
