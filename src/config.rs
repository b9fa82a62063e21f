use crate::dictionary::SequenceDictionary;
use crate::formats::FeatureFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a track binds to its file.
///
/// Deserializable so host applications can keep track definitions in their own
/// configuration files; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackOptions {
    /// Overrides format detection from the file extension
    pub format: Option<FeatureFormat>,

    /// Index to use instead of searching next to the data file
    pub index_path: Option<PathBuf>,

    /// Fail at open time instead of degrading to a stream-only track
    pub require_index: bool,

    /// Build a tabix index for BGZF input that has none
    pub create_index: bool,

    /// Sequence dictionary attached to the track
    pub dictionary: Option<SequenceDictionary>,
}

impl TrackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: FeatureFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    pub fn require_index(mut self, require: bool) -> Self {
        self.require_index = require;
        self
    }

    pub fn create_index(mut self, create: bool) -> Self {
        self.create_index = create;
        self
    }

    pub fn dictionary(mut self, dictionary: SequenceDictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }
}
