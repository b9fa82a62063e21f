use crate::{Error, Result};
use noodles::vcf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One reference sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contig {
    pub name: String,
    /// Length in bases, when known
    pub length: Option<u32>,
}

/// Ordered contigs; a contig's id is its position in the dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Contig>", into = "Vec<Contig>")]
pub struct SequenceDictionary {
    contigs: Vec<Contig>,
    ids: HashMap<String, u32>,
}

impl SequenceDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a contig and returns its id. Re-adding a known name returns the
    /// existing id.
    pub fn push(&mut self, name: impl Into<String>, length: Option<u32>) -> u32 {
        let name = name.into();
        if let Some(&id) = self.ids.get(&name) {
            return id;
        }
        let id = self.contigs.len() as u32;
        self.ids.insert(name.clone(), id);
        self.contigs.push(Contig { name, length });
        id
    }

    pub fn with_contig(mut self, name: impl Into<String>, length: Option<u32>) -> Self {
        self.push(name, length);
        self
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    /// Resolves a contig name, failing with `UnknownContig`.
    pub fn resolve(&self, name: &str) -> Result<u32> {
        self.id(name)
            .ok_or_else(|| Error::UnknownContig(name.to_string()))
    }

    pub fn get(&self, id: u32) -> Option<&Contig> {
        self.contigs.get(id as usize)
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    /// Builds a dictionary from the `##contig` lines of a VCF header.
    pub fn from_vcf_header(header: &vcf::Header) -> Self {
        let mut dictionary = Self::new();
        for (name, contig) in header.contigs() {
            let length = contig.length().and_then(|len| u32::try_from(len).ok());
            dictionary.push(name.to_string(), length);
        }
        dictionary
    }
}

impl From<Vec<Contig>> for SequenceDictionary {
    fn from(contigs: Vec<Contig>) -> Self {
        let mut dictionary = Self::new();
        for contig in contigs {
            dictionary.push(contig.name, contig.length);
        }
        dictionary
    }
}

impl From<SequenceDictionary> for Vec<Contig> {
    fn from(dictionary: SequenceDictionary) -> Self {
        dictionary.contigs
    }
}
