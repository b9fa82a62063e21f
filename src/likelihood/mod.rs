//! Per-position diploid genotype likelihoods and their fixed binary layout.
//!
//! # Sink layout
//!
//! All integers are little-endian.
//!
//! | section | contents |
//! |---------|----------|
//! | header  | magic `GLK1`, version (u8), 3 reserved bytes, sample name, contig list |
//! | record  | 32 bytes, see [`RECORD_SIZE`] |
//!
//! A record holds the contig id (u32), position (u32), reference base (u8),
//! RMS mapping quality (u8), read depth (u16) and ten likelihoods (u16 each) in
//! hundredths of a negative log10 unit. Records are appended in
//! `(contig_id, position)` order; the format has no slot for no-calls or
//! variable-length alleles.

mod adapter;
mod call;
mod codec;
mod reader;

pub use adapter::{GenotypeCallAdapter, GenotypeWriter};
pub use call::{GenotypeCall, IndelLikelihood, PointCall, VariableLengthCall};
pub use codec::{LikelihoodCodec, LikelihoodHeader};
pub use reader::LikelihoodReader;

use crate::{Error, Result};
use std::fmt;

pub const MAGIC: [u8; 4] = *b"GLK1";
pub const VERSION: u8 = 1;

/// Size of one encoded record in bytes
pub const RECORD_SIZE: usize = 32;

/// Number of unordered diploid genotypes over A, C, G, T
pub const GENOTYPE_COUNT: usize = 10;

/// Stored likelihoods are multiples of `1 / LIKELIHOOD_SCALE` negative log10 units.
pub const LIKELIHOOD_SCALE: f64 = 100.0;

/// Largest native-scale likelihood a record can hold.
pub const MAX_NATIVE_LIKELIHOOD: f64 = u16::MAX as f64 / LIKELIHOOD_SCALE;

/// Diploid genotypes in sink order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiploidGenotype {
    AA,
    AC,
    AG,
    AT,
    CC,
    CG,
    CT,
    GG,
    GT,
    TT,
}

impl DiploidGenotype {
    pub const ALL: [DiploidGenotype; GENOTYPE_COUNT] = [
        DiploidGenotype::AA,
        DiploidGenotype::AC,
        DiploidGenotype::AG,
        DiploidGenotype::AT,
        DiploidGenotype::CC,
        DiploidGenotype::CG,
        DiploidGenotype::CT,
        DiploidGenotype::GG,
        DiploidGenotype::GT,
        DiploidGenotype::TT,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn bases(&self) -> [u8; 2] {
        const BASES: [[u8; 2]; GENOTYPE_COUNT] = [
            *b"AA", *b"AC", *b"AG", *b"AT", *b"CC", *b"CG", *b"CT", *b"GG", *b"GT", *b"TT",
        ];
        BASES[self.index()]
    }

    pub fn is_homozygous(&self) -> bool {
        let [a, b] = self.bases();
        a == b
    }
}

impl fmt::Display for DiploidGenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.bases();
        write!(f, "{}{}", a as char, b as char)
    }
}

/// How likelihood values are expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Probabilities in `(0, 1]`
    Linear,
    /// log10 of the probability (`<= 0`)
    Log10,
    /// Negated log10 (`>= 0`); the sink's native scale
    NegativeLog10,
}

/// Likelihoods for every [`DiploidGenotype`], in [`DiploidGenotype::ALL`] order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenotypeLikelihoods {
    scale: Scale,
    values: [f64; GENOTYPE_COUNT],
}

impl GenotypeLikelihoods {
    pub fn new(scale: Scale, values: [f64; GENOTYPE_COUNT]) -> Self {
        Self { scale, values }
    }

    /// Fails with `GenotypeCount` unless `values` has one entry per genotype.
    pub fn from_slice(scale: Scale, values: &[f64]) -> Result<Self> {
        let values: [f64; GENOTYPE_COUNT] =
            values.try_into().map_err(|_| Error::GenotypeCount {
                expected: GENOTYPE_COUNT,
                actual: values.len(),
            })?;
        Ok(Self::new(scale, values))
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn values(&self) -> &[f64; GENOTYPE_COUNT] {
        &self.values
    }

    pub fn get(&self, genotype: DiploidGenotype) -> f64 {
        self.values[genotype.index()]
    }

    /// Values on the native (negative log10) scale. Order is preserved.
    pub fn to_native(&self) -> [f64; GENOTYPE_COUNT] {
        self.values.map(|v| match self.scale {
            Scale::Linear => -v.log10(),
            Scale::Log10 => -v,
            Scale::NegativeLog10 => v,
        })
    }

    pub fn to_log10(&self) -> [f64; GENOTYPE_COUNT] {
        self.to_native().map(|v| -v)
    }

    /// The most likely genotype.
    pub fn best(&self) -> DiploidGenotype {
        let native = self.to_native();
        let (best, _) = native
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |(best, min), (i, &v)| {
                if v < min { (i, v) } else { (best, min) }
            });
        DiploidGenotype::ALL[best]
    }

    /// Quantizes to the stored representation.
    pub(crate) fn encode(&self) -> Result<[u16; GENOTYPE_COUNT]> {
        let mut encoded = [0u16; GENOTYPE_COUNT];
        for (slot, value) in encoded.iter_mut().zip(self.to_native()) {
            let scaled = (value * LIKELIHOOD_SCALE).round();
            if !scaled.is_finite() || scaled < 0.0 || scaled > f64::from(u16::MAX) {
                return Err(Error::overflow("likelihood", value));
            }
            *slot = scaled as u16;
        }
        Ok(encoded)
    }

    pub(crate) fn decode(encoded: [u16; GENOTYPE_COUNT]) -> Self {
        Self::new(
            Scale::NegativeLog10,
            encoded.map(|v| f64::from(v) / LIKELIHOOD_SCALE),
        )
    }
}

/// One fixed-layout genotype likelihood record
#[derive(Debug, Clone, PartialEq)]
pub struct LikelihoodRecord {
    pub contig_id: u32,
    /// 1-based
    pub position: u32,
    pub ref_base: u8,
    pub read_depth: u32,
    pub rms_mapping_quality: f32,
    pub likelihoods: GenotypeLikelihoods,
}
