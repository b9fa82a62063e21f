/// A genotype call produced by a caller, before it is bound to a sink
#[derive(Debug, Clone, PartialEq)]
pub enum GenotypeCall {
    /// Single-position SNP-style call with one likelihood per diploid genotype
    Point(PointCall),
    /// Call carrying insertion/deletion alleles
    VariableLength(VariableLengthCall),
}

impl GenotypeCall {
    pub fn contig(&self) -> &str {
        match self {
            GenotypeCall::Point(call) => &call.contig,
            GenotypeCall::VariableLength(call) => &call.contig,
        }
    }

    pub fn position(&self) -> u64 {
        match self {
            GenotypeCall::Point(call) => call.position,
            GenotypeCall::VariableLength(call) => call.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointCall {
    pub contig: String,
    /// 1-based
    pub position: u64,
    pub ref_base: char,
    pub read_depth: u32,
    pub rms_mapping_quality: f64,
    /// log10 likelihoods in `DiploidGenotype::ALL` order
    pub likelihoods: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndelLikelihood {
    pub alleles: Vec<String>,
    pub log10_likelihood: f64,
    /// Positive for insertions, negative for deletions
    pub length: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableLengthCall {
    pub contig: String,
    pub position: u64,
    pub ref_base: char,
    pub read_depth: u32,
    pub rms_mapping_quality: f64,
    pub first_homozygous: IndelLikelihood,
    pub second_homozygous: Option<IndelLikelihood>,
    pub het_likelihood: u8,
}
