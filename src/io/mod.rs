pub mod fasta;
pub mod fastq;

/// 一对原始读段。`r1` 含前 4 个 handle 碱基。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    pub id: u64,
    pub r1: Vec<u8>,
    pub r2: Vec<u8>,
}

impl ReadPair {
    pub fn new(id: u64, r1: impl Into<Vec<u8>>, r2: impl Into<Vec<u8>>) -> Self {
        Self { id, r1: r1.into(), r2: r2.into() }
    }
}
