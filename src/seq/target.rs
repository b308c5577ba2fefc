use anyhow::{bail, Result};
use std::io::BufRead;
use std::path::Path;

use crate::io::fasta::FastaReader;
use crate::util::dna;

/// 参考靶序列。构建完成后只读，`id` 即其在 [`Targets`] 中的下标。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: usize,
    pub name: String,
    pub seq: Vec<u8>,
}

impl Target {
    #[inline]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// `[start, start + length)`，越界部分截掉
    pub fn subseq(&self, start: usize, length: usize) -> &[u8] {
        let start = start.min(self.seq.len());
        let end = start.saturating_add(length).min(self.seq.len());
        &self.seq[start..end]
    }
}

/// 按插入顺序保存的靶序列集合
#[derive(Debug, Clone, Default)]
pub struct Targets {
    targets: Vec<Target>,
}

impl Targets {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条靶序列；序列会被大写化，必须只含 ACGT。
    pub fn add(&mut self, name: impl Into<String>, seq: &[u8]) -> Result<&Target> {
        let name = name.into();
        if seq.is_empty() {
            bail!("target '{}' has an empty sequence", name);
        }
        if !dna::is_acgt(seq) {
            bail!("target '{}' contains characters other than A/C/G/T", name);
        }
        let id = self.targets.len();
        self.targets.push(Target { id, name, seq: dna::normalize_seq(seq) });
        Ok(&self.targets[id])
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut fasta = FastaReader::new(reader);
        let mut targets = Self::new();
        while let Some(rec) = fasta.next_record()? {
            targets.add(rec.id, &rec.seq)?;
        }
        Ok(targets)
    }

    pub fn from_fasta(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let fh = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("cannot open targets FASTA '{}': {}", path.display(), e))?;
        let targets = Self::from_reader(std::io::BufReader::new(fh))?;
        if targets.is_empty() {
            bail!("FASTA file '{}' contains no targets", path.display());
        }
        Ok(targets)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    #[inline]
    pub fn get(&self, id: usize) -> &Target {
        &self.targets[id]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        self.targets.iter()
    }

    /// 最长靶序列长度，决定计数表的尺寸
    pub fn max_len(&self) -> usize {
        self.targets.iter().map(Target::len).max().unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a Targets {
    type Item = &'a Target;
    type IntoIter = std::slice::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}
