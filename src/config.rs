use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::matcher::mask::HANDLE_LEN;
use crate::seq::FRAGMENT_CAPACITY;
use crate::util::dna;

pub const DEFAULT_ADAPTER_B: &str = "AGATCGGAAGAGCACACGTCTGAACTCCAGTCAC";
pub const DEFAULT_ADAPTER_T: &str = "AATGATACGGCGACCACCGAGATCTACACTCTTTCCCTACACGACGCTCTTCCGATCT";
pub const DEFAULT_LINKER: &str = "CTGACTCGGGCACCAAGGAC";

/// 实验类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// 每条靶序列只有一个 3′ 端（全长），无 linker
    Standard,
    /// 共转录：3′ 端可在任意位置，靶序列与 adapter 之间有 linker
    Cotrans,
}

/// R1 索引的存储实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Hash,
    Trie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatsConfig {
    pub mode: Mode,
    pub adapter_b: String,
    pub adapter_t: String,
    pub linker: String,
    /// R1 中参与匹配的长度（不含 4 nt handle）
    pub r1_length: usize,
    /// 0 或 1
    pub allowed_errors: u8,
    pub r2_match_length: usize,
    pub minimum_length: usize,
    pub index_kind: IndexKind,
    pub workers: usize,
    pub queue_capacity: usize,
    pub track_hits: bool,
}

impl Default for SpatsConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl SpatsConfig {
    pub fn standard() -> Self {
        SpatsConfig {
            mode: Mode::Standard,
            adapter_b: DEFAULT_ADAPTER_B.to_string(),
            adapter_t: DEFAULT_ADAPTER_T.to_string(),
            linker: String::new(),
            r1_length: 32,
            allowed_errors: 0,
            r2_match_length: 12,
            minimum_length: 0,
            index_kind: IndexKind::Hash,
            workers: 6,
            queue_capacity: 512,
            track_hits: false,
        }
    }

    pub fn cotrans() -> Self {
        SpatsConfig {
            mode: Mode::Cotrans,
            linker: DEFAULT_LINKER.to_string(),
            minimum_length: 20,
            ..Self::standard()
        }
    }

    /// 读段总长 = handle + R1 匹配长度
    #[inline]
    pub fn pair_length(&self) -> usize {
        self.r1_length + HANDLE_LEN
    }

    pub fn adapter_t_rc(&self) -> Vec<u8> {
        dna::revcomp(self.adapter_t.as_bytes())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("cannot open config '{}': {}", path.display(), e))?;
        serde_json::from_str(&text).map_err(|e| anyhow!("invalid config '{}': {}", path.display(), e))
    }

    /// 在构建索引前检查配置，错误信息直接给用户看
    pub fn validate(&self) -> Result<()> {
        if self.allowed_errors > 1 {
            bail!("allowed_errors must be 0 or 1 (got {})", self.allowed_errors);
        }
        if self.r1_length == 0 {
            bail!("r1_length must be positive");
        }
        if self.pair_length() > FRAGMENT_CAPACITY {
            bail!(
                "pair length {} exceeds fragment capacity {}",
                self.pair_length(),
                FRAGMENT_CAPACITY
            );
        }
        for (name, seq, allow_empty) in [
            ("adapter_b", &self.adapter_b, false),
            ("adapter_t", &self.adapter_t, false),
            ("linker", &self.linker, true),
        ] {
            if seq.is_empty() && !allow_empty {
                bail!("{} must not be empty", name);
            }
            if !dna::is_acgt(seq.as_bytes()) {
                bail!("{} contains non-ACGT characters: '{}'", name, seq);
            }
        }
        if self.mode == Mode::Cotrans && self.linker.len() + 3 > self.r1_length {
            bail!(
                "r1_length {} leaves no room for linker ({} nt) plus 3 target bases",
                self.r1_length,
                self.linker.len()
            );
        }
        if self.r2_match_length == 0 || self.r2_match_length > self.pair_length() {
            bail!(
                "r2_match_length must be in 1..={} (got {})",
                self.pair_length(),
                self.r2_match_length
            );
        }
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.queue_capacity == 0 {
            bail!("queue_capacity must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        SpatsConfig::standard().validate().unwrap();
        SpatsConfig::cotrans().validate().unwrap();
        assert_eq!(SpatsConfig::cotrans().pair_length(), 36);
        assert_eq!(SpatsConfig::default(), SpatsConfig::standard());
    }

    #[test]
    fn rejects_bad_settings() {
        let cfg = SpatsConfig { allowed_errors: 2, ..SpatsConfig::standard() };
        assert!(cfg.validate().unwrap_err().to_string().contains("allowed_errors"));

        let cfg = SpatsConfig { r1_length: 61, ..SpatsConfig::standard() };
        assert!(cfg.validate().is_err());

        let cfg = SpatsConfig { adapter_b: "ACGTN".into(), ..SpatsConfig::standard() };
        assert!(cfg.validate().is_err());

        let cfg = SpatsConfig { r1_length: 20, ..SpatsConfig::cotrans() };
        assert!(cfg.validate().is_err());

        let cfg = SpatsConfig { workers: 0, ..SpatsConfig::standard() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_with_missing_fields_uses_defaults() {
        let cfg: SpatsConfig = serde_json::from_str(r#"{"mode":"cotrans","workers":2}"#).unwrap();
        assert_eq!(cfg.mode, Mode::Cotrans);
        assert_eq!(cfg.workers, 2);
        // serde(default) 取的是 standard 预设
        assert_eq!(cfg.minimum_length, 0);
        assert_eq!(cfg.r2_match_length, 12);
    }

    #[test]
    fn adapter_t_reverse_complement() {
        let rc = SpatsConfig::standard().adapter_t_rc();
        assert!(rc.starts_with(b"AGATCGGAAGAGCGTCGTG"));
    }
}
