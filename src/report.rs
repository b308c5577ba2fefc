use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::config::SpatsConfig;
use crate::matcher::{Counters, Snapshot};
use crate::seq::Targets;

/// 运行元信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    pub targets_file: Option<String>,
    pub reads: Vec<String>,
    pub build_args: Option<String>,
    pub timestamp: Option<String>,
}

/// 一次运行的完整结果，可用 bincode 落盘后再加载、合并
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub config: SpatsConfig,
    pub targets: Vec<String>,
    pub counters: Counters,
    pub meta: RunMeta,
}

impl RunResult {
    pub fn new(config: SpatsConfig, targets: &Targets, counters: Counters) -> Self {
        RunResult {
            config,
            targets: targets.iter().map(|t| t.name.clone()).collect(),
            counters,
            meta: RunMeta { timestamp: Some(chrono::Utc::now().to_rfc3339()), ..RunMeta::default() },
        }
    }

    pub fn with_meta(mut self, targets_file: Option<&str>, reads: &[&str]) -> Self {
        self.meta.targets_file = targets_file.map(str::to_string);
        self.meta.reads = reads.iter().map(|s| s.to_string()).collect();
        self.meta.build_args = Some(std::env::args().collect::<Vec<_>>().join(" "));
        self
    }

    pub fn snapshot(&self) -> Snapshot {
        self.counters.snapshot(self.config.minimum_length)
    }

    /// 合并另一份结果；靶序列集合和计数表尺寸必须一致
    pub fn merge(&mut self, other: &RunResult) -> Result<()> {
        if self.targets != other.targets {
            bail!("cannot merge results over different targets ({:?} vs {:?})", self.targets, other.targets);
        }
        if self.counters.max_length() != other.counters.max_length() {
            bail!(
                "cannot merge results with different counter sizes ({} vs {})",
                self.counters.max_length(),
                other.counters.max_length()
            );
        }
        self.counters.merge(&other.counters);
        self.meta.reads.extend(other.meta.reads.iter().cloned());
        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let f = std::fs::File::create(path)
            .map_err(|e| anyhow!("cannot write result to '{}': {}", path.display(), e))?;
        let mut w = std::io::BufWriter::new(f);
        bincode::serialize_into(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .map_err(|e| anyhow!("cannot open result '{}': {}", path.display(), e))?;
        let result: Self = bincode::deserialize_from(std::io::BufReader::new(f))
            .map_err(|e| anyhow!("invalid result file '{}': {}", path.display(), e))?;
        Ok(result)
    }
}

/// `{"counts": [...], "sites": {"RRRY": {"L": [...]}, "YYYR": {...}}}`
pub fn write_json<W: Write>(snapshot: &Snapshot, out: W) -> Result<()> {
    serde_json::to_writer_pretty(out, snapshot)?;
    Ok(())
}

pub fn to_json(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string(snapshot)?)
}
