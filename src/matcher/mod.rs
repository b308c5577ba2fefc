//! 匹配/验证：R1 查索引、确定位点、校验 R2 边界、按 handle 分通道并计数。

pub mod counters;
pub mod mask;

use anyhow::{bail, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::SpatsConfig;
use crate::index::{FragmentResult, R1Lookup, R2Lookup};
use crate::io::ReadPair;
use crate::seq::{Fragment, Targets, FRAGMENT_CAPACITY};

pub use counters::{Count, Counters, Snapshot};
pub use mask::{classify, Channel, HANDLE_LEN};

/// 一对读段的最终分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// R1 不在索引中，或读长不符
    NoMatch,
    /// 命中链上有多个 trim 相同的候选
    Ambiguous,
    /// L 低于最小长度
    TooShort,
    /// 所有候选都未通过 R2 边界校验
    BoundaryMismatch,
    /// 读段中有 N
    Indeterminate,
    /// handle 不属于任何通道
    MaskFailure,
    Matched { channel: Channel, length: usize, site: usize },
}

impl Outcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, Outcome::Matched { .. })
    }
}

/// 单对读段的处理状态，用于逐条调试
#[derive(Debug, Clone)]
pub struct Case {
    pub pair_id: u64,
    pub handle: Vec<u8>,
    pub r1: Fragment,
    pub r2: Fragment,
    pub outcome: Outcome,
}

impl Case {
    /// `r1` 为含 handle 的完整 R1。读段超过片段容量会 panic。
    pub fn new(pair_id: u64, r1: &[u8], r2: &[u8]) -> Self {
        let split = HANDLE_LEN.min(r1.len());
        Case {
            pair_id,
            handle: r1[..split].to_ascii_uppercase(),
            r1: Fragment::parse(&r1[split..]),
            r2: Fragment::parse(r2),
            outcome: Outcome::NoMatch,
        }
    }
}

/// 处理一对读段并更新计数；返回 `false` 表示要求流水线停止
pub trait PairHandler: Sync {
    fn handle(&self, pair: &ReadPair, counters: &mut Counters) -> bool;

    fn new_counters(&self) -> Counters;
}

/// 持有只读索引的匹配器，可被多个 worker 共享
pub struct Matcher {
    cfg: SpatsConfig,
    targets: Targets,
    r1: R1Lookup,
    r2: R2Lookup,
    adapter_t_rc: Vec<u8>,
}

impl Matcher {
    pub fn build(targets: Targets, mut cfg: SpatsConfig) -> Result<Self> {
        cfg.validate()?;
        for seq in [&mut cfg.adapter_b, &mut cfg.adapter_t, &mut cfg.linker] {
            *seq = seq.to_ascii_uppercase().replace('U', "T");
        }
        if targets.is_empty() {
            bail!("no targets to index");
        }
        info!(
            "building {:?} indexes for {} target(s), longest {} nt",
            cfg.mode,
            targets.len(),
            targets.max_len()
        );
        let r1 = R1Lookup::build(&targets, &cfg);
        let r2 = R2Lookup::build(&targets, cfg.r2_match_length);
        let adapter_t_rc = cfg.adapter_t_rc();
        Ok(Matcher { cfg, targets, r1, r2, adapter_t_rc })
    }

    pub fn config(&self) -> &SpatsConfig {
        &self.cfg
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn r1_index(&self) -> &R1Lookup {
        &self.r1
    }

    pub fn r2_index(&self) -> &R2Lookup {
        &self.r2
    }

    pub fn new_counters(&self) -> Counters {
        Counters::new(self.targets.max_len())
    }

    /// 对已打包的读段做完整判定，不修改计数
    pub fn evaluate(&self, r1: &Fragment, r2: &Fragment, handle: &[u8]) -> Outcome {
        if r1.len() != self.cfg.r1_length || r2.len() != self.cfg.pair_length() {
            return Outcome::NoMatch;
        }
        let chain = self.r1.find(r1);
        let best = match chain.map(|r| r.errors).min() {
            Some(e) => e,
            None => return Outcome::NoMatch,
        };
        // 按编辑次数分层：精确条目优先，只有整层都不成立时才看编辑变体
        let tier = |errors: u8| chain.filter(move |r| r.errors == errors);
        if Self::ambiguous(tier(best)) {
            return Outcome::Ambiguous;
        }
        if tier(best).next().is_some_and(|h| h.length < self.cfg.minimum_length) {
            return Outcome::TooShort;
        }

        let r2_text = r2.to_string().into_bytes();
        for errors in best..=self.cfg.allowed_errors.max(best) {
            if errors != best && Self::ambiguous(tier(errors)) {
                return Outcome::Ambiguous;
            }
            for cand in tier(errors) {
                if let Some(outcome) = self.try_candidate(cand, r1, r2, &r2_text, handle) {
                    if self.cfg.track_hits && outcome.is_matched() {
                        cand.record_hit();
                    }
                    return outcome;
                }
            }
        }
        Outcome::BoundaryMismatch
    }

    /// 不同来源、相同 trim 的候选无法靠 R2 区分
    fn ambiguous<'a, I>(entries: I) -> bool
    where
        I: Iterator<Item = &'a FragmentResult> + Clone,
    {
        entries.clone().enumerate().any(|(i, a)| entries.clone().skip(i + 1).any(|b| b.trim == a.trim))
    }

    /// `None` 表示该候选不成立，继续尝试链上的下一个
    fn try_candidate(
        &self,
        cand: &FragmentResult,
        r1: &Fragment,
        r2: &Fragment,
        r2_text: &[u8],
        handle: &[u8],
    ) -> Option<Outcome> {
        let linker = self.cfg.linker.as_bytes();
        let ll = linker.len() as i64;
        let pair_len = r2_text.len() as i64;
        let length = cand.length as i64;
        let trim = cand.trim as i64;
        let target = &self.targets.get(cand.target).seq;

        let site = if cand.is_deferred() {
            let mut key = r2.clone();
            key.truncate(self.r2.r2_length());
            self.r2.find(&key, cand.target)? as i64
        } else {
            length - (pair_len - ll - HANDLE_LEN as i64) + trim
        };
        if site < 0 || site > length {
            return None;
        }

        // R2: [target][linker][handle rc][adapter-T rc]
        let tml = pair_len.min(length - site);
        if tml <= 0 {
            return None;
        }
        let (s, t) = (site as usize, tml as usize);
        if r2_text[..t] != target[s..s + t] {
            return None;
        }
        if tml < pair_len {
            let lml = ll.min(pair_len - tml) as usize;
            if r2_text[t..t + lml] != linker[..lml] {
                return None;
            }
            if trim > 0 {
                let tail = &r2_text[r2_text.len() - trim as usize..];
                if self.adapter_t_rc.get(..trim as usize) != Some(tail) {
                    return None;
                }
            }
            if pair_len - tml - ll - HANDLE_LEN as i64 > trim {
                return None;
            }
        }

        // R1 与 R2 推出的 trim 必须一致
        let implied = (self.cfg.r1_length as i64 - (length - site + ll)).max(0);
        if implied != trim {
            return None;
        }

        if r1.has_errors() || r2.has_errors() {
            return Some(Outcome::Indeterminate);
        }
        Some(match classify(handle) {
            Some(channel) => Outcome::Matched { channel, length: cand.length, site: s },
            None => Outcome::MaskFailure,
        })
    }

    fn count(outcome: Outcome, counters: &mut Counters) {
        counters.incr(Count::Total);
        match outcome {
            Outcome::Matched { channel, length, site } => {
                counters.register_site(channel, length, site);
                counters.incr(Count::Matched);
            }
            Outcome::MaskFailure => counters.incr(Count::MaskFailure),
            Outcome::Indeterminate => counters.incr(Count::Indeterminate),
            _ => {}
        }
    }

    /// 逐条调试入口：判定、计数，并把结果写回 `case`
    pub fn run_case(&self, case: &mut Case, counters: &mut Counters) -> Outcome {
        case.outcome = self.evaluate(&case.r1, &case.r2, &case.handle);
        Self::count(case.outcome, counters);
        case.outcome
    }

    /// `r1` 不含 handle。读长不符时只计入 total。
    pub fn process_pair(&self, handle: &[u8], r1: &[u8], r2: &[u8], counters: &mut Counters) -> bool {
        let outcome = if r1.len() != self.cfg.r1_length
            || r2.len() != self.cfg.pair_length()
            || r2.len() > FRAGMENT_CAPACITY
            || handle.len() != HANDLE_LEN
        {
            Outcome::NoMatch
        } else {
            let handle = handle.to_ascii_uppercase();
            self.evaluate(&Fragment::parse(r1), &Fragment::parse(r2), &handle)
        };
        Self::count(outcome, counters);
        true
    }
}

impl PairHandler for Matcher {
    fn handle(&self, pair: &ReadPair, counters: &mut Counters) -> bool {
        let split = HANDLE_LEN.min(pair.r1.len());
        self.process_pair(&pair.r1[..split], &pair.r1[split..], &pair.r2, counters)
    }

    fn new_counters(&self) -> Counters {
        Matcher::new_counters(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::util::dna;

    const TARGET: &str = "GGATGCCTGGCGGCCGTAGCGCGGTGGTCCCACCTGACCCCATGCCGAACTCAGAAGTGAAACGCCGTAGCGCCGATGGTAGTGTGGGGTCTCCCCATGCGAGAGTAGGGAACTGCCAGGCATCTGACTCGGGCACCAAGGAC";

    fn matcher(cfg: SpatsConfig) -> Matcher {
        let mut targets = Targets::new();
        targets.add("5S", TARGET.as_bytes()).unwrap();
        Matcher::build(targets, cfg).unwrap()
    }

    fn standard() -> SpatsConfig {
        SpatsConfig { r1_length: 31, workers: 1, ..SpatsConfig::standard() }
    }

    /// 以 `site` 为 5′ 端构造一对读段（标准模式）
    fn pair_for(cfg: &SpatsConfig, handle: &str, site: usize) -> (Vec<u8>, Vec<u8>) {
        let t = TARGET.as_bytes();
        let pair_len = cfg.pair_length();
        let insert = &t[site..];
        let mut r1 = handle.as_bytes().to_vec();
        r1.extend(dna::revcomp(insert));
        r1.extend_from_slice(cfg.adapter_b.as_bytes());
        r1.truncate(pair_len);
        let mut r2 = insert.to_vec();
        r2.extend(dna::revcomp(handle.as_bytes()));
        r2.extend(cfg.adapter_t_rc());
        r2.truncate(pair_len);
        (r1, r2)
    }

    fn run(m: &Matcher, r1: &[u8], r2: &[u8]) -> (Outcome, Counters) {
        let mut counters = m.new_counters();
        let mut case = Case::new(1, r1, r2);
        let outcome = m.run_case(&mut case, &mut counters);
        (outcome, counters)
    }

    #[test]
    fn matches_site_with_adapter() {
        let cfg = standard();
        let m = matcher(cfg.clone());
        let (r1, r2) = pair_for(&cfg, "AAAC", 130);
        let (outcome, c) = run(&m, &r1, &r2);
        assert_eq!(outcome, Outcome::Matched { channel: Channel::Treated, length: 143, site: 130 });
        assert_eq!(c.counts(), [1, 1, 0, 0]);
        assert_eq!(c.site(Channel::Treated, 143, 130), 1);
        assert_eq!(c.site_total(), 1);
    }

    #[test]
    fn matches_site_without_adapter() {
        let cfg = standard();
        let m = matcher(cfg.clone());
        let (r1, r2) = pair_for(&cfg, "CCCA", 40);
        let (outcome, _) = run(&m, &r1, &r2);
        assert_eq!(outcome, Outcome::Matched { channel: Channel::Untreated, length: 143, site: 40 });
    }

    #[test]
    fn mask_failure_and_indeterminate() {
        let cfg = standard();
        let m = matcher(cfg.clone());
        let (r1, r2) = pair_for(&cfg, "AACC", 130);
        let (outcome, c) = run(&m, &r1, &r2);
        assert_eq!(outcome, Outcome::MaskFailure);
        assert_eq!(c.counts(), [1, 0, 1, 0]);

        // N 落在 R2 的 handle 区域，边界校验仍能通过
        let (r1, mut r2) = pair_for(&cfg, "AAAC", 130);
        r2[14] = b'N';
        let (outcome, c) = run(&m, &r1, &r2);
        assert_eq!(outcome, Outcome::Indeterminate);
        assert_eq!(c.counts(), [1, 0, 0, 1]);
    }

    #[test]
    fn unknown_r1_and_bad_lengths() {
        let m = matcher(standard());
        let (outcome, c) = run(&m, &[b'A'; 35], &[b'A'; 35]);
        assert_eq!(outcome, Outcome::NoMatch);
        assert_eq!(c.counts(), [1, 0, 0, 0]);

        let mut counters = m.new_counters();
        assert!(m.process_pair(b"AAAC", &[b'A'; 20], &[b'A'; 24], &mut counters));
        assert!(m.process_pair(b"AAAC", &[b'A'; 70], &[b'A'; 74], &mut counters));
        assert_eq!(counters.counts(), [2, 0, 0, 0]);
    }

    #[test]
    fn r2_mismatch_fails_boundary() {
        let cfg = standard();
        let m = matcher(cfg.clone());
        let (r1, mut r2) = pair_for(&cfg, "AAAC", 130);
        r2[3] = if r2[3] == b'A' { b'C' } else { b'A' };
        let (outcome, c) = run(&m, &r1, &r2);
        assert_eq!(outcome, Outcome::BoundaryMismatch);
        assert_eq!(c.counts(), [1, 0, 0, 0]);
    }

    #[test]
    fn single_edit_tolerance() {
        let cfg = SpatsConfig { allowed_errors: 1, ..standard() };
        let m = matcher(cfg.clone());
        let (mut r1, r2) = pair_for(&cfg, "AAAC", 130);
        r1[10] = if r1[10] == b'G' { b'T' } else { b'G' };
        let (outcome, _) = run(&m, &r1, &r2);
        assert_eq!(outcome, Outcome::Matched { channel: Channel::Treated, length: 143, site: 130 });
    }

    #[test]
    fn hit_tracking() {
        let cfg = SpatsConfig { track_hits: true, ..standard() };
        let m = matcher(cfg.clone());
        let (r1, r2) = pair_for(&cfg, "AAAC", 130);
        run(&m, &r1, &r2);
        run(&m, &r1, &r2);
        let hit = m.r1_index().find(&Fragment::parse(&r1[4..])).head().unwrap();
        assert_eq!(hit.hits(), 2);
    }

    #[test]
    fn cotrans_pair() {
        let cfg = SpatsConfig { workers: 1, ..SpatsConfig::cotrans() };
        assert_eq!(cfg.mode, Mode::Cotrans);
        let m = matcher(cfg.clone());
        let t = TARGET.as_bytes();
        let linker = cfg.linker.as_bytes();
        // L = 60，靶序列部分 10 nt，trim = 32 - 20 - 10 = 2
        let (length, site) = (60usize, 50usize);
        let mut insert = t[site..length].to_vec();
        insert.extend_from_slice(linker);
        let mut r1 = b"GGGT".to_vec();
        r1.extend(dna::revcomp(&insert));
        r1.extend_from_slice(cfg.adapter_b.as_bytes());
        r1.truncate(36);
        let mut r2 = insert.clone();
        r2.extend(dna::revcomp(b"GGGT"));
        r2.extend(cfg.adapter_t_rc());
        r2.truncate(36);

        let (outcome, c) = run(&m, &r1, &r2);
        assert_eq!(outcome, Outcome::Matched { channel: Channel::Treated, length, site });
        assert_eq!(c.site(Channel::Treated, length, site), 1);
    }

    #[test]
    fn cotrans_minimum_length() {
        let cfg = SpatsConfig { workers: 1, ..SpatsConfig::cotrans() };
        let m = matcher(cfg.clone());
        let t = TARGET.as_bytes();
        let (length, site) = (15usize, 5usize);
        let mut insert = t[site..length].to_vec();
        insert.extend_from_slice(cfg.linker.as_bytes());
        let mut r1 = b"GGGT".to_vec();
        r1.extend(dna::revcomp(&insert));
        r1.extend_from_slice(cfg.adapter_b.as_bytes());
        r1.truncate(36);
        let r2 = vec![b'A'; 36];
        let (outcome, _) = run(&m, &r1, &r2);
        assert_eq!(outcome, Outcome::TooShort);
    }
}
