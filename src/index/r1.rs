use log::{debug, info};
use std::io::{self, Write};

use super::result::{Chain, Collision, FragmentResult, SITE_DEFERRED};
use super::{FragmentStorage, Lookup, R1Tree};
use crate::config::{IndexKind, Mode, SpatsConfig};
use crate::seq::{Fragment, Target, Targets};
use crate::util::dna;

/// cotrans 模式下候选中至少要有的靶序列碱基数
pub const MIN_TARGET_BASES: usize = 3;

/// 一个精确候选：R1 匹配区的文本（可能多带 1 个 lookahead 碱基）及其来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: Vec<u8>,
    pub length: usize,
    pub site: i32,
    pub trim: usize,
}

/// 枚举一条靶序列的全部 R1 候选。
///
/// 候选 = revcomp(target[L-tp..L] + linker) + adapter_b[..t]，其中 tp = r1_length - linker - t。
/// 标准模式 L 固定为靶序列全长；cotrans 模式 L 取遍 [3, len]。
/// `lookahead` 为真时多取 1 个碱基（adapter 或更靠 5′ 的靶序列），供删除变体补齐长度。
pub fn candidates(target: &Target, cfg: &SpatsConfig, lookahead: bool) -> Vec<Candidate> {
    let r1m = cfg.r1_length;
    let linker = cfg.linker.as_bytes();
    let adapter = cfg.adapter_b.as_bytes();
    let tlen = target.len();
    let (ends, min_tp) = match cfg.mode {
        Mode::Standard => (tlen..=tlen, 0),
        Mode::Cotrans => (MIN_TARGET_BASES.min(tlen)..=tlen, MIN_TARGET_BASES),
    };

    let mut out = Vec::new();
    for end in ends {
        for trim in 0..=r1m.saturating_sub(linker.len()) {
            let tp = r1m - linker.len() - trim;
            if tp < min_tp || tp > end || trim > adapter.len() {
                continue;
            }
            let mut lo = end - tp;
            // lookahead 碱基只取一个：trim 为 0 时优先取靶序列，否则取 adapter
            let from_adapter = lookahead && (trim > 0 || lo == 0);
            if lookahead && !from_adapter {
                lo -= 1;
            }
            let mut rc_part = target.seq[lo..end].to_vec();
            rc_part.extend_from_slice(linker);
            let mut text = dna::revcomp(&rc_part);
            let take = if from_adapter { trim + 1 } else { trim };
            text.extend_from_slice(&adapter[..take.min(adapter.len())]);

            out.push(Candidate {
                text,
                length: end,
                site: if trim == 0 { SITE_DEFERRED } else { (end - tp) as i32 },
                trim,
            });
        }
    }
    out
}

/// 单编辑邻域：每个位置 3 个替换、4 个插入、1 个删除（需要 lookahead 碱基），
/// 全部截断到 `r1m`
pub fn single_edits(full: &Fragment, r1m: usize) -> Vec<Fragment> {
    let mut exact = full.clone();
    exact.truncate(r1m);
    let has_lookahead = full.len() > r1m;
    let mut out = Vec::with_capacity(r1m * 8);
    for j in 0..r1m {
        let cur = exact.at(j);
        for nt in 0..4u64 {
            let mut ins = exact.clone();
            ins.insert(j, nt);
            ins.truncate(r1m);
            out.push(ins);
            if nt != cur {
                let mut sub = exact.clone();
                sub.set(j, nt);
                out.push(sub);
            }
        }
        if has_lookahead {
            let mut del = full.clone();
            del.delete(j);
            del.truncate(r1m);
            out.push(del);
        }
    }
    out
}

/// R1 索引：把所有靶序列的候选及其单编辑变体放进同一个存储
pub struct R1Lookup {
    storage: Box<dyn FragmentStorage>,
    r1_length: usize,
    candidates: usize,
}

impl R1Lookup {
    pub fn build(targets: &Targets, cfg: &SpatsConfig) -> Self {
        assert!(cfg.allowed_errors <= 1, "only allowed_errors of 0 or 1 is supported");
        let r1m = cfg.r1_length;
        let errors = cfg.allowed_errors as usize;
        let policy = match cfg.mode {
            Mode::Standard => Collision::Withdraw,
            Mode::Cotrans => Collision::Chain,
        };

        let per_target: Vec<Vec<Candidate>> =
            targets.iter().map(|t| candidates(t, cfg, errors > 0)).collect();
        let count: usize = per_target.iter().map(Vec::len).sum();
        let expected = count * (1 + 9 * r1m * errors);

        let mut storage: Box<dyn FragmentStorage> = match cfg.index_kind {
            IndexKind::Hash => Box::new(Lookup::new(expected, policy)),
            IndexKind::Trie => Box::new(R1Tree::new(r1m, policy)),
        };

        for (target, cands) in targets.iter().zip(per_target) {
            let mut kept = 0usize;
            for c in cands {
                let full = Fragment::parse(&c.text);
                let mut exact = full.clone();
                exact.truncate(r1m);
                let parent = FragmentResult::new(exact, target.id, c.length, c.site, c.trim);
                let variants = if errors > 0 { single_edits(&full, r1m) } else { Vec::new() };
                let edits: Vec<FragmentResult> = variants.into_iter().map(|v| parent.derive(v, 1)).collect();
                // 被撤销或重复的候选不再展开编辑变体
                if !storage.insert(parent) {
                    continue;
                }
                kept += 1;
                for e in edits {
                    storage.insert(e);
                }
            }
            debug!("target '{}': {} R1 candidates kept", target.name, kept);
        }

        info!("R1 index: {} candidates, {} entries", count, storage.len());
        R1Lookup { storage, r1_length: r1m, candidates: count }
    }

    #[inline]
    pub fn find(&self, f: &Fragment) -> Chain<'_> {
        self.storage.find(f)
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// 精确候选数（不含编辑变体）
    pub fn candidates(&self) -> usize {
        self.candidates
    }

    pub fn r1_length(&self) -> usize {
        self.r1_length
    }

    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        self.storage.dump(out)
    }
}
