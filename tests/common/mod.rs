#![allow(dead_code)]

use spats_rs::config::SpatsConfig;
use spats_rs::io::ReadPair;
use spats_rs::matcher::Matcher;
use spats_rs::seq::Targets;
use spats_rs::util::dna;

/// 143 nt 的 5S rRNA 靶序列
pub const TARGET_5S: &str = "GGATGCCTGGCGGCCGTAGCGCGGTGGTCCCACCTGACCCCATGCCGAACTCAGAAGTGAAACGCCGTAGCGCCGATGGTAGTGTGGGGTCTCCCCATGCGAGAGTAGGGAACTGCCAGGCATCTGACTCGGGCACCAAGGAC";

pub fn targets_5s() -> Targets {
    let mut targets = Targets::new();
    targets.add("5S", TARGET_5S.as_bytes()).unwrap();
    targets
}

pub fn config(allowed_errors: u8) -> SpatsConfig {
    SpatsConfig { r1_length: 31, allowed_errors, ..SpatsConfig::standard() }
}

pub fn matcher(cfg: SpatsConfig) -> Matcher {
    Matcher::build(targets_5s(), cfg).unwrap()
}

/// 5′ 端在 `site` 的完整插入片段对应的一对读段
pub fn pair_for(cfg: &SpatsConfig, handle: &str, site: usize) -> (Vec<u8>, Vec<u8>) {
    let insert = &TARGET_5S.as_bytes()[site..];
    let pair_len = cfg.pair_length();
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

/// 线性同余发生器，保证各测试输入可复现
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

const HANDLES: [&str; 6] = ["AAAC", "GGGT", "CCCA", "TTTG", "AACC", "AGAC"];
const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// 混合的读段批次：可匹配的、单碱基突变的、含 N 的、随机的
pub fn mixed_pairs(cfg: &SpatsConfig, n: u64, seed: u64) -> Vec<ReadPair> {
    let mut rng = Lcg::new(seed);
    let pair_len = cfg.pair_length();
    (1..=n)
        .map(|id| {
            let kind = rng.below(16);
            if kind == 0 {
                let r1: Vec<u8> = (0..pair_len).map(|_| BASES[rng.below(4) as usize]).collect();
                let r2: Vec<u8> = (0..pair_len).map(|_| BASES[rng.below(4) as usize]).collect();
                return ReadPair::new(id, r1, r2);
            }
            let handle = HANDLES[rng.below(HANDLES.len() as u64) as usize];
            let site = rng.below(TARGET_5S.len() as u64) as usize;
            let (mut r1, mut r2) = pair_for(cfg, handle, site);
            match kind {
                1 | 2 => {
                    let pos = 4 + rng.below((pair_len - 4) as u64) as usize;
                    r1[pos] = BASES[rng.below(4) as usize];
                }
                3 => {
                    let pos = rng.below(pair_len as u64) as usize;
                    r2[pos] = b'N';
                }
                _ => {}
            }
            ReadPair::new(id, r1, r2)
        })
        .collect()
}
