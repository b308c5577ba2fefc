use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::mask::Channel;

pub const NUM_COUNTS: usize = 4;

/// 固定计数器，下标即其在 `counts` 列表中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Total = 0,
    Matched = 1,
    MaskFailure = 2,
    Indeterminate = 3,
}

/// 每个 worker 独占一份的计数器。
///
/// 位点表按 (通道, L, site) 展开成 `2 * n * n` 的一维数组，`n` 为最长靶序列长度 + 1。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    counts: [u64; NUM_COUNTS],
    n: usize,
    sites: Vec<u64>,
}

/// 计数器快照：固定计数列表 + 通道 → L → 各位点计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub counts: Vec<u64>,
    pub sites: BTreeMap<String, BTreeMap<usize, Vec<u64>>>,
}

impl Counters {
    pub fn new(max_length: usize) -> Self {
        let n = max_length + 1;
        Counters { counts: [0; NUM_COUNTS], n, sites: vec![0; 2 * n * n] }
    }

    /// 能容纳的最大 L
    pub fn max_length(&self) -> usize {
        self.n - 1
    }

    #[inline]
    pub fn incr(&mut self, which: Count) {
        self.counts[which as usize] += 1;
    }

    #[inline]
    pub fn get(&self, which: Count) -> u64 {
        self.counts[which as usize]
    }

    pub fn counts(&self) -> [u64; NUM_COUNTS] {
        self.counts
    }

    #[inline]
    fn index(&self, channel: Channel, length: usize, site: usize) -> Option<usize> {
        (length < self.n && site < self.n).then(|| channel.index() * self.n * self.n + self.n * length + site)
    }

    /// 越界的 (L, site) 直接忽略
    #[inline]
    pub fn register_site(&mut self, channel: Channel, length: usize, site: usize) {
        if let Some(i) = self.index(channel, length, site) {
            self.sites[i] += 1;
        }
    }

    pub fn site(&self, channel: Channel, length: usize, site: usize) -> u64 {
        self.index(channel, length, site).map_or(0, |i| self.sites[i])
    }

    /// 所有位点计数之和
    pub fn site_total(&self) -> u64 {
        self.sites.iter().sum()
    }

    /// 逐元素相加；两边尺寸必须一致
    pub fn merge(&mut self, other: &Counters) {
        assert_eq!(self.n, other.n, "cannot merge counters of different sizes");
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
        for (a, b) in self.sites.iter_mut().zip(other.sites.iter()) {
            *a += b;
        }
    }

    pub fn merged(mut self, other: Counters) -> Counters {
        self.merge(&other);
        self
    }

    pub fn snapshot(&self, min_length: usize) -> Snapshot {
        let mut sites = BTreeMap::new();
        for channel in Channel::ALL {
            let per_length: BTreeMap<usize, Vec<u64>> = (min_length..self.n)
                .map(|length| (length, (0..=length).map(|site| self.site(channel, length, site)).collect()))
                .collect();
            sites.insert(channel.label().to_string(), per_length);
        }
        Snapshot { counts: self.counts.to_vec(), sites }
    }
}
