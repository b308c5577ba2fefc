use log::{debug, info};
use std::io::{self, Write};

use super::result::{Chain, Collision, FragmentResult, ResultArena};
use super::FragmentStorage;
use crate::seq::Fragment;

const EMPTY: u32 = u32::MAX;
/// 初始槽位数；桶数已是条目数的 8 倍以上，溢出时再翻倍
const MIN_LIST_SIZE: usize = 4;
/// 超过这个大小的表在 info 级别报告
const LARGE_TABLE_BYTES: usize = 64 << 20;

/// 开放寻址哈希索引。
///
/// `modulus` 个桶，每桶 `list_size` 个槽位，槽位保存链头在 arena 中的下标。
/// 键为片段首字原始位对 `modulus`（形如 2^k − 1）取模。
/// 某个桶的槽位用尽时整体重建：槽位数翻倍，所有链头重新散列。
#[derive(Debug)]
pub struct Lookup {
    expected: usize,
    modulus: u64,
    list_size: usize,
    slots: Vec<u32>,
    heads: usize,
    arena: ResultArena,
    policy: Collision,
}

fn modulus_for(count: usize, expected: usize) -> u64 {
    let want = (count.max(expected).max(4) as u64) << 3;
    let mut m = 1u64;
    while m < want {
        m <<= 1;
    }
    m - 1
}

impl Lookup {
    pub fn new(expected: usize, policy: Collision) -> Self {
        let modulus = modulus_for(0, expected);
        let list_size = MIN_LIST_SIZE;
        let bytes = modulus as usize * list_size * std::mem::size_of::<u32>();
        if bytes >= LARGE_TABLE_BYTES {
            info!("lookup table: {} buckets x {} slots ({} MiB)", modulus, list_size, bytes >> 20);
        } else {
            debug!("lookup table: {} buckets x {} slots ({}K)", modulus, list_size, bytes >> 10);
        }
        Lookup {
            expected,
            modulus,
            list_size,
            slots: vec![EMPTY; modulus as usize * list_size],
            heads: 0,
            arena: ResultArena::with_capacity(expected),
            policy,
        }
    }

    #[inline]
    fn bucket(&self, f: &Fragment) -> usize {
        (f.key() % self.modulus) as usize * self.list_size
    }

    /// 以 `list_size` 为下限重建整张表，直到所有链头都能放下
    fn rebuild(&mut self, min_list_size: usize) {
        let mut list_size = min_list_size.max(self.list_size).max(MIN_LIST_SIZE);
        let modulus = modulus_for(self.heads, self.expected);
        let heads: Vec<u32> = self.slots.iter().copied().filter(|&s| s != EMPTY).collect();

        'grow: loop {
            let mut slots = vec![EMPTY; modulus as usize * list_size];
            for &id in &heads {
                let base = (self.arena.get(id).fragment.key() % modulus) as usize * list_size;
                match slots[base..base + list_size].iter().position(|&s| s == EMPTY) {
                    Some(i) => slots[base + i] = id,
                    None => {
                        list_size <<= 1;
                        continue 'grow;
                    }
                }
            }
            debug!(
                "lookup rebuild: {} entries, {} buckets x {} slots ({}K)",
                heads.len(),
                modulus,
                list_size,
                (slots.len() * 4) >> 10
            );
            self.modulus = modulus;
            self.list_size = list_size;
            self.slots = slots;
            return;
        }
    }

    fn find_slot(&self, f: &Fragment) -> Option<u32> {
        let base = self.bucket(f);
        self.slots[base..base + self.list_size]
            .iter()
            .take_while(|&&s| s != EMPTY)
            .copied()
            .find(|&id| self.arena.get(id).fragment == *f)
    }

    /// 已占用槽位分布：(桶号, 槽位数)，仅列出非空桶
    pub fn occupancy(&self) -> Vec<(u64, usize)> {
        (0..self.modulus as usize)
            .filter_map(|b| {
                let base = b * self.list_size;
                let n = self.slots[base..base + self.list_size].iter().take_while(|&&s| s != EMPTY).count();
                (n > 0).then_some((b as u64, n))
            })
            .collect()
    }

    pub fn list_size(&self) -> usize {
        self.list_size
    }

    /// 槽位表占用的字节数（不含候选本身）
    pub fn table_bytes(&self) -> usize {
        self.slots.len() * std::mem::size_of::<u32>()
    }
}

impl FragmentStorage for Lookup {
    fn len(&self) -> usize {
        self.arena.len()
    }

    fn insert(&mut self, result: FragmentResult) -> bool {
        loop {
            let base = self.bucket(&result.fragment);
            let mut free = None;
            for i in 0..self.list_size {
                let id = self.slots[base + i];
                if id == EMPTY {
                    free = Some(base + i);
                    break;
                }
                if self.arena.get(id).fragment == result.fragment {
                    return self.arena.collide(id, result, self.policy);
                }
            }
            match free {
                Some(slot) => {
                    self.slots[slot] = self.arena.push(result);
                    self.heads += 1;
                    return true;
                }
                None => self.rebuild(self.list_size << 1),
            }
        }
    }

    fn find(&self, f: &Fragment) -> Chain<'_> {
        match self.find_slot(f) {
            Some(id) => self.arena.chain(Some(id)),
            None => Chain::empty(),
        }
    }

    fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            "lookup: {} entries, {} buckets x {} slots",
            self.arena.len(),
            self.modulus,
            self.list_size
        )?;
        for (bucket, n) in self.occupancy() {
            writeln!(out, " 0x{:x} : {}", bucket, n)?;
            let base = bucket as usize * self.list_size;
            for &id in &self.slots[base..base + n] {
                for r in self.arena.chain(Some(id)) {
                    writeln!(out, "   {} : {} {} {} {}", r.fragment, r.site, r.trim, r.errors, r.hits())?;
                }
            }
        }
        Ok(())
    }
}
