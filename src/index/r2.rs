use log::info;
use std::io::{self, Write};

use super::result::{Collision, FragmentResult};
use super::{FragmentStorage, Lookup};
use crate::seq::{Fragment, Targets};

/// R2 索引：每条靶序列一张表，键为长度 `r2_length` 的滑动窗口，值为窗口起点。
///
/// 在同一靶序列中出现多次的窗口被撤销，查询时当作未命中。
pub struct R2Lookup {
    r2_length: usize,
    stores: Vec<Lookup>,
}

impl R2Lookup {
    pub fn build(targets: &Targets, r2_length: usize) -> Self {
        assert!(r2_length > 0, "R2 match length must be positive");
        let stores: Vec<Lookup> = targets
            .iter()
            .map(|t| {
                let windows = (t.len() + 1).saturating_sub(r2_length);
                let mut store = Lookup::new(windows, Collision::Withdraw);
                for start in 0..windows {
                    let f = Fragment::parse(t.subseq(start, r2_length));
                    store.insert(FragmentResult::new(f, t.id, t.len(), start as i32, 0));
                }
                store
            })
            .collect();
        info!(
            "R2 index: {} targets, {} windows of {} nt",
            stores.len(),
            stores.iter().map(|s| s.len()).sum::<usize>(),
            r2_length
        );
        R2Lookup { r2_length, stores }
    }

    #[inline]
    pub fn r2_length(&self) -> usize {
        self.r2_length
    }

    /// 在 `target` 中查找窗口，返回唯一的起点
    pub fn find(&self, f: &Fragment, target: usize) -> Option<usize> {
        let hit = self.stores.get(target)?.find(f).head()?;
        (!hit.is_deferred()).then_some(hit.site as usize)
    }

    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        for (id, store) in self.stores.iter().enumerate() {
            writeln!(out, "target {}:", id)?;
            store.dump(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_unique_windows() {
        let mut targets = Targets::new();
        targets.add("a", b"GGATGCCTGGCGGCCGTAGCGC").unwrap();
        targets.add("b", b"ACGTACGTAC").unwrap();
        let r2 = R2Lookup::build(&targets, 4);

        assert_eq!(r2.find(&Fragment::parse(b"GGAT"), 0), Some(0));
        assert_eq!(r2.find(&Fragment::parse(b"AGCG"), 0), Some(17));
        assert_eq!(r2.find(&Fragment::parse(b"GGAT"), 1), None);
        // 重复窗口被撤销
        assert_eq!(r2.find(&Fragment::parse(b"ACGT"), 1), None);
        assert_eq!(r2.find(&Fragment::parse(b"GTAC"), 1), None);
        assert_eq!(r2.find(&Fragment::parse(b"ACGT"), 7), None);
    }

    #[test]
    fn short_target_has_no_windows() {
        let mut targets = Targets::new();
        targets.add("tiny", b"ACG").unwrap();
        let r2 = R2Lookup::build(&targets, 12);
        assert_eq!(r2.find(&Fragment::parse(b"ACG"), 0), None);
    }
}
