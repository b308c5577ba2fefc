//! 片段索引：开放寻址哈希表、压缩前缀树，以及在其上构建的 R1/R2 索引。
//!
//! 构建阶段单线程完成；匹配阶段索引只读，可被多个 worker 同时查询。

pub mod lookup;
pub mod r1;
pub mod r2;
pub mod result;
pub mod tree;

use std::io::{self, Write};

use crate::seq::Fragment;

pub use lookup::Lookup;
pub use r1::R1Lookup;
pub use r2::R2Lookup;
pub use result::{Chain, Collision, FragmentResult, ResultArena, SITE_DEFERRED};
pub use tree::R1Tree;

/// 片段存储的统一接口，调用方只依赖这个 trait
pub trait FragmentStorage: Send + Sync {
    /// 已存入的候选数（含链上的）
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 存入一条候选；重复或被撤销时返回 `false`
    fn insert(&mut self, result: FragmentResult) -> bool;

    /// 内容完全相同的候选链；空链表示未找到
    fn find(&self, f: &Fragment) -> Chain<'_>;

    fn dump(&self, out: &mut dyn Write) -> io::Result<()>;
}
