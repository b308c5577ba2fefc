use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::seq::Fragment;

/// `site` 哨兵：需要借助 R2 索引确定位点（trim 为 0，或重复候选被撤销）
pub const SITE_DEFERRED: i32 = -1;

/// 插入索引的一条候选。
///
/// `length` 是该候选对应的靶序列长度 L（标准模式为整条靶序列，cotrans 模式为转录终点）；
/// `site` 是 5′ 位点或 [`SITE_DEFERRED`]；`trim` 是候选末尾拼接的 adapter 碱基数；
/// `errors` 是从精确候选派生时施加的编辑次数。
#[derive(Debug)]
pub struct FragmentResult {
    pub fragment: Fragment,
    pub target: usize,
    pub length: usize,
    pub site: i32,
    pub trim: usize,
    pub errors: u8,
    next: Option<u32>,
    hits: AtomicU64,
}

impl FragmentResult {
    pub fn new(fragment: Fragment, target: usize, length: usize, site: i32, trim: usize) -> Self {
        Self { fragment, target, length, site, trim, errors: 0, next: None, hits: AtomicU64::new(0) }
    }

    /// 以 `self` 为来源派生一个编辑变体
    pub fn derive(&self, fragment: Fragment, errors: u8) -> Self {
        Self {
            fragment,
            target: self.target,
            length: self.length,
            site: self.site,
            trim: self.trim,
            errors,
            next: None,
            hits: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn is_deferred(&self) -> bool {
        self.site < 0
    }

    fn same_origin(&self, other: &FragmentResult) -> bool {
        self.target == other.target
            && self.length == other.length
            && self.site == other.site
            && self.trim == other.trim
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

/// 内容完全相同的候选如何处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// 两个零错误候选撞车时撤销已有候选的位点；编辑变体仍挂到链上
    Withdraw,
    /// 一律挂到链上，由匹配阶段判断歧义
    Chain,
}

/// 候选的后备存储，两种索引共用。链表通过下标串联。
#[derive(Debug, Default)]
pub struct ResultArena {
    entries: Vec<FragmentResult>,
}

impl ResultArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self { entries: Vec::with_capacity(n) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, result: FragmentResult) -> u32 {
        let id = self.entries.len();
        assert!(id < u32::MAX as usize, "fragment index overflow");
        self.entries.push(result);
        id as u32
    }

    #[inline]
    pub fn get(&self, id: u32) -> &FragmentResult {
        &self.entries[id as usize]
    }

    pub fn chain(&self, head: Option<u32>) -> Chain<'_> {
        Chain { entries: &self.entries, cur: head }
    }

    /// `incoming` 与链头 `head` 内容相同时调用。返回是否真正存入。
    pub fn collide(&mut self, head: u32, incoming: FragmentResult, policy: Collision) -> bool {
        if policy == Collision::Withdraw && incoming.errors == 0 {
            // 精确条目不一定在链头：链头可能是别的候选的编辑变体
            let mut cur = Some(head);
            while let Some(id) = cur {
                let entry = &mut self.entries[id as usize];
                if entry.errors == 0 {
                    entry.site = SITE_DEFERRED;
                    debug!("withdrawing duplicate candidate {}", incoming.fragment);
                    return false;
                }
                cur = entry.next;
            }
        }

        let mut tail = head;
        loop {
            let entry = &self.entries[tail as usize];
            if entry.same_origin(&incoming) {
                return false;
            }
            match entry.next {
                Some(n) => tail = n,
                None => break,
            }
        }
        let id = self.push(incoming);
        self.entries[tail as usize].next = Some(id);
        true
    }
}

/// 一次查找命中的候选链，按插入顺序迭代；空链表示未命中
#[derive(Debug, Clone, Copy)]
pub struct Chain<'a> {
    entries: &'a [FragmentResult],
    cur: Option<u32>,
}

impl<'a> Chain<'a> {
    pub fn empty() -> Self {
        Chain { entries: &[], cur: None }
    }

    pub fn head(&self) -> Option<&'a FragmentResult> {
        self.cur.map(|id| &self.entries[id as usize])
    }

    pub fn is_empty(&self) -> bool {
        self.cur.is_none()
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a FragmentResult;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = &self.entries[self.cur? as usize];
        self.cur = entry.next;
        Some(entry)
    }
}
