use std::io::{self, Write};

use super::result::{Chain, Collision, FragmentResult, ResultArena};
use super::FragmentStorage;
use crate::seq::Fragment;
use crate::util::dna;

#[derive(Debug, Clone)]
struct Node {
    /// 仅前 `prefix_len` 个碱基有意义
    prefix: Fragment,
    prefix_len: usize,
    children: [Option<u32>; 4],
    leaf: Option<u32>,
}

impl Node {
    fn internal(prefix: Fragment, prefix_len: usize) -> Self {
        Node { prefix, prefix_len, children: [None; 4], leaf: None }
    }
}

/// 压缩前缀树（radix trie），与 [`Lookup`](super::Lookup) 提供相同的查询接口。
///
/// 所有条目必须等长（`r1_len`）。叶节点的 `prefix_len == r1_len`，
/// 内部节点按 `prefix_len` 位置上的碱基分叉。节点保存在数组里，用下标互相引用。
#[derive(Debug)]
pub struct R1Tree {
    r1_len: usize,
    nodes: Vec<Node>,
    arena: ResultArena,
    policy: Collision,
}

impl R1Tree {
    pub fn new(r1_len: usize, policy: Collision) -> Self {
        assert!(r1_len > 0, "R1 tree needs a positive fragment length");
        R1Tree {
            r1_len,
            nodes: vec![Node::internal(Fragment::new(), 0)],
            arena: ResultArena::new(),
            policy,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn push_node(&mut self, node: Node) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(node);
        id
    }

    fn dump_node(&self, id: u32, depth: usize, out: &mut dyn Write) -> io::Result<()> {
        let node = &self.nodes[id as usize];
        let indent = " ".repeat(depth);
        let mut text = node.prefix.to_string();
        text.truncate(node.prefix_len);
        writeln!(out, "{}pfx: {}", indent, text)?;
        if let Some(leaf) = node.leaf {
            for r in self.arena.chain(Some(leaf)) {
                writeln!(out, "{}LEAF: {} : {} {} {}", indent, r.fragment, r.site, r.trim, r.errors)?;
            }
        }
        for (nt, child) in node.children.iter().enumerate() {
            if let Some(child) = child {
                writeln!(out, "{}{}:", indent, dna::from_bits(nt as u64) as char)?;
                self.dump_node(*child, depth + 1, out)?;
            }
        }
        Ok(())
    }
}

impl FragmentStorage for R1Tree {
    fn len(&self) -> usize {
        self.arena.len()
    }

    fn insert(&mut self, result: FragmentResult) -> bool {
        assert_eq!(result.fragment.len(), self.r1_len, "R1 tree entries must all have the same length");
        let mut cur = 0u32;
        loop {
            let node = &self.nodes[cur as usize];
            let c = node.prefix.common_prefix(&result.fragment, node.prefix_len);

            if c < node.prefix_len {
                // 分裂：旧内容下沉为新子节点，本节点缩短为公共前缀
                let moved = node.clone();
                let nt = moved.prefix.at(c) as usize;
                let child = self.push_node(moved);
                let node = &mut self.nodes[cur as usize];
                node.prefix_len = c;
                node.children = [None; 4];
                node.children[nt] = Some(child);
                node.leaf = None;
            }

            let node = &self.nodes[cur as usize];
            if let Some(head) = node.leaf {
                return self.arena.collide(head, result, self.policy);
            }
            let nt = result.fragment.at(node.prefix_len) as usize;
            match node.children[nt] {
                Some(child) => cur = child,
                None => {
                    let mut leaf = Node::internal(result.fragment.clone(), self.r1_len);
                    leaf.leaf = Some(self.arena.push(result));
                    let id = self.push_node(leaf);
                    self.nodes[cur as usize].children[nt] = Some(id);
                    return true;
                }
            }
        }
    }

    fn find(&self, f: &Fragment) -> Chain<'_> {
        if f.len() != self.r1_len {
            return Chain::empty();
        }
        let mut cur = 0usize;
        let mut start = 0usize;
        loop {
            let node = &self.nodes[cur];
            if !node.prefix.equals(f, node.prefix_len, start) {
                return Chain::empty();
            }
            if let Some(head) = node.leaf {
                return self.arena.chain(Some(head));
            }
            match node.children[f.at(node.prefix_len) as usize] {
                Some(child) => {
                    start = node.prefix_len;
                    cur = child as usize;
                }
                None => return Chain::empty(),
            }
        }
    }

    fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "r1 tree: {} entries, {} nodes", self.arena.len(), self.nodes.len())?;
        self.dump_node(0, 0, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Lookup, SITE_DEFERRED};

    fn entry(seq: &str, site: i32) -> FragmentResult {
        FragmentResult::new(Fragment::parse(seq.as_bytes()), 0, 50, site, 0)
    }

    fn site_of(tree: &R1Tree, seq: &str) -> Option<i32> {
        tree.find(&Fragment::parse(seq.as_bytes())).head().map(|r| r.site)
    }

    #[test]
    fn split_and_find() {
        let mut tree = R1Tree::new(6, Collision::Withdraw);
        assert!(tree.insert(entry("ACGTAC", 1)));
        assert!(tree.insert(entry("ACGTTT", 2)));
        assert!(tree.insert(entry("ACCCCC", 3)));
        assert!(tree.insert(entry("GGGGGG", 4)));
        assert_eq!(tree.len(), 4);

        assert_eq!(site_of(&tree, "ACGTAC"), Some(1));
        assert_eq!(site_of(&tree, "ACGTTT"), Some(2));
        assert_eq!(site_of(&tree, "ACCCCC"), Some(3));
        assert_eq!(site_of(&tree, "GGGGGG"), Some(4));
        assert_eq!(site_of(&tree, "ACGTAA"), None);
        assert_eq!(site_of(&tree, "ACGTTTA"), None);
        assert_eq!(site_of(&tree, "TTTTTT"), None);
    }

    #[test]
    fn duplicate_withdraws_leaf() {
        let mut tree = R1Tree::new(4, Collision::Withdraw);
        assert!(tree.insert(entry("ACGT", 7)));
        assert!(tree.insert(entry("ACGA", 8)));
        assert!(!tree.insert(entry("ACGT", 9)));
        assert_eq!(site_of(&tree, "ACGT"), Some(SITE_DEFERRED));
        assert_eq!(site_of(&tree, "ACGA"), Some(8));
    }

    #[test]
    fn chain_policy_keeps_all_origins() {
        let mut tree = R1Tree::new(4, Collision::Chain);
        assert!(tree.insert(entry("ACGT", 7)));
        assert!(tree.insert(entry("ACGT", 9)));
        let sites: Vec<i32> = tree.find(&Fragment::parse(b"ACGT")).map(|r| r.site).collect();
        assert_eq!(sites, vec![7, 9]);
    }

    #[test]
    fn query_with_miscalled_base_misses() {
        let mut tree = R1Tree::new(4, Collision::Withdraw);
        tree.insert(entry("ACGA", 1));
        assert_eq!(site_of(&tree, "ACGN"), None);
    }

    #[test]
    fn agrees_with_lookup() {
        let mut x = 17u64;
        let mut next = || {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            b"ACGT"[((x >> 16) & 3) as usize] as char
        };
        let seqs: Vec<String> = (0..300).map(|_| (0..10).map(|_| next()).collect()).collect();

        let mut tree = R1Tree::new(10, Collision::Withdraw);
        let mut lookup = Lookup::new(300, Collision::Withdraw);
        for (i, s) in seqs.iter().enumerate() {
            let a = tree.insert(entry(s, i as i32));
            let b = lookup.insert(entry(s, i as i32));
            assert_eq!(a, b);
        }
        assert_eq!(tree.len(), lookup.len());
        for s in &seqs {
            let f = Fragment::parse(s.as_bytes());
            assert_eq!(
                tree.find(&f).head().map(|r| r.site),
                lookup.find(&f).head().map(|r| r.site)
            );
        }
    }

    #[test]
    fn dump_is_indented() {
        let mut tree = R1Tree::new(3, Collision::Withdraw);
        tree.insert(entry("ACG", 1));
        tree.insert(entry("ACT", 2));
        let mut out = Vec::new();
        tree.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("LEAF: ACG : 1 0 0"));
        assert!(text.contains("\n  pfx: ACT\n") || text.contains("\n  pfx: ACG\n"));
    }
}
