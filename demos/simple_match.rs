//! 演示如何在 library 模式下使用 spats-rs 匹配读段。
//!
//! 运行方式：
//! ```bash
//! cargo run --example simple_match
//! ```

use spats_rs::config::SpatsConfig;
use spats_rs::matcher::{Case, Matcher};
use spats_rs::report;
use spats_rs::seq::Targets;
use spats_rs::util::dna;

fn main() -> anyhow::Result<()> {
    // 1. 靶序列
    let target = b"GGATGCCTGGCGGCCGTAGCGCGGTGGTCCCACCTGACCCCATGCCGAACTCAGAAGTGAAACGCCGTAGCGCCGATGGTAGTGTGGGGTCTCCCCATGCGAGAGTAGGGAACTGCCAGGCATCTGACTCGGGCACCAAGGAC";
    let mut targets = Targets::new();
    targets.add("5S", target)?;
    println!("靶序列长度: {} nt", target.len());

    // 2. 构建索引（允许 R1 上一个编辑）
    let cfg = SpatsConfig { r1_length: 31, allowed_errors: 1, ..SpatsConfig::standard() };
    let matcher = Matcher::build(targets, cfg)?;
    let cfg = matcher.config();
    println!("R1 候选: {}，索引条目: {}", matcher.r1_index().candidates(), matcher.r1_index().len());

    // 3. 构造几对读段：插入片段从 site 开始直到 3′ 端
    let mut counters = matcher.new_counters();
    for (handle, site) in [("AAAC", 40usize), ("CCCA", 40), ("AACC", 100), ("GGGT", 130)] {
        let insert = &target[site..];
        let mut r1 = handle.as_bytes().to_vec();
        r1.extend(dna::revcomp(insert));
        r1.extend_from_slice(cfg.adapter_b.as_bytes());
        r1.truncate(cfg.pair_length());
        let mut r2 = insert.to_vec();
        r2.extend(dna::revcomp(handle.as_bytes()));
        r2.extend(cfg.adapter_t_rc());
        r2.truncate(cfg.pair_length());

        let mut case = Case::new(0, &r1, &r2);
        let outcome = matcher.run_case(&mut case, &mut counters);
        println!("  handle={} site={:>3} -> {:?}", handle, site, outcome);
    }

    // 4. 只保留 L = 靶长的报告
    let snapshot = counters.snapshot(target.len());
    println!("\n[total, matched, mask_failure, indeterminate] = {:?}", snapshot.counts);
    println!("{}", report::to_json(&snapshot)?);
    println!("\n完成！");
    Ok(())
}
