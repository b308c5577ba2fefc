//! # spats-rs
//!
//! 受 [SPATS](https://github.com/LucksLab/spats) 启发的 Rust 版 SHAPE-Seq 读段匹配引擎。
//!
//! 本 crate 把成对测序读段定位到参考靶序列上，并按通道、长度、位点计数，包括：
//!
//! - **片段编码**：2-bit 打包的定长核酸片段，带 N 位置掩码
//! - **片段索引**：开放寻址哈希表与压缩前缀树，支持单编辑容错
//! - **匹配验证**：R1 查索引、R2 边界校验、handle 分通道
//! - **并发流水线**：单读取线程轮转分发，多 worker 各自计数后汇总
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use spats_rs::config::SpatsConfig;
//! use spats_rs::matcher::{Case, Matcher};
//! use spats_rs::seq::Targets;
//!
//! let mut targets = Targets::new();
//! targets.add("5S", b"GGATGCCTGGCGGCCGTAGCGCGGTGGTCCCACCTGACCCCATGCCGAACTCAG").unwrap();
//!
//! let cfg = SpatsConfig { r1_length: 31, ..SpatsConfig::standard() };
//! let matcher = Matcher::build(targets, cfg).unwrap();
//!
//! let mut counters = matcher.new_counters();
//! let mut case = Case::new(1, b"AAACCTGAGTTCGGCATGGGGTCAGGTGGGACCAC", b"GTGGTCCCACCTGACCCCATGCCGAACTCAGGTTTA");
//! println!("{:?}", matcher.run_case(&mut case, &mut counters));
//! ```
//!
//! ## 模块说明
//!
//! - [`seq`] — 打包片段与靶序列
//! - [`index`] — 哈希 / 前缀树索引与 R1、R2 索引构建
//! - [`matcher`] — 匹配状态机、通道判定与计数器
//! - [`pipeline`] — 读取线程 + worker 的并发分发
//! - [`io`] — FASTA / FASTQ 文件解析
//! - [`config`] / [`report`] — 配置、JSON 报告与结果持久化
//! - [`util`] — DNA 编码 / 反向互补等工具函数

pub mod config;
pub mod index;
pub mod io;
pub mod matcher;
pub mod pipeline;
pub mod report;
pub mod seq;
pub mod util;
