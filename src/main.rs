use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use spats_rs::config::{IndexKind, Mode, SpatsConfig};
use spats_rs::io::fastq;
use spats_rs::matcher::{Count, Matcher};
use spats_rs::pipeline::Pipeline;
use spats_rs::report::{self, RunResult};
use spats_rs::seq::Targets;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "spats-rs", author, version, about = "SHAPE-Seq read-pair matcher inspired by SPATS", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 覆盖配置文件中对应字段的命令行参数
#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON config file (flags below override it)
    #[arg(short, long)]
    config: Option<String>,
    /// Cotranscriptional experiment (linker, all 3' ends)
    #[arg(long)]
    cotrans: bool,
    /// R1 match length, excluding the 4 nt handle
    #[arg(long = "r1-length")]
    r1_length: Option<usize>,
    /// Single-edit tolerance on R1 (0 or 1)
    #[arg(short = 'e', long = "allowed-errors")]
    allowed_errors: Option<u8>,
    #[arg(long = "r2-match-length")]
    r2_match_length: Option<usize>,
    #[arg(long = "minimum-length")]
    minimum_length: Option<usize>,
    /// Use the prefix tree instead of the hash table for R1
    #[arg(long)]
    trie: bool,
    #[arg(short = 't', long = "workers")]
    workers: Option<usize>,
    #[arg(long = "queue-capacity")]
    queue_capacity: Option<usize>,
    /// Count hits per index entry (shown by --dump)
    #[arg(long = "track-hits")]
    track_hits: bool,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<SpatsConfig> {
        let mut cfg = match &self.config {
            Some(path) => SpatsConfig::from_json_file(path)?,
            None if self.cotrans => SpatsConfig::cotrans(),
            None => SpatsConfig::standard(),
        };
        if self.cotrans && cfg.mode != Mode::Cotrans {
            let base = SpatsConfig::cotrans();
            cfg.mode = Mode::Cotrans;
            cfg.linker = base.linker;
            cfg.minimum_length = base.minimum_length;
        }
        if let Some(v) = self.r1_length {
            cfg.r1_length = v;
        }
        if let Some(v) = self.allowed_errors {
            cfg.allowed_errors = v;
        }
        if let Some(v) = self.r2_match_length {
            cfg.r2_match_length = v;
        }
        if let Some(v) = self.minimum_length {
            cfg.minimum_length = v;
        }
        if self.trie {
            cfg.index_kind = IndexKind::Trie;
        }
        if let Some(v) = self.workers {
            cfg.workers = v;
        }
        if let Some(v) = self.queue_capacity {
            cfg.queue_capacity = v;
        }
        cfg.track_hits |= self.track_hits;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the R1/R2 indexes for the targets and print their statistics
    Index {
        /// Targets FASTA file
        targets: String,
        #[command(flatten)]
        config: ConfigArgs,
        /// Dump the R1 index to stdout
        #[arg(long)]
        dump: bool,
    },
    /// Match paired FASTQ reads against the targets
    Run {
        /// Targets FASTA file
        targets: String,
        /// R1 FASTQ file
        r1: String,
        /// R2 FASTQ file
        r2: String,
        #[command(flatten)]
        config: ConfigArgs,
        /// Output JSON path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        /// Also save the full result (bincode) for later `report`
        #[arg(short, long)]
        save: Option<String>,
    },
    /// Load saved results, aggregate them and print the JSON report
    Report {
        /// Saved result files
        #[arg(required = true)]
        results: Vec<String>,
        /// Output JSON path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Index { targets, config, dump } => run_index(&targets, config.resolve()?, dump),
        Commands::Run { targets, r1, r2, config, out, save } => {
            run_match(&targets, &r1, &r2, config.resolve()?, out.as_deref(), save.as_deref())
        }
        Commands::Report { results, out } => run_report(&results, out.as_deref()),
    }
}

fn load_matcher(targets_path: &str, cfg: SpatsConfig) -> Result<Matcher> {
    let targets = Targets::from_fasta(targets_path)?;
    eprintln!("targets: {}", targets_path);
    eprintln!("sequences: {}", targets.len());
    eprintln!("longest: {}", targets.max_len());
    Matcher::build(targets, cfg)
}

fn run_index(targets_path: &str, cfg: SpatsConfig, dump: bool) -> Result<()> {
    let matcher = load_matcher(targets_path, cfg)?;
    let r1 = matcher.r1_index();
    println!("r1 candidates: {}", r1.candidates());
    println!("r1 entries: {}", r1.len());
    if dump {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        r1.dump(&mut lock)?;
        matcher.r2_index().dump(&mut lock)?;
    }
    Ok(())
}

fn write_report(result: &RunResult, out_path: Option<&str>) -> Result<()> {
    let snapshot = result.snapshot();
    match out_path {
        Some(p) => {
            let f = std::fs::File::create(p)
                .map_err(|e| anyhow::anyhow!("cannot write report to '{}': {}", p, e))?;
            report::write_json(&snapshot, std::io::BufWriter::new(f))?;
            println!("report saved: {}", p);
        }
        None => {
            report::write_json(&snapshot, std::io::stdout().lock())?;
            println!();
        }
    }
    Ok(())
}

fn run_match(
    targets_path: &str,
    r1_path: &str,
    r2_path: &str,
    cfg: SpatsConfig,
    out_path: Option<&str>,
    save_path: Option<&str>,
) -> Result<()> {
    let matcher = load_matcher(targets_path, cfg)?;
    let pairs = fastq::open_pairs(r1_path, r2_path)?;
    let cfg = matcher.config();

    let stats = Pipeline::new(&matcher, cfg.workers, cfg.queue_capacity).run(pairs)?;
    let counters = &stats.counters;
    eprintln!("total: {}", counters.get(Count::Total));
    eprintln!("matched: {}", counters.get(Count::Matched));
    eprintln!("mask_failure: {}", counters.get(Count::MaskFailure));
    eprintln!("indeterminate: {}", counters.get(Count::Indeterminate));
    eprintln!("elapsed: {:.2}s", stats.elapsed.as_secs_f64());

    let result = RunResult::new(cfg.clone(), matcher.targets(), stats.counters)
        .with_meta(Some(targets_path), &[r1_path, r2_path]);
    if let Some(p) = save_path {
        result.save_to_file(p)?;
        eprintln!("result saved: {}", p);
    }
    write_report(&result, out_path)
}

fn run_report(paths: &[String], out_path: Option<&str>) -> Result<()> {
    let mut merged: Option<RunResult> = None;
    for p in paths {
        let r = RunResult::load_from_file(p)?;
        match merged.as_mut() {
            Some(m) => m.merge(&r)?,
            None => merged = Some(r),
        }
    }
    let merged = merged.ok_or_else(|| anyhow::anyhow!("no result files given"))?;
    write_report(&merged, out_path)
}
