mod common;

use anyhow::Result;
use common::{config, matcher, mixed_pairs};
use spats_rs::io::ReadPair;
use spats_rs::matcher::{Count, Counters, PairHandler};
use spats_rs::pipeline::{run_serial, Pipeline};

fn as_input(pairs: &[ReadPair]) -> impl Iterator<Item = Result<ReadPair>> + '_ {
    pairs.iter().cloned().map(Ok)
}

#[test]
fn workers_agree_with_serial_run() {
    let cfg = config(1);
    let m = matcher(cfg.clone());
    let pairs = mixed_pairs(&cfg, 10_000, 2024);
    let serial = run_serial(&m, as_input(&pairs)).unwrap();
    assert_eq!(serial.get(Count::Total), 10_000);
    assert!(serial.get(Count::Matched) > 5_000);
    assert!(serial.get(Count::MaskFailure) > 0);
    assert!(serial.get(Count::Indeterminate) > 0);

    for workers in [1, 2, 8] {
        let stats = Pipeline::new(&m, workers, 64).run(as_input(&pairs)).unwrap();
        assert_eq!(stats.dispatched, 10_000);
        assert_eq!(stats.per_worker.len(), workers);
        assert_eq!(stats.per_worker.iter().sum::<u64>(), 10_000);
        assert!(!stats.stopped_early);
        assert_eq!(stats.counters, serial, "{} workers", workers);
    }
}

#[test]
fn aggregation_ignores_partition_and_order() {
    let cfg = config(0);
    let m = matcher(cfg.clone());
    let pairs = mixed_pairs(&cfg, 3_000, 99);
    let expected = run_serial(&m, as_input(&pairs)).unwrap();

    for parts in [1usize, 2, 8] {
        // 连续分块而不是轮转，再以相反顺序合并
        let chunk = (pairs.len() + parts - 1) / parts;
        let partials: Vec<Counters> =
            pairs.chunks(chunk).map(|c| run_serial(&m, as_input(c)).unwrap()).collect();
        let merged = partials.into_iter().rev().fold(m.new_counters(), Counters::merged);
        assert_eq!(merged, expected, "{} parts", parts);
    }

    let mut reversed = pairs.clone();
    reversed.reverse();
    let stats = Pipeline::new(&m, 8, 4).run(as_input(&reversed)).unwrap();
    assert_eq!(stats.counters, expected);
}

#[test]
fn small_queues_do_not_deadlock() {
    let cfg = config(0);
    let m = matcher(cfg.clone());
    let pairs = mixed_pairs(&cfg, 1_000, 5);
    let stats = Pipeline::new(&m, 3, 1).run(as_input(&pairs)).unwrap();
    assert_eq!(stats.counters.get(Count::Total), 1_000);
    assert_eq!(stats.per_worker, vec![334, 333, 333]);
    assert_eq!(stats.counters, run_serial(&m, as_input(&pairs)).unwrap());
}

#[test]
fn counters_are_sized_for_the_longest_target() {
    let m = matcher(config(0));
    assert_eq!(PairHandler::new_counters(&m).max_length(), common::TARGET_5S.len());
}
