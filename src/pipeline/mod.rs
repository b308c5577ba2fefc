//! 读取线程 + N 个 worker 的分发流水线。
//!
//! 读取线程按严格轮转把读段放进各 worker 的有界队列，队列满时阻塞等待；
//! 每个 worker 持有自己的 [`Counters`]，全部结束后再逐元素求和。

pub mod worker;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Sender};
use log::info;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::io::ReadPair;
use crate::matcher::{Counters, PairHandler};
use worker::{WorkItem, Worker, WorkerReport};

/// 从外部请求流水线尽快停止
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub struct RunStats {
    pub counters: Counters,
    /// 读取线程送出的读段数
    pub dispatched: u64,
    /// 每个 worker 实际处理的读段数
    pub per_worker: Vec<u64>,
    pub elapsed: Duration,
    pub stopped_early: bool,
}

pub struct Pipeline<'a, H: PairHandler> {
    handler: &'a H,
    workers: usize,
    queue_capacity: usize,
    stop: Arc<AtomicBool>,
}

impl<'a, H: PairHandler> Pipeline<'a, H> {
    pub fn new(handler: &'a H, workers: usize, queue_capacity: usize) -> Self {
        Pipeline {
            handler,
            workers: workers.max(1),
            queue_capacity: queue_capacity.max(1),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// 在调用线程上读取输入并分发，直到输入耗尽、出错或被要求停止
    pub fn run<I>(&self, pairs: I) -> Result<RunStats>
    where
        I: IntoIterator<Item = Result<ReadPair>>,
    {
        let start = Instant::now();
        let stop = self.stop.as_ref();
        let (senders, receivers): (Vec<Sender<WorkItem>>, Vec<_>) =
            (0..self.workers).map(|_| bounded(self.queue_capacity)).unzip();

        let (reports, dispatched, read_result) = thread::scope(|s| {
            let handles: Vec<_> = receivers
                .into_iter()
                .enumerate()
                .map(|(id, queue)| {
                    let w = Worker { id, handler: self.handler, queue, stop };
                    s.spawn(move || w.run())
                })
                .collect();

            let mut dispatched = 0u64;
            let mut read_result = Ok(());
            for (i, pair) in pairs.into_iter().enumerate() {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                let pair = match pair {
                    Ok(p) => p,
                    Err(e) => {
                        stop.store(true, Ordering::Relaxed);
                        read_result = Err(e);
                        break;
                    }
                };
                // 接收端已退出说明 worker 收到了停止信号
                if senders[i % self.workers].send(pair).is_err() {
                    break;
                }
                dispatched += 1;
            }
            drop(senders);

            let reports: Vec<thread::Result<WorkerReport>> = handles.into_iter().map(|h| h.join()).collect();
            (reports, dispatched, read_result)
        });
        read_result?;

        let mut reports = reports
            .into_iter()
            .collect::<thread::Result<Vec<_>>>()
            .map_err(|_| anyhow!("worker thread panicked"))?;
        reports.sort_by_key(|r| r.id);
        let per_worker: Vec<u64> = reports.iter().map(|r| r.processed).collect();

        let counters = reports
            .into_par_iter()
            .map(|r| r.counters)
            .reduce(|| self.handler.new_counters(), Counters::merged);

        let elapsed = start.elapsed();
        let stopped_early = stop.load(Ordering::Relaxed);
        info!(
            "pipeline: {} pairs over {} workers in {:.2}s{}",
            dispatched,
            self.workers,
            elapsed.as_secs_f64(),
            if stopped_early { " (stopped early)" } else { "" }
        );
        Ok(RunStats { counters, dispatched, per_worker, elapsed, stopped_early })
    }
}

/// 不开线程、按顺序处理全部读段，作为流水线结果的参照
pub fn run_serial<H, I>(handler: &H, pairs: I) -> Result<Counters>
where
    H: PairHandler,
    I: IntoIterator<Item = Result<ReadPair>>,
{
    let mut counters = handler.new_counters();
    for pair in pairs {
        if !handler.handle(&pair?, &mut counters) {
            break;
        }
    }
    Ok(counters)
}
