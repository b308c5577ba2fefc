use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::io::ReadPair;
use crate::matcher::{Counters, PairHandler};

/// 队列中的一个工作项：编号 + 原始 R1/R2
pub type WorkItem = ReadPair;

/// 单个 worker 结束时交回的结果
#[derive(Debug)]
pub struct WorkerReport {
    pub id: usize,
    pub processed: u64,
    pub counters: Counters,
}

pub(crate) struct Worker<'a, H: PairHandler> {
    pub id: usize,
    pub handler: &'a H,
    pub queue: Receiver<WorkItem>,
    pub stop: &'a AtomicBool,
}

impl<'a, H: PairHandler> Worker<'a, H> {
    /// 依次处理自己队列里的读段，直到发送端关闭或收到停止信号
    pub fn run(self) -> WorkerReport {
        let mut counters = self.handler.new_counters();
        let mut processed = 0u64;
        for item in self.queue.iter() {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            processed += 1;
            if !self.handler.handle(&item, &mut counters) {
                self.stop.store(true, Ordering::Relaxed);
                break;
            }
        }
        WorkerReport { id: self.id, processed, counters }
    }
}
