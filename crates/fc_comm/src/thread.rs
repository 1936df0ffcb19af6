// crates/fc_comm/src/thread.rs

//! 进程内多 rank 通信实现
//!
//! 用线程模拟 SPMD 执行：[`ThreadComm::cluster`] 创建 N 个 rank 的
//! 通信端点，每个端点移入一个工作线程后即构成一个确定性的小集群。
//!
//! - 集合操作：共享槽表 (`parking_lot::Mutex`) + `std::sync::Barrier`，
//!   两次屏障保证所有 rank 读完本轮数据后槽表才会被下一轮覆盖
//! - 点对点：每个 (源, 目标) 对一条 `mpsc` 通道，接收端校验 tag
//!
//! 对端线程退出（通道断开）视为致命错误并 panic：按规范集合通信
//! 没有可恢复的局部失败模式，单个 rank 失败等价于整个作业中止。

use parking_lot::Mutex;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Barrier};

use crate::comm::Communicator;

type Message = (usize, Vec<i64>);

/// 集合操作共享状态
struct Shared {
    barrier: Barrier,
    slots_u64: Mutex<Vec<u64>>,
    slots_f64: Mutex<Vec<Vec<f64>>>,
}

/// 进程内多 rank 通信端点
pub struct ThreadComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
    /// senders[dst]: 本 rank 发往 dst 的通道
    senders: Vec<Sender<Message>>,
    /// receivers[src]: 本 rank 接收来自 src 的通道
    receivers: Vec<Receiver<Message>>,
}

impl ThreadComm {
    /// 创建一个 size 个 rank 的集群，返回按 rank 顺序排列的端点
    pub fn cluster(size: usize) -> Vec<ThreadComm> {
        assert!(size > 0, "集群至少需要一个 rank");

        let shared = Arc::new(Shared {
            barrier: Barrier::new(size),
            slots_u64: Mutex::new(vec![0; size]),
            slots_f64: Mutex::new(vec![Vec::new(); size]),
        });

        // 建立 (src, dst) 通道矩阵
        let mut senders: Vec<Vec<Sender<Message>>> = (0..size).map(|_| Vec::new()).collect();
        let mut receivers: Vec<Vec<Receiver<Message>>> = (0..size).map(|_| Vec::new()).collect();
        for dst in 0..size {
            for src in 0..size {
                let (tx, rx) = channel();
                senders[src].push(tx); // senders[src][dst]
                receivers[dst].push(rx); // receivers[dst][src]
            }
        }
        // 外层按 dst 迭代时 senders[src] 恰好按 dst 顺序追加
        for s in senders.iter() {
            debug_assert_eq!(s.len(), size);
        }

        let mut comms = Vec::with_capacity(size);
        let mut receivers = receivers.into_iter();
        for (rank, sends) in senders.into_iter().enumerate() {
            comms.push(ThreadComm {
                rank,
                size,
                shared: Arc::clone(&shared),
                senders: sends,
                receivers: receivers.next().unwrap_or_default(),
            });
        }
        comms
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_gather_u64(&self, value: u64) -> Vec<u64> {
        self.shared.slots_u64.lock()[self.rank] = value;
        self.shared.barrier.wait();
        let result = self.shared.slots_u64.lock().clone();
        self.shared.barrier.wait();
        result
    }

    fn all_gather_v_f64(&self, local: &[f64]) -> Vec<f64> {
        self.shared.slots_f64.lock()[self.rank] = local.to_vec();
        self.shared.barrier.wait();
        let result: Vec<f64> = {
            let slots = self.shared.slots_f64.lock();
            slots.iter().flatten().copied().collect()
        };
        self.shared.barrier.wait();
        result
    }

    fn send_i64(&self, dest: usize, tag: usize, data: &[i64]) {
        self.senders[dest]
            .send((tag, data.to_vec()))
            .unwrap_or_else(|_| panic!("ThreadComm: rank {dest} 已退出, 发送失败"));
    }

    fn recv_i64(&self, src: usize, tag: usize) -> Vec<i64> {
        let (got_tag, data) = self.receivers[src]
            .recv()
            .unwrap_or_else(|_| panic!("ThreadComm: rank {src} 已退出, 接收失败"));
        assert_eq!(
            got_tag, tag,
            "ThreadComm: tag 不匹配 (期望 {tag}, 实际 {got_tag}), 集合调用顺序错位"
        );
        data
    }
}
