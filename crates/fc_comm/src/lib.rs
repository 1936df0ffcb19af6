// crates/fc_comm/src/lib.rs

//! FlowCore SPMD 进程上下文
//!
//! 网格按分区分布在多个进程上（每进程一个分区），进程间只在显式的
//! 集合通信点同步。本 crate 把这组通信能力抽象为 [`Communicator`]
//! trait，拓扑引擎对具体传输方式保持无感。
//!
//! # 实现
//!
//! - [`SerialComm`]: 单进程实现，所有集合操作退化为恒等
//! - [`ThreadComm`]: 进程内多 rank 实现，用线程模拟 SPMD 执行，
//!   供多分区逻辑的确定性测试使用
//!
//! # 协议约束
//!
//! 所有 rank 必须以相同的顺序和次数执行集合操作，顺序错位会死锁
//! （与 MPI 语义一致）。点对点收发按 (源, 目标, tag) 配对阻塞。

pub mod comm;
pub mod serial;
pub mod thread;

pub use comm::Communicator;
pub use serial::SerialComm;
pub use thread::ThreadComm;
