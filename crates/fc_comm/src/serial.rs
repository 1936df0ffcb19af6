// crates/fc_comm/src/serial.rs

//! 单进程通信实现
//!
//! 串行运行时的 [`Communicator`]：rank 固定为 0，集合操作恒等。

use crate::comm::Communicator;

/// 单进程通信上下文
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl SerialComm {
    pub fn new() -> Self {
        Self
    }
}

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_gather_u64(&self, value: u64) -> Vec<u64> {
        vec![value]
    }

    fn all_gather_v_f64(&self, local: &[f64]) -> Vec<f64> {
        local.to_vec()
    }

    fn send_i64(&self, dest: usize, _tag: usize, _data: &[i64]) {
        // 单进程没有可配对的对端，走到这里说明调用方的 rank 循环有误
        panic!("SerialComm: 无对端可发送 (dest={dest})");
    }

    fn recv_i64(&self, src: usize, _tag: usize) -> Vec<i64> {
        panic!("SerialComm: 无对端可接收 (src={src})");
    }
}
