// crates/fc_comm/src/comm.rs

//! 集合通信能力抽象
//!
//! 拓扑引擎需要的通信原语集合：求和归约、全收集、变长全收集、
//! 带 tag 的阻塞点对点收发。

/// SPMD 通信上下文
///
/// 每个进程（rank）持有一个实现，经由它参与集合操作。
/// 集合操作阻塞直到所有 rank 到达；点对点收发阻塞直到配对完成。
pub trait Communicator {
    /// 当前进程的 rank（0 起始）
    fn rank(&self) -> usize;

    /// 参与进程总数
    fn size(&self) -> usize;

    /// 全收集：每个 rank 贡献一个值，返回按 rank 顺序排列的所有值
    fn all_gather_u64(&self, value: u64) -> Vec<u64>;

    /// 变长全收集：每个 rank 贡献一段数据，返回按 rank 顺序拼接的结果
    fn all_gather_v_f64(&self, local: &[f64]) -> Vec<f64>;

    /// 整数求和归约（所有 rank 得到相同结果）
    fn sum_u64(&self, value: u64) -> u64 {
        self.all_gather_u64(value).iter().sum()
    }

    /// 浮点求和归约（所有 rank 得到相同结果）
    fn sum_f64(&self, value: f64) -> f64 {
        self.all_gather_v_f64(&[value]).iter().sum()
    }

    /// 阻塞发送一段整数数据到 dest，tag 用于配对
    fn send_i64(&self, dest: usize, tag: usize, data: &[i64]);

    /// 阻塞接收来自 src、tag 匹配的一段整数数据
    fn recv_i64(&self, src: usize, tag: usize) -> Vec<i64>;
}
