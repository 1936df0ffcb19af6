// crates/fc_mesh/src/error.rs

//! 网格拓扑错误类型
//!
//! 区分两类失败（见错误分级约定）：
//! - 致命配置错误：不支持的单元形状、无法匹配边界区域的面等，
//!   以 `Err` 形式从阶段函数返回，由调用方决定终止策略
//! - 结构性异常（如塌缩边导致的退化面）在构建过程中就地修复，
//!   不经由错误通道传播

use fc_foundation::FcError;
use thiserror::Error;

/// 网格模块结果类型
pub type MeshResult<T> = Result<T, MeshError>;

/// 网格拓扑错误枚举
#[derive(Error, Debug)]
pub enum MeshError {
    /// 不支持的单元形状（节点数不在 {4, 5, 6, 8} 内）
    #[error("不支持的单元形状: 全局单元 {cell} 有 {node_count} 个节点 (支持 4/5/6/8)")]
    UnsupportedCellShape {
        /// 全局单元 id
        cell: u32,
        /// 实际节点数
        node_count: usize,
    },

    /// 原始连接数据引用了不存在的实体
    #[error("连接数据错误: {entity} {id}: {message}")]
    InvalidConnectivity {
        /// 实体类别（cell/face/node）
        entity: &'static str,
        /// 出错实体的编号
        id: usize,
        /// 具体原因
        message: String,
    },

    /// 面类输入中有面无法匹配任何边界区域（面类路径为致命错误）
    #[error("全局面 {face} 无法匹配任何边界条件区域")]
    UnmatchedBoundaryFace {
        /// 全局面编号
        face: usize,
    },

    /// 所有边界条件区域应用后仍有未赋值的面
    #[error("本地面 {face} 在所有边界条件区域应用后仍未赋值")]
    UnassignedFace {
        /// 本地面编号
        face: usize,
    },

    /// 基础层错误
    #[error(transparent)]
    Foundation(#[from] FcError),
}

impl MeshError {
    pub fn invalid_connectivity(entity: &'static str, id: usize, message: impl Into<String>) -> Self {
        Self::InvalidConnectivity {
            entity,
            id,
            message: message.into(),
        }
    }
}
