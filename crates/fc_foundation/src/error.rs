// crates/fc_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `FcError` 枚举和 `FcResult` 类型别名。拓扑构建相关的具体错误
//! 在 `fc_mesh` 中扩展，并可转换为本层错误向上传播。

use thiserror::Error;

/// 统一结果类型
pub type FcResult<T> = Result<T, FcError>;

/// FlowCore 基础错误类型
#[derive(Error, Debug)]
pub enum FcError {
    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 进程间通信错误
    #[error("通信错误: {message}")]
    Communication {
        /// 具体错误信息
        message: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

/// 便捷构造函数
impl FcError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FcError::size_mismatch("cell_owner", 100, 99);
        assert_eq!(err.to_string(), "数组大小不匹配: cell_owner 期望100, 实际99");
    }

    #[test]
    fn test_convenience_constructors() {
        let err = FcError::invalid_input("节点坐标为空");
        assert!(matches!(err, FcError::InvalidInput { .. }));

        let err = FcError::index_out_of_bounds("node", 10, 10);
        assert!(err.to_string().contains("0..10"));
    }
}
