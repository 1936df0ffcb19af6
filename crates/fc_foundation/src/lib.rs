// crates/fc_foundation/src/lib.rs

//! FlowCore 基础层
//!
//! 为上层 crate 提供统一的错误类型和强类型索引系统。
//!
//! # 模块结构
//!
//! - [`error`]: 统一错误类型 `FcError` 与结果别名 `FcResult`
//! - [`index`]: 强类型本地索引 (`NodeId`/`CellId`/`FaceId`/`BcId`)
//!
//! # 分层约定
//!
//! 本 crate 不依赖任何其他 FlowCore crate，是依赖图的最底层。

pub mod error;
pub mod index;

pub use error::{FcError, FcResult};
pub use index::{BcId, CellId, FaceId, Idx, NodeId, RawId};
