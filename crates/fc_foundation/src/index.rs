// crates/fc_foundation/src/index.rs

//! 强类型索引系统
//!
//! 使用泛型 `Idx<T>` 实现类型安全的本地索引。
//!
//! # 设计目标
//!
//! 1. **类型安全**: 编译期区分不同类型的索引（Cell/Face/Node/Bc）
//! 2. **零开销**: 在 release 模式下与 u32 完全相同的性能
//! 3. **全局/本地区分**: 本地索引使用强类型，原始网格的全局 id
//!    保持裸 [`RawId`]，两套编号体系不会在签名中混淆
//!
//! 拓扑容器只追加、从不删除，索引位置终生稳定，
//! 因此不需要代际(generation)验证。
//!
//! # 示例
//!
//! ```
//! use fc_foundation::index::{CellId, NodeId};
//!
//! let c = CellId::new(3);
//! assert_eq!(c.as_usize(), 3);
//! assert_eq!(format!("{}", c), "3");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// 原始网格全局 id（读入数据的编号体系，未经本地化）
pub type RawId = u32;

// ============================================================================
// 标记类型 (Phantom Types)
// ============================================================================

/// 单元索引标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellTag;

/// 面索引标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceTag;

/// 节点索引标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeTag;

/// 边界条件区域索引标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BcTag;

// ============================================================================
// 泛型索引类型
// ============================================================================

/// 强类型本地索引
///
/// 使用 Phantom Type `T` 区分不同类型的索引，避免误用。
#[derive(Serialize, Deserialize)]
#[repr(transparent)]
pub struct Idx<T> {
    index: u32,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

// 手动实现 Copy 和 Clone，因为派生会要求 T: Copy
impl<T> Copy for Idx<T> {}

impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Idx<T> {
    /// 创建新索引
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// 从 usize 创建
    #[inline]
    pub fn from_usize(index: usize) -> Self {
        Self::new(index as u32)
    }

    /// 获取索引值
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// 获取索引值（usize）
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.index as usize
    }
}

// ============================================================================
// Trait 实现
// ============================================================================

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Idx<T> {}

impl<T> PartialOrd for Idx<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Idx<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Idx<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Idx({})", self.index)
    }
}

impl<T> fmt::Display for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

impl<T> From<usize> for Idx<T> {
    #[inline]
    fn from(index: usize) -> Self {
        Self::from_usize(index)
    }
}

impl<T> From<Idx<T>> for usize {
    #[inline]
    fn from(idx: Idx<T>) -> usize {
        idx.as_usize()
    }
}

impl<T> From<u32> for Idx<T> {
    #[inline]
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

impl<T> From<Idx<T>> for u32 {
    #[inline]
    fn from(idx: Idx<T>) -> u32 {
        idx.index()
    }
}

// ============================================================================
// 类型别名
// ============================================================================

/// 本地单元索引（含幽灵单元）
pub type CellId = Idx<CellTag>;

/// 本地面索引
pub type FaceId = Idx<FaceTag>;

/// 本地节点索引
pub type NodeId = Idx<NodeTag>;

/// 边界条件区域索引
pub type BcId = Idx<BcTag>;

// ============================================================================
// 测试
// ============================================================================
