// crates/fc_mesh/src/csr.rs

//! CSR (Compressed Sparse Row) 连接性存储
//!
//! 原始网格的单元-节点、面-节点连接以及分区器输出的单元邻接图
//! 都以偏移数组 + 扁平索引数组的形式存储：
//! `offsets[i]..offsets[i+1]` 是第 i 行的索引范围。
//!
//! 只读迭代友好，不支持动态修改。

use fc_foundation::RawId;
use serde::{Deserialize, Serialize};

/// CSR 格式连接性
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrConnectivity {
    /// 行偏移数组，长度 = n_rows + 1
    offsets: Vec<usize>,
    /// 扁平索引数组，长度 = offsets 最后一项
    indices: Vec<RawId>,
}

impl Default for CsrConnectivity {
    fn default() -> Self {
        Self::empty()
    }
}

impl CsrConnectivity {
    /// 从偏移数组和索引数组创建
    pub fn new(offsets: Vec<usize>, indices: Vec<RawId>) -> Self {
        debug_assert!(!offsets.is_empty(), "offsets 至少要有一个元素");
        debug_assert_eq!(
            offsets.last().copied().unwrap_or(0),
            indices.len(),
            "最后一个偏移必须等于索引数组长度"
        );
        Self { offsets, indices }
    }

    /// 创建空结构（0 行）
    pub fn empty() -> Self {
        Self {
            offsets: vec![0],
            indices: Vec::new(),
        }
    }

    /// 从行列表构建
    pub fn from_rows<R: AsRef<[RawId]>>(rows: &[R]) -> Self {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();

        offsets.push(0);
        for row in rows {
            indices.extend_from_slice(row.as_ref());
            offsets.push(indices.len());
        }

        Self { offsets, indices }
    }

    /// 获取第 row 行的切片
    #[inline]
    pub fn row(&self, row: usize) -> &[RawId] {
        &self.indices[self.offsets[row]..self.offsets[row + 1]]
    }

    /// 第 row 行的元素个数
    #[inline]
    pub fn row_len(&self, row: usize) -> usize {
        self.offsets[row + 1] - self.offsets[row]
    }

    /// 获取行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// 获取非零元素总数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// 检查是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    /// 迭代所有行
    pub fn iter_rows(&self) -> impl Iterator<Item = &[RawId]> {
        (0..self.n_rows()).map(move |i| self.row(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_basic() {
        let csr = CsrConnectivity::new(vec![0, 3, 7, 9], vec![0, 1, 2, 1, 2, 3, 4, 2, 3]);

        assert_eq!(csr.n_rows(), 3);
        assert_eq!(csr.nnz(), 9);
        assert_eq!(csr.row(0), &[0, 1, 2]);
        assert_eq!(csr.row(1), &[1, 2, 3, 4]);
        assert_eq!(csr.row(2), &[2, 3]);
        assert_eq!(csr.row_len(1), 4);
    }

    #[test]
    fn test_csr_from_rows() {
        let rows: Vec<Vec<RawId>> = vec![vec![0, 1, 2], vec![1, 2, 3, 4]];
        let csr = CsrConnectivity::from_rows(&rows);

        assert_eq!(csr.n_rows(), 2);
        assert_eq!(csr.row(0), &[0, 1, 2]);
        assert_eq!(csr.row(1), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_csr_empty() {
        let csr = CsrConnectivity::empty();
        assert_eq!(csr.n_rows(), 0);
        assert!(csr.is_empty());
    }

    #[test]
    fn test_csr_iter_rows() {
        let rows: Vec<Vec<RawId>> = vec![vec![0, 1], vec![2, 3, 4]];
        let csr = CsrConnectivity::from_rows(&rows);

        let collected: Vec<&[RawId]> = csr.iter_rows().collect();
        assert_eq!(collected, vec![&[0u32, 1][..], &[2, 3, 4][..]]);
    }
}
