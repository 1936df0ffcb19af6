// crates/fc_mesh/src/raw.rs

//! 原始网格输入
//!
//! 外部读网格器产出的全局编号数据，以及图分区器产出的归属信息。
//! 本模块只定义数据形状与合法性校验，解析文件格式不在职责内。
//!
//! 两种原始输入形态：
//! - **单元类** ([`RawKind::CellBased`]): 只有单元-节点连接，
//!   面由拓扑引擎按形状模板推导
//! - **面类** ([`RawKind::FaceBased`]): 额外携带面-节点连接和
//!   每个面的左/右单元 id，面直接取自输入

use std::collections::HashSet;

use fc_foundation::{FcError, RawId};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::csr::CsrConnectivity;
use crate::error::MeshResult;

/// 原始输入形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawKind {
    /// 单元-节点连接输入
    CellBased,
    /// 面-节点连接 + 左右单元输入
    FaceBased,
}

/// 命名边界节点集（全局节点 id）
#[derive(Debug, Clone, Default)]
pub struct BocoSet {
    /// 区域名
    pub name: String,
    /// 区域内所有节点的全局 id
    pub nodes: HashSet<RawId>,
}

/// 原始全局网格
#[derive(Debug, Clone)]
pub struct RawMesh {
    /// 输入形态
    pub kind: RawKind,
    /// 全局节点坐标
    pub nodes: Vec<DVec3>,
    /// 单元 -> 全局节点 id（两种形态都有）
    pub cell_conn: CsrConnectivity,
    /// 面 -> 全局节点 id（仅面类输入）
    pub face_conn: CsrConnectivity,
    /// 每个面的左（parent）单元全局 id（仅面类输入）
    pub face_left: Vec<RawId>,
    /// 每个面的右（neighbor）单元全局 id，边界面为 None（仅面类输入）
    pub face_right: Vec<Option<RawId>>,
    /// 命名边界节点集
    pub boco: Vec<BocoSet>,
}

impl RawMesh {
    /// 构造单元类输入
    pub fn cell_based(nodes: Vec<DVec3>, cell_conn: CsrConnectivity, boco: Vec<BocoSet>) -> Self {
        Self {
            kind: RawKind::CellBased,
            nodes,
            cell_conn,
            face_conn: CsrConnectivity::empty(),
            face_left: Vec::new(),
            face_right: Vec::new(),
            boco,
        }
    }

    /// 构造面类输入
    pub fn face_based(
        nodes: Vec<DVec3>,
        cell_conn: CsrConnectivity,
        face_conn: CsrConnectivity,
        face_left: Vec<RawId>,
        face_right: Vec<Option<RawId>>,
        boco: Vec<BocoSet>,
    ) -> Self {
        Self {
            kind: RawKind::FaceBased,
            nodes,
            cell_conn,
            face_conn,
            face_left,
            face_right,
            boco,
        }
    }

    /// 全局单元数
    #[inline]
    pub fn global_cell_count(&self) -> usize {
        self.cell_conn.n_rows()
    }

    /// 全局节点数
    #[inline]
    pub fn global_node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 全局面数（面类输入；单元类输入为 0）
    #[inline]
    pub fn global_face_count(&self) -> usize {
        self.face_conn.n_rows()
    }

    /// 单元 c 的全局节点 id 列表
    #[inline]
    pub fn cell_nodes(&self, c: usize) -> &[RawId] {
        self.cell_conn.row(c)
    }

    /// 基本合法性校验：连接数据引用的 id 必须落在声明的范围内
    pub fn validate(&self) -> MeshResult<()> {
        let n_nodes = self.nodes.len();
        for (c, row) in self.cell_conn.iter_rows().enumerate() {
            for &gid in row {
                if gid as usize >= n_nodes {
                    return Err(crate::error::MeshError::invalid_connectivity(
                        "cell",
                        c,
                        format!("引用节点 {gid} 超出全局节点数 {n_nodes}"),
                    ));
                }
            }
        }
        if self.kind == RawKind::FaceBased {
            let n_faces = self.face_conn.n_rows();
            if self.face_left.len() != n_faces {
                return Err(FcError::size_mismatch("face_left", n_faces, self.face_left.len()).into());
            }
            if self.face_right.len() != n_faces {
                return Err(
                    FcError::size_mismatch("face_right", n_faces, self.face_right.len()).into(),
                );
            }
            let n_cells = self.global_cell_count();
            for (f, &left) in self.face_left.iter().enumerate() {
                if left as usize >= n_cells {
                    return Err(crate::error::MeshError::invalid_connectivity(
                        "face",
                        f,
                        format!("左单元 {left} 超出全局单元数 {n_cells}"),
                    ));
                }
            }
            for (f, &right) in self.face_right.iter().enumerate() {
                if let Some(r) = right {
                    if r as usize >= n_cells {
                        return Err(crate::error::MeshError::invalid_connectivity(
                            "face",
                            f,
                            format!("右单元 {r} 超出全局单元数 {n_cells}"),
                        ));
                    }
                }
            }
            for (f, row) in self.face_conn.iter_rows().enumerate() {
                for &gid in row {
                    if gid as usize >= n_nodes {
                        return Err(crate::error::MeshError::invalid_connectivity(
                            "face",
                            f,
                            format!("引用节点 {gid} 超出全局节点数 {n_nodes}"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// 图分区器输出
///
/// `adjacency` 的行对应本 rank 的本地单元（与本地编号同序），
/// 值是**分区顺序编号**体系下的邻接单元索引：各 rank 的单元在该
/// 体系中按 rank 顺序占据连续区块，与原始全局 id、本地 id 都不同。
#[derive(Debug, Clone, Default)]
pub struct PartitionAssignment {
    /// 每个全局单元的归属 rank
    pub cell_owner: Vec<u32>,
    /// 本地单元 -> 分区顺序编号的邻接单元
    pub adjacency: CsrConnectivity,
}

impl PartitionAssignment {
    /// 单 rank 运行：所有单元归属 rank 0，无邻接信息
    pub fn single_rank(global_cell_count: usize) -> Self {
        Self {
            cell_owner: vec![0; global_cell_count],
            adjacency: CsrConnectivity::empty(),
        }
    }

    /// 校验归属数组与全局单元数一致
    pub fn validate(&self, global_cell_count: usize, np: usize) -> MeshResult<()> {
        if self.cell_owner.len() != global_cell_count {
            return Err(
                FcError::size_mismatch("cell_owner", global_cell_count, self.cell_owner.len())
                    .into(),
            );
        }
        if let Some(&bad) = self.cell_owner.iter().find(|&&o| o as usize >= np) {
            return Err(FcError::invalid_input(format!("归属 rank {bad} 超出进程数 {np}")).into());
        }
        Ok(())
    }
}
