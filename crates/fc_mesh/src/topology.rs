// crates/fc_mesh/src/topology.rs

//! 本地拓扑构建
//!
//! 把全局编号的原始连接数据转换为本 rank 的节点/单元容器：
//! - 节点按全局 id 首次引用时创建并记忆化，重复引用折叠为同一本地节点
//! - 单元类输入按形状查表预置面槽位：4→4 (四面体)、5→5 (金字塔)、
//!   6→5 (三棱柱)、8→6 (六面体)；表外节点数为致命输入错误
//! - 面类输入的槽位数不可预知，按原始面的左右归属逐面加一
//!   （先定容后填充，避免反复扩容）
//! - 之后一次性构建节点→单元与单元→邻居闭包，均去重
//! - 命名边界节点集由全局 id 翻译为本地 id，丢弃非本地项

use std::collections::HashSet;

use fc_foundation::{CellId, NodeId};
use tracing::info;

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Cell, MeshPartition, Node};
use crate::raw::{PartitionAssignment, RawKind, RawMesh};

/// 按单元节点数查面槽位数；表外形状不支持
fn face_slot_count(node_count: usize) -> Option<usize> {
    match node_count {
        4 => Some(4), // 四面体
        5 => Some(5), // 金字塔
        6 => Some(5), // 三棱柱
        8 => Some(6), // 六面体
        _ => None,
    }
}

impl MeshPartition {
    /// 构建本地节点与单元（对应原始数据的本地化阶段）
    pub fn build_nodes_cells(
        &mut self,
        raw: &RawMesh,
        assign: &PartitionAssignment,
    ) -> MeshResult<()> {
        for c in 0..raw.global_cell_count() {
            if assign.cell_owner[c] as usize != self.rank {
                continue;
            }

            // 解析节点列表：首次引用的全局 id 创建本地节点
            let mut cell_nodes = Vec::with_capacity(raw.cell_conn.row_len(c));
            for &gid in raw.cell_nodes(c) {
                let local = match self.maps.node_global_to_local.get(&gid) {
                    Some(&n) => n,
                    None => {
                        let n = NodeId::from_usize(self.nodes.len());
                        self.nodes.push(Node::new(gid, raw.nodes[gid as usize]));
                        self.maps.node_global_to_local.insert(gid, n);
                        n
                    }
                };
                cell_nodes.push(local);
            }

            let mut cell = Cell::internal(c as u32, self.rank, self.cells.len() as u32);
            if raw.kind == RawKind::CellBased {
                let slots = face_slot_count(cell_nodes.len()).ok_or(
                    MeshError::UnsupportedCellShape {
                        cell: c as u32,
                        node_count: cell_nodes.len(),
                    },
                )?;
                cell.faces = vec![None; slots];
            }
            // 面类输入的槽位在单元循环后统一定容
            cell.nodes = cell_nodes;

            self.maps
                .cell_global_to_local
                .insert(c as u32, CellId::from_usize(self.cells.len()));
            self.cells.push(cell);
        }

        self.cell_count = self.cells.len();
        self.node_count = self.nodes.len();

        if raw.kind == RawKind::FaceBased {
            // 每个原始面为其左右本地单元各增加一个槽位
            for f in 0..raw.global_face_count() {
                let left = raw.face_left[f];
                if assign.cell_owner[left as usize] as usize == self.rank {
                    let c = self.maps.cell_global_to_local[&left];
                    self.cell_mut(c).faces.push(None);
                }
                if let Some(right) = raw.face_right[f] {
                    if assign.cell_owner[right as usize] as usize == self.rank {
                        let c = self.maps.cell_global_to_local[&right];
                        self.cell_mut(c).faces.push(None);
                    }
                }
            }
        }

        if self.rank == 0 {
            info!("已创建单元与节点");
        }

        self.build_node_cell_lists();
        if self.rank == 0 {
            info!("已计算节点-单元连接");
        }

        self.build_cell_neighbor_lists();
        if self.rank == 0 {
            info!("已计算单元-单元连接");
        }

        // 边界节点集本地化
        self.boco_names = raw.boco.iter().map(|b| b.name.clone()).collect();
        self.boco_nodes = raw
            .boco
            .iter()
            .map(|b| {
                b.nodes
                    .iter()
                    .filter_map(|gid| self.maps.node_global_to_local.get(gid).copied())
                    .collect::<HashSet<NodeId>>()
            })
            .collect();

        Ok(())
    }

    /// 为每个节点构建关联单元列表
    ///
    /// 需要专门一遍：多个原始单元可能重复引用同一节点，
    /// 节点的单元列表必须无重复。
    fn build_node_cell_lists(&mut self) {
        for c in 0..self.cell_count {
            let cell_id = CellId::from_usize(c);
            let cell_nodes = self.cells[c].nodes.clone();
            for n in cell_nodes {
                let node = self.node_mut(n);
                if !node.cells.contains(&cell_id) {
                    node.cells.push(cell_id);
                }
            }
        }
    }

    /// 为每个单元构建邻居单元列表（节点邻接闭包，去重）
    fn build_cell_neighbor_lists(&mut self) {
        for c in 0..self.cell_count {
            let cell_nodes = self.cells[c].nodes.clone();
            for n in cell_nodes {
                let node_cells = self.node(n).cells.clone();
                for c2 in node_cells {
                    if !self.cells[c].neighbors.contains(&c2) {
                        self.cells[c].neighbors.push(c2);
                    }
                }
            }
        }
    }
}
