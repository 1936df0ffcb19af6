// crates/fc_mesh/src/numbering.rs

//! 输出编号
//!
//! 节点在分区界面上被多个 rank 复制，写输出文件时必须全局唯一。
//! 约定：分区界面节点由相邻 rank 中编号最低者命名。
//!
//! 流程（体编号与边界编号同构）：
//! 1. 本地标记：凡关联到 owner rank 更低的分区幽灵的节点让位，
//!    其余节点按本地顺序取号
//! 2. 全收集各 rank 的取号数，做前缀和得到本 rank 的编号偏移
//! 3. 成对交换补洞：p 从 1 到 np-1、pr 从 0 到 p-1 的固定顺序，
//!    p 把让位节点的全局 id 发给 pr，pr 查表回填已定编号。
//!    固定顺序保证 pr 侧在充当应答方之前已完成自身的补洞
//!
//! 体编号覆盖全部本地节点；边界编号只覆盖触及边界面的节点。
//! 让位后仍未取到号的节点（对方也不认识）留空，只记告警。

use std::collections::BTreeSet;

use fc_comm::Communicator;
use fc_foundation::{FaceId, NodeId};
use tracing::warn;

use crate::mesh::MeshPartition;

/// 编号草稿状态
const UNNUMBERED: i64 = -2;
const DEFERRED: i64 = -1;

impl MeshPartition {
    // ========================================================================
    // 体输出编号
    // ========================================================================

    /// 为全部本地节点赋体输出编号，并整理各区域的边界花名册
    pub fn assign_output_ids(&mut self, comm: &dyn Communicator) {
        let mut scratch = vec![UNNUMBERED; self.node_count];
        let mut count: u64 = 0;

        for n in 0..self.node_count {
            scratch[n] = 0;
            for &g in &self.nodes[n].cells {
                if self.is_ghost(g) && self.cell(g).owner_rank < self.rank {
                    scratch[n] = DEFERRED;
                    break;
                }
            }
            if scratch[n] == 0 {
                scratch[n] = count as i64;
                count += 1;
            }
        }

        let counts = comm.all_gather_u64(count);
        let total: u64 = counts.iter().sum();
        if total as usize != self.global_node_count {
            warn!(
                total,
                expected = self.global_node_count,
                "体输出编号总数与全局节点数不一致"
            );
        }

        let offset: u64 = counts[..self.rank].iter().sum();
        self.node_output_offset = offset as u32;
        for s in scratch.iter_mut() {
            if *s >= 0 {
                *s += offset as i64;
            }
        }

        let deferred: Vec<usize> = (0..self.node_count).filter(|&n| scratch[n] == DEFERRED).collect();
        self.exchange_deferred_ids(comm, &deferred, &mut scratch);

        for n in 0..self.node_count {
            self.nodes[n].output_id = u32::try_from(scratch[n]).ok();
        }

        self.build_boundary_rosters();
    }

    // ========================================================================
    // 边界输出编号
    // ========================================================================

    /// 为触及边界面的节点赋边界输出编号
    pub fn assign_bc_output_ids(&mut self, comm: &dyn Communicator) {
        // 所有区域的边界节点并集，升序遍历保证补洞顺序确定
        let mut bc_nodes: BTreeSet<usize> = BTreeSet::new();
        for f in 0..self.face_count {
            if self.faces[f].class.is_boundary() {
                for &n in &self.faces[f].nodes {
                    bc_nodes.insert(n.as_usize());
                }
            }
        }

        let mut scratch = vec![UNNUMBERED; self.node_count];
        let mut count: u64 = 0;
        for &n in &bc_nodes {
            scratch[n] = 0;
            for &g in &self.nodes[n].cells {
                if self.cell(g).owner_rank < self.rank {
                    scratch[n] = DEFERRED;
                    break;
                }
            }
            if scratch[n] == 0 {
                scratch[n] = count as i64;
                count += 1;
            }
        }

        let counts = comm.all_gather_u64(count);
        self.global_bc_node_count = counts.iter().sum::<u64>() as usize;

        let offset: u64 = counts[..self.rank].iter().sum();
        self.node_bc_output_offset = offset as u32;
        for &n in &bc_nodes {
            if scratch[n] >= 0 {
                scratch[n] += offset as i64;
            }
        }

        let deferred: Vec<usize> = bc_nodes
            .iter()
            .copied()
            .filter(|&n| scratch[n] == DEFERRED)
            .collect();
        self.exchange_deferred_ids(comm, &deferred, &mut scratch);

        for n in 0..self.node_count {
            self.nodes[n].bc_output_id = u32::try_from(scratch[n]).ok();
        }
    }

    // ========================================================================
    // 共用
    // ========================================================================

    /// 成对交换回填让位节点的编号
    ///
    /// `deferred` 是让位节点的本地索引（固定顺序）。应答侧直接从
    /// 自己的编号草稿查值：(p, pr) 的固定循环顺序保证应答侧在
    /// 充当应答方之前已完成自身的补洞。所有 rank 走相同的循环
    /// 以保持收发配对。
    fn exchange_deferred_ids(&self, comm: &dyn Communicator, deferred: &[usize], scratch: &mut [i64]) {
        for p in 1..self.np {
            for pr in 0..p {
                if self.rank == p {
                    let global_ids: Vec<i64> = deferred
                        .iter()
                        .map(|&n| self.nodes[n].global_id as i64)
                        .collect();
                    comm.send_i64(pr, p, &global_ids);
                    let resolved = comm.recv_i64(pr, p);
                    for (&n, &id) in deferred.iter().zip(resolved.iter()) {
                        if scratch[n] == DEFERRED && id >= 0 {
                            scratch[n] = id;
                        }
                    }
                } else if self.rank == pr {
                    let global_ids = comm.recv_i64(p, p);
                    let resolved: Vec<i64> = global_ids
                        .iter()
                        .map(|&gid| {
                            self.maps
                                .node_global_to_local
                                .get(&(gid as u32))
                                .map(|&n| scratch[n.as_usize()])
                                .unwrap_or(DEFERRED)
                        })
                        .collect();
                    comm.send_i64(p, p, &resolved);
                }
            }
        }
    }

    /// 整理每个区域的边界面与边界节点花名册
    fn build_boundary_rosters(&mut self) {
        self.boundary_faces = vec![Vec::new(); self.bc_count];
        let mut node_sets: Vec<BTreeSet<NodeId>> = vec![BTreeSet::new(); self.bc_count];

        for f in 0..self.face_count {
            if let Some(b) = self.faces[f].class.boundary_id() {
                self.boundary_faces[b.as_usize()].push(FaceId::from_usize(f));
                for &n in &self.faces[f].nodes {
                    node_sets[b.as_usize()].insert(n);
                }
            }
        }

        // 升序的节点花名册
        self.boundary_nodes = node_sets
            .into_iter()
            .map(|s| s.into_iter().collect())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csr::CsrConnectivity;
    use crate::raw::{BocoSet, PartitionAssignment, RawMesh};
    use fc_comm::SerialComm;
    use glam::DVec3;

    fn cube_with_bottom_wall() -> MeshPartition {
        let nodes = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(0.0, 1.0, 1.0),
        ];
        let boco = vec![BocoSet {
            name: "bottom".into(),
            nodes: [0u32, 1, 2, 3].into_iter().collect(),
        }];
        let raw = RawMesh::cell_based(
            nodes,
            CsrConnectivity::from_rows(&[vec![0u32, 1, 2, 3, 4, 5, 6, 7]]),
            boco,
        );
        let assign = PartitionAssignment::single_rank(1);
        let comm = SerialComm::new();
        MeshPartition::build(&raw, &assign, &comm).unwrap()
    }

    #[test]
    fn test_serial_output_ids_are_dense() {
        let mesh = cube_with_bottom_wall();
        let mut ids: Vec<u32> = mesh.nodes.iter().map(|n| n.output_id.unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..8).collect::<Vec<u32>>());
        assert_eq!(mesh.node_output_offset, 0);
    }

    #[test]
    fn test_serial_bc_output_ids_cover_boundary_nodes() {
        let mesh = cube_with_bottom_wall();
        assert_eq!(mesh.global_bc_node_count, 4);

        let mut bc_ids = Vec::new();
        for node in &mesh.nodes {
            if node.global_id < 4 {
                bc_ids.push(node.bc_output_id.unwrap());
            } else {
                assert_eq!(node.bc_output_id, None);
            }
        }
        bc_ids.sort_unstable();
        assert_eq!(bc_ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_boundary_rosters() {
        let mesh = cube_with_bottom_wall();
        assert_eq!(mesh.boundary_faces.len(), 1);
        assert_eq!(mesh.boundary_faces[0].len(), 1);
        assert_eq!(mesh.boundary_nodes[0].len(), 4);
        // 花名册升序
        let roster = &mesh.boundary_nodes[0];
        assert!(roster.windows(2).all(|w| w[0] < w[1]));
    }
}
