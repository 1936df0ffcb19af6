// crates/fc_mesh/src/ghosts.rs

//! 幽灵单元
//!
//! 两类幽灵按序追加到单元容器尾部：
//!
//! - **分区幽灵**: 依据分区器的邻接图发现邻 rank 上与本地面共享
//!   节点的单元。面节点全部落在对方节点列表内的，面改判为分区面
//!   且邻居指向幽灵；部分共享（角/边接触）只登记节点邻接。
//!   发现过程是纯本地计算，只有全局面数归约需要通信。
//! - **边界幽灵**: 为每个已匹配边界区域的面合成一个镜像单元，
//!   形心取 parent 形心对面平面的镜像，体积与长度尺度复制 parent。
//!
//! 邻接图的值使用分区顺序编号（各 rank 的单元占连续区块），
//! 需先建立到原始全局 id 的换算表。

use fc_comm::Communicator;
use fc_foundation::{BcId, CellId, RawId};

use crate::mesh::{Cell, FaceClass, MeshPartition};
use crate::raw::{PartitionAssignment, RawMesh};

impl MeshPartition {
    // ========================================================================
    // 分区幽灵
    // ========================================================================

    /// 发现分区幽灵并完成分区面改判，最后归约全局面数
    pub fn build_partition_ghosts(
        &mut self,
        raw: &RawMesh,
        assign: &PartitionAssignment,
        comm: &dyn Communicator,
    ) {
        if self.np > 1 {
            let global_cell_count = raw.global_cell_count();

            // 各 rank 的单元数与分区顺序编号的区块偏移
            let mut rank_cell_counts = vec![0usize; self.np];
            for &owner in &assign.cell_owner {
                rank_cell_counts[owner as usize] += 1;
            }
            let mut rank_offsets = vec![0usize; self.np];
            let mut counter = 0;
            for p in 0..self.np {
                rank_offsets[p] = counter;
                counter += rank_cell_counts[p];
            }

            // 分区顺序编号 -> 原始全局 id
            let mut seq_to_global = vec![0 as RawId; global_cell_count];
            let mut fill = rank_offsets.clone();
            for (c, &owner) in assign.cell_owner.iter().enumerate() {
                seq_to_global[fill[owner as usize]] = c as RawId;
                fill[owner as usize] += 1;
            }

            let local_begin = rank_offsets[self.rank];
            let local_end = local_begin + self.cell_count;
            let mut found = vec![false; global_cell_count];

            for f in 0..self.face_count {
                if self.faces[f].class == FaceClass::Internal {
                    continue;
                }
                let parent = self.faces[f].parent.as_usize();
                let adjacency = assign.adjacency.row(parent).to_vec();
                for seq in adjacency {
                    let seq = seq as usize;
                    // 本地区块内的邻接单元不是幽灵候选
                    if seq >= local_begin && seq < local_end {
                        continue;
                    }
                    let gg = seq_to_global[seq];

                    // 面节点与对方单元节点列表的交集
                    let remote_nodes = raw.cell_nodes(gg as usize);
                    let face_nodes = self.faces[f].nodes.clone();
                    let matched: Vec<usize> = face_nodes
                        .iter()
                        .enumerate()
                        .filter(|(_, &n)| remote_nodes.contains(&self.node(n).global_id))
                        .map(|(i, _)| i)
                        .collect();

                    if !matched.is_empty() && !found[gg as usize] {
                        found[gg as usize] = true;
                        let ghost = Cell::partition_ghost(
                            gg,
                            assign.cell_owner[gg as usize] as usize,
                            self.cells.len() as u32,
                        );
                        self.maps
                            .cell_global_to_local
                            .insert(gg, CellId::from_usize(self.cells.len()));
                        self.cells.push(ghost);
                    }

                    if matched.len() == face_nodes.len() {
                        // 整面贴在对方单元上，改判为分区面
                        let ghost_id = self.maps.cell_global_to_local[&gg];
                        self.faces[f].class = FaceClass::Partition;
                        self.faces[f].neighbor = Some(ghost_id);
                    }

                    // 共享节点登记幽灵邻接（角/边接触也算）
                    if !matched.is_empty() {
                        let ghost_id = self.maps.cell_global_to_local[&gg];
                        for i in matched {
                            let node = self.node_mut(face_nodes[i]);
                            if !node.cells.contains(&ghost_id) {
                                node.cells.push(ghost_id);
                            }
                        }
                    }
                }
            }
        }

        self.link_ghost_neighbors(self.cell_count);

        // 全局面数归约：分区面由较低 rank 一侧计数
        let mut local_faces = 0u64;
        let mut local_face_nodes = 0u64;
        for f in 0..self.face_count {
            let face = &self.faces[f];
            if face.class == FaceClass::Partition {
                if let Some(g) = face.neighbor {
                    if self.cell(g).owner_rank < self.rank {
                        continue;
                    }
                }
            }
            local_faces += 1;
            local_face_nodes += face.nodes.len() as u64;
        }
        self.global_face_count = comm.sum_u64(local_faces) as usize;
        self.global_face_node_count = comm.sum_u64(local_face_nodes) as usize;

        self.partition_ghosts = self.cell_count..self.cells.len();
    }

    // ========================================================================
    // 边界幽灵
    // ========================================================================

    /// 为每个已匹配区域的边界面合成镜像幽灵
    pub fn build_boundary_ghosts(&mut self) {
        self.bc_count = self.boco_nodes.len();
        self.boundary_ghosts = Vec::with_capacity(self.bc_count);
        let first_boundary_ghost = self.cells.len();

        for b in 0..self.bc_count {
            let begin = self.cells.len();
            for f in 0..self.face_count {
                if self.faces[f].class.boundary_id().map(|b2| b2.as_usize()) != Some(b) {
                    continue;
                }
                let parent = self.faces[f].parent;
                let (p_centroid, p_volume, p_length_scale) = {
                    let p = self.cell(parent);
                    (p.centroid, p.volume, p.length_scale)
                };
                let (f_centroid, f_normal) = (self.faces[f].centroid, self.faces[f].normal);

                let ghost_id = CellId::from_usize(self.cells.len());
                let mut ghost =
                    Cell::boundary_ghost(self.rank, self.cells.len() as u32, BcId::from_usize(b));
                ghost.volume = p_volume;
                ghost.length_scale = p_length_scale;
                // parent 形心对面平面的镜像
                ghost.centroid =
                    p_centroid + 2.0 * (f_centroid - p_centroid).dot(f_normal) * f_normal;

                self.faces[f].neighbor = Some(ghost_id);
                let face_nodes = self.faces[f].nodes.clone();
                for n in face_nodes {
                    self.node_mut(n).cells.push(ghost_id);
                }
                self.cells.push(ghost);
            }
            self.boundary_ghosts.push(begin..self.cells.len());
        }

        self.link_ghost_neighbors(first_boundary_ghost);
    }

    /// 把索引不小于 threshold 的幽灵与真实单元双向登记为邻居
    fn link_ghost_neighbors(&mut self, threshold: usize) {
        for c in 0..self.cell_count {
            let cell_nodes = self.cells[c].nodes.clone();
            for n in cell_nodes {
                let node_cells = self.node(n).cells.clone();
                for g in node_cells {
                    if g.as_usize() < threshold {
                        continue;
                    }
                    let c_id = CellId::from_usize(c);
                    if !self.cells[c].neighbors.contains(&g) {
                        self.cells[c].neighbors.push(g);
                        self.cell_mut(g).neighbors.push(c_id);
                    }
                }
            }
        }
    }
}
