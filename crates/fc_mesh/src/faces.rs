// crates/fc_mesh/src/faces.rs

//! 面构建
//!
//! 两条互斥路径，取决于原始输入形态：
//!
//! - **单元类**: 按形状模板枚举每个单元的候选面，利用节点-单元
//!   邻接去重（两侧中编号较小的单元负责创建），随后做边界区域
//!   预匹配。塌缩边产生的退化面就地剔除，宿主单元按三角面重建
//!   节点列表（目前只处理六面体退化为三棱柱）。
//! - **面类**: 输入直接给出面-节点连接和左右单元，逐面判断归属
//!   与分类；无法匹配边界区域的边界面是致命输入错误。
//!
//! 模板的节点顺序保证法向朝向 parent 单元外侧。

use std::collections::BTreeSet;
use std::time::Instant;

use fc_foundation::{BcId, CellId, FaceId, NodeId};
use tracing::info;

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Face, FaceClass, MeshPartition};
use crate::raw::{PartitionAssignment, RawMesh};

// ============================================================================
// 形状模板
// ============================================================================

const HEXA_FACES: [[usize; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [1, 2, 6, 5],
    [0, 4, 7, 3],
    [1, 5, 4, 0],
    [2, 3, 7, 6],
];

// 前两个面是三角面，只取前 3 项
const PRISM_FACES: [[usize; 4]; 5] = [
    [0, 2, 1, 0],
    [3, 4, 5, 0],
    [0, 3, 5, 2],
    [1, 2, 5, 4],
    [0, 1, 4, 3],
];

// 第一个面是四边形，其余取前 3 项
const PYRA_FACES: [[usize; 4]; 5] = [
    [0, 3, 2, 1],
    [0, 1, 4, 0],
    [1, 2, 4, 0],
    [3, 4, 2, 0],
    [0, 4, 3, 0],
];

const TETRA_FACES: [[usize; 3]; 4] = [[0, 2, 1], [1, 2, 3], [0, 3, 2], [0, 1, 3]];

/// 单元第 cf 个面的模板（单元局部节点序号）
fn face_template(cell_node_count: usize, cf: usize) -> &'static [usize] {
    match cell_node_count {
        4 => &TETRA_FACES[cf],
        5 => {
            if cf < 1 {
                &PYRA_FACES[cf]
            } else {
                &PYRA_FACES[cf][..3]
            }
        }
        6 => {
            if cf < 2 {
                &PRISM_FACES[cf][..3]
            } else {
                &PRISM_FACES[cf]
            }
        }
        8 => &HEXA_FACES[cf],
        _ => unreachable!("单元形状在拓扑阶段已校验"),
    }
}

impl MeshPartition {
    // ========================================================================
    // 单元类路径
    // ========================================================================

    /// 从单元-节点连接推导面
    pub fn build_faces_from_cells(&mut self) -> MeshResult<()> {
        let started = Instant::now();
        self.face_count = 0;
        let mut repeated_node_cells: BTreeSet<usize> = BTreeSet::new();

        for c in 0..self.cell_count {
            let mut degenerate_face_count = 0;
            let slot_count = self.cells[c].faces.len();

            for cf in 0..slot_count {
                let cell_nodes = self.cells[c].nodes.clone();
                let template = face_template(cell_nodes.len(), cf);
                let temp_nodes: Vec<NodeId> = template.iter().map(|&i| cell_nodes[i]).collect();

                // 塌缩边检查：剔除重复节点，保持出现顺序
                let mut unique_nodes: Vec<NodeId> = Vec::with_capacity(temp_nodes.len());
                for &n in &temp_nodes {
                    if !unique_nodes.contains(&n) {
                        unique_nodes.push(n);
                    }
                }
                let mut degenerate = false;
                if unique_nodes.len() != temp_nodes.len() {
                    repeated_node_cells.insert(c);
                    if unique_nodes.len() == 2 {
                        // 只剩两个不同节点的面已塌缩成一条边
                        degenerate = true;
                        degenerate_face_count += 1;
                    }
                }
                let temp_nodes = unique_nodes;

                // 在首节点的关联单元里找对面单元。
                // 编号较小的一侧先被处理，重复发现时由较小者负责创建。
                let mut internal = false;
                let mut unique = true;
                let mut neighbor = None;
                for &i in &self.node(temp_nodes[0]).cells.clone() {
                    if i.as_usize() != c
                        && i.as_usize() < self.cell_count
                        && self.cell(i).have_nodes(&temp_nodes)
                    {
                        if i.as_usize() > c {
                            neighbor = Some(i);
                            internal = true;
                        } else {
                            unique = false;
                        }
                    }
                }

                if unique && !degenerate {
                    let class = if internal {
                        FaceClass::Internal
                    } else {
                        // 分区界面候选此时也会参与匹配，之后分区幽灵
                        // 阶段可能将其改写为分区面
                        match self.match_face_bc(&temp_nodes, CellId::from_usize(c)) {
                            Some(b) => FaceClass::Boundary(b),
                            None => FaceClass::Unassigned,
                        }
                    };

                    let face_id = FaceId::from_usize(self.faces.len());
                    self.fill_face_slot(CellId::from_usize(c), face_id);
                    if let Some(nb) = neighbor {
                        self.fill_face_slot(nb, face_id);
                    }

                    let mut face = Face::new(CellId::from_usize(c), class);
                    face.neighbor = neighbor;
                    face.nodes = temp_nodes;
                    self.faces.push(face);
                    self.face_count += 1;
                }
            }

            // 退化面留下的空槽位收尾裁掉
            let len = self.cells[c].faces.len();
            self.cells[c].faces.truncate(len - degenerate_face_count);
        }

        self.rebuild_repeated_node_cells(&repeated_node_cells);
        self.build_node_face_lists();

        if self.rank == 0 {
            info!(
                faces = self.face_count,
                elapsed_secs = started.elapsed().as_secs_f64(),
                "面搜索完成"
            );
        }

        Ok(())
    }

    /// 把面 id 写入单元的第一个空槽位
    fn fill_face_slot(&mut self, c: CellId, f: FaceId) {
        for slot in &mut self.cell_mut(c).faces {
            if slot.is_none() {
                *slot = Some(f);
                return;
            }
        }
        debug_assert!(false, "单元 {c} 的面槽位已满");
    }

    /// 含重复节点的单元按存活的三角面重建节点列表
    ///
    /// 目前只处理六面体塌缩为三棱柱（8 节点、恰好 2 个重复值）。
    /// 每个三角面从重复节点出现的位置开始旋转取节点，两个三角面
    /// 依次拼出 6 节点的三棱柱列表。
    fn rebuild_repeated_node_cells(&mut self, repeated_node_cells: &BTreeSet<usize>) {
        for &c in repeated_node_cells {
            let cell_nodes = self.cells[c].nodes.clone();
            let mut repeated_nodes = Vec::new();
            for (cn, &n) in cell_nodes.iter().enumerate() {
                if cell_nodes[..cn].contains(&n) {
                    repeated_nodes.push(n);
                }
            }

            if cell_nodes.len() == 8 && repeated_nodes.len() == 2 {
                let mut new_nodes = Vec::with_capacity(6);
                let slots = self.cells[c].faces.clone();
                for slot in slots.into_iter().flatten() {
                    let face_nodes = self.face(slot).nodes.clone();
                    if face_nodes.len() != 3 {
                        continue;
                    }
                    // 从重复节点所在位置开始旋转
                    let start = face_nodes
                        .iter()
                        .position(|n| repeated_nodes.contains(n))
                        .unwrap_or(0);
                    for i in 0..3 {
                        new_nodes.push(face_nodes[(start + i) % 3]);
                    }
                }
                self.cells[c].nodes = new_nodes;
            }
        }
    }

    // ========================================================================
    // 面类路径
    // ========================================================================

    /// 从输入面列表直接构建面
    pub fn build_faces_from_face_list(
        &mut self,
        raw: &RawMesh,
        assign: &PartitionAssignment,
    ) -> MeshResult<()> {
        let started = Instant::now();
        self.face_count = 0;

        for f in 0..raw.global_face_count() {
            let left_g = raw.face_left[f];
            let right_g = raw.face_right[f];

            let left_owned = assign.cell_owner[left_g as usize] as usize == self.rank;
            let right_owned = right_g
                .map(|r| assign.cell_owner[r as usize] as usize == self.rank)
                .unwrap_or(false);

            if !left_owned && !right_owned {
                continue;
            }

            let mut nodes: Vec<NodeId> = raw
                .face_conn
                .row(f)
                .iter()
                .map(|gid| self.maps.node_global_to_local[gid])
                .collect();

            // 两侧都是本地单元才是内部面；只有一侧是本地则为分区面，
            // 其邻居留待幽灵阶段填充（右侧为空的是边界面）。
            // parent 必须是本地单元：只拥有右侧时交换两侧并反转
            // 节点顺序，保持法向朝 parent 外侧的约定
            let (class, parent, neighbor) = match right_g {
                None => (
                    FaceClass::Unassigned,
                    self.maps.cell_global_to_local[&left_g],
                    None,
                ),
                Some(right_g) if left_owned && right_owned => (
                    FaceClass::Internal,
                    self.maps.cell_global_to_local[&left_g],
                    Some(self.maps.cell_global_to_local[&right_g]),
                ),
                Some(_) if left_owned => {
                    (FaceClass::Partition, self.maps.cell_global_to_local[&left_g], None)
                }
                Some(right_g) => {
                    nodes.reverse();
                    (FaceClass::Partition, self.maps.cell_global_to_local[&right_g], None)
                }
            };

            let class = if class == FaceClass::Unassigned {
                match self.match_face_bc(&nodes, parent) {
                    Some(b) => FaceClass::Boundary(b),
                    // 面类输入的边界面必须能匹配到某个区域
                    None => return Err(MeshError::UnmatchedBoundaryFace { face: f }),
                }
            } else {
                class
            };

            let face_id = FaceId::from_usize(self.faces.len());
            self.fill_face_slot(parent, face_id);
            if class == FaceClass::Internal {
                if let Some(nb) = neighbor {
                    self.fill_face_slot(nb, face_id);
                }
            }

            let mut face = Face::new(parent, class);
            face.neighbor = neighbor;
            face.nodes = nodes;
            self.faces.push(face);
            self.face_count += 1;
        }

        self.build_node_face_lists();

        if self.rank == 0 {
            info!(
                faces = self.face_count,
                elapsed_secs = started.elapsed().as_secs_f64(),
                "面搜索完成"
            );
        }

        Ok(())
    }

    // ========================================================================
    // 共用
    // ========================================================================

    /// 边界区域预匹配
    ///
    /// 面的全部节点都落在某区域节点集内即为候选。相邻区域（如前后
    /// 对称面夹角处）会让一个面同时匹配多个区域，此时剔除“parent
    /// 单元整体贴在其上”的那个区域，取剩余的第一个。
    pub(crate) fn match_face_bc(&self, face_nodes: &[NodeId], parent: CellId) -> Option<BcId> {
        let mut face_matched_bcs = Vec::new();
        let mut cell_matched_bc: Option<usize> = None;

        for (nbc, region) in self.boco_nodes.iter().enumerate() {
            if face_nodes.iter().all(|n| region.contains(n)) {
                face_matched_bcs.push(nbc);
            }
            if cell_matched_bc.is_none()
                && self.cell(parent).nodes.iter().all(|n| region.contains(n))
            {
                cell_matched_bc = Some(nbc);
            }
        }

        let picked = if face_matched_bcs.len() > 1 {
            face_matched_bcs
                .into_iter()
                .find(|&nbc| Some(nbc) != cell_matched_bc)
        } else {
            face_matched_bcs.first().copied()
        };
        picked.map(BcId::from_usize)
    }

    /// 为每个节点构建关联面列表
    fn build_node_face_lists(&mut self) {
        for f in 0..self.face_count {
            let face_id = FaceId::from_usize(f);
            let face_nodes = self.faces[f].nodes.clone();
            for n in face_nodes {
                self.node_mut(n).faces.push(face_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csr::CsrConnectivity;
    use crate::raw::BocoSet;
    use glam::DVec3;

    fn unit_cube_nodes() -> Vec<DVec3> {
        vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(0.0, 1.0, 1.0),
        ]
    }

    fn build_cell_based(nodes: Vec<DVec3>, rows: &[Vec<u32>], boco: Vec<BocoSet>) -> MeshPartition {
        let raw = RawMesh::cell_based(nodes, CsrConnectivity::from_rows(rows), boco);
        let assign = PartitionAssignment::single_rank(rows.len());
        let mut mesh = MeshPartition::new(0, 1);
        mesh.build_nodes_cells(&raw, &assign).unwrap();
        mesh.build_faces_from_cells().unwrap();
        mesh
    }

    #[test]
    fn test_single_hexa_has_six_faces() {
        let mesh = build_cell_based(
            unit_cube_nodes(),
            &[vec![0, 1, 2, 3, 4, 5, 6, 7]],
            Vec::new(),
        );

        assert_eq!(mesh.face_count, 6);
        for face in &mesh.faces {
            assert_eq!(face.class, FaceClass::Unassigned);
            assert_eq!(face.nodes.len(), 4);
            assert!(face.neighbor.is_none());
        }
        // 所有槽位都被填满
        assert!(mesh.cells[0].faces.iter().all(|s| s.is_some()));
    }

    #[test]
    fn test_two_stacked_hexa_share_one_internal_face() {
        let mut nodes = unit_cube_nodes();
        for i in 0..4 {
            let mut n = nodes[4 + i];
            n.z = 2.0;
            nodes.push(n);
        }
        let mesh = build_cell_based(
            nodes,
            &[
                vec![0, 1, 2, 3, 4, 5, 6, 7],
                vec![4, 5, 6, 7, 8, 9, 10, 11],
            ],
            Vec::new(),
        );

        // 6 + 6 - 共享面 1
        assert_eq!(mesh.face_count, 11);
        let internal: Vec<&Face> = mesh
            .faces
            .iter()
            .filter(|f| f.class == FaceClass::Internal)
            .collect();
        assert_eq!(internal.len(), 1);
        // 编号较小的单元是 parent
        assert_eq!(internal[0].parent.as_usize(), 0);
        assert_eq!(internal[0].neighbor.map(|c| c.as_usize()), Some(1));
    }

    #[test]
    fn test_tetra_faces_are_triangles() {
        let mesh = build_cell_based(
            vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z],
            &[vec![0, 1, 2, 3]],
            Vec::new(),
        );
        assert_eq!(mesh.face_count, 4);
        assert!(mesh.faces.iter().all(|f| f.nodes.len() == 3));
    }

    #[test]
    fn test_degenerate_hexa_collapses_to_prism() {
        // 节点 2==3、5==6 的六面体，按连接表写成 [0,1,2,2,3,4,5,5]
        let nodes = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.5, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(0.5, 1.0, 1.0),
        ];
        let mesh = build_cell_based(nodes, &[vec![0, 1, 2, 2, 3, 4, 5, 5]], Vec::new());

        // 六面体的 6 个候选面中 1 个塌缩成边被剔除
        assert_eq!(mesh.face_count, 5);
        assert_eq!(mesh.cells[0].faces.len(), 5);
        let tri = mesh.faces.iter().filter(|f| f.nodes.len() == 3).count();
        let quad = mesh.faces.iter().filter(|f| f.nodes.len() == 4).count();
        assert_eq!((tri, quad), (2, 3));
        // 节点列表重建为 6 节点的三棱柱
        assert_eq!(mesh.cells[0].nodes.len(), 6);
    }

    #[test]
    fn test_boundary_region_prematch() {
        // 底面节点集构成一个区域
        let boco = vec![BocoSet {
            name: "bottom".into(),
            nodes: [0u32, 1, 2, 3].into_iter().collect(),
        }];
        let mesh = build_cell_based(unit_cube_nodes(), &[vec![0, 1, 2, 3, 4, 5, 6, 7]], boco);

        let matched: Vec<&Face> = mesh
            .faces
            .iter()
            .filter(|f| f.class == FaceClass::Boundary(BcId::new(0)))
            .collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(
            mesh.faces
                .iter()
                .filter(|f| f.class == FaceClass::Unassigned)
                .count(),
            5
        );
    }

    #[test]
    fn test_ambiguous_match_skips_full_cell_region() {
        // 整个单元的节点都在区域 0 内，区域 1 只含底面。
        // 侧面会同时匹配两个区域时剔除单元整体贴住的区域 0。
        let boco = vec![
            BocoSet {
                name: "all".into(),
                nodes: (0u32..8).collect(),
            },
            BocoSet {
                name: "bottom".into(),
                nodes: [0u32, 1, 2, 3].into_iter().collect(),
            },
        ];
        let mesh = build_cell_based(unit_cube_nodes(), &[vec![0, 1, 2, 3, 4, 5, 6, 7]], boco);

        // 底面同时匹配 0 和 1，parent 单元整体贴在 0 上，选 1
        let bottom = mesh
            .faces
            .iter()
            .find(|f| {
                f.nodes.len() == 4
                    && f.nodes
                        .iter()
                        .all(|&n| mesh.node(n).global_id < 4)
            })
            .unwrap();
        assert_eq!(bottom.class, FaceClass::Boundary(BcId::new(1)));
    }

    #[test]
    fn test_face_based_input_classification() {
        // 两个四面体共享面，另加各自的边界面
        let nodes = vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::Z,
            DVec3::new(1.0, 1.0, 1.0),
        ];
        let cell_conn = CsrConnectivity::from_rows(&[vec![0u32, 1, 2, 3], vec![1, 2, 3, 4]]);
        let face_conn = CsrConnectivity::from_rows(&[
            vec![1u32, 2, 3], // 共享面
            vec![0u32, 2, 1], // 单元 0 的边界面
        ]);
        let boco = vec![BocoSet {
            name: "wall".into(),
            nodes: [0u32, 1, 2].into_iter().collect(),
        }];
        let raw = RawMesh::face_based(
            nodes,
            cell_conn,
            face_conn,
            vec![0, 0],
            vec![Some(1), None],
            boco,
        );
        let assign = PartitionAssignment::single_rank(2);
        let mut mesh = MeshPartition::new(0, 1);
        mesh.build_nodes_cells(&raw, &assign).unwrap();
        mesh.build_faces_from_face_list(&raw, &assign).unwrap();

        assert_eq!(mesh.face_count, 2);
        assert_eq!(mesh.faces[0].class, FaceClass::Internal);
        assert_eq!(mesh.faces[0].neighbor.map(|c| c.as_usize()), Some(1));
        assert_eq!(mesh.faces[1].class, FaceClass::Boundary(BcId::new(0)));
    }

    #[test]
    fn test_face_based_unmatched_boundary_is_fatal() {
        let nodes = vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
        let cell_conn = CsrConnectivity::from_rows(&[vec![0u32, 1, 2, 3]]);
        let face_conn = CsrConnectivity::from_rows(&[vec![0u32, 2, 1]]);
        let raw = RawMesh::face_based(nodes, cell_conn, face_conn, vec![0], vec![None], Vec::new());
        let assign = PartitionAssignment::single_rank(1);
        let mut mesh = MeshPartition::new(0, 1);
        mesh.build_nodes_cells(&raw, &assign).unwrap();

        let err = mesh.build_faces_from_face_list(&raw, &assign).unwrap_err();
        assert!(matches!(err, MeshError::UnmatchedBoundaryFace { face: 0 }));
    }

    #[test]
    fn test_node_face_lists_populated() {
        let mesh = build_cell_based(
            unit_cube_nodes(),
            &[vec![0, 1, 2, 3, 4, 5, 6, 7]],
            Vec::new(),
        );
        // 立方体每个角节点触及 3 个面
        for node in &mesh.nodes {
            assert_eq!(node.faces.len(), 3);
        }
    }
}
