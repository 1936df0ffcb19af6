// crates/fc_mesh/src/geometry.rs

//! 度量几何
//!
//! 面心/法向/面积与单元形心/体积/长度尺度。拓扑阶段完成后、
//! 边界幽灵合成之前执行（镜像幽灵与边界条件应用都依赖这些量）。
//!
//! - 面按节点均值为扇心做三角扇分解：面积向量为各三角面积向量之和，
//!   面心为面积加权的三角形心均值。法向符号由节点顺序决定，
//!   模板保证其朝 parent 单元外侧。
//! - 单元对每个面配一个以面为底、节点均值为顶点的锥体，
//!   体积与形心由锥体求和得到。邻居侧的面法向取反号。
//! - 长度尺度取体积的立方根。
//!
//! 幽灵单元不在此计算：边界幽灵在合成时复制 parent 的度量，
//! 分区幽灵的度量属于求解期数据交换，不在拓扑层职责内。

use glam::DVec3;

use crate::mesh::MeshPartition;

impl MeshPartition {
    /// 计算全部面与本地单元的度量几何
    pub fn compute_geometry(&mut self) {
        self.compute_face_geometry();
        self.compute_cell_geometry();
    }

    fn compute_face_geometry(&mut self) {
        for f in 0..self.face_count {
            let coords: Vec<DVec3> = self.faces[f]
                .nodes
                .iter()
                .map(|&n| self.node(n).coord)
                .collect();
            let hub = coords.iter().sum::<DVec3>() / coords.len() as f64;

            // 三角扇：面积向量之和与面积加权形心
            let mut area_vec = DVec3::ZERO;
            let mut centroid_acc = DVec3::ZERO;
            let mut area_acc = 0.0;
            for i in 0..coords.len() {
                let a = coords[i];
                let b = coords[(i + 1) % coords.len()];
                let tri_vec = 0.5 * (a - hub).cross(b - hub);
                let tri_area = tri_vec.length();
                area_vec += tri_vec;
                centroid_acc += tri_area * (hub + a + b) / 3.0;
                area_acc += tri_area;
            }

            let face = &mut self.faces[f];
            face.area = area_vec.length();
            face.normal = if face.area > 0.0 {
                area_vec / face.area
            } else {
                DVec3::ZERO
            };
            face.centroid = if area_acc > 0.0 {
                centroid_acc / area_acc
            } else {
                hub
            };
        }
    }

    fn compute_cell_geometry(&mut self) {
        for c in 0..self.cell_count {
            let apex = {
                let cell = &self.cells[c];
                cell.nodes
                    .iter()
                    .map(|&n| self.node(n).coord)
                    .sum::<DVec3>()
                    / cell.nodes.len() as f64
            };

            // 每个面配一个以节点均值为顶点的锥体
            let mut volume = 0.0;
            let mut centroid_acc = DVec3::ZERO;
            let slots = self.cells[c].faces.clone();
            for f in slots.into_iter().flatten() {
                let face = self.face(f);
                // 法向约定朝 parent 外侧，邻居侧取反
                let sign = if face.parent.as_usize() == c { 1.0 } else { -1.0 };
                let height = (face.centroid - apex).dot(sign * face.normal);
                let v = face.area * height / 3.0;
                // 锥体形心在底面形心与顶点连线距底面 1/4 处
                let pyramid_centroid = 0.75 * face.centroid + 0.25 * apex;
                volume += v;
                centroid_acc += v * pyramid_centroid;
            }

            let cell = &mut self.cells[c];
            cell.volume = volume;
            cell.centroid = if volume > 0.0 {
                centroid_acc / volume
            } else {
                apex
            };
            cell.length_scale = volume.max(0.0).cbrt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csr::CsrConnectivity;
    use crate::mesh::FaceClass;
    use crate::raw::{PartitionAssignment, RawMesh};

    fn unit_cube_mesh() -> MeshPartition {
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
        let raw = RawMesh::cell_based(
            nodes,
            CsrConnectivity::from_rows(&[vec![0u32, 1, 2, 3, 4, 5, 6, 7]]),
            Vec::new(),
        );
        let assign = PartitionAssignment::single_rank(1);
        let mut mesh = MeshPartition::new(0, 1);
        mesh.build_nodes_cells(&raw, &assign).unwrap();
        mesh.build_faces_from_cells().unwrap();
        mesh.compute_geometry();
        mesh
    }

    #[test]
    fn test_cube_face_metrics() {
        let mesh = unit_cube_mesh();
        for face in &mesh.faces {
            assert!((face.area - 1.0).abs() < 1e-12);
            assert!((face.normal.length() - 1.0).abs() < 1e-12);
        }
        // 底面法向朝外（-z）
        let bottom = mesh
            .faces
            .iter()
            .find(|f| f.centroid.z.abs() < 1e-12)
            .unwrap();
        assert!((bottom.normal - DVec3::new(0.0, 0.0, -1.0)).length() < 1e-12);
        assert!((bottom.centroid - DVec3::new(0.5, 0.5, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_cube_cell_metrics() {
        let mesh = unit_cube_mesh();
        let cell = &mesh.cells[0];
        assert!((cell.volume - 1.0).abs() < 1e-12);
        assert!((cell.centroid - DVec3::new(0.5, 0.5, 0.5)).length() < 1e-12);
        assert!((cell.length_scale - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tetra_volume() {
        let nodes = vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
        let raw = RawMesh::cell_based(
            nodes,
            CsrConnectivity::from_rows(&[vec![0u32, 1, 2, 3]]),
            Vec::new(),
        );
        let assign = PartitionAssignment::single_rank(1);
        let mut mesh = MeshPartition::new(0, 1);
        mesh.build_nodes_cells(&raw, &assign).unwrap();
        mesh.build_faces_from_cells().unwrap();
        mesh.compute_geometry();

        assert!((mesh.cells[0].volume - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_internal_face_normal_points_away_from_parent() {
        // 两个堆叠立方体，共享面法向从下方单元（parent）指向上方
        let mut nodes = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(0.0, 1.0, 1.0),
        ];
        for i in 0..4 {
            let mut n = nodes[4 + i];
            n.z = 2.0;
            nodes.push(n);
        }
        let raw = RawMesh::cell_based(
            nodes,
            CsrConnectivity::from_rows(&[
                vec![0u32, 1, 2, 3, 4, 5, 6, 7],
                vec![4, 5, 6, 7, 8, 9, 10, 11],
            ]),
            Vec::new(),
        );
        let assign = PartitionAssignment::single_rank(2);
        let mut mesh = MeshPartition::new(0, 1);
        mesh.build_nodes_cells(&raw, &assign).unwrap();
        mesh.build_faces_from_cells().unwrap();
        mesh.compute_geometry();

        let shared = mesh
            .faces
            .iter()
            .find(|f| f.class == FaceClass::Internal)
            .unwrap();
        assert_eq!(shared.parent.as_usize(), 0);
        assert!(shared.normal.z > 0.99);
        // 两个单元体积都正确
        assert!((mesh.cells[0].volume - 1.0).abs() < 1e-12);
        assert!((mesh.cells[1].volume - 1.0).abs() < 1e-12);
    }
}
