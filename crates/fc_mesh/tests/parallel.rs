// crates/fc_mesh/tests/parallel.rs

//! 双 rank 分区场景：ThreadComm 线程集群上的分区幽灵、全局归约
//! 与输出编号一致性。

use std::thread;

use fc_comm::{Communicator, ThreadComm};
use fc_mesh::{
    BcKind, BcRegionSpec, BcType, CellKind, CsrConnectivity, FaceClass, MeshPartition,
    PartitionAssignment, PickPolicy, RawMesh, RegionSelect,
};
use glam::DVec3;

/// 每个 rank 一个线程跑同一段 SPMD 逻辑，按 rank 顺序收集结果
fn run_spmd<T, F>(np: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(ThreadComm) -> T + Clone + Send + 'static,
{
    let handles: Vec<_> = ThreadComm::cluster(np)
        .into_iter()
        .map(|comm| {
            let f = f.clone();
            thread::spawn(move || f(comm))
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

/// 沿 z 轴堆叠的两个单位立方体，节点 0..11，单元 0 在下、1 在上
fn stacked_hexa_raw() -> RawMesh {
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
    RawMesh::cell_based(
        nodes,
        CsrConnectivity::from_rows(&[
            vec![0u32, 1, 2, 3, 4, 5, 6, 7],
            vec![4, 5, 6, 7, 8, 9, 10, 11],
        ]),
        Vec::new(),
    )
}

/// 单元 0 归 rank 0、单元 1 归 rank 1 的分区；邻接图按分区顺序编号
fn two_rank_assign(rank: usize) -> PartitionAssignment {
    let other = if rank == 0 { 1u32 } else { 0 };
    PartitionAssignment {
        cell_owner: vec![0, 1],
        adjacency: CsrConnectivity::from_rows(&[vec![other]]),
    }
}

fn build_on(comm: &ThreadComm) -> MeshPartition {
    let raw = stacked_hexa_raw();
    let assign = two_rank_assign(comm.rank());
    MeshPartition::build(&raw, &assign, comm).unwrap()
}

#[test]
fn test_two_rank_partition_ghosts() {
    let meshes = run_spmd(2, |comm| build_on(&comm));

    for (rank, mesh) in meshes.iter().enumerate() {
        assert_eq!(mesh.rank, rank);
        assert_eq!(mesh.cell_count, 1);
        assert_eq!(mesh.node_count, 8);
        assert_eq!(mesh.face_count, 6);

        // 共享面在两侧都是分区面，邻居是对方的幽灵
        let partition_faces: Vec<&fc_mesh::Face> = mesh
            .faces
            .iter()
            .filter(|f| f.class == FaceClass::Partition)
            .collect();
        assert_eq!(partition_faces.len(), 1);
        let ghost = mesh.cell(partition_faces[0].neighbor.unwrap());
        assert_eq!(ghost.kind, CellKind::PartitionGhost);
        assert_eq!(ghost.owner_rank, 1 - rank);
        assert_eq!(ghost.global_id, Some(1 - rank as u32));

        assert_eq!(mesh.partition_ghosts.len(), 1);
        // 幽灵与本地单元互为邻居
        assert!(mesh.cells[0]
            .neighbors
            .contains(&partition_faces[0].neighbor.unwrap()));

        // 分区面由低 rank 一侧计数：全局 6 + 6 - 1
        assert_eq!(mesh.global_face_count, 11);
        assert_eq!(mesh.global_face_node_count, 44);
    }
}

#[test]
fn test_two_rank_output_id_consistency() {
    let meshes = run_spmd(2, |comm| build_on(&comm));

    // 每个全局节点恰好一个编号，共享节点两侧一致
    let mut by_global = std::collections::HashMap::new();
    let mut all_ids = Vec::new();
    for mesh in &meshes {
        for node in &mesh.nodes {
            let id = node.output_id.expect("每个节点都应取到编号");
            if let Some(&prev) = by_global.get(&node.global_id) {
                assert_eq!(prev, id, "共享节点两侧编号不一致");
            } else {
                by_global.insert(node.global_id, id);
                all_ids.push(id);
            }
        }
    }
    all_ids.sort_unstable();
    assert_eq!(all_ids, (0..12).collect::<Vec<u32>>());

    // 低 rank 先取号
    assert_eq!(meshes[0].node_output_offset, 0);
    assert_eq!(meshes[1].node_output_offset, 8);
}

#[test]
fn test_two_rank_boundary_conditions_and_wall_distance() {
    let results = run_spmd(2, |comm| {
        let mut mesh = build_on(&comm);
        let specs = vec![
            BcRegionSpec {
                name: "bottom".into(),
                bc_type: BcType::Wall,
                kind: BcKind::NoSlip,
                region: Some(RegionSelect::Box {
                    corner_1: DVec3::new(-0.1, -0.1, -0.1),
                    corner_2: DVec3::new(1.1, 1.1, 0.1),
                }),
                pick: PickPolicy::Override,
            },
            BcRegionSpec {
                name: "rest".into(),
                bc_type: BcType::Symmetry,
                kind: BcKind::default(),
                region: Some(RegionSelect::Box {
                    corner_1: DVec3::new(-0.1, -0.1, -0.1),
                    corner_2: DVec3::new(1.1, 1.1, 2.1),
                }),
                pick: PickPolicy::UnassignedOnly,
            },
        ];
        let regions = mesh.apply_boundary_conditions(&specs, &comm).unwrap();
        (mesh, regions)
    });

    let (mesh0, regions0) = &results[0];
    let (mesh1, regions1) = &results[1];

    // 壁面只在 rank 0，面积归约后两侧一致
    assert!((regions0[0].area - 1.0).abs() < 1e-12);
    assert!((regions1[0].area - 0.0).abs() < 1e-12);
    assert!((regions0[0].total_area - 1.0).abs() < 1e-12);
    assert!((regions1[0].total_area - 1.0).abs() < 1e-12);
    // 对称区域：rank 0 四个侧面，rank 1 四个侧面加顶面
    assert!((regions0[1].area - 4.0).abs() < 1e-12);
    assert!((regions1[1].area - 5.0).abs() < 1e-12);
    assert!((regions0[1].total_area - 9.0).abs() < 1e-12);

    for mesh in [mesh0, mesh1] {
        assert_eq!(mesh.boundary_face_counts[0], vec![1, 0]);
        assert_eq!(mesh.boundary_face_counts[1], vec![4, 5]);
        assert_eq!(mesh.global_boundary_face_counts, vec![1, 9]);
    }

    // 远端 rank 的单元也能看到 rank 0 的壁面
    assert!((mesh0.cells[0].closest_wall_distance - 0.5).abs() < 1e-12);
    assert!((mesh1.cells[0].closest_wall_distance - 1.5).abs() < 1e-12);
    // 分区面不参与区域改判
    for mesh in [mesh0, mesh1] {
        assert_eq!(
            mesh.faces
                .iter()
                .filter(|f| f.class == FaceClass::Partition)
                .count(),
            1
        );
    }
}

#[test]
fn test_two_rank_bc_output_ids() {
    // 底面四个节点构成边界区域，只有 rank 0 持有这些节点
    let results = run_spmd(2, |comm| {
        let mut raw = stacked_hexa_raw();
        raw.boco.push(fc_mesh::BocoSet {
            name: "bottom".into(),
            nodes: [0u32, 1, 2, 3].into_iter().collect(),
        });
        let assign = two_rank_assign(comm.rank());
        MeshPartition::build(&raw, &assign, &comm).unwrap()
    });

    assert_eq!(results[0].global_bc_node_count, 4);
    assert_eq!(results[1].global_bc_node_count, 4);

    let mut bc_ids: Vec<u32> = results[0]
        .nodes
        .iter()
        .filter_map(|n| n.bc_output_id)
        .collect();
    bc_ids.sort_unstable();
    assert_eq!(bc_ids, vec![0, 1, 2, 3]);
    // rank 1 没有边界节点
    assert!(results[1].nodes.iter().all(|n| n.bc_output_id.is_none()));
}
