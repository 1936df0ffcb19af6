// crates/fc_mesh/src/mesh.rs

//! 本地网格分区数据模型
//!
//! 每个进程持有一个 [`MeshPartition`]：本地节点、单元、面三个容器
//! 及其全部邻接关系。容器只追加、从不重排，索引终生稳定。
//!
//! # 单元三态
//!
//! - **内部单元**: 本 rank 拥有的真实单元
//! - **分区幽灵**: 邻 rank 拥有、与本地单元共享面/节点的占位单元，
//!   不携带权威几何数据
//! - **边界幽灵**: 为闭合边界模板合成的镜像单元，无全局 id
//!
//! # 构建阶段
//!
//! [`MeshPartition::build`] 按固定顺序推进各阶段，后续阶段只向
//! 容器追加（幽灵），从不改写先前阶段建立的不变量。所有 rank 必须
//! 执行相同的阶段序列以保持集合通信对齐。

use std::collections::HashMap;
use std::ops::Range;

use fc_comm::Communicator;
use fc_foundation::{BcId, CellId, FaceId, NodeId, RawId};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::MeshResult;
use crate::raw::{PartitionAssignment, RawKind, RawMesh};

/// 网格节点
#[derive(Debug, Clone)]
pub struct Node {
    /// 全局 id
    pub global_id: RawId,
    /// 三维坐标
    pub coord: DVec3,
    /// 关联单元（本地索引，含幽灵），无重复
    pub cells: Vec<CellId>,
    /// 关联面（本地索引），无重复
    pub faces: Vec<FaceId>,
    /// 体输出编号（全局唯一、跨分区去重），编号阶段后赋值
    pub output_id: Option<u32>,
    /// 边界输出编号（仅触及边界面的节点），编号阶段后赋值
    pub bc_output_id: Option<u32>,
}

impl Node {
    pub fn new(global_id: RawId, coord: DVec3) -> Self {
        Self {
            global_id,
            coord,
            cells: Vec::new(),
            faces: Vec::new(),
            output_id: None,
            bc_output_id: None,
        }
    }
}

/// 单元类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    /// 本 rank 拥有的真实单元
    Internal,
    /// 邻 rank 拥有的分区幽灵
    PartitionGhost,
    /// 合成的边界幽灵
    BoundaryGhost,
}

/// 网格单元
#[derive(Debug, Clone)]
pub struct Cell {
    /// 单元类别
    pub kind: CellKind,
    /// 全局 id，边界幽灵为 None
    pub global_id: Option<RawId>,
    /// 拥有该单元的 rank
    pub owner_rank: usize,
    /// 创建时在容器中的位置，容器不重排故恒等于自身索引
    pub id_in_owner: u32,
    /// 节点列表（本地索引，有序）
    pub nodes: Vec<NodeId>,
    /// 面槽位列表，None 表示构建期间尚未填充
    pub faces: Vec<Option<FaceId>>,
    /// 节点邻接闭包内的邻居单元（含幽灵），无重复
    pub neighbors: Vec<CellId>,
    /// 边界幽灵所属的边界区域
    pub bc: Option<BcId>,
    /// 形心（几何阶段计算；幽灵为估计值）
    pub centroid: DVec3,
    /// 体积
    pub volume: f64,
    /// 长度尺度
    pub length_scale: f64,
    /// 最近壁面距离
    pub closest_wall_distance: f64,
}

impl Cell {
    fn new(kind: CellKind, global_id: Option<RawId>, owner_rank: usize, id_in_owner: u32) -> Self {
        Self {
            kind,
            global_id,
            owner_rank,
            id_in_owner,
            nodes: Vec::new(),
            faces: Vec::new(),
            neighbors: Vec::new(),
            bc: None,
            centroid: DVec3::ZERO,
            volume: 0.0,
            length_scale: 0.0,
            closest_wall_distance: 0.0,
        }
    }

    /// 创建内部单元
    pub fn internal(global_id: RawId, owner_rank: usize, id_in_owner: u32) -> Self {
        Self::new(CellKind::Internal, Some(global_id), owner_rank, id_in_owner)
    }

    /// 创建分区幽灵
    pub fn partition_ghost(global_id: RawId, owner_rank: usize, id_in_owner: u32) -> Self {
        Self::new(
            CellKind::PartitionGhost,
            Some(global_id),
            owner_rank,
            id_in_owner,
        )
    }

    /// 创建边界幽灵
    pub fn boundary_ghost(owner_rank: usize, id_in_owner: u32, bc: BcId) -> Self {
        let mut cell = Self::new(CellKind::BoundaryGhost, None, owner_rank, id_in_owner);
        cell.bc = Some(bc);
        cell
    }

    /// 判断给定节点列表是否全部属于该单元
    pub fn have_nodes(&self, nodes: &[NodeId]) -> bool {
        nodes.iter().all(|n| self.nodes.contains(n))
    }
}

/// 面分类
///
/// 不变量：任一时刻恰有一种分类成立；重分类只允许
/// `Unassigned` 收窄为具体类别（或边界区域之间按 pick 策略迁移），
/// 绝不反向。例外：单元类路径的预匹配看不到对岸 rank，可能把
/// 分区界面误判为 `Boundary`，分区幽灵阶段凑齐节点证据后将其
/// 改写为 `Partition`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceClass {
    /// 两侧单元都在本 rank
    Internal,
    /// 尚未分类（边界或分区界面候选）
    Unassigned,
    /// 分区界面，邻居是分区幽灵
    Partition,
    /// 已匹配到编号边界区域
    Boundary(BcId),
}

impl FaceClass {
    /// 是否已匹配到边界区域
    #[inline]
    pub fn is_boundary(self) -> bool {
        matches!(self, FaceClass::Boundary(_))
    }

    /// 边界区域编号
    #[inline]
    pub fn boundary_id(self) -> Option<BcId> {
        match self {
            FaceClass::Boundary(b) => Some(b),
            _ => None,
        }
    }
}

/// 网格面
#[derive(Debug, Clone)]
pub struct Face {
    /// 拥有者单元。内部面约定取两侧中编号较小者
    pub parent: CellId,
    /// 邻居单元；边界/分区面在幽灵创建前为 None
    pub neighbor: Option<CellId>,
    /// 节点列表（本地索引，有序——顺序决定外法向符号）
    pub nodes: Vec<NodeId>,
    /// 面分类
    pub class: FaceClass,
    /// 对称面标志（边界条件应用阶段覆盖）
    pub symmetry: bool,
    /// 面心
    pub centroid: DVec3,
    /// 单位外法向（从 parent 指向外侧）
    pub normal: DVec3,
    /// 面积
    pub area: f64,
    /// 最近壁面距离
    pub closest_wall_distance: f64,
    /// 耗散因子 1 - |最近壁面法向 · 自身法向|
    pub dissipation_factor: f64,
}

impl Face {
    pub fn new(parent: CellId, class: FaceClass) -> Self {
        Self {
            parent,
            neighbor: None,
            nodes: Vec::new(),
            class,
            symmetry: false,
            centroid: DVec3::ZERO,
            normal: DVec3::ZERO,
            area: 0.0,
            closest_wall_distance: 0.0,
            dissipation_factor: 0.0,
        }
    }
}

/// 全局/本地编号映射
#[derive(Debug, Clone, Default)]
pub struct Maps {
    /// 全局节点 id -> 本地节点索引
    pub node_global_to_local: HashMap<RawId, NodeId>,
    /// 全局单元 id -> 本地单元索引（含分区幽灵）
    pub cell_global_to_local: HashMap<RawId, CellId>,
    /// 每个边界面在所属区域花名册中的序号（边界条件应用阶段填充）
    pub face_to_bc_slot: Vec<Option<u32>>,
}

/// 本地网格分区
#[derive(Debug, Clone)]
pub struct MeshPartition {
    /// 本进程 rank
    pub rank: usize,
    /// 进程总数
    pub np: usize,

    /// 节点容器
    pub nodes: Vec<Node>,
    /// 单元容器：`[0, cell_count)` 内部单元，其后依次为分区幽灵、
    /// 各区域的边界幽灵
    pub cells: Vec<Cell>,
    /// 面容器
    pub faces: Vec<Face>,

    /// 本地真实单元数（不含幽灵）
    pub cell_count: usize,
    /// 本地节点数
    pub node_count: usize,
    /// 本地面数
    pub face_count: usize,

    /// 全局节点数
    pub global_node_count: usize,
    /// 全局单元数
    pub global_cell_count: usize,
    /// 归约后的全局面数（分区面只计一次）
    pub global_face_count: usize,
    /// 归约后的全局面-节点总数
    pub global_face_node_count: usize,

    /// 编号映射
    pub maps: Maps,

    /// 边界区域名（与 boco 同序）
    pub boco_names: Vec<String>,
    /// 本地化后的边界节点集（本地节点索引）
    pub boco_nodes: Vec<std::collections::HashSet<NodeId>>,

    /// 分区幽灵在单元容器中的索引区间
    pub partition_ghosts: Range<usize>,
    /// 各边界区域幽灵的索引区间
    pub boundary_ghosts: Vec<Range<usize>>,

    /// 边界区域数
    pub bc_count: usize,
    /// 每个区域的本地边界面花名册
    pub boundary_faces: Vec<Vec<FaceId>>,
    /// 每个区域的本地边界节点花名册（升序）
    pub boundary_nodes: Vec<Vec<NodeId>>,
    /// 每个区域按 rank 的边界面数
    pub boundary_face_counts: Vec<Vec<u32>>,
    /// 每个区域全局边界面数
    pub global_boundary_face_counts: Vec<u32>,

    /// 本 rank 体输出编号偏移
    pub node_output_offset: u32,
    /// 本 rank 边界输出编号偏移
    pub node_bc_output_offset: u32,
    /// 全局边界节点数
    pub global_bc_node_count: usize,
}

impl MeshPartition {
    /// 创建空分区
    pub fn new(rank: usize, np: usize) -> Self {
        Self {
            rank,
            np,
            nodes: Vec::new(),
            cells: Vec::new(),
            faces: Vec::new(),
            cell_count: 0,
            node_count: 0,
            face_count: 0,
            global_node_count: 0,
            global_cell_count: 0,
            global_face_count: 0,
            global_face_node_count: 0,
            maps: Maps::default(),
            boco_names: Vec::new(),
            boco_nodes: Vec::new(),
            partition_ghosts: 0..0,
            boundary_ghosts: Vec::new(),
            bc_count: 0,
            boundary_faces: Vec::new(),
            boundary_nodes: Vec::new(),
            boundary_face_counts: Vec::new(),
            global_boundary_face_counts: Vec::new(),
            node_output_offset: 0,
            node_bc_output_offset: 0,
            global_bc_node_count: 0,
        }
    }

    // ========================================================================
    // 访问器
    // ========================================================================

    #[inline]
    pub fn node(&self, n: NodeId) -> &Node {
        &self.nodes[n.as_usize()]
    }

    #[inline]
    pub fn node_mut(&mut self, n: NodeId) -> &mut Node {
        &mut self.nodes[n.as_usize()]
    }

    #[inline]
    pub fn cell(&self, c: CellId) -> &Cell {
        &self.cells[c.as_usize()]
    }

    #[inline]
    pub fn cell_mut(&mut self, c: CellId) -> &mut Cell {
        &mut self.cells[c.as_usize()]
    }

    #[inline]
    pub fn face(&self, f: FaceId) -> &Face {
        &self.faces[f.as_usize()]
    }

    #[inline]
    pub fn face_mut(&mut self, f: FaceId) -> &mut Face {
        &mut self.faces[f.as_usize()]
    }

    /// 面 f 的第 i 个节点
    #[inline]
    pub fn face_node(&self, f: usize, i: usize) -> &Node {
        &self.nodes[self.faces[f].nodes[i].as_usize()]
    }

    /// 索引 c 是否指向幽灵单元（分区或边界）
    #[inline]
    pub fn is_ghost(&self, c: CellId) -> bool {
        c.as_usize() >= self.cell_count
    }

    // ========================================================================
    // 构建管线
    // ========================================================================

    /// 从原始网格和分区归属构建完整的本地分区
    ///
    /// 阶段顺序固定：本地拓扑 → 面构建 → 分区幽灵 → 几何 →
    /// 边界幽灵 → 体输出编号 → 边界输出编号。所有 rank 必须同步
    /// 走完相同的阶段序列（内部含集合通信）。
    ///
    /// 边界条件区域的应用（[`apply_boundary_conditions`]）由调用方
    /// 在此之后单独执行。
    ///
    /// [`apply_boundary_conditions`]: MeshPartition::apply_boundary_conditions
    pub fn build(
        raw: &RawMesh,
        assign: &PartitionAssignment,
        comm: &dyn Communicator,
    ) -> MeshResult<Self> {
        raw.validate()?;
        assign.validate(raw.global_cell_count(), comm.size())?;

        let mut mesh = Self::new(comm.rank(), comm.size());
        mesh.global_cell_count = raw.global_cell_count();
        mesh.global_node_count = raw.global_node_count();

        mesh.build_nodes_cells(raw, assign)?;
        match raw.kind {
            RawKind::CellBased => mesh.build_faces_from_cells()?,
            RawKind::FaceBased => mesh.build_faces_from_face_list(raw, assign)?,
        }
        mesh.build_partition_ghosts(raw, assign, comm);
        mesh.compute_geometry();
        mesh.build_boundary_ghosts();
        mesh.assign_output_ids(comm);
        mesh.assign_bc_output_ids(comm);

        Ok(mesh)
    }
}
