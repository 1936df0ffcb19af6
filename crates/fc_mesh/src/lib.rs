// crates/fc_mesh/src/lib.rs

//! FlowCore 非结构网格拓扑引擎
//!
//! 把全局编号的原始网格数据（外部读网格器 + 图分区器的输出）
//! 物化为每个进程的本地分区 [`MeshPartition`]：本地节点/单元/面、
//! 全部邻接关系、分区幽灵与边界幽灵、全局唯一的输出编号，以及
//! 边界条件区域的匹配结果。
//!
//! # 使用
//!
//! ```no_run
//! use fc_comm::SerialComm;
//! use fc_mesh::{BcRegionSpec, MeshPartition, PartitionAssignment, RawMesh};
//!
//! # fn load_raw() -> RawMesh { unimplemented!() }
//! # fn load_specs() -> Vec<BcRegionSpec> { unimplemented!() }
//! let raw = load_raw();
//! let assign = PartitionAssignment::single_rank(raw.global_cell_count());
//! let comm = SerialComm::new();
//!
//! let mut mesh = MeshPartition::build(&raw, &assign, &comm)?;
//! let _regions = mesh.apply_boundary_conditions(&load_specs(), &comm)?;
//! # Ok::<(), fc_mesh::MeshError>(())
//! ```
//!
//! # 模块划分
//!
//! - [`raw`]: 原始输入的数据形状与校验
//! - [`mesh`]: 分区数据模型与构建管线入口
//! - [`topology`] / [`faces`] / [`ghosts`] / [`geometry`] /
//!   [`numbering`]: 各构建阶段
//! - [`bc`]: 边界条件区域配置与应用
//!
//! 多进程运行时所有 rank 必须同步执行相同的构建与应用序列，
//! 集合通信经由 `fc_comm` 的 [`Communicator`](fc_comm::Communicator)。

pub mod bc;
pub mod csr;
pub mod error;
pub mod faces;
pub mod geometry;
pub mod ghosts;
pub mod mesh;
pub mod numbering;
pub mod raw;
pub mod topology;

pub use bc::{BcKind, BcRegion, BcRegionSpec, BcType, PickPolicy, RegionSelect};
pub use csr::CsrConnectivity;
pub use error::{MeshError, MeshResult};
pub use mesh::{Cell, CellKind, Face, FaceClass, Maps, MeshPartition, Node};
pub use raw::{BocoSet, PartitionAssignment, RawKind, RawMesh};
