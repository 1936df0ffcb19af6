// crates/fc_mesh/src/bc.rs

//! 边界条件区域应用
//!
//! 构建管线完成后按配置顺序逐区域执行：
//!
//! 1. box 几何筛选按 pick 策略改判面的区域归属
//! 2. 逐面登记区域内序号、累计面积与面积加权法向，面积做全局归约
//! 3. 应用完毕仍有未赋值面即为致命配置错误
//! 4. inlet/outlet 区域的边界幽灵形心改为对面心的点反射
//!    （镜面反射会让幽灵贴着斜进出口面，通量重构会退化）
//! 5. 无滑移壁面心/法向全收集后对所有单元与面做最近壁距离扫描
//!
//! 区域配置是 serde 数据模型，pick 策略在反序列化时就解析成枚举。

use fc_comm::Communicator;
use fc_foundation::BcId;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MeshError, MeshResult};
use crate::mesh::{FaceClass, MeshPartition};

// ============================================================================
// 区域配置
// ============================================================================

/// 边界条件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BcType {
    Wall,
    Inlet,
    Outlet,
    Symmetry,
}

/// 壁面子类；只有无滑移壁面参与最近壁距离
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BcKind {
    #[default]
    NoSlip,
    Slip,
}

/// 几何筛选形状
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum RegionSelect {
    /// 轴对齐包围盒，面心落在盒内即命中
    Box { corner_1: DVec3, corner_2: DVec3 },
}

/// 几何筛选命中时的改判策略
///
/// 配置里写 `"override"`、`"unassigned"` 或 `"BCk"`（k 为 1 起始的
/// 区域号，表示只改判当前属于区域 k-1 的面）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickPolicy {
    /// 命中即改判，无视当前归属
    Override,
    /// 只改判尚未赋值的面
    UnassignedOnly,
    /// 只改判当前属于指定区域的面（0 起始）
    FromRegion(usize),
}

impl Default for PickPolicy {
    fn default() -> Self {
        Self::UnassignedOnly
    }
}

impl std::str::FromStr for PickPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "override" => Ok(Self::Override),
            "unassigned" => Ok(Self::UnassignedOnly),
            _ => {
                if let Some(k) = s.strip_prefix("BC") {
                    let k: usize = k
                        .parse()
                        .map_err(|_| format!("pick 策略 BC 序号无法解析: {s:?}"))?;
                    if k == 0 {
                        return Err("pick 策略的 BC 序号从 1 起始".into());
                    }
                    Ok(Self::FromRegion(k - 1))
                } else {
                    Err(format!("未知的 pick 策略: {s:?}"))
                }
            }
        }
    }
}

impl std::fmt::Display for PickPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Override => write!(f, "override"),
            Self::UnassignedOnly => write!(f, "unassigned"),
            Self::FromRegion(k) => write!(f, "BC{}", k + 1),
        }
    }
}

impl Serialize for PickPolicy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PickPolicy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 单个边界条件区域的配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BcRegionSpec {
    /// 区域名（诊断用）
    #[serde(default)]
    pub name: String,
    /// 边界条件类型
    #[serde(rename = "type")]
    pub bc_type: BcType,
    /// 壁面子类
    #[serde(default)]
    pub kind: BcKind,
    /// 几何筛选；None 表示完全依赖节点集预匹配
    #[serde(default)]
    pub region: Option<RegionSelect>,
    /// 改判策略
    #[serde(default)]
    pub pick: PickPolicy,
}

// ============================================================================
// 区域应用结果
// ============================================================================

/// 应用后的区域汇总
#[derive(Debug, Clone)]
pub struct BcRegion {
    pub bc_type: BcType,
    pub kind: BcKind,
    /// 本 rank 的区域面积
    pub area: f64,
    /// 本 rank 的面积加权法向和
    pub area_vec: DVec3,
    /// 全局归约后的区域面积
    pub total_area: f64,
}

impl BcRegion {
    /// 是否参与最近壁距离（无滑移壁面）
    #[inline]
    fn is_no_slip_wall(&self) -> bool {
        self.bc_type == BcType::Wall && self.kind != BcKind::Slip
    }
}

/// 点是否落在两角点撑起的包围盒内（角点顺序不限）
fn within_box(p: DVec3, corner_1: DVec3, corner_2: DVec3) -> bool {
    let lo = corner_1.min(corner_2);
    let hi = corner_1.max(corner_2);
    p.cmpge(lo).all() && p.cmple(hi).all()
}

impl MeshPartition {
    /// 按配置顺序应用全部边界条件区域
    ///
    /// 成功时返回各区域的面积汇总。所有 rank 必须以相同配置同步
    /// 调用（内部含集合通信）。
    pub fn apply_boundary_conditions(
        &mut self,
        specs: &[BcRegionSpec],
        comm: &dyn Communicator,
    ) -> MeshResult<Vec<BcRegion>> {
        self.bc_count = specs.len();
        self.maps.face_to_bc_slot = vec![None; self.face_count];
        let mut bc_counter = vec![0u32; specs.len()];
        let mut regions = Vec::with_capacity(specs.len());

        for (b, spec) in specs.iter().enumerate() {
            // box 几何筛选
            if let Some(RegionSelect::Box { corner_1, corner_2 }) = spec.region {
                for f in 0..self.face_count {
                    let class = self.faces[f].class;
                    // 内部面与分区面不参与改判
                    let eligible = matches!(class, FaceClass::Unassigned | FaceClass::Boundary(_));
                    if !eligible || !within_box(self.faces[f].centroid, corner_1, corner_2) {
                        continue;
                    }
                    let hit = match spec.pick {
                        PickPolicy::Override => true,
                        PickPolicy::UnassignedOnly => class == FaceClass::Unassigned,
                        PickPolicy::FromRegion(k) => {
                            class.boundary_id().map(|b2| b2.as_usize()) == Some(k)
                        }
                    };
                    if hit {
                        self.faces[f].class = FaceClass::Boundary(BcId::from_usize(b));
                    }
                }
            }

            // 区域内序号登记与面积累计
            let mut area = 0.0;
            let mut area_vec = DVec3::ZERO;
            for f in 0..self.face_count {
                if self.faces[f].class.boundary_id().map(|b2| b2.as_usize()) != Some(b) {
                    continue;
                }
                self.faces[f].symmetry = spec.bc_type == BcType::Symmetry;
                self.maps.face_to_bc_slot[f] = Some(bc_counter[b]);
                bc_counter[b] += 1;
                area += self.faces[f].area;
                area_vec += self.faces[f].area * self.faces[f].normal;
            }

            regions.push(BcRegion {
                bc_type: spec.bc_type,
                kind: spec.kind,
                area,
                area_vec,
                total_area: comm.sum_f64(area),
            });
        }

        // 每个区域按 rank 的边界面数
        self.boundary_face_counts = Vec::with_capacity(specs.len());
        self.global_boundary_face_counts = Vec::with_capacity(specs.len());
        for b in 0..specs.len() {
            let counts = comm.all_gather_u64(bc_counter[b] as u64);
            self.global_boundary_face_counts
                .push(counts.iter().sum::<u64>() as u32);
            self.boundary_face_counts
                .push(counts.into_iter().map(|c| c as u32).collect());
        }

        // 收尾检查与 inlet/outlet 幽灵形心修正
        for f in 0..self.face_count {
            match self.faces[f].class {
                FaceClass::Unassigned => return Err(MeshError::UnassignedFace { face: f }),
                FaceClass::Boundary(b) => {
                    let region = &regions[b.as_usize()];
                    if region.bc_type == BcType::Inlet || region.bc_type == BcType::Outlet {
                        // 点反射而非镜面反射
                        let parent_centroid = self.cell(self.faces[f].parent).centroid;
                        let fixed = parent_centroid
                            + 2.0 * (self.faces[f].centroid - parent_centroid);
                        if let Some(g) = self.faces[f].neighbor {
                            self.cell_mut(g).centroid = fixed;
                        }
                    }
                }
                _ => {}
            }
        }

        self.compute_wall_distances(&regions, comm);

        Ok(regions)
    }

    /// 全收集无滑移壁面的面心/法向并做最近壁距离线性扫描
    fn compute_wall_distances(&mut self, regions: &[BcRegion], comm: &dyn Communicator) {
        if self.rank == 0 {
            info!("计算最近壁面距离");
        }

        let face_is_no_slip_wall = |class: FaceClass| {
            class
                .boundary_id()
                .map(|b| regions[b.as_usize()].is_no_slip_wall())
                .unwrap_or(false)
        };

        // 本地壁面的 [面心 xyz, 法向 xyz] 六元组拼接后变长全收集
        let mut local = Vec::new();
        for f in 0..self.face_count {
            if face_is_no_slip_wall(self.faces[f].class) {
                let face = &self.faces[f];
                local.extend_from_slice(&[
                    face.centroid.x,
                    face.centroid.y,
                    face.centroid.z,
                    face.normal.x,
                    face.normal.y,
                    face.normal.z,
                ]);
            }
        }
        let gathered = comm.all_gather_v_f64(&local);
        let walls: Vec<(DVec3, DVec3)> = gathered
            .chunks_exact(6)
            .map(|w| {
                (
                    DVec3::new(w[0], w[1], w[2]),
                    DVec3::new(w[3], w[4], w[5]),
                )
            })
            .collect();

        // 所有单元（含幽灵）
        for cell in &mut self.cells {
            let mut best: f64 = 1.0e20;
            for &(c, _) in &walls {
                best = best.min((cell.centroid - c).length());
            }
            cell.closest_wall_distance = best;
        }

        // 所有面；壁面自身距离为零
        for f in 0..self.face_count {
            if face_is_no_slip_wall(self.faces[f].class) {
                self.faces[f].closest_wall_distance = 0.0;
                self.faces[f].dissipation_factor = 0.0;
                continue;
            }
            let centroid = self.faces[f].centroid;
            let mut best = 1.0e20;
            let mut nearest_normal = DVec3::ZERO;
            for &(c, n) in &walls {
                let d = (centroid - c).length();
                if d < best {
                    best = d;
                    nearest_normal = n;
                }
            }
            self.faces[f].closest_wall_distance = best;
            self.faces[f].dissipation_factor =
                1.0 - nearest_normal.dot(self.faces[f].normal).abs();
        }
    }
}
