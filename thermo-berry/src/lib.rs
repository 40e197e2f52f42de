#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供糖尿病足 (DFU) 红外热成像数据的结构化信息和基础分析算法.
//!
//! 该 crate 目前仅提供 `safe` 接口. 将来可能为部分高性能场景关键路径提供 `unsafe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 面向 "单人双足、一次背侧/跖侧热成像拍摄" 的数据组织模式,
//!   没有对其它拍摄姿态进行直接适配.
//! 2. 在非期望情况下, 程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//!
//! # 开发计划
//!
//! ### 足底前景分割 ✅
//!
//! 灰度化, CLAHE 局部对比度增强, Otsu + 局部自适应混合阈值,
//! 极性归一化, 椭圆核闭运算, 内部空洞填充, 最大连通域提取.
//!
//! 实现位于 `thermo-berry/src/segment`.
//!
//! ### 左右足配准 ✅
//!
//! 右足水平镜像, 使左右足的解剖区域在同一坐标系下逐点可比.
//! 镜像是严格的 involution: 翻转两次按位复原.
//!
//! 实现位于 `thermo-berry/src/register.rs`.
//!
//! ### Angiosome 血管区划分 ✅
//!
//! 根据前景 bounding box 的固定比例分割线, 将足部划分为
//! MPA / LPA / LCA / MCA 四个血管区, 并从温度矩阵提取各区统计信息.
//!
//! 实现位于 `thermo-berry/src/angiosome.rs`.
//!
//! ### 双侧对称性分析 ✅
//!
//! 逐区温度差与风险分级 (交通灯模型), 以及病人级聚合状态.
//!
//! 实现位于 `thermo-berry/src/symmetry.rs`.
//!
//! ### 队列级敏感性分析 ✅
//!
//! 手工实现 (不依赖现成统计库) 的 ROC 曲线 / AUC
//! 与固定阈值下的混淆矩阵指标.
//!
//! 参考论文: "Infrared thermal imaging for automated detection of
//! diabetic foot complications". 从该论文得知 2.2 ℃ 双侧温差筛查标准.
//!
//! 实现位于 `thermo-berry/src/sensitivity.rs`.
//!
//! ### 数据集与批处理 ✅
//!
//! 提供迭代器风格的病人记录加载器, 以及可并行的队列批处理
//! (单条记录失败不影响整体).
//!
//! 实现位于 `thermo-berry/src/{dataset, batch.rs}`.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

type Predicate = fn(u8) -> bool;

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

/// 热成像基础数据结构.
mod data;

pub use data::{BoundingBox, FootMask, GridError, ImgWriteRaw, TempGrid, ThermalImage};

pub mod consts;

pub mod segment;

pub mod register;

pub mod angiosome;

pub mod symmetry;

pub mod sensitivity;

pub mod pipeline;

pub mod batch;
pub mod dataset;
pub mod prelude;
