//! 左右足配准.
//!
//! 约定以左足坐标系为规范坐标系: 右足的掩膜、遮罩照片与温度矩阵
//! 都做一次水平镜像, 使左右足的解剖区域逐坐标可比.
//! 镜像是纯粹的后处理, 掩膜总是在 **未翻转** 的原图上计算,
//! 因此分割质量不受拍摄方向影响.

use crate::segment::Segmentation;
use crate::TempGrid;

/// 脚的左右侧别.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FootSide {
    /// 左足. 已处于规范坐标系.
    Left,

    /// 右足. 配准时需要水平镜像.
    Right,
}

impl FootSide {
    /// 是否为右足?
    #[inline]
    pub fn is_right(&self) -> bool {
        matches!(self, Self::Right)
    }
}

/// 将一只脚的分割结果变换到规范坐标系.
///
/// 右足的掩膜与遮罩照片被水平镜像; 左足原样返回.
/// 变换是严格的 involution: 翻转两次按位复原.
pub fn register_segmentation(seg: Segmentation, side: FootSide) -> Segmentation {
    if !side.is_right() {
        return seg;
    }
    Segmentation {
        foot: seg.foot.flip_horizontal(),
        mask: seg.mask.flip_horizontal(),
    }
}

/// 将一只脚的温度矩阵变换到规范坐标系.
///
/// 温度矩阵独立于照片加载, 因此独立配准; 右足矩阵被水平镜像.
pub fn register_grid(grid: TempGrid, side: FootSide) -> TempGrid {
    if !side.is_right() {
        return grid;
    }
    grid.flip_horizontal()
}
