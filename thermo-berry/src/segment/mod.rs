//! 足底前景分割.
//!
//! 从一张彩色热成像照片中分离足部轮廓, 产出二值掩膜和遮罩后的照片.
//! 流水线: 灰度化 -> CLAHE 局部对比度增强 -> (Otsu 全局阈值 ∪
//! 局部自适应阈值) -> 极性归一化 -> 椭圆核闭运算 -> 内部空洞填充 ->
//! 最大连通域提取 -> 原图遮罩.

mod enhance;
mod morph;
mod threshold;

pub use enhance::clahe;

use crate::consts::segm::*;
use crate::{FootMask, Idx2d, ThermalImage};

/// 分割配置.
///
/// 历史上曾存在两个几乎相同的分割实现: 一个把输入统一缩放到固定分辨率
/// (批预处理), 一个保持原生分辨率 (交互分析).
/// 这里统一为单一入口, 用显式的 `target` 模式区分, 避免两份代码分叉.
#[derive(Copy, Clone, Debug, Default)]
pub struct SegmentConfig {
    /// `Some((height, width))` 时先将输入重采样到该分辨率再分割;
    /// `None` 时保持原生分辨率.
    pub target: Option<Idx2d>,
}

impl SegmentConfig {
    /// 保持原生分辨率的配置.
    #[inline]
    pub fn native() -> Self {
        Self { target: None }
    }

    /// 固定目标分辨率的配置.
    #[inline]
    pub fn resized(target: Idx2d) -> Self {
        Self {
            target: Some(target),
        }
    }
}

/// 分割结果: 遮罩后的足部照片与二值掩膜, 二者分辨率一致.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// 背景被置零的足部照片.
    pub foot: ThermalImage,

    /// 足部前景掩膜.
    pub mask: FootMask,
}

/// 对一张热成像照片运行前景分割.
///
/// # 注意
///
/// 当阈值并集 + 形态学修复后不存在任何前景连通域时,
/// 掩膜和遮罩图都退化为全零. 该退化结果 **不是错误**:
/// 它会继续向下游传播, 下游各区会报告 "无数据" 均值.
/// 图像解码失败属于加载阶段 ([`ThermalImage::open`]) 的职责,
/// 到达本函数的输入总是已解码的.
pub fn segment(image: &ThermalImage, config: &SegmentConfig) -> Segmentation {
    let standardized;
    let input = match config.target {
        Some(target) if target != image.shape() => {
            standardized = image.resized(target);
            &standardized
        }
        _ => image,
    };

    let gray = input.to_gray();
    let enhanced = clahe(&gray.view(), CLAHE_CLIP_LIMIT, CLAHE_TILES);
    let view = enhanced.view();

    // 两份独立的前景估计: 全局双峰 + 局部自适应.
    let global = threshold::binarize_global(&view, threshold::otsu_level(&view));
    let local = threshold::adaptive_mean_mask(&view, ADAPTIVE_BLOCK, ADAPTIVE_OFFSET);
    let combined = threshold::normalize_polarity(threshold::union(&global, &local));

    let healed = morph::fill_holes(&morph::close(&combined, CLOSE_ITERATIONS));

    let mask = match morph::largest_component(&healed) {
        Some(data) => FootMask::from_array(data),
        None => FootMask::zeros(input.shape()),
    };

    let foot = input.masked(&mask);
    Segmentation { foot, mask }
}
