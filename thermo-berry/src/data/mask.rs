use std::ops::{Index, IndexMut};

use image::GrayImage;
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, Axis, Ix2};

use crate::consts::gray::*;
use crate::Idx2d;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 前景 bounding box: 包含所有前景像素的最小轴对齐矩形.
///
/// 四个边界均为 **闭区间** 端点, 因此 `height()`/`width()`
/// 是包含两端的像素计数.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// 最小前景行.
    pub top: usize,
    /// 最大前景行 (含).
    pub bottom: usize,
    /// 最小前景列.
    pub left: usize,
    /// 最大前景列 (含).
    pub right: usize,
}

impl BoundingBox {
    /// box 的像素高度.
    #[inline]
    pub fn height(&self) -> usize {
        self.bottom - self.top + 1
    }

    /// box 的像素宽度.
    #[inline]
    pub fn width(&self) -> usize {
        self.right - self.left + 1
    }

    /// 判断 `(h, w)` 是否落在 box 内.
    #[inline]
    pub fn contains(&self, (h, w): Idx2d) -> bool {
        (self.top..=self.bottom).contains(&h) && (self.left..=self.right).contains(&w)
    }
}

/// 足部前景二值掩膜.
///
/// 像素值只允许 [`MASK_BACKGROUND`] 和 [`MASK_FOREGROUND`] 两种.
/// 掩膜总是由分割算法派生, 不应手工编辑.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FootMask {
    data: Array2<u8>,
}

impl Index<Idx2d> for FootMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for FootMask {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl FootMask {
    /// 从裸矩阵直接创建掩膜.
    ///
    /// # 注意
    ///
    /// `data` 的像素值必须为 0 或 255, 否则程序行为未定义.
    pub fn from_array(data: Array2<u8>) -> Self {
        debug_assert!(data.iter().all(|p| matches!(*p, MASK_BACKGROUND | MASK_FOREGROUND)));
        Self { data }
    }

    /// 创建 `(height, width)` 分辨率的全背景掩膜.
    #[inline]
    pub fn zeros((height, width): Idx2d) -> Self {
        Self {
            data: Array2::zeros((height, width)),
        }
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 获得图像的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 获得图像的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 判断一个索引是否合法 (未越界).
    #[inline]
    pub fn check(&self, (h, w): Idx2d) -> bool {
        let (h_len, w_len) = self.shape();
        h < h_len && w < w_len
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u8> {
        self.data.get(pos)
    }

    /// 获取可以迭代掩膜像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, u8, Ix2> {
        self.data.iter()
    }

    /// 以行优先规则, 获取能迭代掩膜所有 `(索引, 像素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
        self.data.indexed_iter()
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }

    /// 统计前景像素总个数.
    #[inline]
    pub fn foreground_count(&self) -> usize {
        self.iter().filter(|p| is_foreground(**p)).count()
    }

    /// 该掩膜是否为全背景?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.iter().copied().all(is_background)
    }

    /// 计算前景 bounding box.
    ///
    /// box 仅由前景像素派生. 当掩膜为全背景时返回 `None`,
    /// 此时任何分区操作都不应继续.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;
        for ((h, w), &pix) in self.indexed_iter() {
            if is_background(pix) {
                continue;
            }
            match bbox.as_mut() {
                None => {
                    bbox = Some(BoundingBox {
                        top: h,
                        bottom: h,
                        left: w,
                        right: w,
                    })
                }
                Some(b) => {
                    b.top = b.top.min(h);
                    b.bottom = b.bottom.max(h);
                    b.left = b.left.min(w);
                    b.right = b.right.max(w);
                }
            }
        }
        bbox
    }

    /// 水平镜像 (逐像素精确反转, 无插值). 翻转两次按位复原.
    pub fn flip_horizontal(&self) -> Self {
        let mut view = self.data.view();
        view.invert_axis(Axis(1));
        Self {
            data: view.as_standard_layout().to_owned(),
        }
    }

    /// 以最近邻插值将掩膜重采样到 `(height, width)` 分辨率.
    ///
    /// 最近邻保证结果仍是严格二值的, 不会在前景边缘引入小数过渡像素.
    pub fn resize_nearest(&self, (height, width): Idx2d) -> Self {
        let (h, w) = self.shape();
        let flat: Vec<u8> = self.iter().copied().collect();
        let raw = GrayImage::from_raw(w as u32, h as u32, flat).unwrap();
        let resized = image::imageops::resize(
            &raw,
            width as u32,
            height as u32,
            image::imageops::FilterType::Nearest,
        );
        Self {
            data: Array2::from_shape_vec((height, width), resized.into_raw()).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross_mask() -> FootMask {
        // 5x5, 前景呈十字形
        let mut m = FootMask::zeros((5, 5));
        for i in 1..4 {
            m[(2, i)] = MASK_FOREGROUND;
            m[(i, 2)] = MASK_FOREGROUND;
        }
        m
    }

    #[test]
    fn test_bounding_box_from_foreground_only() {
        let m = cross_mask();
        let b = m.bounding_box().unwrap();
        assert_eq!((b.top, b.bottom, b.left, b.right), (1, 3, 1, 3));
        assert_eq!(b.height(), 3);
        assert_eq!(b.width(), 3);
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(FootMask::zeros((4, 4)).bounding_box().is_none());
    }

    #[test]
    fn test_flip_horizontal_is_involution() {
        let m = cross_mask();
        let twice = m.flip_horizontal().flip_horizontal();
        assert_eq!(m.data, twice.data);
    }

    #[test]
    fn test_flip_horizontal_reverses_columns() {
        let mut m = FootMask::zeros((2, 3));
        m[(0, 0)] = MASK_FOREGROUND;
        let f = m.flip_horizontal();
        assert_eq!(f[(0, 2)], MASK_FOREGROUND);
        assert_eq!(f[(0, 0)], MASK_BACKGROUND);
    }

    #[test]
    fn test_resize_nearest_keeps_binary() {
        let m = cross_mask();
        let r = m.resize_nearest((17, 11));
        assert_eq!(r.shape(), (17, 11));
        assert!(r.iter().all(|p| matches!(*p, MASK_BACKGROUND | MASK_FOREGROUND)));
    }
}
