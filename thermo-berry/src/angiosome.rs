//! Angiosome 血管区划分.
//!
//! 足部按四个标准血管供血区划分: MPA (足底内侧), LPA (足底外侧),
//! LCA (跟骨外侧), MCA (跟骨内侧). 分割线由前景 bounding box
//! 的固定比例派生, 四个区域按构造互不重叠且完整铺满 box.
//!
//! 温度矩阵的分辨率是权威分辨率: 掩膜在划分前会以最近邻插值
//! 重采样到矩阵的分辨率.

use ndarray::Array2;
use num::ToPrimitive;

use crate::consts::gray::is_foreground;
use crate::consts::split::*;
use crate::data::BoundingBox;
use crate::{FootMask, Idx2d, TempGrid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 四个标准血管区之一.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Angiosome {
    /// Medial Plantar Artery: 足底内侧中段.
    Mpa,

    /// Lateral Plantar Artery: 全部足趾 + 足底外侧中段 (L 形).
    Lpa,

    /// Lateral Calcaneal Artery: 足跟外侧.
    Lca,

    /// Medial Calcaneal Artery: 足跟内侧.
    Mca,
}

impl Angiosome {
    /// 四个血管区的固定遍历顺序.
    pub const ALL: [Angiosome; 4] = [Self::Mpa, Self::Lpa, Self::Lca, Self::Mca];

    /// 区域的标准缩写名.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mpa => "MPA",
            Self::Lpa => "LPA",
            Self::Lca => "LCA",
            Self::Mca => "MCA",
        }
    }

    /// `ALL` 中的下标.
    #[inline]
    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Mpa => 0,
            Self::Lpa => 1,
            Self::Lca => 2,
            Self::Mca => 3,
        }
    }
}

impl std::fmt::Display for Angiosome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 划分足部 bounding box 所用的四条分割线坐标.
/// 下游可视化用它绘制 overlay.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AngiosomeSplits {
    /// 足跟/前足水平分割行 (box 高度的 60% 处).
    pub vertical: usize,

    /// 内侧列分界 (box 宽度的 35% 处).
    pub medial: usize,

    /// 趾区下界行 (前足高度的 50% 处, 即 box 高度的前 30%).
    pub toe_limit: usize,

    /// 足跟内/外侧分割列 (box 宽度的 50% 处).
    pub heel: usize,
}

impl AngiosomeSplits {
    /// 从前景 bounding box 派生分割线.
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        // 固定比例均在 [0, 1) 区间, 换算结果必然落在 box 内.
        let frac = |len: usize, frac: f64| {
            (len as f64 * frac).to_usize().expect("分割线比例换算越界")
        };

        let vertical = bbox.top + frac(bbox.height(), VERTICAL_FRAC);
        let medial = bbox.left + frac(bbox.width(), MEDIAL_FRAC);
        let toe_limit = bbox.top + frac(vertical - bbox.top, TOE_FRAC);
        let heel = bbox.left + frac(bbox.width(), HEEL_FRAC);

        Self {
            vertical,
            medial,
            toe_limit,
            heel,
        }
    }

    /// 判定 box 内坐标 `(h, w)` 属于哪个血管区.
    ///
    /// 判定是单次分支, 因此四个区域按构造互不重叠且穷尽整个 box:
    /// 趾区条带归 LPA (全宽), MPA 只占趾区以下、分割行以上的内侧列.
    #[inline]
    pub fn classify(&self, (h, w): Idx2d) -> Angiosome {
        if h >= self.vertical {
            if w < self.heel {
                Angiosome::Lca
            } else {
                Angiosome::Mca
            }
        } else if h < self.toe_limit {
            Angiosome::Lpa
        } else if w < self.medial {
            Angiosome::Mpa
        } else {
            Angiosome::Lpa
        }
    }
}

/// 单个血管区的温度统计.
#[derive(Debug, Clone)]
pub struct RegionStat {
    /// 区域温度栅格: 几何 ∩ 掩膜内保留原值, 其余位置为 0.
    /// 分辨率与温度矩阵一致, 供下游可视化直接使用.
    pub values: Array2<f64>,

    /// 参与均值计算的严格正温度值个数.
    pub count: usize,

    mean: Option<f64>,
}

impl RegionStat {
    /// 区域内严格正温度值的算术平均.
    ///
    /// 区域为空 (几何 ∩ 掩膜内不存在正值) 时返回 `None`,
    /// 即显式的 "无数据" 标记, 与真实的 0 度读数不混淆.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        self.mean
    }

    /// 均值, 空区域以 0 代替.
    ///
    /// 历史接口以 0 作为空区域哨兵, 对称性分析沿用该算术约定.
    #[inline]
    pub fn mean_or_zero(&self) -> f64 {
        self.mean.unwrap_or(0.0)
    }
}

/// 一只脚的完整划分结果.
#[derive(Debug, Clone)]
pub struct AngiosomeCuts {
    /// 划分所用的前景 bounding box.
    pub bbox: BoundingBox,

    /// 四条分割线坐标.
    pub splits: AngiosomeSplits,

    regions: [RegionStat; 4],
}

impl AngiosomeCuts {
    /// 获取单个血管区的统计.
    #[inline]
    pub fn region(&self, angiosome: Angiosome) -> &RegionStat {
        &self.regions[angiosome.index()]
    }

    /// 以 [`Angiosome::ALL`] 顺序获取四个区域的均值 (空区域记 0).
    pub fn means_or_zero(&self) -> [f64; 4] {
        let mut ans = [0.0; 4];
        for (dst, region) in ans.iter_mut().zip(self.regions.iter()) {
            *dst = region.mean_or_zero();
        }
        ans
    }

    /// 迭代 `(区域, 统计)` 对.
    pub fn iter(&self) -> impl Iterator<Item = (Angiosome, &RegionStat)> {
        Angiosome::ALL.into_iter().zip(self.regions.iter())
    }
}

/// 对一只脚运行血管区划分.
///
/// `mask` 的分辨率与 `grid` 不一致时, 会先以最近邻插值重采样到
/// `grid` 的分辨率 (矩阵分辨率是权威的).
///
/// # 返回值
///
/// 掩膜不存在任何前景像素时返回 `None`, 调用方应将四个区域
/// 视为 "无数据". 其他情况下返回完整的划分结果.
pub fn cut(grid: &TempGrid, mask: &FootMask) -> Option<AngiosomeCuts> {
    let resized;
    let mask = if mask.shape() != grid.shape() {
        resized = mask.resize_nearest(grid.shape());
        &resized
    } else {
        mask
    };

    let bbox = mask.bounding_box()?;
    let splits = AngiosomeSplits::from_bbox(&bbox);

    let shape = grid.shape();
    let mut values: [Array2<f64>; 4] = std::array::from_fn(|_| Array2::zeros(shape));
    let mut sums = [0.0f64; 4];
    let mut counts = [0usize; 4];

    for h in bbox.top..=bbox.bottom {
        for w in bbox.left..=bbox.right {
            if !is_foreground(mask[(h, w)]) {
                continue;
            }
            let slot = splits.classify((h, w)).index();
            let value = grid[(h, w)];
            values[slot][(h, w)] = value;
            if value > 0.0 {
                sums[slot] += value;
                counts[slot] += 1;
            }
        }
    }

    let mut iter = values.into_iter().zip(sums).zip(counts);
    let regions: [RegionStat; 4] = std::array::from_fn(|_| {
        let ((values, sum), count) = iter.next().unwrap();
        RegionStat {
            values,
            count,
            mean: (count > 0).then(|| sum / count as f64),
        }
    });

    Some(AngiosomeCuts {
        bbox,
        splits,
        regions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::gray::MASK_FOREGROUND;

    /// 左半覆盖的掩膜 + 右上角一个前景像素将 box 撑满 100 x 100.
    fn half_mask_full_box() -> FootMask {
        let mut mask = FootMask::zeros((100, 100));
        for h in 0..100 {
            for w in 0..50 {
                mask[(h, w)] = MASK_FOREGROUND;
            }
        }
        mask[(0, 99)] = MASK_FOREGROUND;
        mask
    }

    fn half_grid() -> TempGrid {
        let mut data = Array2::<f64>::zeros((100, 100));
        for h in 0..100 {
            for w in 0..50 {
                data[(h, w)] = 30.0;
            }
        }
        TempGrid::from_array(data)
    }

    #[test]
    fn test_splits_at_fixed_fractions() {
        let cuts = cut(&half_grid(), &half_mask_full_box()).unwrap();
        let s = cuts.splits;
        assert_eq!(s.vertical, 60);
        assert_eq!(s.medial, 35);
        assert_eq!(s.toe_limit, 30);
        assert_eq!(s.heel, 50);
    }

    #[test]
    fn test_half_covered_box_exact_counts_and_means() {
        let cuts = cut(&half_grid(), &half_mask_full_box()).unwrap();

        // 覆盖半区内的区域: 均值 30.0, 像素数可由固定比例手算.
        let mpa = cuts.region(Angiosome::Mpa);
        assert_eq!(mpa.count, 30 * 35); // 行 [30, 60) x 列 [0, 35)
        assert_eq!(mpa.mean(), Some(30.0));

        let lpa = cuts.region(Angiosome::Lpa);
        // 趾区 30 x 50 + 外侧中段 30 x (50 - 35)
        assert_eq!(lpa.count, 30 * 50 + 30 * 15);
        assert_eq!(lpa.mean(), Some(30.0));

        let lca = cuts.region(Angiosome::Lca);
        assert_eq!(lca.count, 40 * 50); // 行 [60, 100) x 列 [0, 50)
        assert_eq!(lca.mean(), Some(30.0));

        // 完全落在未覆盖半区的区域: 无数据, 哨兵为 0.
        let mca = cuts.region(Angiosome::Mca);
        assert_eq!(mca.count, 0);
        assert_eq!(mca.mean(), None);
        assert_eq!(mca.mean_or_zero(), 0.0);
    }

    #[test]
    fn test_regions_tile_the_box_disjointly() {
        // 不规则前景块, 全部正温度.
        let mut mask = FootMask::zeros((40, 30));
        for h in 3..37 {
            for w in 5..25 {
                if (h + w) % 7 != 0 {
                    mask[(h, w)] = MASK_FOREGROUND;
                }
            }
        }
        let grid = TempGrid::from_array(Array2::from_elem((40, 30), 25.0));
        let cuts = cut(&grid, &mask).unwrap();

        // 穷尽性: 四个区域的样本数之和等于前景像素总数.
        let total: usize = Angiosome::ALL.iter().map(|a| cuts.region(*a).count).sum();
        assert_eq!(total, mask.foreground_count());

        // 互斥性: 任何位置至多被一个区域的栅格记录.
        for h in 0..40 {
            for w in 0..30 {
                let hits = Angiosome::ALL
                    .iter()
                    .filter(|a| cuts.region(**a).values[(h, w)] != 0.0)
                    .count();
                assert!(hits <= 1);
            }
        }
    }

    #[test]
    fn test_mask_resized_to_grid_resolution() {
        // 掩膜 50 x 50, 矩阵 100 x 100: 矩阵分辨率是权威的.
        let mut mask = FootMask::zeros((50, 50));
        for h in 10..40 {
            for w in 10..40 {
                mask[(h, w)] = MASK_FOREGROUND;
            }
        }
        let grid = TempGrid::from_array(Array2::from_elem((100, 100), 28.0));
        let cuts = cut(&grid, &mask).unwrap();
        assert_eq!(cuts.region(Angiosome::Mpa).values.shape(), &[100, 100]);
        assert!(cuts.region(Angiosome::Lpa).count > 0);
    }

    #[test]
    fn test_empty_mask_yields_none() {
        let grid = TempGrid::from_array(Array2::from_elem((10, 10), 30.0));
        assert!(cut(&grid, &FootMask::zeros((10, 10))).is_none());
    }

    #[test]
    fn test_non_positive_values_excluded_from_mean() {
        let mut mask = FootMask::zeros((10, 10));
        for h in 0..10 {
            for w in 0..10 {
                mask[(h, w)] = MASK_FOREGROUND;
            }
        }
        let mut data = Array2::<f64>::from_elem((10, 10), 31.0);
        data[(0, 0)] = 0.0;
        data[(0, 1)] = -5.0;
        let cuts = cut(&TempGrid::from_array(data), &mask).unwrap();
        // (0, 0) 和 (0, 1) 在趾区 (LPA), 不参与均值.
        // LPA = 趾区 3 x 10 + 外侧中段 3 x 7, 再扣掉两个非正值.
        let lpa = cuts.region(Angiosome::Lpa);
        assert_eq!(lpa.mean(), Some(31.0));
        assert_eq!(lpa.count, 3 * 10 + 3 * 7 - 2);
    }
}
