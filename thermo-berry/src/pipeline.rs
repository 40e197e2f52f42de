//! 单人分析流水线.
//!
//! 每只脚严格顺序执行: 分割 -> 配准 (仅右足) -> 血管区划分;
//! 双足结果在最后汇入对称性分析. 各阶段消费上一阶段的完整输出,
//! 不存在部分/流式结果.
//!
//! 所有输入路径都是显式参数, 核心不内嵌任何环境相关的文件位置.

use std::path::Path;

use crate::angiosome::{self, AngiosomeCuts};
use crate::register::{register_grid, register_segmentation, FootSide};
use crate::segment::{segment, SegmentConfig, Segmentation};
use crate::symmetry::{self, SymmetryReport};
use crate::{GridError, TempGrid, ThermalImage};

/// 单人流水线错误.
#[derive(Debug)]
pub enum PipelineError {
    /// 照片无法打开或解码.
    Image(image::ImageError),

    /// 温度矩阵无法加载.
    Grid(GridError),
}

impl From<image::ImageError> for PipelineError {
    #[inline]
    fn from(value: image::ImageError) -> Self {
        Self::Image(value)
    }
}

impl From<GridError> for PipelineError {
    #[inline]
    fn from(value: GridError) -> Self {
        Self::Grid(value)
    }
}

/// 一只脚在规范坐标系下的完整分析结果.
#[derive(Debug, Clone)]
pub struct FootAnalysis {
    /// 配准后的分割结果 (遮罩照片 + 掩膜).
    pub segmentation: Segmentation,

    /// 配准后的温度矩阵.
    pub grid: TempGrid,

    /// 血管区划分. 分割退化为全零掩膜时为 `None`.
    pub cuts: Option<AngiosomeCuts>,
}

impl FootAnalysis {
    /// 以 [`crate::angiosome::Angiosome::ALL`] 顺序获取四区均值.
    /// 划分不存在 (无前景) 时退化为全零哨兵.
    pub fn means_or_zero(&self) -> [f64; 4] {
        match self.cuts.as_ref() {
            Some(cuts) => cuts.means_or_zero(),
            None => [0.0; 4],
        }
    }
}

/// 双足分析结果与对称性报告.
#[derive(Debug, Clone)]
pub struct PairAnalysis {
    /// 左足 (规范坐标系).
    pub left: FootAnalysis,

    /// 右足 (已镜像到规范坐标系).
    pub right: FootAnalysis,

    /// 双侧对称性报告.
    pub report: SymmetryReport,
}

/// 对一只脚运行完整流水线.
///
/// 掩膜在未翻转的原图上计算, 配准是纯后处理;
/// 温度矩阵独立加载并独立配准.
///
/// # 返回值
///
/// 照片或矩阵加载失败时返回 `Err`; 分割退化 (无前景)
/// **不是** 错误, 表现为 `cuts == None`.
pub fn analyze_foot(
    image_path: impl AsRef<Path>,
    grid_path: impl AsRef<Path>,
    side: FootSide,
    config: &SegmentConfig,
) -> Result<FootAnalysis, PipelineError> {
    let image = ThermalImage::open(image_path)?;
    let grid = TempGrid::open(grid_path)?;

    let segmentation = register_segmentation(segment(&image, config), side);
    let grid = register_grid(grid, side);
    let cuts = angiosome::cut(&grid, &segmentation.mask);

    Ok(FootAnalysis {
        segmentation,
        grid,
        cuts,
    })
}

/// 对一名病人的双足运行完整流水线并做对称性分析.
pub fn analyze_pair(
    left_image: impl AsRef<Path>,
    left_grid: impl AsRef<Path>,
    right_image: impl AsRef<Path>,
    right_grid: impl AsRef<Path>,
    config: &SegmentConfig,
) -> Result<PairAnalysis, PipelineError> {
    let left = analyze_foot(left_image, left_grid, FootSide::Left, config)?;
    let right = analyze_foot(right_image, right_grid, FootSide::Right, config)?;
    let report = symmetry::analyze(&left.means_or_zero(), &right.means_or_zero());

    Ok(PairAnalysis {
        left,
        right,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetry::PatientStatus;
    use std::path::PathBuf;

    /// 在临时目录下生成一组合成的单足输入 (亮足暗底照片 + 恒温矩阵).
    /// 照片取 256 x 256, 避免 CLAHE 在过小 tile 上退化.
    fn synth_foot(tag: &str, temp: f64) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir();
        let img_path = dir.join(format!("thermo_berry_pipe_{tag}.png"));
        let csv_path = dir.join(format!("thermo_berry_pipe_{tag}.csv"));

        let mut img = image::RgbImage::from_pixel(256, 256, image::Rgb([25, 25, 25]));
        for y in 64..192 {
            for x in 85..171 {
                img.put_pixel(x, y, image::Rgb([220, 220, 220]));
            }
        }
        img.save(&img_path).unwrap();

        let mut rows = Vec::with_capacity(48);
        for _ in 0..48 {
            let row: Vec<String> = (0..48).map(|_| format!("{temp:.1}")).collect();
            rows.push(row.join(","));
        }
        std::fs::write(&csv_path, rows.join("\n")).unwrap();
        (img_path, csv_path)
    }

    #[test]
    fn test_symmetric_pair_is_normal() {
        let (li, lg) = synth_foot("sym_l", 30.0);
        let (ri, rg) = synth_foot("sym_r", 30.0);
        let pair = analyze_pair(&li, &lg, &ri, &rg, &SegmentConfig::native()).unwrap();
        assert_eq!(pair.report.status, PatientStatus::Normal);
        assert_eq!(pair.report.max_diff(), 0.0);
        assert!(pair.left.cuts.is_some());
        assert!(pair.right.cuts.is_some());
    }

    #[test]
    fn test_asymmetric_pair_escalates() {
        let (li, lg) = synth_foot("asym_l", 33.0);
        let (ri, rg) = synth_foot("asym_r", 30.0);
        let pair = analyze_pair(&li, &lg, &ri, &rg, &SegmentConfig::native()).unwrap();
        // 四区温差全部为 3.0 度: 弥散风险.
        assert_eq!(pair.report.status, PatientStatus::DiffuseRisk);
        assert!((pair.report.max_diff() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_contrast_pair_degrades_to_normal() {
        // 无对比度照片分割不出前景: 四区均为 "无数据",
        // 温差哨兵 0, 状态正常 (0 哨兵与真实 0 度读数的歧义在此可见).
        let dir = std::env::temp_dir();
        let img_path = dir.join("thermo_berry_pipe_flat.png");
        image::RgbImage::from_pixel(256, 256, image::Rgb([128, 128, 128]))
            .save(&img_path)
            .unwrap();
        let (_, csv_path) = synth_foot("flat_grid", 30.0);

        let pair =
            analyze_pair(&img_path, &csv_path, &img_path, &csv_path, &SegmentConfig::native())
                .unwrap();
        assert!(pair.left.cuts.is_none());
        assert!(pair.right.cuts.is_none());
        assert_eq!(pair.left.means_or_zero(), [0.0; 4]);
        assert_eq!(pair.report.max_diff(), 0.0);
        assert_eq!(pair.report.status, PatientStatus::Normal);
    }

    #[test]
    fn test_undecodable_image_is_load_failure() {
        let dir = std::env::temp_dir();
        let bogus = dir.join("thermo_berry_pipe_bogus.png");
        std::fs::write(&bogus, b"not an image at all").unwrap();
        let (_, grid) = synth_foot("bogus_grid", 30.0);

        let err = analyze_foot(&bogus, &grid, FootSide::Left, &SegmentConfig::native());
        assert!(matches!(err, Err(PipelineError::Image(_))));
    }
}
