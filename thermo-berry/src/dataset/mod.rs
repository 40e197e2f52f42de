//! 数据集操作.
//!
//! 队列数据库按组目录组织: 每组目录下是病人子目录,
//! 每个病人目录必须同时包含左/右足照片 (`*_L.png` / `*_R.png`, 或 jpg)
//! 和左/右足温度矩阵 (`*_L.csv` / `*_R.csv`) 共四个文件.
//! 缺少任何一个文件的病人会被记录并跳过, 不参与批处理.

use std::path::{Path, PathBuf};

use crate::pipeline::{analyze_pair, PairAnalysis, PipelineError};
use crate::segment::SegmentConfig;
use crate::{consts, Idx2d};

/// 对照组的组目录名.
pub const CONTROL_GROUP_DIR: &str = "Control_Group";

/// 糖尿病组的组目录名.
pub const DM_GROUP_DIR: &str = "DM_Group";

/// 获取 `{用户主目录}/ThermoDataBase` 目录.
pub fn home_database_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("ThermoDataBase");
    Some(ans)
}

/// 获取 `{用户主目录}/ThermoDataBase` 目录下给定继续项组成的全路径.
pub fn home_database_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_database_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 一名病人的输入记录: 标识、分组标签与四个必需文件的路径.
#[derive(Debug, Clone)]
pub struct PatientRecord {
    /// 病人标识 (子目录名).
    pub id: String,

    /// 二分类标签: 0 = 对照组, 1 = 糖尿病组.
    pub label: u8,

    /// 左足照片路径.
    pub left_image: PathBuf,

    /// 左足温度矩阵路径.
    pub left_grid: PathBuf,

    /// 右足照片路径.
    pub right_image: PathBuf,

    /// 右足温度矩阵路径.
    pub right_grid: PathBuf,
}

/// 在病人目录的文件列表中查找以任一 `suffixes` 结尾的文件.
fn find_with_suffix(files: &[PathBuf], suffixes: &[&str]) -> Option<PathBuf> {
    files
        .iter()
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| suffixes.iter().any(|s| name.ends_with(s)))
        })
        .cloned()
}

/// 扫描一个组目录, 收集完整的病人记录.
///
/// # 注意
///
/// 1. `group_dir` 不存在时返回空列表 (允许只有一组数据的数据库).
/// 2. 四个文件不齐的病人会以 `log::warn!` 记录并跳过.
pub fn scan_group<P: AsRef<Path>>(group_dir: P, label: u8) -> std::io::Result<Vec<PatientRecord>> {
    let group_dir = group_dir.as_ref();
    if !group_dir.is_dir() {
        return Ok(vec![]);
    }

    let mut patients = Vec::with_capacity(16);
    let mut entries: Vec<PathBuf> = std::fs::read_dir(group_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    entries.sort();

    for patient_dir in entries {
        let id = patient_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_owned();

        let files: Vec<PathBuf> = std::fs::read_dir(&patient_dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();

        let left_image = find_with_suffix(&files, &["_L.png", "_L.jpg"]);
        let right_image = find_with_suffix(&files, &["_R.png", "_R.jpg"]);
        let left_grid = find_with_suffix(&files, &["_L.csv"]);
        let right_grid = find_with_suffix(&files, &["_R.csv"]);

        match (left_image, right_image, left_grid, right_grid) {
            (Some(left_image), Some(right_image), Some(left_grid), Some(right_grid)) => {
                patients.push(PatientRecord {
                    id,
                    label,
                    left_image,
                    left_grid,
                    right_image,
                    right_grid,
                });
            }
            _ => log::warn!("病人 {id} 的输入文件不齐全, 已跳过"),
        }
    }
    Ok(patients)
}

/// 扫描整个队列数据库 (对照组 + 糖尿病组).
///
/// `db_dir` 是显式参数; 常见默认值可由 [`home_database_dir`] 提供.
pub fn scan_database<P: AsRef<Path>>(db_dir: P) -> std::io::Result<Vec<PatientRecord>> {
    let db_dir = db_dir.as_ref();
    let mut ans = scan_group(db_dir.join(CONTROL_GROUP_DIR), consts::LABEL_CONTROL)?;
    ans.extend(scan_group(db_dir.join(DM_GROUP_DIR), consts::LABEL_DM)?);
    Ok(ans)
}

/// 从病人记录创建惰性的队列分析加载器.
///
/// 返回的加载器按记录顺序逐人运行完整流水线,
/// 并以 `(记录, 分析结果)` 形式迭代产出.
pub fn cohort_loader<I: IntoIterator<Item = PatientRecord>>(
    records: I,
    config: SegmentConfig,
) -> CohortLoader {
    let mut records: Vec<PatientRecord> = records.into_iter().collect();
    records.reverse();

    CohortLoader {
        records_rev: records,
        config,
    }
}

/// 队列分析加载器, 在迭代时惰性运行流水线.
#[derive(Debug)]
pub struct CohortLoader {
    records_rev: Vec<PatientRecord>,
    config: SegmentConfig,
}

impl Iterator for CohortLoader {
    type Item = (PatientRecord, Result<PairAnalysis, PipelineError>);

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records_rev.pop()?;
        let analysis = analyze_pair(
            &record.left_image,
            &record.left_grid,
            &record.right_image,
            &record.right_grid,
            &self.config,
        );
        Some((record, analysis))
    }
}

impl ExactSizeIterator for CohortLoader {
    #[inline]
    fn len(&self) -> usize {
        self.records_rev.len()
    }
}

/// 批预处理: 把一组病人的分割产物统一保存为 `{组名}_{病人}_{原文件名}`.
///
/// 分割配置通常指定固定 `target` 分辨率 ([`SegmentConfig::resized`]),
/// 以便后续训练/统计在同一分辨率下进行. 输出目录不存在时自动创建.
/// 单张照片失败只记录不中断.
pub fn prepare_segmented<P: AsRef<Path>>(
    records: &[PatientRecord],
    output_dir: P,
    target: Idx2d,
) -> std::io::Result<()> {
    use crate::data::ImgWriteRaw;
    use crate::segment::segment;
    use crate::ThermalImage;

    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)?;
    let config = SegmentConfig::resized(target);

    for record in records {
        let group = crate::batch::group_name(record.label);
        for src in [&record.left_image, &record.right_image] {
            let Some(name) = src.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match ThermalImage::open(src) {
                Ok(image) => {
                    let seg = segment(&image, &config);
                    let dst = output_dir.join(format!("{group}_{}_{name}", record.id));
                    if let Err(e) = seg.foot.save_raw(&dst) {
                        log::warn!("病人 {} 的分割产物保存失败: {e}", record.id);
                    }
                }
                Err(e) => log::warn!("病人 {} 的照片 {name} 无法解码: {e}", record.id),
            }
        }
    }
    Ok(())
}
