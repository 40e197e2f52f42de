//! 队列批处理.
//!
//! 病人之间不共享任何可变状态, 批处理是平凡并行的:
//! 打开 `rayon` feature 时逐病人并行, 否则顺序执行.
//! 单个病人的失败被捕获、连同病人标识记录日志并从聚合中剔除,
//! 批处理总是运行到底. 聚合只在所有病人评分算完后做一次 fan-in,
//! 不是增量更新的共享累加器.

use std::io::Write;

use crate::dataset::PatientRecord;
use crate::pipeline::analyze_pair;
use crate::segment::SegmentConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 单名病人的批处理聚合结果. 写入报告后不可变.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchRow {
    /// 病人标识.
    pub patient_id: String,

    /// 组名 ("Control" 或 "DM").
    pub group: String,

    /// 二分类真值标签.
    pub label: u8,

    /// 四区温差绝对值的最大者, 即病人级筛查评分.
    pub max_diff: f64,
}

/// 标签对应的组名.
#[inline]
pub fn group_name(label: u8) -> &'static str {
    if label == crate::consts::LABEL_CONTROL {
        "Control"
    } else {
        "DM"
    }
}

/// 处理单条病人记录. 失败时记录日志并返回 `None`.
fn process_record(record: &PatientRecord, config: &SegmentConfig) -> Option<BatchRow> {
    match analyze_pair(
        &record.left_image,
        &record.left_grid,
        &record.right_image,
        &record.right_grid,
        config,
    ) {
        Ok(pair) => Some(BatchRow {
            patient_id: record.id.clone(),
            group: group_name(record.label).to_owned(),
            label: record.label,
            max_diff: pair.report.max_diff(),
        }),
        Err(e) => {
            log::warn!("病人 {} 处理失败, 已从聚合中剔除: {e:?}", record.id);
            None
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        /// 对整个队列运行流水线, 收集每名病人的聚合结果.
        ///
        /// 失败的记录被剔除, 返回值只包含成功处理的病人;
        /// 记录之间互相独立, 因此借助 `rayon` 并行处理,
        /// 且结果与执行顺序无关.
        pub fn run_batch(records: &[PatientRecord], config: &SegmentConfig) -> Vec<BatchRow> {
            records
                .par_iter()
                .filter_map(|r| process_record(r, config))
                .collect()
        }
    } else {
        /// 对整个队列运行流水线, 收集每名病人的聚合结果.
        ///
        /// 失败的记录被剔除, 返回值只包含成功处理的病人.
        pub fn run_batch(records: &[PatientRecord], config: &SegmentConfig) -> Vec<BatchRow> {
            records
                .iter()
                .filter_map(|r| process_record(r, config))
                .collect()
        }
    }
}

/// 提取敏感性分析所需的 `(标签, 评分)` 序列.
pub fn samples(rows: &[BatchRow]) -> Vec<(u8, f64)> {
    rows.iter().map(|r| (r.label, r.max_diff)).collect()
}

/// 将批处理结果写成分隔文本报告.
///
/// 列依次为 `Patient_ID, Group, True_Label, Max_Temp_Diff`.
pub fn write_report<W: Write>(rows: &[BatchRow], w: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(w);
    writer.write_record(["Patient_ID", "Group", "True_Label", "Max_Temp_Diff"])?;
    for row in rows {
        let label = row.label.to_string();
        let max_diff = format!("{:.6}", row.max_diff);
        writer.write_record([
            row.patient_id.as_str(),
            row.group.as_str(),
            label.as_str(),
            max_diff.as_str(),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)
}
