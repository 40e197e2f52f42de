//! 实验结果.

use std::io::{self, Write};

use thermo_berry::batch::{self, BatchRow};
use thermo_berry::consts::risk::CANDIDATE_THRESHOLDS;
use thermo_berry::prelude::*;

/// 将单个阈值下的混淆矩阵指标写进 `w` 中.
fn describe_into<W: Write>(threshold: f64, counts: &ConfusionCounts, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Threshold > {threshold}°C:")?;
    writeln!(w, "{S4}Sensitivity: {:.4}", counts.sensitivity())?;
    writeln!(w, "{S4}Specificity: {:.4}", counts.specificity())?;
    write!(w, "{S4}F1-Score:    {:.4}", counts.f1())?;
    Ok(())
}

/// 将 ROC 点列写成分隔文本.
fn write_roc_points<W: Write>(curve: &RocCurve, w: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(w);
    writer.write_record(["FPR", "TPR"])?;
    for &(fpr, tpr) in curve.points() {
        writer.write_record([format!("{fpr:.6}"), format!("{tpr:.6}")])?;
    }
    writer.flush().map_err(csv::Error::from)
}

/// 敏感性研究最终结果.
pub struct StudyResult {
    rows: Vec<BatchRow>,
}

impl StudyResult {
    pub fn new(rows: Vec<BatchRow>) -> Self {
        Self { rows }
    }

    /// 分析运行结果: ROC / AUC 与固定阈值指标.
    pub fn analyze(&self) {
        utils::sep();
        if self.rows.is_empty() {
            println!("No data found to analyze.");
            return;
        }

        let samples = batch::samples(&self.rows);
        let curve = roc_curve(&samples);
        println!("ROC AUC: {:.4} ({} patients)", curve.auc(), samples.len());

        match std::fs::File::create(crate::runner::ROC_FILE) {
            Ok(file) => match write_roc_points(&curve, file) {
                Ok(()) => println!("Saved ROC points to {}", crate::runner::ROC_FILE),
                Err(e) => log::warn!("ROC 点列保存失败: {e}"),
            },
            Err(e) => log::warn!("ROC 输出文件创建失败: {e}"),
        }
        utils::sep();

        let mut buf = Vec::with_capacity(512);
        for (threshold, counts) in threshold_summaries(&samples, &CANDIDATE_THRESHOLDS) {
            describe_into(threshold, &counts, &mut buf).unwrap();
            println!("{}", std::str::from_utf8(&buf).unwrap());
            buf.clear();

            utils::sep();
        }
    }
}
