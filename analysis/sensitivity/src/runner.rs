//! 程序运行函数.

use crate::result::StudyResult;
use thermo_berry::batch;
use thermo_berry::prelude::*;
use utils::loader;

/// 报告输出文件名.
pub const REPORT_FILE: &str = "Sensitivity_Report.csv";

/// ROC 点列输出文件名.
pub const ROC_FILE: &str = "ROC_Curve.csv";

/// 实际运行.
pub fn run() -> StudyResult {
    let db_dir = loader::database_dir_from_env_or_home();
    assert!(db_dir.is_dir(), "Database dir not found: {db_dir:?}");

    let records = loader::records_from_env_or_home().expect("Scanning database error");
    assert!(!records.is_empty(), "Loading dataset config error");

    let controls = records.iter().filter(|r| r.label == LABEL_CONTROL).count();
    println!(
        "Found {controls} Controls and {} DM patients. Total: {} (workers: {})",
        records.len() - controls,
        records.len(),
        utils::cpus(),
    );

    println!("Running pipeline on all patients (this may take time)...");
    let rows = batch::run_batch(&records, &SegmentConfig::native());
    if rows.len() < records.len() {
        log::warn!("{} 条记录处理失败, 详见上方日志", records.len() - rows.len());
    }

    let file = std::fs::File::create(REPORT_FILE).expect("Report file error");
    batch::write_report(&rows, file).expect("Report writing error");
    println!("Saved results to {REPORT_FILE}");

    StudyResult::new(rows)
}
