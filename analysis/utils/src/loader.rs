//! 对 `thermo-berry::dataset` 的更一层封装. 提供更直接的数据库扫描入口.

use std::env;
use std::path::PathBuf;

use thermo_berry::dataset::{self, PatientRecord};

/// 获取队列数据库基本路径.
///
/// 1. 若环境变量 `$THERMO_DB_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/ThermoDataBase`.
pub fn database_dir_from_env_or_home() -> PathBuf {
    if let Ok(d) = env::var("THERMO_DB_DIR") {
        PathBuf::from(d)
    } else {
        dataset::home_database_dir().unwrap()
    }
}

/// 从 `$THERMO_DB_DIR` 或者 `$HOME/ThermoDataBase` 扫描全部病人记录.
pub fn records_from_env_or_home() -> std::io::Result<Vec<PatientRecord>> {
    dataset::scan_database(database_dir_from_env_or_home())
}
