//! 🦶欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::data::{BoundingBox, FootMask, GridError, ImgWriteRaw, TempGrid, ThermalImage};

pub use crate::angiosome::{Angiosome, AngiosomeCuts, AngiosomeSplits, RegionStat};
pub use crate::register::FootSide;
pub use crate::segment::{segment, SegmentConfig, Segmentation};
pub use crate::symmetry::{PatientStatus, RegionRisk, SymmetryReport};

pub use crate::pipeline::{analyze_foot, analyze_pair, FootAnalysis, PairAnalysis};
pub use crate::sensitivity::{roc_curve, threshold_summaries, ConfusionCounts, RocCurve};

pub use crate::consts::gray::{MASK_BACKGROUND, MASK_FOREGROUND};
pub use crate::consts::{LABEL_CONTROL, LABEL_DM};

pub use crate::dataset::{self, home_database_dir_with, PatientRecord};
