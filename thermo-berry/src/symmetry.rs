//! 双侧温度对称性分析 (交通灯模型).
//!
//! 健康人双足温度高度对称; 单侧显著升温是糖尿病足溃疡的早期信号.
//! 本模块比较配准后的左右足各血管区均值, 按固定阈值给出逐区分级
//! 与病人级聚合状态. 所有函数都是四个温差的纯函数, 无隐藏状态.

use itertools::izip;
use ordered_float::NotNan;

use crate::angiosome::Angiosome;
use crate::consts::risk::{HIGH_RISK_DIFF, WARNING_DIFF};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个血管区的风险分级.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RegionRisk {
    /// 温差不超过 [`WARNING_DIFF`].
    Normal,

    /// 温差落在 ([`WARNING_DIFF`], [`HIGH_RISK_DIFF`]] 区间.
    Warning,

    /// 温差严格大于 [`HIGH_RISK_DIFF`].
    HighRisk,
}

impl RegionRisk {
    /// 由双侧温差绝对值分级. 分级随温差单调不降.
    pub fn from_diff(diff: f64) -> Self {
        debug_assert!(diff >= 0.0);
        if diff > HIGH_RISK_DIFF {
            Self::HighRisk
        } else if diff > WARNING_DIFF {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    /// 展示用标签.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Warning => "WARNING",
            Self::HighRisk => "HIGH RISK",
        }
    }

    /// 严重性等级 (0 最轻). 供展示层着色, 展示层不做任何算术.
    #[inline]
    pub fn severity(&self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Warning => 1,
            Self::HighRisk => 2,
        }
    }
}

/// 病人级聚合状态.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PatientStatus {
    /// 无显著双侧不对称.
    Normal,

    /// 存在警告区间的区域, 需随访监测.
    MonitoringRequired,

    /// 恰有一个高风险区域.
    LocalRisk,

    /// 两个及以上高风险区域.
    DiffuseRisk,
}

impl PatientStatus {
    /// 聚合决策表, 按优先级顺序判定:
    /// 高风险区域数 >= 2 -> 弥散风险; == 1 -> 局部风险;
    /// 否则存在警告区域 -> 需监测; 否则正常.
    pub fn from_risks(risks: &[RegionRisk; 4]) -> Self {
        let high = risks.iter().filter(|r| **r == RegionRisk::HighRisk).count();
        let warning = risks.iter().filter(|r| **r == RegionRisk::Warning).count();

        if high >= 2 {
            Self::DiffuseRisk
        } else if high == 1 {
            Self::LocalRisk
        } else if warning > 0 {
            Self::MonitoringRequired
        } else {
            Self::Normal
        }
    }

    /// 展示用标签.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::MonitoringRequired => "MONITORING REQUIRED",
            Self::LocalRisk => "LOCAL RISK",
            Self::DiffuseRisk => "DIFFUSE RISK",
        }
    }

    /// 严重性等级 (0 最轻). 供展示层着色.
    #[inline]
    pub fn severity(&self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::MonitoringRequired => 1,
            Self::LocalRisk => 2,
            Self::DiffuseRisk => 3,
        }
    }
}

/// 一名病人的完整对称性报告.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SymmetryReport {
    /// 以 [`Angiosome::ALL`] 顺序排列的逐区温差绝对值.
    pub diffs: [f64; 4],

    /// 以 [`Angiosome::ALL`] 顺序排列的逐区分级.
    pub risks: [RegionRisk; 4],

    /// 病人级聚合状态.
    pub status: PatientStatus,
}

impl SymmetryReport {
    /// 四个区域温差绝对值中的最大者. 作为病人级筛查评分.
    pub fn max_diff(&self) -> f64 {
        self.diffs
            .iter()
            .copied()
            .map(|d| NotNan::new(d).expect("温差不可能为 NaN"))
            .max()
            .map(NotNan::into_inner)
            .unwrap_or(0.0)
    }

    /// 获取单个区域的 (温差, 分级).
    #[inline]
    pub fn region(&self, angiosome: Angiosome) -> (f64, RegionRisk) {
        let i = angiosome.index();
        (self.diffs[i], self.risks[i])
    }
}

/// 对配准后的左右足逐区均值做对称性分析.
///
/// 温差取绝对值, 因此对参数顺序可交换; 空区域以 0 均值参与,
/// 这沿用了历史的 0 哨兵算术约定.
pub fn analyze(left_means: &[f64; 4], right_means: &[f64; 4]) -> SymmetryReport {
    let mut diffs = [0.0; 4];
    for (dst, l, r) in izip!(diffs.iter_mut(), left_means, right_means) {
        *dst = (l - r).abs();
    }
    let risks = diffs.map(RegionRisk::from_diff);
    let status = PatientStatus::from_risks(&risks);
    SymmetryReport {
        diffs,
        risks,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_is_commutative() {
        let l = [30.0, 28.5, 31.2, 26.0];
        let r = [27.1, 30.0, 31.2, 29.9];
        let a = analyze(&l, &r);
        let b = analyze(&r, &l);
        assert_eq!(a.diffs, b.diffs);
        assert_eq!(a.status, b.status);
    }

    #[test]
    fn test_region_risk_thresholds() {
        assert_eq!(RegionRisk::from_diff(0.0), RegionRisk::Normal);
        assert_eq!(RegionRisk::from_diff(1.8), RegionRisk::Normal);
        assert_eq!(RegionRisk::from_diff(1.81), RegionRisk::Warning);
        assert_eq!(RegionRisk::from_diff(2.6), RegionRisk::Warning);
        assert_eq!(RegionRisk::from_diff(2.61), RegionRisk::HighRisk);
    }

    #[test]
    fn test_region_risk_monotone_in_diff() {
        let mut last = RegionRisk::Normal;
        for step in 0..500 {
            let diff = step as f64 * 0.01;
            let risk = RegionRisk::from_diff(diff);
            assert!(risk >= last);
            last = risk;
        }
    }

    #[test]
    fn test_status_decision_table() {
        use RegionRisk::*;
        let table = [
            ([Normal, Normal, Normal, Normal], PatientStatus::Normal),
            (
                [Warning, Normal, Normal, Normal],
                PatientStatus::MonitoringRequired,
            ),
            ([HighRisk, Warning, Normal, Normal], PatientStatus::LocalRisk),
            (
                [HighRisk, HighRisk, Normal, Normal],
                PatientStatus::DiffuseRisk,
            ),
            (
                [HighRisk, HighRisk, HighRisk, HighRisk],
                PatientStatus::DiffuseRisk,
            ),
        ];
        for (risks, expected) in table {
            assert_eq!(PatientStatus::from_risks(&risks), expected);
        }
    }

    #[test]
    fn test_status_escalates_with_more_high_risk() {
        use RegionRisk::*;
        // 高风险区域逐个增加, 聚合状态只能升级不能降级.
        let mut risks = [Warning, Warning, Warning, Warning];
        let mut last = PatientStatus::from_risks(&risks);
        for i in 0..4 {
            risks[i] = HighRisk;
            let now = PatientStatus::from_risks(&risks);
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, PatientStatus::DiffuseRisk);
    }

    #[test]
    fn test_max_diff_and_labels() {
        let report = analyze(&[30.0, 30.0, 30.0, 30.0], &[30.0, 27.0, 29.0, 30.0]);
        assert_eq!(report.max_diff(), 3.0);
        assert_eq!(report.status, PatientStatus::LocalRisk);
        assert_eq!(report.status.label(), "LOCAL RISK");
        let (diff, risk) = report.region(crate::angiosome::Angiosome::Lpa);
        assert_eq!(diff, 3.0);
        assert_eq!(risk.label(), "HIGH RISK");
    }

    #[test]
    fn test_all_empty_regions_are_normal() {
        // 全零哨兵 (如分割退化) 时: 温差 0, 状态正常.
        let report = analyze(&[0.0; 4], &[0.0; 4]);
        assert_eq!(report.max_diff(), 0.0);
        assert_eq!(report.status, PatientStatus::Normal);
    }
}
