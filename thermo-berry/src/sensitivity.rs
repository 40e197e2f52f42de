//! 队列级敏感性分析.
//!
//! 输入为 `(二分类标签, 评分)` 序列, 评分取病人四区温差绝对值的最大者.
//! ROC / AUC 与混淆矩阵指标全部手工实现, 不依赖现成统计库.
//! 所有分母为零的比值都以 0 哨兵解析, 不会产生未定义值.

use ordered_float::NotNan;

/// 由 `(假阳性率, 真阳性率)` 点列构成的 ROC 曲线.
///
/// 点列以原点 `(0, 0)` 开始; 当队列同时包含两类标签时,
/// 终点必为 `(1, 1)`.
#[derive(Debug, Clone)]
pub struct RocCurve {
    points: Vec<(f64, f64)>,
}

impl RocCurve {
    /// 曲线上的有序点列.
    #[inline]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// 以梯形法计算曲线下面积.
    ///
    /// 积分前按 FPR 升序排序. 返回值总在 `[0, 1]` 区间内;
    /// 队列只含单一类别时各比率均为 0, 因此 AUC 也为 0.
    pub fn auc(&self) -> f64 {
        let mut points = self.points.clone();
        points.sort_by_key(|&(fpr, _)| NotNan::new(fpr).expect("比率不可能为 NaN"));

        points
            .windows(2)
            .map(|wnd| {
                let &[(x0, y0), (x1, y1)] = wnd else {
                    unreachable!()
                };
                (x1 - x0) * (y1 + y0) / 2.0
            })
            .sum()
    }
}

/// 分母为零时返回 0 哨兵的比值.
#[inline]
fn ratio_or_zero(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// 从 `(标签, 评分)` 序列构建 ROC 曲线.
///
/// 标签非零视为阳性. 算法: 按评分降序排序, 在评分值发生变化处
/// 发射累计真/假阳性计数, 以阳/阴性总数归一化, 最后前置原点.
///
/// # 注意
///
/// 评分不允许为 NaN, 否则程序 panic.
pub fn roc_curve(samples: &[(u8, f64)]) -> RocCurve {
    let mut order: Vec<usize> = (0..samples.len()).collect();
    order.sort_by_key(|&i| {
        std::cmp::Reverse(NotNan::new(samples[i].1).expect("评分不可能为 NaN"))
    });

    let mut tps: Vec<usize> = Vec::with_capacity(samples.len() + 1);
    let mut fps: Vec<usize> = Vec::with_capacity(samples.len() + 1);
    tps.push(0);
    fps.push(0);

    let mut tp = 0usize;
    let mut fp = 0usize;
    for (k, &i) in order.iter().enumerate() {
        if samples[i].0 != 0 {
            tp += 1;
        } else {
            fp += 1;
        }
        let emit = match order.get(k + 1) {
            None => true,
            Some(&next) => samples[next].1 != samples[i].1,
        };
        if emit {
            tps.push(tp);
            fps.push(fp);
        }
    }

    let (total_pos, total_neg) = (tp, fp);
    let points = fps
        .into_iter()
        .zip(tps)
        .map(|(f, t)| (ratio_or_zero(f, total_neg), ratio_or_zero(t, total_pos)))
        .collect();
    RocCurve { points }
}

/// 固定阈值下的混淆矩阵计数.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfusionCounts {
    /// 真阳性.
    pub true_positive: usize,
    /// 假阳性.
    pub false_positive: usize,
    /// 真阴性.
    pub true_negative: usize,
    /// 假阴性.
    pub false_negative: usize,
}

impl ConfusionCounts {
    /// 在固定阈值 `threshold` 下统计混淆矩阵:
    /// 评分 **严格大于** 阈值即判为阳性.
    pub fn at_threshold(samples: &[(u8, f64)], threshold: f64) -> Self {
        let mut counts = Self::default();
        for &(label, score) in samples {
            let predicted = score > threshold;
            let actual = label != 0;
            match (predicted, actual) {
                (true, true) => counts.true_positive += 1,
                (true, false) => counts.false_positive += 1,
                (false, false) => counts.true_negative += 1,
                (false, true) => counts.false_negative += 1,
            }
        }
        counts
    }

    /// 敏感度 `TP / (TP + FN)`. 分母为零时为 0.
    #[inline]
    pub fn sensitivity(&self) -> f64 {
        ratio_or_zero(self.true_positive, self.true_positive + self.false_negative)
    }

    /// 特异度 `TN / (TN + FP)`. 分母为零时为 0.
    #[inline]
    pub fn specificity(&self) -> f64 {
        ratio_or_zero(self.true_negative, self.true_negative + self.false_positive)
    }

    /// F1 值 `2TP / (2TP + FP + FN)`. 分母为零时为 0.
    #[inline]
    pub fn f1(&self) -> f64 {
        ratio_or_zero(
            2 * self.true_positive,
            2 * self.true_positive + self.false_positive + self.false_negative,
        )
    }
}

/// 对候选阈值列表逐一计算混淆矩阵.
pub fn threshold_summaries(
    samples: &[(u8, f64)],
    thresholds: &[f64],
) -> Vec<(f64, ConfusionCounts)> {
    thresholds
        .iter()
        .map(|&t| (t, ConfusionCounts::at_threshold(samples, t)))
        .collect()
}
