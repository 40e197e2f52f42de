//! 混合阈值: 全局 Otsu + 局部自适应, 取并集后做极性归一化.

use ndarray::{Array2, ArrayView2};

use crate::consts::gray::*;

/// 以 Otsu 法计算全局双峰分割阈值.
///
/// 遍历 256 个灰度 bin, 取类间方差最大的位置.
/// 对单一灰度的退化图像, 返回 0.
pub(crate) fn otsu_level(gray: &ArrayView2<u8>) -> u8 {
    let mut histogram = [0usize; 256];
    for &p in gray.iter() {
        histogram[p as usize] += 1;
    }
    let total = gray.len() as f64;
    let sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut sum_b = 0.0;
    let mut weight_b = 0.0;
    let mut max_variance = 0.0;
    let mut level = 0u8;

    for (i, &count) in histogram.iter().enumerate() {
        weight_b += count as f64;
        if weight_b == 0.0 {
            continue;
        }
        let weight_f = total - weight_b;
        if weight_f == 0.0 {
            break;
        }
        sum_b += i as f64 * count as f64;
        let mean_b = sum_b / weight_b;
        let mean_f = (sum - sum_b) / weight_f;
        let variance = weight_b * weight_f * (mean_b - mean_f) * (mean_b - mean_f);
        if variance > max_variance {
            max_variance = variance;
            level = i as u8;
        }
    }
    level
}

/// 全局二值化: 灰度严格大于 `level` 的像素为前景.
pub(crate) fn binarize_global(gray: &ArrayView2<u8>, level: u8) -> Array2<u8> {
    gray.mapv(|p| if p > level { MASK_FOREGROUND } else { MASK_BACKGROUND })
}

/// 局部自适应二值化.
///
/// 每个像素与其 `block * block` 邻域 (边界处窗口截断)
/// 的均值比较, 严格大于 `均值 - offset` 的像素为前景.
/// 该阈值能捕捉全局阈值漏掉的细微局部对比.
pub(crate) fn adaptive_mean_mask(gray: &ArrayView2<u8>, block: usize, offset: f64) -> Array2<u8> {
    assert!(block % 2 == 1, "邻域边长必须为奇数");
    let &[h, w] = gray.shape() else { unreachable!() };
    let r = block / 2;

    // 积分图, 比逐像素窗口求和快一个数量级.
    let mut integral = Array2::<i64>::zeros((h + 1, w + 1));
    for y in 0..h {
        let mut row_sum = 0i64;
        for x in 0..w {
            row_sum += gray[(y, x)] as i64;
            integral[(y + 1, x + 1)] = integral[(y, x + 1)] + row_sum;
        }
    }

    let mut out = Array2::<u8>::zeros((h, w));
    for ((y, x), dst) in out.indexed_iter_mut() {
        let y0 = y.saturating_sub(r);
        let x0 = x.saturating_sub(r);
        let y1 = (y + r + 1).min(h);
        let x1 = (x + r + 1).min(w);

        let sum = integral[(y1, x1)] - integral[(y0, x1)] - integral[(y1, x0)] + integral[(y0, x0)];
        let count = ((y1 - y0) * (x1 - x0)) as f64;
        let mean = sum as f64 / count;

        *dst = if gray[(y, x)] as f64 > mean - offset {
            MASK_FOREGROUND
        } else {
            MASK_BACKGROUND
        };
    }
    out
}

/// 两份二值估计的逻辑并集.
pub(crate) fn union(a: &Array2<u8>, b: &Array2<u8>) -> Array2<u8> {
    assert_eq!(a.shape(), b.shape());
    let mut out = a.clone();
    out.zip_mut_with(b, |x, y| *x |= *y);
    out
}

/// 极性归一化.
///
/// 编码约定是 "足部 = 亮": 当并集的平均亮度超过中间灰度
/// [`MID_GRAY`] 时, 认为当前掩膜把背景当成了前景, 整体取反.
///
/// # 注意
///
/// 当前景与背景都不占明显多数 (如杂乱背景) 时该启发式可能误判,
/// 这是已知的脆弱点.
pub(crate) fn normalize_polarity(mask: Array2<u8>) -> Array2<u8> {
    let mean = mask.iter().map(|p| *p as f64).sum::<f64>() / mask.len() as f64;
    if mean > MID_GRAY as f64 {
        mask.mapv(|p| MASK_FOREGROUND - p)
    } else {
        mask
    }
}
