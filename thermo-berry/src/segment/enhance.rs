//! 局部对比度增强 (CLAHE).
//!
//! 热成像照片常存在不均匀加热/光照, 直接做全局阈值会丢失局部细节.
//! 这里实现限制对比度的自适应直方图均衡:
//! 将图像划分为 tile 网格, 每个 tile 独立做裁剪直方图均衡,
//! 像素值按所在位置对相邻 tile 的映射表做双线性插值, 以消除块效应.

use ndarray::{Array2, ArrayView2};

/// tile 直方图的裁剪与均衡映射表.
fn tile_lut(hist: &[usize; 256], area: usize, clip_limit: f64) -> [u8; 256] {
    // OpenCV 惯例: 裁剪上限按 tile 面积等比缩放, 且至少为 1.
    let clip = ((clip_limit * area as f64 / 256.0) as usize).max(1);

    let mut clipped = [0usize; 256];
    let mut excess = 0usize;
    for (dst, &cnt) in clipped.iter_mut().zip(hist.iter()) {
        if cnt > clip {
            excess += cnt - clip;
            *dst = clip;
        } else {
            *dst = cnt;
        }
    }

    // 裁剪掉的计数平均回灌到所有 bin.
    let bonus = excess / 256;
    for cnt in clipped.iter_mut() {
        *cnt += bonus;
    }

    let mut lut = [0u8; 256];
    let scale = 255.0 / area as f64;
    let mut cumsum = 0usize;
    for (dst, &cnt) in lut.iter_mut().zip(clipped.iter()) {
        cumsum += cnt;
        *dst = (cumsum as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// tile 在某一轴上的均衡划分: 返回每个 tile 的 (起点, 长度).
fn tile_spans(len: usize, tiles: usize) -> Vec<(usize, usize)> {
    (0..tiles)
        .map(|i| {
            let start = i * len / tiles;
            let end = (i + 1) * len / tiles;
            (start, end - start)
        })
        .collect()
}

/// 在 tile 中心序列上定位插值区间.
///
/// 返回 (左 tile 索引, 右 tile 索引, 右侧权重). 图像边缘处退化为最近 tile.
fn locate(centers: &[f64], pos: f64) -> (usize, usize, f64) {
    if pos <= centers[0] {
        return (0, 0, 0.0);
    }
    let last = centers.len() - 1;
    if pos >= centers[last] {
        return (last, last, 0.0);
    }
    let right = centers.partition_point(|c| *c <= pos);
    let left = right - 1;
    let t = (pos - centers[left]) / (centers[right] - centers[left]);
    (left, right, t)
}

/// 对单通道图像应用 CLAHE.
///
/// `clip_limit` 为对比度裁剪上限 (相对值, OpenCV 惯例),
/// `tiles` 为网格边长 (即划分为 `tiles * tiles` 个 tile).
///
/// # 注意
///
/// 当图像某一边小于 `tiles` 时, tile 划分会退化, 但算法仍然可用.
pub fn clahe(gray: &ArrayView2<u8>, clip_limit: f64, tiles: usize) -> Array2<u8> {
    assert!(tiles >= 1, "tile 网格至少为 1 x 1");
    let &[h, w] = gray.shape() else { unreachable!() };
    assert!(h > 0 && w > 0, "不允许空图像");

    let tiles_h = tiles.min(h);
    let tiles_w = tiles.min(w);
    let spans_h = tile_spans(h, tiles_h);
    let spans_w = tile_spans(w, tiles_w);

    // 每个 tile 的映射表.
    let mut luts: Vec<[u8; 256]> = Vec::with_capacity(tiles_h * tiles_w);
    for &(y0, th) in spans_h.iter() {
        for &(x0, tw) in spans_w.iter() {
            let mut hist = [0usize; 256];
            for y in y0..y0 + th {
                for x in x0..x0 + tw {
                    hist[gray[(y, x)] as usize] += 1;
                }
            }
            luts.push(tile_lut(&hist, th * tw, clip_limit));
        }
    }

    let centers_h: Vec<f64> = spans_h
        .iter()
        .map(|&(s, l)| s as f64 + l as f64 / 2.0)
        .collect();
    let centers_w: Vec<f64> = spans_w
        .iter()
        .map(|&(s, l)| s as f64 + l as f64 / 2.0)
        .collect();

    let mut out = Array2::<u8>::zeros((h, w));
    for ((y, x), dst) in out.indexed_iter_mut() {
        let v = gray[(y, x)] as usize;
        let (ty0, ty1, fy) = locate(&centers_h, y as f64);
        let (tx0, tx1, fx) = locate(&centers_w, x as f64);

        let at = |ti: usize, tj: usize| luts[ti * tiles_w + tj][v] as f64;
        let top = at(ty0, tx0) * (1.0 - fx) + at(ty0, tx1) * fx;
        let bottom = at(ty1, tx0) * (1.0 - fx) + at(ty1, tx1) * fx;
        *dst = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clahe_uniform_image_stays_uniform() {
        let img = Array2::<u8>::from_elem((64, 64), 100);
        let out = clahe(&img.view(), 3.0, 8);
        let first = out[(0, 0)];
        assert!(out.iter().all(|p| *p == first));
    }

    #[test]
    fn test_clahe_single_tile_is_monotone() {
        // 单 tile 时退化为裁剪直方图均衡, 映射必须单调不减.
        let mut img = Array2::<u8>::zeros((16, 16));
        for ((y, x), p) in img.indexed_iter_mut() {
            *p = (y * 16 + x) as u8;
        }
        let out = clahe(&img.view(), 3.0, 1);
        let flat_in: Vec<u8> = img.iter().copied().collect();
        let flat_out: Vec<u8> = out.iter().copied().collect();
        for pair in flat_in.windows(2).zip(flat_out.windows(2)) {
            let (i, o) = pair;
            if i[1] > i[0] {
                assert!(o[1] >= o[0]);
            }
        }
    }

    #[test]
    fn test_clahe_spreads_low_contrast_ramp() {
        // 窄动态范围的渐变经过均衡后, 动态范围应该被拉开.
        let mut img = Array2::<u8>::zeros((32, 32));
        for ((y, _), p) in img.indexed_iter_mut() {
            *p = 100 + (y / 4) as u8; // [100, 107]
        }
        let out = clahe(&img.view(), 4.0, 2);
        let lo = out.iter().min().unwrap();
        let hi = out.iter().max().unwrap();
        assert!(hi - lo > 7);
    }
}
