//! 二值掩膜的形态学修复.
//!
//! 缺血区域在热成像上表现为局部低温 "dropout",
//! 阈值化后会在足底内部留下缝隙和空洞. 修复顺序:
//! 椭圆核闭运算弥合缝隙 -> 填充不接触图像边界的内部空洞 ->
//! 只保留最大连通域以丢弃背景噪声.

use std::collections::{HashSet, VecDeque};

use ndarray::Array2;
use once_cell::sync::Lazy;

use crate::consts::gray::*;
use crate::consts::segm::CLOSE_KERNEL_DIAMETER;
use crate::{Area2d, Areas2d, Idx2d, Predicate};

/// 椭圆结构元的偏移表. 只按直径构建一次.
static CLOSE_KERNEL: Lazy<Vec<(isize, isize)>> =
    Lazy::new(|| elliptical_offsets(CLOSE_KERNEL_DIAMETER));

/// 构建直径为 `diameter` 的椭圆 (圆盘) 结构元偏移表.
fn elliptical_offsets(diameter: usize) -> Vec<(isize, isize)> {
    assert!(diameter % 2 == 1, "结构元直径必须为奇数");
    let r = (diameter / 2) as isize;
    let r2 = (r * r) as f64 + 1.0;
    let mut offsets = Vec::with_capacity(diameter * diameter);
    for dy in -r..=r {
        for dx in -r..=r {
            if ((dy * dy + dx * dx) as f64) <= r2 {
                offsets.push((dy, dx));
            }
        }
    }
    offsets
}

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
#[inline]
fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}

#[inline]
fn shape_of(mask: &Array2<u8>) -> Idx2d {
    let &[h, w] = mask.shape() else { unreachable!() };
    (h, w)
}

#[inline]
fn check((h, w): Idx2d, (h_len, w_len): Idx2d) -> bool {
    h < h_len && w < w_len
}

/// 以结构元 `kernel` 做一次膨胀.
fn dilate(mask: &Array2<u8>, kernel: &[(isize, isize)]) -> Array2<u8> {
    let (h, w) = shape_of(mask);
    let mut out = Array2::from_elem((h, w), MASK_BACKGROUND);
    for ((y, x), &pix) in mask.indexed_iter() {
        if is_background(pix) {
            continue;
        }
        for &(dy, dx) in kernel {
            let ny = y as isize + dy;
            let nx = x as isize + dx;
            if ny >= 0 && nx >= 0 && (ny as usize) < h && (nx as usize) < w {
                out[(ny as usize, nx as usize)] = MASK_FOREGROUND;
            }
        }
    }
    out
}

/// 以结构元 `kernel` 做一次腐蚀. 越界位置视为背景.
fn erode(mask: &Array2<u8>, kernel: &[(isize, isize)]) -> Array2<u8> {
    let (h, w) = shape_of(mask);
    let mut out = Array2::from_elem((h, w), MASK_BACKGROUND);
    for ((y, x), &pix) in mask.indexed_iter() {
        if is_background(pix) {
            continue;
        }
        let keep = kernel.iter().all(|&(dy, dx)| {
            let ny = y as isize + dy;
            let nx = x as isize + dx;
            ny >= 0
                && nx >= 0
                && (ny as usize) < h
                && (nx as usize) < w
                && is_foreground(mask[(ny as usize, nx as usize)])
        });
        if keep {
            out[(y, x)] = MASK_FOREGROUND;
        }
    }
    out
}

/// 椭圆核闭运算: `iterations` 次膨胀后接 `iterations` 次腐蚀.
/// 用于弥合低温 dropout 产生的缝隙.
pub(crate) fn close(mask: &Array2<u8>, iterations: usize) -> Array2<u8> {
    let kernel = CLOSE_KERNEL.as_slice();
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = dilate(&out, kernel);
    }
    for _ in 0..iterations {
        out = erode(&out, kernel);
    }
    out
}

/// 填充被前景完全包围的内部空洞.
///
/// 从图像边界上的所有背景像素出发做 4-邻接 BFS,
/// 不可达的背景像素即为内部空洞, 统一改写为前景.
/// 内部低温点因此被视为足部组织.
pub(crate) fn fill_holes(mask: &Array2<u8>) -> Array2<u8> {
    let (h, w) = shape_of(mask);
    debug_assert_ne!(h * w, 0);
    let mut reachable = Array2::<bool>::from_elem((h, w), false);
    let mut q: VecDeque<Idx2d> = VecDeque::with_capacity(2 * (h + w));

    let mut push = |pos: Idx2d, reachable: &mut Array2<bool>, q: &mut VecDeque<Idx2d>| {
        if is_background(mask[pos]) && !reachable[pos] {
            reachable[pos] = true;
            q.push_back(pos);
        }
    };
    for y in 0..h {
        push((y, 0), &mut reachable, &mut q);
        push((y, w - 1), &mut reachable, &mut q);
    }
    for x in 0..w {
        push((0, x), &mut reachable, &mut q);
        push((h - 1, x), &mut reachable, &mut q);
    }

    while let Some(cur) = q.pop_front() {
        for pos in neighbour4(cur) {
            if check(pos, (h, w)) && is_background(mask[pos]) && !reachable[pos] {
                reachable[pos] = true;
                q.push_back(pos);
            }
        }
    }

    let mut out = mask.clone();
    for ((y, x), pix) in out.indexed_iter_mut() {
        if is_background(*pix) && !reachable[(y, x)] {
            *pix = MASK_FOREGROUND;
        }
    }
    out
}

/// 按照 8-相邻规则获取所有区域. 两个像素 `p1` 和 `p2` 属于同一个区域,
/// 当且仅当存在一条从 `p1` 到 `p2` 的 8-相邻路径, 且路径上的所有像素
/// (包括 `p1` 和 `p2`) 都满足谓词 `pred`.
fn areas(mask: &Array2<u8>, pred: Predicate) -> Areas2d {
    let sh = shape_of(mask);
    let mut ans = Areas2d::with_capacity(1);
    let mut bfs_q = VecDeque::with_capacity(4);
    let mut set = HashSet::with_capacity(16);

    for (pos, &pix) in mask.indexed_iter() {
        if set.contains(&pos) || !pred(pix) {
            continue;
        }
        bfs_q.push_back(pos);
        let mut this_area = Area2d::with_capacity(1);
        while let Some(cur_pos) = bfs_q.pop_front() {
            if set.contains(&cur_pos) {
                continue;
            }
            set.insert(cur_pos);
            this_area.push(cur_pos);

            for neigh in neighbour8(cur_pos) {
                if check(neigh, sh) && pred(mask[neigh]) && !set.contains(&neigh) {
                    bfs_q.push_back(neigh);
                }
            }
        }
        ans.push(this_area);
    }
    ans
}

/// 保留最大外轮廓连通域并实心化.
///
/// 提取所有 8-相邻前景连通域, 只保留面积最大的一个,
/// 并填充其内部空洞 (等价于以填充模式栅格化其外轮廓).
/// 断开的背景噪声/伪影由此被全部丢弃.
///
/// # 返回值
///
/// 当前景不存在任何连通域时返回 `None`,
/// 调用方应以全零掩膜作为退化结果继续传播.
pub(crate) fn largest_component(mask: &Array2<u8>) -> Option<Array2<u8>> {
    let largest = areas(mask, is_foreground)
        .into_iter()
        .max_by_key(|a| a.len())?;

    let mut out = Array2::from_elem(shape_of(mask), MASK_BACKGROUND);
    for pos in largest {
        out[pos] = MASK_FOREGROUND;
    }
    Some(fill_holes(&out))
}
