use std::ops::Index;
use std::path::Path;

use ndarray::{Array2, ArrayView2, Axis};

use crate::Idx2d;

/// 温度矩阵加载错误.
#[derive(Debug)]
pub enum GridError {
    /// 底层 I/O 或分隔文本读取错误.
    Csv(csv::Error),

    /// 某个单元格无法解析为温度值. 两个参数依次为行号与列号 (从 0 开始).
    Parse(usize, usize),

    /// 矩阵没有任何行或列. 温度矩阵的分辨率是权威分辨率, 因此该情况是致命的.
    Empty,

    /// 行宽不一致. 参数依次为期望列数、实际列数、行号.
    Ragged(usize, usize, usize),
}

impl From<csv::Error> for GridError {
    #[inline]
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// 一只脚的逐像素温度矩阵, 以摄氏度为单位.
///
/// 矩阵从测量文件 (无表头的分隔数值文本) 加载,
/// 其分辨率与照片分辨率无关且以矩阵为准; 加载后只读.
#[derive(Debug, Clone)]
pub struct TempGrid {
    data: Array2<f64>,
}

impl Index<Idx2d> for TempGrid {
    type Output = f64;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl TempGrid {
    /// 打开一份温度矩阵文件. `path` 为无表头分隔数值文本的本地路径.
    ///
    /// # 返回值
    ///
    /// - 文件不可读或不是合法分隔文本时, 返回 `Err(GridError::Csv)`;
    /// - 存在无法解析为浮点数的单元格时, 返回 `Err(GridError::Parse)`;
    /// - 行宽不一致时, 返回 `Err(GridError::Ragged)`;
    /// - 矩阵为空时, 返回 `Err(GridError::Empty)`;
    /// - 其他情况下成功, 返回 `Ok(Self)`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path.as_ref())?;

        let mut buf: Vec<f64> = Vec::with_capacity(64);
        let mut width = 0usize;
        let mut height = 0usize;

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            if row == 0 {
                width = record.len();
            } else if record.len() != width {
                return Err(GridError::Ragged(width, record.len(), row));
            }
            for (col, field) in record.iter().enumerate() {
                let value: f64 = field
                    .trim()
                    .parse()
                    .map_err(|_| GridError::Parse(row, col))?;
                buf.push(value);
            }
            height += 1;
        }

        if height == 0 || width == 0 {
            return Err(GridError::Empty);
        }

        // 形状在上面已逐行校验, 该操作不会生成 `Err`.
        let data = Array2::from_shape_vec((height, width), buf).unwrap();
        Ok(Self { data })
    }

    /// 从裸矩阵直接创建实体.
    ///
    /// 如果 `data` 没有任何行或列, 则程序 panic.
    pub fn from_array(data: Array2<f64>) -> Self {
        let &[h, w] = data.shape() else { unreachable!() };
        assert!(h > 0 && w > 0, "温度矩阵不允许为空");
        Self { data }
    }

    /// 矩阵的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 获取给定位置 (高, 宽) 的温度值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f64> {
        self.data.get(pos)
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// 水平镜像 (逐值精确反转, 无插值). 翻转两次按位复原.
    pub fn flip_horizontal(&self) -> Self {
        let mut view = self.data.view();
        view.invert_axis(Axis(1));
        Self {
            data: view.as_standard_layout().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_flip_horizontal_is_involution() {
        let g = TempGrid::from_array(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let twice = g.flip_horizontal().flip_horizontal();
        assert_eq!(g.data, twice.data);
    }

    #[test]
    fn test_flip_horizontal_reverses_columns() {
        let g = TempGrid::from_array(array![[1.0, 2.0, 3.0]]);
        let f = g.flip_horizontal();
        assert_eq!(f[(0, 0)], 3.0);
        assert_eq!(f[(0, 2)], 1.0);
    }

    #[test]
    #[should_panic]
    fn test_from_array_rejects_empty() {
        let _ = TempGrid::from_array(Array2::<f64>::zeros((0, 3)));
    }

    #[test]
    fn test_open_rejects_ragged_and_garbage() {
        let dir = std::env::temp_dir();

        let ragged = dir.join("thermo_berry_ragged_grid.csv");
        std::fs::write(&ragged, "1.0,2.0\n3.0\n").unwrap();
        assert!(matches!(
            TempGrid::open(&ragged),
            Err(GridError::Ragged(2, 1, 1))
        ));

        let garbage = dir.join("thermo_berry_garbage_grid.csv");
        std::fs::write(&garbage, "1.0,oops\n").unwrap();
        assert!(matches!(
            TempGrid::open(&garbage),
            Err(GridError::Parse(0, 1))
        ));

        for p in [ragged, garbage] {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn test_open_parses_plain_grid() {
        let path = std::env::temp_dir().join("thermo_berry_plain_grid.csv");
        std::fs::write(&path, "30.5,31.0\n29.5,30.0\n").unwrap();
        let g = TempGrid::open(&path).unwrap();
        assert_eq!(g.shape(), (2, 2));
        assert_eq!(g[(0, 1)], 31.0);
        let _ = std::fs::remove_file(path);
    }
}
