use std::path::Path;

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array2;

use crate::Idx2d;

mod grid;
mod mask;
mod save;

pub use grid::{GridError, TempGrid};
pub use mask::{BoundingBox, FootMask};
pub use save::ImgWriteRaw;

/// 一张已解码的彩色热成像照片. 加载后只读.
///
/// 照片本身只参与前景分割与可视化;
/// 实际温度值由独立加载的 [`TempGrid`] 提供.
#[derive(Debug, Clone)]
pub struct ThermalImage {
    data: RgbImage,
}

impl ThermalImage {
    /// 打开一张热成像照片. `path` 为图像文件的本地路径.
    /// 如果打开或解码失败, 则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> image::ImageResult<Self> {
        let data = image::open(path.as_ref())?.into_rgb8();
        Ok(Self { data })
    }

    /// 从已有的 RGB 数据直接创建实体.
    #[inline]
    pub fn from_rgb(data: RgbImage) -> Self {
        Self { data }
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        (self.data.height() as usize, self.data.width() as usize)
    }

    /// 获得图像的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 获得图像的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 将图像重采样到 `(height, width)` 分辨率 (area 插值).
    /// 用于批预处理时统一分辨率.
    pub fn resized(&self, (height, width): Idx2d) -> Self {
        let data = image::imageops::resize(
            &self.data,
            width as u32,
            height as u32,
            FilterType::Triangle,
        );
        Self { data }
    }

    /// 转换为单通道灰度矩阵, 行优先存储.
    pub fn to_gray(&self) -> Array2<u8> {
        let (h, w) = self.shape();
        let gray = image::imageops::grayscale(&self.data);
        Array2::from_shape_vec((h, w), gray.into_raw()).unwrap()
    }

    /// 用 `mask` 遮罩原图: 背景像素全部置零, 前景像素原样保留.
    ///
    /// 如果 `mask` 与图像分辨率不一致, 则程序 panic.
    pub fn masked(&self, mask: &FootMask) -> Self {
        assert_eq!(self.shape(), mask.shape(), "掩膜与图像分辨率不一致");
        let mut data = self.data.clone();
        for ((h, w), &pix) in mask.indexed_iter() {
            if crate::consts::gray::is_background(pix) {
                data.put_pixel(w as u32, h as u32, image::Rgb([0, 0, 0]));
            }
        }
        Self { data }
    }

    /// 水平镜像 (逐像素精确反转, 无插值).
    pub fn flip_horizontal(&self) -> Self {
        Self {
            data: image::imageops::flip_horizontal(&self.data),
        }
    }

    /// 获得底层 RGB 数据的引用.
    #[inline]
    pub fn as_rgb(&self) -> &RgbImage {
        &self.data
    }
}
