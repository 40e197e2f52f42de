//! 图像的持久化存储.

use super::{FootMask, ThermalImage};
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
///
/// `ImgWriteRaw` trait 的意图是, 图像将按原样保存. 对于掩膜这类
/// 0/255 二值图像, 原样保存本身就是可视化友好的.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 按 0/255 单通道格式存储.
impl ImgWriteRaw for FootMask {
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &pix) in self.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
        }
        buf.save(path)
    }
}

/// 按原 RGB 内容存储.
impl ImgWriteRaw for ThermalImage {
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.as_rgb().save(path)
    }
}
