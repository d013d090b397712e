use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

use crate::error::{Error, Result, StoreError};

/// 解码后的三通道 8 位光栅帧，内存中按 RGB 顺序排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame(RgbImage);

impl RasterFrame {
    pub fn new(image: RgbImage) -> Self {
        Self(image)
    }

    /// 创建一张纯色帧
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self(RgbImage::from_pixel(width, height, image::Rgb(rgb)))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.0
    }

    pub fn into_image(self) -> RgbImage {
        self.0
    }

    /// 保存为 JPEG 文件
    pub fn save_jpeg(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        self.0
            .save_with_format(path, ImageFormat::Jpeg)
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))
    }
}

impl From<RgbImage> for RasterFrame {
    fn from(image: RgbImage) -> Self {
        Self(image)
    }
}

impl From<RgbaImage> for RasterFrame {
    fn from(image: RgbaImage) -> Self {
        Self(DynamicImage::ImageRgba8(image).to_rgb8())
    }
}

impl From<DynamicImage> for RasterFrame {
    fn from(image: DynamicImage) -> Self {
        Self(image.to_rgb8())
    }
}

/// 将图片字节解码为光栅帧，格式由内容自动识别
pub fn decode_image(bytes: &[u8]) -> Result<RasterFrame> {
    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::decode("图片尺寸为 0"));
    }
    Ok(image.into())
}

/// 读取并解码图片文件
pub fn read_image(path: impl AsRef<Path>) -> Result<RasterFrame> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::decode(format!("{}: {e}", path.display())))?;
    decode_image(&bytes)
}
