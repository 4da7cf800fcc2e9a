//! # 像素解码模块
//!
//! ## 设计思路
//!
//! “字节 → 灰度像素”被抽象为 `ImageLoader` 能力，识别引擎只消费 `PixelBuffer`。
//! 默认实现先读图片头做尺寸检查，再完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素 / 内存上限快速拒绝
//! 3. 完整解码
//! 4. 转换为 8 位灰度

use std::io::Cursor;

use image::{GenericImageView, ImageReader};

use super::source::{PixelBuffer, RawImageData};
use super::{LoadError, ScanConfig};

/// 图片容器解码能力。
pub trait ImageLoader: Send + Sync {
    /// 将原始字节解码为灰度像素。
    fn load(&self, raw: &RawImageData, config: &ScanConfig) -> Result<PixelBuffer, LoadError>;
}

/// 基于 `image` crate 的默认解码器（PNG / JPEG / GIF / BMP / WebP 等）。
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateLoader;

impl ImageLoader for ImageCrateLoader {
    fn load(&self, raw: &RawImageData, config: &ScanConfig) -> Result<PixelBuffer, LoadError> {
        image::guess_format(&raw.bytes)
            .map_err(|e| LoadError::InvalidFormat(format!("不支持的图片格式：{}", e)))?;

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| LoadError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        Self::validate_pixel_limits(config, width, height)?;

        let luma = decoded.to_luma8().into_raw();
        let buffer = PixelBuffer::from_luma(width, height, luma)?;

        log::debug!(
            "🖼️ 图片解码成功 - 来源: {} 尺寸: {}x{}",
            raw.source_hint,
            width,
            height
        );

        Ok(buffer)
    }
}

impl ImageCrateLoader {
    /// 仅通过图片头读取宽高。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), LoadError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| LoadError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
            .into_dimensions()
            .map_err(|e| LoadError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数与按 RGBA 估算的解码内存。
    fn validate_pixel_limits(config: &ScanConfig, width: u32, height: u32) -> Result<(), LoadError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| LoadError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(LoadError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        let estimated = pixels
            .checked_mul(4)
            .ok_or_else(|| LoadError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(LoadError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}
