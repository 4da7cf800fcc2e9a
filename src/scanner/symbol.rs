//! # 识别引擎模块
//!
//! ## 设计思路
//!
//! 像素级识别（二值化、定位图案搜索、纠错解码）不属于调度层职责，
//! 通过 `SymbolDecoder` 能力注入。调度器只关心“给我第一个”或“给我全部”。
//!
//! “没有码”用空结果表示，而不是错误；严格模式下的 `Undecodable` 由调度器决定。

use super::source::{DecodedSymbol, PixelBuffer, SymbolFormat};

/// 码识别能力。实现必须可重入。
pub trait SymbolDecoder: Send + Sync {
    /// 返回图中全部可识别的码，按引擎发现顺序排列。
    fn decode_all(&self, pixels: &PixelBuffer) -> Vec<DecodedSymbol>;

    /// 返回第一个可识别的码。
    ///
    /// 默认实现基于 `decode_all`；能提前停止扫描的引擎应覆盖它。
    fn decode_first(&self, pixels: &PixelBuffer) -> Option<DecodedSymbol> {
        self.decode_all(pixels).into_iter().next()
    }
}

/// 基于 rqrr 的 QR 码识别引擎。
#[derive(Debug, Default, Clone, Copy)]
pub struct QrSymbolDecoder;

impl QrSymbolDecoder {
    /// 检测所有网格并按检测顺序解码，`limit` 个成功后停止。
    fn decode_grids(pixels: &PixelBuffer, limit: Option<usize>) -> Vec<DecodedSymbol> {
        let width = pixels.width() as usize;
        let height = pixels.height() as usize;
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let luma = pixels.luma();
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);
        let grids = prepared.detect_grids();
        log::debug!("🔍 检测到 {} 个候选网格", grids.len());

        let mut symbols = Vec::new();
        for (idx, grid) in grids.iter().enumerate() {
            match grid.decode() {
                Ok((_meta, content)) => {
                    symbols.push(DecodedSymbol::new(SymbolFormat::QrCode, content));
                    if limit.is_some_and(|max| symbols.len() >= max) {
                        break;
                    }
                }
                Err(err) => log::debug!("⚠️ 第 {} 个网格解码失败：{:?}", idx, err),
            }
        }

        symbols
    }
}

impl SymbolDecoder for QrSymbolDecoder {
    fn decode_all(&self, pixels: &PixelBuffer) -> Vec<DecodedSymbol> {
        Self::decode_grids(pixels, None)
    }

    fn decode_first(&self, pixels: &PixelBuffer) -> Option<DecodedSymbol> {
        Self::decode_grids(pixels, Some(1)).into_iter().next()
    }
}
