//! 单元测试用图片夹具。

use std::io::Cursor;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};

const MODULE_PX: u32 = 6;
const QUIET_ZONE_MODULES: u32 = 4;

/// 渲染一个带静区的 QR 码灰度图。
pub(crate) fn qr_luma(text: &str) -> GrayImage {
    let code = QrCode::new(text.as_bytes()).expect("qr encode failed");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + QUIET_ZONE_MODULES * 2) * MODULE_PX;

    GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / MODULE_PX) as i64 - QUIET_ZONE_MODULES as i64;
        let my = (y / MODULE_PX) as i64 - QUIET_ZONE_MODULES as i64;
        let inside = mx >= 0 && my >= 0 && mx < modules as i64 && my < modules as i64;

        if inside && colors[(my as u32 * modules + mx as u32) as usize] == Color::Dark {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// 左右拼接两张图，中间留白。
pub(crate) fn side_by_side(left: &GrayImage, right: &GrayImage) -> GrayImage {
    let gap = MODULE_PX * QUIET_ZONE_MODULES;
    let width = left.width() + gap + right.width();
    let height = left.height().max(right.height());
    let mut canvas = GrayImage::from_pixel(width, height, Luma([255]));

    image::imageops::replace(&mut canvas, left, 0, 0);
    image::imageops::replace(&mut canvas, right, (left.width() + gap) as i64, 0);
    canvas
}

/// 不含任何码的渐变图。
pub(crate) fn blank_luma(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| Luma([((x * 3 + y * 5) % 200 + 30) as u8]))
}

pub(crate) fn png_bytes(img: &GrayImage) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    cursor.into_inner()
}

pub(crate) fn unique_temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock error")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("barscan-{tag}-test-{nanos}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
