//! 集成测试共享夹具：生成二维码图片、临时目录与一次性 HTTP 服务。
#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};

const MODULE_PX: u32 = 6;
const QUIET_ZONE_MODULES: u32 = 4;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn unique_temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock error")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("barscan-it-{tag}-{nanos}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn qr_image(text: &str) -> GrayImage {
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

/// 多个码横向排列在同一张图上。
pub fn qr_row(texts: &[&str]) -> GrayImage {
    let tiles: Vec<GrayImage> = texts.iter().map(|text| qr_image(text)).collect();
    let gap = MODULE_PX * QUIET_ZONE_MODULES;
    let width = tiles.iter().map(GrayImage::width).sum::<u32>() + gap * tiles.len() as u32;
    let height = tiles.iter().map(GrayImage::height).max().unwrap_or(1);
    let mut canvas = GrayImage::from_pixel(width.max(1), height, Luma([255]));

    let mut offset = 0i64;
    for tile in &tiles {
        image::imageops::replace(&mut canvas, tile, offset, 0);
        offset += (tile.width() + gap) as i64;
    }
    canvas
}

pub fn blank_image() -> GrayImage {
    GrayImage::from_fn(160, 120, |x, y| Luma([((x * 7 + y * 3) % 180 + 40) as u8]))
}

pub fn png_bytes(img: &GrayImage) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    cursor.into_inner()
}

pub fn write_png(dir: &Path, name: &str, img: &GrayImage) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(img)).expect("write fixture");
    path
}

/// 单连接 HTTP 服务：接受一次请求后返回给定 PNG。
pub fn serve_png_once(body: Vec<u8>) -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let port = listener.local_addr().expect("read local addr failed").port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept failed");
        let mut req_buf = [0u8; 1024];
        let _ = stream.read(&mut req_buf);

        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).expect("write head failed");
        stream.write_all(&body).expect("write body failed");
        stream.flush().expect("flush failed");
    });

    (format!("http://127.0.0.1:{port}/code.png"), handle)
}
