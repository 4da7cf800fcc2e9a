//! # 字节加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理三种归一化输入（本地文件 / 字节流 / 远程地址）的原始字节获取，
//! 并在“尽可能早”的阶段做体积与文件签名校验，减少无意义的解码开销。
//!
//! ## 实现思路
//!
//! - 文件：metadata 体积限制 + 读取。
//! - 字节流：`take(max + 1)` 限量读取，超出即判定超限。
//! - URL：交给注入的 `Fetcher`。
//! - 所有来源最终都经过 `infer` 的图片签名校验。

use std::io::Read;
use std::path::Path;

use super::source::{RawImageData, ResolvedInput};
use super::{DecodeDispatcher, LoadError, ScanConfig};

impl DecodeDispatcher {
    /// 按归一化输入加载原始字节。
    ///
    /// 字节流句柄在本函数内被消费，任何返回路径上都会被释放。
    pub(super) async fn load_raw(
        &self,
        input: ResolvedInput,
        config: &ScanConfig,
    ) -> Result<RawImageData, LoadError> {
        match input {
            ResolvedInput::Path(path) => Self::load_from_file(&path, config),
            ResolvedInput::Stream(reader) => Self::load_from_stream(reader, config),
            ResolvedInput::Remote(url) => {
                let bytes = self.fetcher.get(&url, config).await?;
                validate_image_signature(&bytes)?;
                Ok(RawImageData {
                    bytes,
                    source_hint: "url",
                })
            }
        }
    }

    fn load_from_file(path: &Path, config: &ScanConfig) -> Result<RawImageData, LoadError> {
        log::debug!("📁 读取本地图片 - 路径: {}", path.display());

        let metadata = std::fs::metadata(path)
            .map_err(|e| LoadError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if metadata.len() > config.max_file_size {
            return Err(LoadError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| LoadError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    fn load_from_stream(
        reader: Box<dyn Read + Send>,
        config: &ScanConfig,
    ) -> Result<RawImageData, LoadError> {
        log::debug!("📥 读取已打开的句柄");

        let mut bytes = Vec::new();
        reader
            .take(config.max_file_size.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| LoadError::FileSystem(format!("无法读取句柄内容：{}", e)))?;

        if bytes.len() as u64 > config.max_file_size {
            return Err(LoadError::ResourceLimit(format!(
                "句柄内容超过大小限制（{:.2} MB）",
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "stream",
        })
    }
}

/// 通过文件签名（magic bytes）校验输入是否为图片。
pub(crate) fn validate_image_signature(bytes: &[u8]) -> Result<(), LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::InvalidFormat("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| LoadError::InvalidFormat("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(LoadError::InvalidFormat(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

/// 流式下载阶段的签名探测。
///
/// - `Ok(true)`：已识别为图片
/// - `Ok(false)`：字节不足以判断，继续下载
/// - `Err(...)`：已识别为非图片，或达到探测上限仍无法识别
pub(crate) fn probe_stream_signature(bytes: &[u8], probe_limit: usize) -> Result<bool, LoadError> {
    if bytes.is_empty() {
        return Ok(false);
    }

    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(LoadError::InvalidFormat(format!(
                "下载内容不是图片类型：{}",
                kind.mime_type()
            )));
        }
        return Ok(true);
    }

    if bytes.len() >= probe_limit {
        return Err(LoadError::InvalidFormat(format!(
            "下载前 {} 字节内无法识别图片类型",
            probe_limit
        )));
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{SystemTime, UNIX_EPOCH};

    const PNG_SIGNATURE: [u8; 12] = [137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13];

    fn unique_temp_dir() -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("barscan-loader-test-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn signature_accepts_png_header() {
        assert!(validate_image_signature(&PNG_SIGNATURE).is_ok());
    }

    #[test]
    fn signature_rejects_empty_and_non_image_payloads() {
        assert!(matches!(validate_image_signature(&[]), Err(LoadError::InvalidFormat(_))));
        assert!(matches!(
            validate_image_signature(b"%PDF-1.7 not an image"),
            Err(LoadError::InvalidFormat(_))
        ));
    }

    #[test]
    fn stream_probe_waits_then_decides() {
        assert!(matches!(probe_stream_signature(&[], 64), Ok(false)));
        assert!(matches!(probe_stream_signature(&PNG_SIGNATURE, 64), Ok(true)));
        assert!(matches!(probe_stream_signature(&[1, 2], 64), Ok(false)));
        assert!(matches!(
            probe_stream_signature(&[b'x'; 64], 64),
            Err(LoadError::InvalidFormat(_))
        ));
    }

    #[test]
    fn file_over_limit_is_rejected_before_read() {
        let dir = unique_temp_dir();
        let path = dir.join("big.png");
        let mut payload = PNG_SIGNATURE.to_vec();
        payload.resize(4096, 0);
        std::fs::write(&path, &payload).expect("write temp file");

        let mut config = ScanConfig::default();
        config.max_file_size = 1024;

        let result = DecodeDispatcher::load_from_file(&path, &config);
        assert!(matches!(result, Err(LoadError::ResourceLimit(_))));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn stream_over_limit_is_rejected() {
        let mut payload = PNG_SIGNATURE.to_vec();
        payload.resize(4096, 0);

        let mut config = ScanConfig::default();
        config.max_file_size = 1024;

        let result = DecodeDispatcher::load_from_stream(Box::new(Cursor::new(payload)), &config);
        assert!(matches!(result, Err(LoadError::ResourceLimit(_))));
    }

    #[test]
    fn stream_with_image_signature_is_loaded() {
        let raw = DecodeDispatcher::load_from_stream(
            Box::new(Cursor::new(PNG_SIGNATURE.to_vec())),
            &ScanConfig::default(),
        )
        .expect("stream should load");

        assert_eq!(raw.source_hint, "stream");
        assert_eq!(raw.bytes, PNG_SIGNATURE.to_vec());
    }
}
