//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调阈值”集中到 `ScanConfig`：下载超时、体积上限、像素上限等。
//! 调度器每次调用只读取一次快照，保证单次调用内参数一致。
//!
//! ## 实现思路
//!
//! - `Default` 提供可直接用于生产的阈值。
//! - 通过 `serde` 支持 JSON 配置文件，缺省字段回落到默认值。
//! - `validate` 统一做范围校验，`from_json_str` / `set_config` 都会先校验。

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// 解码流水线配置。
///
/// 字段覆盖了下载、读取、像素解码三个阶段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 读取/下载原始字节时允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 网络请求总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接（TCP/TLS）超时（秒）。
    pub connect_timeout: u64,
    /// 下载首包超时（毫秒）。
    pub stream_first_byte_timeout_ms: u64,
    /// 下载分块读取超时（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 是否允许访问本地或内网地址。
    ///
    /// 关闭后，指向回环、私有网段、链路本地地址的 URL 会在下载前被拒绝。
    pub allow_private_network: bool,
    /// 解码前允许的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            stream_first_byte_timeout_ms: 10_000,
            stream_chunk_timeout_ms: 15_000,
            max_redirects: 5,
            allow_private_network: true,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
        }
    }
}

impl ScanConfig {
    /// 校验各字段取值范围。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size == 0 {
            return Err(ConfigError::Invalid("max_file_size 必须大于 0".to_string()));
        }
        if self.max_decoded_bytes < 8 * 1024 * 1024 {
            return Err(ConfigError::Invalid("max_decoded_bytes 不能小于 8MB".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(ConfigError::Invalid("max_decoded_pixels 必须大于 0".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(ConfigError::Invalid("connect_timeout 必须在 1~120 秒之间".to_string()));
        }
        if self.download_timeout == 0 {
            return Err(ConfigError::Invalid("download_timeout 必须大于 0".to_string()));
        }
        if !(500..=120_000).contains(&self.stream_first_byte_timeout_ms) {
            return Err(ConfigError::Invalid(
                "stream_first_byte_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_chunk_timeout_ms) {
            return Err(ConfigError::Invalid(
                "stream_chunk_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }

        Ok(())
    }

    /// 从 JSON 文本解析配置，缺省字段使用默认值。
    ///
    /// # 示例
    /// ```rust
    /// use barscan::ScanConfig;
    ///
    /// let config = ScanConfig::from_json_str(r#"{ "max_redirects": 2 }"#)?;
    /// assert_eq!(config.max_redirects, 2);
    /// assert_eq!(config.connect_timeout, ScanConfig::default().connect_timeout);
    /// # Ok::<(), barscan::ConfigError>(())
    /// ```
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载配置。
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        log::debug!("⚙️ 已加载解码配置 - 路径: {}", path.display());
        Ok(config)
    }
}
