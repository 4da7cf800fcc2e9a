//! # 远程下载模块
//!
//! ## 设计思路
//!
//! URL 来源的字节获取被抽象为 `Fetcher` 能力，调度器只依赖 trait，
//! 测试或特殊网络环境下可以整体替换。
//!
//! ## 实现思路
//!
//! 默认实现 `HttpFetcher` 基于 reqwest：
//! - 关闭自动重定向，手动跟随并逐跳校验地址。
//! - 校验 `Content-Type` 与 `Content-Length`。
//! - 流式读取，首包 / 分块分别设置超时，累计体积超限立即中止。
//! - 前 4KB 内做文件签名探测，尽早拒绝非图片内容。
//!
//! 单次调用只请求一次，不做重试，也不缓存结果。

use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Url;
use tokio::net::lookup_host;

use super::loader::{probe_stream_signature, validate_image_signature};
use super::{LoadError, ScanConfig};

const STREAM_SIGNATURE_PROBE_BYTES: usize = 4096;
const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;
const ACCEPT_IMAGE: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";

/// `Fetcher::get` 返回的 future。
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, LoadError>> + Send + 'a>>;

/// 远程图片字节获取能力。
pub trait Fetcher: Send + Sync {
    /// 下载 `url` 指向的完整图片字节。
    fn get<'a>(&'a self, url: &'a Url, config: &'a ScanConfig) -> FetchFuture<'a>;
}

/// 基于 reqwest 的默认下载器。
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn get<'a>(&'a self, url: &'a Url, config: &'a ScanConfig) -> FetchFuture<'a> {
        Box::pin(self.download(url, config))
    }
}

impl HttpFetcher {
    async fn download(&self, url: &Url, config: &ScanConfig) -> Result<Vec<u8>, LoadError> {
        log::info!("🌐 开始下载图片 - URL: {}", redact_url_for_log(url));

        let client = Self::build_http_client(config)?;
        let mut current_url = url.clone();

        for redirect_count in 0..=config.max_redirects {
            Self::validate_url_safety(&current_url, config).await?;

            let response = client
                .get(current_url.clone())
                .header(reqwest::header::ACCEPT, ACCEPT_IMAGE)
                .send()
                .await
                .map_err(|e| Self::map_reqwest_error(e, &current_url, config))?;

            if response.status().is_redirection() {
                if redirect_count >= config.max_redirects {
                    return Err(LoadError::Network(format!(
                        "重定向次数超过限制（{}）",
                        config.max_redirects
                    )));
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .ok_or_else(|| LoadError::Network("重定向响应缺少 Location 头".to_string()))?;

                let location_str = location
                    .to_str()
                    .map_err(|e| LoadError::InvalidFormat(format!("重定向地址无效：{}", e)))?;

                let next_url = current_url
                    .join(location_str)
                    .map_err(|e| LoadError::InvalidFormat(format!("重定向 URL 解析失败：{}", e)))?;

                log::debug!("↪️ 跳转到: {}", redact_url_for_log(&next_url));
                current_url = next_url;
                continue;
            }

            if !response.status().is_success() {
                return Err(LoadError::Network(format!(
                    "HTTP {}: {}",
                    response.status().as_u16(),
                    Self::status_message(response.status().as_u16())
                )));
            }

            if let Some(ct) = response.headers().get(reqwest::header::CONTENT_TYPE) {
                if let Ok(ct_str) = ct.to_str() {
                    if !Self::is_image_content_type(ct_str) {
                        return Err(LoadError::InvalidFormat(format!("不是图片类型：{}", ct_str)));
                    }
                }
            }

            return Self::read_body(response, config).await;
        }

        Err(LoadError::Network("下载流程异常结束".to_string()))
    }

    async fn read_body(
        mut response: reqwest::Response,
        config: &ScanConfig,
    ) -> Result<Vec<u8>, LoadError> {
        let total_len = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|cl| cl.to_str().ok())
            .and_then(|cl| cl.parse::<u64>().ok());

        if let Some(size) = total_len {
            if size > config.max_file_size {
                return Err(LoadError::ResourceLimit(format!(
                    "文件过大：{:.2} MB（限制：{:.2} MB）",
                    size as f64 / 1024.0 / 1024.0,
                    config.max_file_size as f64 / 1024.0 / 1024.0
                )));
            }
        }

        let initial_capacity = total_len
            .map(|len| len.min(config.max_file_size).min(usize::MAX as u64) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);
        let mut total: u64 = 0;
        let mut signature_validated = false;
        let mut received_first_chunk = false;

        loop {
            let read_timeout = if received_first_chunk {
                Duration::from_millis(config.stream_chunk_timeout_ms)
            } else {
                Duration::from_millis(config.stream_first_byte_timeout_ms)
            };

            let next_chunk = tokio::time::timeout(read_timeout, response.chunk())
                .await
                .map_err(|_| {
                    if received_first_chunk {
                        LoadError::Timeout("下载数据流读取超时".to_string())
                    } else {
                        LoadError::Timeout("下载首包超时".to_string())
                    }
                })?;

            let Some(chunk) = next_chunk.map_err(|e| LoadError::Network(format!("下载失败：{}", e)))?
            else {
                break;
            };

            received_first_chunk = true;

            total = total.saturating_add(chunk.len() as u64);
            if total > config.max_file_size {
                return Err(LoadError::ResourceLimit("下载后文件超过大小限制".to_string()));
            }
            buffer.extend_from_slice(&chunk);

            if !signature_validated {
                signature_validated = probe_stream_signature(&buffer, STREAM_SIGNATURE_PROBE_BYTES)?;
            }
        }

        if !signature_validated {
            validate_image_signature(&buffer)?;
        }

        log::debug!("✅ 下载完成 - {} bytes", total);
        Ok(buffer)
    }

    fn build_http_client(config: &ScanConfig) -> Result<reqwest::Client, LoadError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| LoadError::Network(format!("无法创建 HTTP 客户端：{}", e)))
    }

    /// 校验 URL 协议与目标地址。
    ///
    /// `allow_private_network` 关闭时拒绝本地 / 内网目标（含域名解析结果）。
    async fn validate_url_safety(url: &Url, config: &ScanConfig) -> Result<(), LoadError> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(LoadError::InvalidFormat("仅支持 HTTP/HTTPS".to_string()));
        }

        if config.allow_private_network {
            return Ok(());
        }

        let host = url
            .host_str()
            .ok_or_else(|| LoadError::InvalidFormat("URL 缺少主机地址".to_string()))?;

        if Self::is_local_hostname(host) {
            return Err(LoadError::InvalidFormat(format!("禁止访问本地网络地址：{}", host)));
        }

        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare_host.parse::<IpAddr>() {
            if Self::is_private_or_local_ip(ip) {
                return Err(LoadError::InvalidFormat(format!("禁止访问内网 IP：{}", ip)));
            }
            return Ok(());
        }

        let port = url
            .port_or_known_default()
            .ok_or_else(|| LoadError::InvalidFormat("URL 缺少端口信息".to_string()))?;
        let addrs = lookup_host((host, port))
            .await
            .map_err(|e| LoadError::Network(format!("URL 主机解析失败：{}", e)))?;

        for addr in addrs {
            if Self::is_private_or_local_ip(addr.ip()) {
                return Err(LoadError::InvalidFormat(format!(
                    "URL 解析结果命中内网地址：{}",
                    addr.ip()
                )));
            }
        }

        Ok(())
    }

    fn is_local_hostname(host: &str) -> bool {
        host.eq_ignore_ascii_case("localhost")
            || host.eq_ignore_ascii_case("localhost.")
            || host.ends_with(".local")
    }

    fn is_private_or_local_ip(ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => {
                if v4.is_private()
                    || v4.is_loopback()
                    || v4.is_link_local()
                    || v4.is_broadcast()
                    || v4.is_unspecified()
                    || v4.is_multicast()
                {
                    return true;
                }

                // 0.0.0.0/8 与运营商级 NAT 100.64.0.0/10
                let octets = v4.octets();
                octets[0] == 0 || (octets[0] == 100 && (octets[1] & 0b1100_0000) == 0b0100_0000)
            }
            IpAddr::V6(v6) => {
                v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_unique_local()
                    || v6.is_unicast_link_local()
                    || v6.is_multicast()
            }
        }
    }

    fn is_image_content_type(content_type: &str) -> bool {
        content_type
            .split(';')
            .next()
            .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }

    fn map_reqwest_error(e: reqwest::Error, url: &Url, config: &ScanConfig) -> LoadError {
        let err_msg = e.to_string().replace(url.as_str(), &redact_url_for_log(url));

        if e.is_timeout() {
            LoadError::Timeout(format!("下载超时（{}秒）", config.download_timeout))
        } else if e.is_connect() {
            LoadError::Network(format!("无法连接：{}", err_msg))
        } else {
            LoadError::Network(format!("请求失败：{}", err_msg))
        }
    }

    fn status_message(code: u16) -> &'static str {
        match code {
            404 => "未找到",
            403 => "访问被拒绝",
            500..=599 => "服务器错误",
            _ => "请求失败",
        }
    }
}

/// 日志用 URL：去掉 query、fragment 与用户信息。
pub(crate) fn redact_url_for_log(url: &Url) -> String {
    let host = url.host_str().unwrap_or("<unknown-host>");
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();

    format!("{}://{}{}{}", url.scheme(), host, port, url.path())
}
