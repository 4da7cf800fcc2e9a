//! # 来源解析模块
//!
//! ## 设计思路
//!
//! “这是哪种来源”的判断只在这里发生一次，之后的流水线只面对 `ResolvedInput`。
//! 本地路径在解析时同步检查存在性，尽早失败，避免后续无意义的读取与解码。
//!
//! ## 实现思路
//!
//! - 本地路径 / PathProvider / 带路径提示的句柄：检查文件存在性。
//! - 无路径提示的句柄：原样作为字节流交给加载阶段。
//! - URL：不做任何探测，可达性问题留给下载阶段。

use std::path::PathBuf;

use super::source::{ResolvedInput, Source};
use crate::ScanError;

/// 来源解析器。无状态，可并发使用。
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceResolver;

impl SourceResolver {
    /// 将调用方输入归一化为 `ResolvedInput`。
    ///
    /// 本地文件不存在时返回 `ScanError::SourceNotFound`，携带调用方给出的路径。
    pub fn resolve(&self, source: Source) -> Result<ResolvedInput, ScanError> {
        match source {
            Source::LocalPath(path) => Self::existing_path(path),
            Source::PathProvider(provider) => Self::existing_path(provider.path()),
            Source::OpenHandle {
                path_hint: Some(path),
                reader,
            } => {
                // 有路径时按路径读取，句柄在此释放
                drop(reader);
                Self::existing_path(path)
            }
            Source::OpenHandle {
                path_hint: None,
                reader,
            } => Ok(ResolvedInput::Stream(reader)),
            Source::RemoteUrl(url) => Ok(ResolvedInput::Remote(url)),
        }
    }

    fn existing_path(path: PathBuf) -> Result<ResolvedInput, ScanError> {
        if !path.is_file() {
            log::debug!("🚫 本地文件不存在 - 路径: {}", path.display());
            return Err(ScanError::SourceNotFound(path.display().to_string()));
        }

        Ok(ResolvedInput::Path(path))
    }
}
