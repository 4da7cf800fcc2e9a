//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“调用方输入”和“流水线中间结果”解耦：
//! - `Source` 表示调用方给出的来源（路径 / URL / 已打开句柄 / 能提供路径的对象）
//! - `ResolvedInput` 表示归一化之后的来源（已确认存在的路径 / 字节流 / 远程地址）
//! - `RawImageData` 表示已读取但未解码的字节
//! - `PixelBuffer` 表示可交给识别引擎的灰度像素
//! - `DecodedSymbol` 表示识别出的一个码

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::LoadError;

/// 被识别为远程地址的 scheme 前缀。
const URL_SCHEME_PREFIXES: [&str; 2] = ["http://", "https://"];

/// 能提供本地路径的对象。
///
/// 适用于“自身不是路径，但知道图片在哪”的业务对象。
pub trait ProvidesPath: Send {
    fn path(&self) -> PathBuf;
}

/// 调用方输入来源。
///
/// 每次调用构造一次，解码结束即丢弃；持有的句柄随之释放。
pub enum Source {
    /// 本地文件路径。
    LocalPath(PathBuf),
    /// HTTP(S) 地址。
    RemoteUrl(Url),
    /// 已打开的可读句柄，可附带其对应的文件路径。
    OpenHandle {
        reader: Box<dyn Read + Send>,
        path_hint: Option<PathBuf>,
    },
    /// 能提供路径的对象。
    PathProvider(Box<dyn ProvidesPath>),
}

impl Source {
    /// 将字符串归类为 URL 或本地路径。
    ///
    /// 仅当以 `http://` / `https://`（不区分大小写）开头且能解析为 URL 时视为远程地址，
    /// 其余一律按本地路径处理。
    ///
    /// # 示例
    /// ```rust
    /// use barscan::Source;
    ///
    /// assert!(matches!(Source::parse("https://example.com/qr.png"), Source::RemoteUrl(_)));
    /// assert!(matches!(Source::parse("fixtures/qr.png"), Source::LocalPath(_)));
    /// ```
    pub fn parse(input: &str) -> Self {
        if has_url_scheme(input) {
            if let Ok(url) = Url::parse(input) {
                return Self::RemoteUrl(url);
            }
        }

        Self::LocalPath(PathBuf::from(input))
    }

    /// 包装一个已打开的可读句柄。
    pub fn handle<R>(reader: R, path_hint: Option<PathBuf>) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::OpenHandle {
            reader: Box::new(reader),
            path_hint,
        }
    }

    /// 包装一个能提供路径的对象。
    pub fn provider<P>(provider: P) -> Self
    where
        P: ProvidesPath + 'static,
    {
        Self::PathProvider(Box::new(provider))
    }

    /// 来源类型标识（用于日志）。
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LocalPath(_) => "path",
            Self::RemoteUrl(_) => "url",
            Self::OpenHandle { .. } => "handle",
            Self::PathProvider(_) => "provider",
        }
    }
}

fn has_url_scheme(input: &str) -> bool {
    let trimmed = input.trim_start();
    URL_SCHEME_PREFIXES.iter().any(|prefix| {
        trimmed
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalPath(path) => f.debug_tuple("LocalPath").field(path).finish(),
            Self::RemoteUrl(url) => f.debug_tuple("RemoteUrl").field(&url.as_str()).finish(),
            Self::OpenHandle { path_hint, .. } => f
                .debug_struct("OpenHandle")
                .field("path_hint", path_hint)
                .finish_non_exhaustive(),
            Self::PathProvider(provider) => f
                .debug_tuple("PathProvider")
                .field(&provider.path())
                .finish(),
        }
    }
}

impl From<&str> for Source {
    fn from(input: &str) -> Self {
        Self::parse(input)
    }
}

impl From<String> for Source {
    fn from(input: String) -> Self {
        Self::parse(&input)
    }
}

impl From<&String> for Source {
    fn from(input: &String) -> Self {
        Self::parse(input)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::LocalPath(path.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::LocalPath(path)
    }
}

impl From<&PathBuf> for Source {
    fn from(path: &PathBuf) -> Self {
        Self::LocalPath(path.clone())
    }
}

impl From<Url> for Source {
    fn from(url: Url) -> Self {
        Self::RemoteUrl(url)
    }
}

impl From<std::fs::File> for Source {
    fn from(file: std::fs::File) -> Self {
        Self::handle(file, None)
    }
}

/// 归一化后的输入。
///
/// 不变量：`Path` 变体只会为解析时已存在的文件构造。
pub enum ResolvedInput {
    /// 已确认存在的本地文件。
    Path(PathBuf),
    /// 待读取的字节流。
    Stream(Box<dyn Read + Send>),
    /// 待下载的远程地址（可达性在加载阶段才会暴露）。
    Remote(Url),
}

impl ResolvedInput {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Path(_) => "file",
            Self::Stream(_) => "stream",
            Self::Remote(_) => "url",
        }
    }
}

impl fmt::Debug for ResolvedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Remote(url) => f.debug_tuple("Remote").field(&url.as_str()).finish(),
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
#[derive(Debug, Clone)]
pub struct RawImageData {
    /// 原始图片字节。
    pub bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub source_hint: &'static str,
}

/// 像素解码阶段输出：8 位灰度像素，行优先。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    luma: Vec<u8>,
}

impl PixelBuffer {
    /// 从灰度数据构造，长度必须等于 `width * height`。
    pub fn from_luma(width: u32, height: u32, luma: Vec<u8>) -> Result<Self, LoadError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| LoadError::ResourceLimit("图片像素数溢出".to_string()))?;

        if luma.len() != expected {
            return Err(LoadError::Decode(format!(
                "灰度数据长度异常：{}（期望 {}）",
                luma.len(),
                expected
            )));
        }

        Ok(Self { width, height, luma })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn luma(&self) -> &[u8] {
        &self.luma
    }

    /// 读取 `(x, y)` 处的灰度值，越界返回 `None`。
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.luma
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// 码制。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolFormat {
    QrCode,
    DataMatrix,
    Aztec,
    Pdf417,
    Code128,
    Code93,
    Code39,
    Codabar,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Itf,
    Unknown,
}

/// 识别出的一个码。构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSymbol {
    format: SymbolFormat,
    text: String,
}

impl DecodedSymbol {
    pub fn new(format: SymbolFormat, text: impl Into<String>) -> Self {
        Self {
            format,
            text: text.into(),
        }
    }

    pub fn format(&self) -> SymbolFormat {
        self.format
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
