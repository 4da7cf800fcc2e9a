//! # barscan：条码 / 二维码解码调度库
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  调用方：路径 / URL / 已打开句柄 / 能提供路径的对象        │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ impl Into<Source>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓        DecodeDispatcher                          │
//! │                                                          │
//! │  ┌─ SourceResolver ── SourceNotFound（任何模式都返回）    │
//! │  ├─ loader ────────── 文件 / 句柄 / Fetcher(URL)          │
//! │  ├─ ImageLoader ───── 字节 → 灰度像素                     │
//! │  └─ SymbolDecoder ─── 灰度像素 → 码（第一个 / 全部）       │
//! │                                                          │
//! │  加载失败 ≡ 没有码 → 宽松：None / []  严格：Undecodable   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 调用约定
//!
//! | 接口 | 数量 | 没有码时 | 来源缺失时 |
//! |------|------|----------|------------|
//! | [`decode`] | 第一个 | `Ok(None)` | `SourceNotFound` |
//! | [`decode_strict`] | 第一个 | `Undecodable` | `SourceNotFound` |
//! | [`decode_all`] | 全部 | `Ok(vec![])` | `SourceNotFound` |
//! | [`decode_all_strict`] | 全部 | `Undecodable` | `SourceNotFound` |
//!
//! 顶层函数使用默认配置的共享调度器；需要自定义配置或替换协作方时，
//! 通过 [`DecodeDispatcher::builder`] 自行构建。
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 对外错误类型 `ScanError` |
//! | [`scanner`] | 来源解析、字节加载、像素解码、码识别与调度 |

pub mod error;
pub mod scanner;

use once_cell::sync::Lazy;

pub use error::ScanError;
pub use reqwest::Url;
pub use scanner::{
    Cardinality, ConfigError, DecodeDispatcher, DecodeDispatcherBuilder, DecodeMode,
    DecodedSymbol, FetchFuture, Fetcher, HttpFetcher, ImageCrateLoader, ImageLoader, LoadError,
    PixelBuffer, ProvidesPath, QrSymbolDecoder, RawImageData, ResolvedInput, ScanConfig, Source,
    SourceResolver, Strictness, SymbolDecoder, SymbolFormat,
};

static DISPATCHER: Lazy<DecodeDispatcher> = Lazy::new(DecodeDispatcher::default);

/// 返回第一个码的文本，没有码时返回 `None`。
///
/// # 示例
/// ```rust,no_run
/// # async fn demo() -> Result<(), barscan::ScanError> {
/// let text = barscan::decode("fixtures/example.png").await?;
/// assert_eq!(text.as_deref(), Some("example"));
/// # Ok(())
/// # }
/// ```
pub async fn decode(source: impl Into<Source>) -> Result<Option<String>, ScanError> {
    DISPATCHER.decode(source).await
}

/// 返回第一个码的文本，没有码时返回 `ScanError::Undecodable`。
pub async fn decode_strict(source: impl Into<Source>) -> Result<String, ScanError> {
    DISPATCHER.decode_strict(source).await
}

/// 按发现顺序返回全部码的文本，没有码时返回空列表。
pub async fn decode_all(source: impl Into<Source>) -> Result<Vec<String>, ScanError> {
    DISPATCHER.decode_all(source).await
}

/// 按发现顺序返回全部码的文本，没有码时返回 `ScanError::Undecodable`。
pub async fn decode_all_strict(source: impl Into<Source>) -> Result<Vec<String>, ScanError> {
    DISPATCHER.decode_all_strict(source).await
}

/// 只接受 QR 码的单结果解码。
pub async fn decode_qr(source: impl Into<Source>) -> Result<Option<String>, ScanError> {
    DISPATCHER.decode_qr(source).await
}
