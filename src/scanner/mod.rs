//! # 解码调度模块（scanner）
//!
//! ## 设计思路
//!
//! 该模块将“来源解析 → 字节加载 → 像素解码 → 码识别 → 结果映射”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `resolver`：判断来源类型，本地文件缺失时尽早失败
//! - `loader`：按归一化输入读取原始字节与签名校验
//! - `fetcher`：URL 下载能力（默认 reqwest）
//! - `pipeline`：图片容器解码能力（默认 image crate）
//! - `symbol`：码识别能力（默认 rqrr）
//! - `handler`：编排整条流水线并映射对外错误
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! 调用方 decode / decode_strict / decode_all / decode_all_strict
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志 + 严格程度映射）
//!    ├─ resolver.rs（来源归一化，SourceNotFound 在此产生）
//!    ├─ loader.rs（文件 / 句柄 / URL 字节）──→ fetcher.rs
//!    ├─ pipeline.rs（字节 → 灰度像素）
//!    └─ symbol.rs（灰度像素 → 码）
//!    ↓
//! Result<_, ScanError>
//! ```
//!
//! ## 分层职责建议
//!
//! - 支持新的输入形态优先改 `source.rs` 与 `resolver.rs`
//! - 阈值与超时变更优先改 `config.rs`
//! - 更换识别引擎实现 `SymbolDecoder` 并通过构建器注入，无需改动 `handler.rs`

mod config;
mod error;
mod fetcher;
mod handler;
mod loader;
mod pipeline;
mod resolver;
mod source;
mod symbol;

#[cfg(test)]
mod test_support;

pub use config::ScanConfig;
pub use error::{ConfigError, LoadError};
pub use fetcher::{FetchFuture, Fetcher, HttpFetcher};
pub use handler::{Cardinality, DecodeDispatcher, DecodeDispatcherBuilder, DecodeMode, Strictness};
pub use pipeline::{ImageCrateLoader, ImageLoader};
pub use resolver::SourceResolver;
pub use source::{
    DecodedSymbol, PixelBuffer, ProvidesPath, RawImageData, ResolvedInput, Source, SymbolFormat,
};
pub use symbol::{QrSymbolDecoder, SymbolDecoder};
