//! # 核心调度模块
//!
//! ## 设计思路
//!
//! `DecodeDispatcher` 只负责流程编排与结果映射。处理链路固定为：
//! 1. 读取配置快照
//! 2. 解析来源（本地文件缺失时直接返回 `SourceNotFound`，任何模式都不吞掉）
//! 3. 加载原始字节并解码为灰度像素
//! 4. 调用识别引擎（按需要的数量：第一个 / 全部）
//! 5. 按严格程度映射结果：空结果在宽松模式返回空值，在严格模式返回 `Undecodable`
//!
//! 第 3 步的任何失败（下载不可达、容器损坏、超限）都折叠为“空结果”，
//! 与“图片正常但没有码”走同一条路径。
//!
//! ## 实现思路
//!
//! - 四个对外接口只是 `decode_symbols` 的薄封装，由 `DecodeMode` 的两个正交维度区分。
//! - 协作方以 `Arc<dyn ...>` 注入，可整体替换或在测试中 mock。
//! - 配置放在 `RwLock` 中，单次调用使用同一快照。
//! - 记录 `resolve/load/decode/total` 阶段耗时。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::fetcher::{Fetcher, HttpFetcher};
use super::pipeline::{ImageCrateLoader, ImageLoader};
use super::resolver::SourceResolver;
use super::source::{DecodedSymbol, PixelBuffer, ResolvedInput, Source, SymbolFormat};
use super::symbol::{QrSymbolDecoder, SymbolDecoder};
use super::{ConfigError, LoadError, ScanConfig};
use crate::ScanError;

/// 结果数量维度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// 只要第一个码。
    First,
    /// 要全部码。
    All,
}

/// 严格程度维度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// 没有码时返回空值。
    Lenient,
    /// 没有码时返回 `ScanError::Undecodable`。
    Strict,
}

/// 一次解码调用的模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeMode {
    pub cardinality: Cardinality,
    pub strictness: Strictness,
}

impl DecodeMode {
    pub const FIRST: Self = Self::new(Cardinality::First, Strictness::Lenient);
    pub const FIRST_STRICT: Self = Self::new(Cardinality::First, Strictness::Strict);
    pub const ALL: Self = Self::new(Cardinality::All, Strictness::Lenient);
    pub const ALL_STRICT: Self = Self::new(Cardinality::All, Strictness::Strict);

    pub const fn new(cardinality: Cardinality, strictness: Strictness) -> Self {
        Self {
            cardinality,
            strictness,
        }
    }
}

/// 解码调度器。
///
/// 调用之间不保留任何结果状态，可在多个任务间通过 `Arc` 共享。
pub struct DecodeDispatcher {
    pub(super) config: RwLock<ScanConfig>,
    pub(super) resolver: SourceResolver,
    pub(super) fetcher: Arc<dyn Fetcher>,
    pub(super) image_loader: Arc<dyn ImageLoader>,
    pub(super) symbol_decoder: Arc<dyn SymbolDecoder>,
}

impl std::fmt::Debug for DecodeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeDispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for DecodeDispatcher {
    fn default() -> Self {
        DecodeDispatcherBuilder::default().build_unchecked()
    }
}

/// `DecodeDispatcher` 构建器，用于替换协作方或配置。
pub struct DecodeDispatcherBuilder {
    config: ScanConfig,
    fetcher: Arc<dyn Fetcher>,
    image_loader: Arc<dyn ImageLoader>,
    symbol_decoder: Arc<dyn SymbolDecoder>,
}

impl Default for DecodeDispatcherBuilder {
    fn default() -> Self {
        Self {
            config: ScanConfig::default(),
            fetcher: Arc::new(HttpFetcher),
            image_loader: Arc::new(ImageCrateLoader),
            symbol_decoder: Arc::new(QrSymbolDecoder),
        }
    }
}

impl DecodeDispatcherBuilder {
    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    pub fn with_image_loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.image_loader = Arc::new(loader);
        self
    }

    pub fn with_symbol_decoder(mut self, decoder: impl SymbolDecoder + 'static) -> Self {
        self.symbol_decoder = Arc::new(decoder);
        self
    }

    /// 校验配置并构建调度器。
    pub fn build(self) -> Result<DecodeDispatcher, ConfigError> {
        self.config.validate()?;
        Ok(self.build_unchecked())
    }

    fn build_unchecked(self) -> DecodeDispatcher {
        DecodeDispatcher {
            config: RwLock::new(self.config),
            resolver: SourceResolver,
            fetcher: self.fetcher,
            image_loader: self.image_loader,
            symbol_decoder: self.symbol_decoder,
        }
    }
}

impl DecodeDispatcher {
    /// 使用默认协作方（reqwest 下载 + image 解码 + rqrr 识别）创建调度器。
    ///
    /// # 示例
    /// ```rust
    /// use barscan::{DecodeDispatcher, ScanConfig};
    ///
    /// let dispatcher = DecodeDispatcher::new(ScanConfig::default())?;
    /// # Ok::<(), barscan::ConfigError>(())
    /// ```
    pub fn new(config: ScanConfig) -> Result<Self, ConfigError> {
        Self::builder().with_config(config).build()
    }

    pub fn builder() -> DecodeDispatcherBuilder {
        DecodeDispatcherBuilder::default()
    }

    /// 获取配置快照，保证单次调用链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<ScanConfig, ConfigError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ConfigError::Invalid("配置读取锁已中毒".to_string()))
    }

    /// 替换配置，先校验再生效；进行中的调用不受影响。
    pub fn set_config(&self, config: ScanConfig) -> Result<(), ConfigError> {
        config.validate()?;

        let mut guard = self
            .config
            .write()
            .map_err(|_| ConfigError::Invalid("配置写入锁已中毒".to_string()))?;
        *guard = config;

        log::info!("⚙️ 已更新解码配置");
        Ok(())
    }

    /// 宽松模式：返回第一个码的文本，没有码时返回 `None`。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use barscan::DecodeDispatcher;
    ///
    /// # async fn demo() -> Result<(), barscan::ScanError> {
    /// let dispatcher = DecodeDispatcher::default();
    /// if let Some(text) = dispatcher.decode("fixtures/example.png").await? {
    ///     println!("{text}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn decode(&self, source: impl Into<Source>) -> Result<Option<String>, ScanError> {
        let symbols = self.decode_symbols(source, DecodeMode::FIRST).await?;
        Ok(symbols.into_iter().next().map(DecodedSymbol::into_text))
    }

    /// 严格模式：返回第一个码的文本，没有码时返回 `ScanError::Undecodable`。
    pub async fn decode_strict(&self, source: impl Into<Source>) -> Result<String, ScanError> {
        self.decode_symbols(source, DecodeMode::FIRST_STRICT)
            .await?
            .into_iter()
            .next()
            .map(DecodedSymbol::into_text)
            .ok_or(ScanError::Undecodable)
    }

    /// 宽松模式：按引擎发现顺序返回全部码的文本，没有码时返回空列表。
    pub async fn decode_all(&self, source: impl Into<Source>) -> Result<Vec<String>, ScanError> {
        let symbols = self.decode_symbols(source, DecodeMode::ALL).await?;
        Ok(symbols.into_iter().map(DecodedSymbol::into_text).collect())
    }

    /// 严格模式：返回非空的文本列表，没有码时返回 `ScanError::Undecodable`。
    pub async fn decode_all_strict(
        &self,
        source: impl Into<Source>,
    ) -> Result<Vec<String>, ScanError> {
        let symbols = self.decode_symbols(source, DecodeMode::ALL_STRICT).await?;
        Ok(symbols.into_iter().map(DecodedSymbol::into_text).collect())
    }

    /// 仅接受 QR 码的宽松单结果解码。
    pub async fn decode_qr(&self, source: impl Into<Source>) -> Result<Option<String>, ScanError> {
        let symbols = self.decode_symbols(source, DecodeMode::ALL).await?;
        Ok(symbols
            .into_iter()
            .find(|symbol| symbol.format() == SymbolFormat::QrCode)
            .map(DecodedSymbol::into_text))
    }

    /// 统一流水线：解析 → 加载 → 识别 → 按模式映射。
    ///
    /// `Cardinality::First` 时结果最多一个元素；`Strictness::Strict` 时结果保证非空。
    pub async fn decode_symbols(
        &self,
        source: impl Into<Source>,
        mode: DecodeMode,
    ) -> Result<Vec<DecodedSymbol>, ScanError> {
        let source = source.into();
        let source_kind = source.kind();
        let total_start = Instant::now();

        // 锁中毒时退回默认配置，不影响对外错误契约
        let config = self.config_snapshot().unwrap_or_else(|err| {
            log::warn!("⚠️ {}，使用默认配置", err);
            ScanConfig::default()
        });

        let resolve_start = Instant::now();
        let resolved = self.resolver.resolve(source)?;
        let resolve_elapsed = resolve_start.elapsed();
        let input_kind = resolved.kind();

        let load_start = Instant::now();
        let pixels = match self.load_pixels(resolved, &config).await {
            Ok(pixels) => Some(pixels),
            Err(err) => {
                log::warn!("⚠️ 图片加载失败，按无结果处理（阶段: {}）：{}", err.stage(), err);
                None
            }
        };
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let symbols = match (&pixels, mode.cardinality) {
            (None, _) => Vec::new(),
            (Some(pixels), Cardinality::First) => {
                self.symbol_decoder.decode_first(pixels).into_iter().collect()
            }
            (Some(pixels), Cardinality::All) => self.symbol_decoder.decode_all(pixels),
        };
        let decode_elapsed = decode_start.elapsed();

        log::info!(
            "✅ 解码完成 - 来源: {}/{} 模式: {:?}/{:?} 结果: {} 个 resolve={}ms load={}ms decode={}ms total={}ms",
            source_kind,
            input_kind,
            mode.cardinality,
            mode.strictness,
            symbols.len(),
            resolve_elapsed.as_millis(),
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        if symbols.is_empty() && mode.strictness == Strictness::Strict {
            return Err(ScanError::Undecodable);
        }

        Ok(symbols)
    }

    async fn load_pixels(
        &self,
        resolved: ResolvedInput,
        config: &ScanConfig,
    ) -> Result<PixelBuffer, LoadError> {
        let raw = self.load_raw(resolved, config).await?;
        self.image_loader.load(&raw, config)
    }
}
