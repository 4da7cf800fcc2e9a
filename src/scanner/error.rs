//! # 协作方错误模型
//!
//! ## 设计思路
//!
//! 下载、读文件、图片解码等“协作方”阶段的失败统一用 `LoadError` 承载。
//! 它不属于对外错误契约：调度器拿到 `LoadError` 后只记录日志，
//! 然后按“没有找到任何码”处理。
//!
//! 之所以仍然公开，是因为自定义 `Fetcher` / `ImageLoader` 实现需要返回它。

/// 加载阶段（取字节 + 解码像素）的统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}

impl LoadError {
    /// 所属阶段，便于日志归类。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::Timeout(_) => "fetch",
            Self::FileSystem(_) => "read",
            Self::InvalidFormat(_) | Self::Decode(_) | Self::ResourceLimit(_) => "decode",
        }
    }
}

/// 配置校验与加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置无效：{0}")]
    Invalid(String),

    #[error("配置文件读取失败：{0}")]
    Io(#[from] std::io::Error),

    #[error("配置解析失败：{0}")]
    Parse(String),
}
