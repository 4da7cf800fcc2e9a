//! 对外错误类型模块
//!
//! # 设计思路
//!
//! 调用方只需要区分两类失败：
//!
//! - `SourceNotFound`：本地来源不存在，属于前置条件失败，任何调用方式下都会返回。
//! - `Undecodable`：流水线正常走完但一个码都没找到，仅由 `*_strict` 系列接口返回。
//!
//! 下载失败、图片容器损坏等底层错误（`LoadError`）不会出现在这里，
//! 它们在调度层被折叠为“空结果”，再按调用方式决定返回空值还是 `Undecodable`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 消息文本保持稳定，便于调用方日志检索与断言。

/// 解码调度层对外暴露的错误类型。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// 本地路径不存在（携带调用方传入的原始描述）
    #[error("File {0} could not be found")]
    SourceNotFound(String),

    /// 图片中没有可识别的码（仅严格模式）
    #[error("Image not decodable")]
    Undecodable,
}

impl ScanError {
    /// 稳定的错误码，供调用方做分支或上报。
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => "source_not_found",
            Self::Undecodable => "undecodable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScanError;

    #[test]
    fn source_not_found_message_names_the_missing_file() {
        let err = ScanError::SourceNotFound("nonexistentfile.png".to_string());
        assert_eq!(err.to_string(), "File nonexistentfile.png could not be found");
        assert_eq!(err.code(), "source_not_found");
    }

    #[test]
    fn undecodable_message_is_stable() {
        assert_eq!(ScanError::Undecodable.to_string(), "Image not decodable");
        assert_eq!(ScanError::Undecodable.code(), "undecodable");
    }
}
