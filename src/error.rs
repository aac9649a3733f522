//! # 统一错误处理模块
//!
//! 定义 filter 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// filter 统一错误类型
#[derive(Error, Debug)]
pub enum FilterError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 正则错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid regex '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 归档错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read archive: {path}")]
    ArchiveRead {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to write archive: {path}")]
    ArchiveWrite {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to create intermediate archive in {dir}")]
    IntermediateCreate {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write entry '{name}' into {path}")]
    EntryWrite {
        name: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 流水线错误
    // ─────────────────────────────────────────────────────────────
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Channel '{0}' closed unexpectedly")]
    ChannelClosed(&'static str),

    #[error("Pipeline task panicked: {0}")]
    TaskPanicked(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 批处理错误
    // ─────────────────────────────────────────────────────────────
    #[error("{failed} of {total} file(s) failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Output {path} would be written by more than one input")]
    OutputCollision { path: String },
}

impl FilterError {
    /// 是否为取消信号（而非真正的失败原因）
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FilterError::Cancelled)
    }

    /// 连同 `source()` 链一起格式化，如 `Failed to read archive: a.zip: invalid Zip archive: ...`
    pub fn chain(&self) -> String {
        let mut msg = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            msg.push_str(": ");
            msg.push_str(&err.to_string());
            cause = err.source();
        }
        msg
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cancelled() {
        assert!(FilterError::Cancelled.is_cancelled());
        assert!(!FilterError::ChannelClosed("entries").is_cancelled());
        assert!(!FilterError::InvalidArgument("boom".to_string()).is_cancelled());
    }

    #[test]
    fn test_display_carries_path() {
        let err = FilterError::FileReadError {
            path: "a.txt".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "Failed to read file: a.txt");
    }

    #[test]
    fn test_chain_appends_causes() {
        let err = FilterError::FileReadError {
            path: "a.txt".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.chain(), "Failed to read file: a.txt: gone");

        let bad = regex::Regex::new("(").unwrap_err();
        let err = FilterError::InvalidPattern {
            pattern: "(".to_string(),
            source: bad.clone(),
        };
        assert_eq!(err.chain(), format!("Invalid regex '(': {}", bad));
    }

    #[test]
    fn test_chain_without_source() {
        assert_eq!(FilterError::Cancelled.chain(), "Operation cancelled");
    }
}
