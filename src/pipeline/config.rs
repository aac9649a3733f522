//! # 流水线配置
//!
//! 将工作目录、输出路径等进程级约定显式化，便于测试。
//!
//! ## 依赖关系
//! - 被 `pipeline/worker.rs`, `pipeline/coordinator.rs` 使用
//! - 使用 `cli::StorageMethod`

use crate::cli::StorageMethod;

use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// 默认 worker 数量
pub const DEFAULT_WORKERS: usize = 10;

/// 默认输出归档路径
pub const DEFAULT_OUTPUT: &str = "output.zip";

/// 中间归档文件名前缀
pub const PART_PREFIX: &str = "tmp-part-";

/// 归档条目的文件权限位
pub const ENTRY_MODE: u32 = 0o644;

/// 归档重建流水线配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 并发 worker 数（同时也是两个通道的容量）
    pub workers: usize,
    /// 条目存储方式
    pub method: StorageMethod,
    /// 中间归档所在目录
    pub work_dir: PathBuf,
    /// 最终输出归档路径
    pub output: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            method: StorageMethod::Deflated,
            work_dir: PathBuf::from("."),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl PipelineConfig {
    /// 设置 worker 数量（至少为 1）
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// 设置存储方式
    pub fn with_method(mut self, method: StorageMethod) -> Self {
        self.method = method;
        self
    }

    /// 设置中间归档目录
    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = dir.as_ref().to_path_buf();
        self
    }

    /// 设置输出归档路径
    pub fn with_output(mut self, output: impl AsRef<Path>) -> Self {
        self.output = output.as_ref().to_path_buf();
        self
    }

    /// 实际使用的 worker 数量
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    /// 写入新条目时使用的 zip 选项
    pub fn file_options(&self) -> SimpleFileOptions {
        let method = match self.method {
            StorageMethod::Stored => CompressionMethod::Stored,
            StorageMethod::Deflated => CompressionMethod::Deflated,
        };
        SimpleFileOptions::default()
            .compression_method(method)
            .unix_permissions(ENTRY_MODE)
    }
}
