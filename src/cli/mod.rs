//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数。
//!
//! ## 命令结构
//! ```text
//! filter <input> <regex> <output> [--select] [--replace <text>]
//!                                 [--recursive] [--directory]
//! ```
//! - 输入为普通文件: 单文件正则变换
//! - 输入为 `.zip` / `.gz`: 并发归档重建流水线
//! - `--directory` / `--recursive`: 遍历目录逐个处理
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 参数传递给 `commands/`

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// 归档条目的存储方式
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum StorageMethod {
    /// Store entries without compression
    Stored,
    /// Compress entries with deflate
    #[default]
    Deflated,
}

impl std::fmt::Display for StorageMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMethod::Stored => write!(f, "stored"),
            StorageMethod::Deflated => write!(f, "deflated"),
        }
    }
}

/// filter - 正则过滤文件、目录与归档
#[derive(Parser, Debug)]
#[command(name = "filter")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Filter files with a regex, writing either the selected text or the substituted text",
    long_about = None
)]
#[command(after_help = "\
Examples:
  filter <file> <regex> <output>
  filter <file> <regex> <output> --select
  filter <file> <regex> <output> --replace <text>
  filter <archive.zip> <regex> <output.zip> --replace <text>
  filter <directory> <regex> <output-dir> --recursive
  filter <directory> <regex> <output-dir> --directory")]
pub struct Cli {
    /// Input file, archive (.zip/.gz) or directory
    pub input: PathBuf,

    /// Regular expression to apply
    pub regex: String,

    /// Output file, archive, or directory (directory mode)
    pub output: PathBuf,

    /// Emit only the matched text instead of substituting
    #[arg(short, long, default_value_t = false, conflicts_with = "replace")]
    pub select: bool,

    /// Literal replacement text for every match
    #[arg(short, long, default_value = "")]
    pub replace: String,

    /// Recurse into subdirectories when the input is a directory
    #[arg(short = 'R', long, default_value_t = false)]
    pub recursive: bool,

    /// Process every file directly inside the input directory
    #[arg(short, long, default_value_t = false)]
    pub directory: bool,

    /// Number of archive workers (intermediate archives built in parallel)
    #[arg(short, long, default_value_t = 10, env = "FILTER_WORKERS")]
    pub workers: usize,

    /// Storage method for rebuilt archive entries
    #[arg(long, value_enum, default_value_t = StorageMethod::Deflated)]
    pub method: StorageMethod,

    /// Directory for intermediate archives
    #[arg(long, default_value = ".", env = "FILTER_WORK_DIR")]
    pub work_dir: PathBuf,

    /// Glob pattern for file names in directory mode
    #[arg(short, long, default_value = "*")]
    pub pattern: String,

    /// Number of parallel jobs in directory mode (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Only print errors
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

impl Cli {
    /// 是否为目录模式
    pub fn is_directory_mode(&self) -> bool {
        self.recursive || self.directory
    }
}
