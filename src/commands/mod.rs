//! # 命令执行模块
//!
//! 按输入类型分派：
//! ```text
//! Classify → { File | Directory | Archive } → Run → { Success | Error }
//! ```
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `transform.rs`, `pipeline/`, `batch/`, `utils/`
//! - 子模块: archive, directory, file

pub mod archive;
pub mod directory;
pub mod file;

use crate::cli::Cli;
use crate::error::{FilterError, Result};
use crate::pipeline::source::ArchiveKind;
use crate::pipeline::{CancelToken, PipelineConfig};
use crate::transform::Transform;

use std::path::Path;

/// 输入分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// 普通文件
    File,
    /// 目录（`--directory` / `--recursive`）
    Directory,
    /// `.zip` / `.gz` 归档
    Archive(ArchiveKind),
}

/// 对输入路径分类
pub fn classify(input: &Path, directory_mode: bool) -> Result<InputKind> {
    if directory_mode {
        return if input.is_dir() {
            Ok(InputKind::Directory)
        } else {
            Err(FilterError::DirectoryNotFound {
                path: input.display().to_string(),
            })
        };
    }

    if let Some(kind) = ArchiveKind::detect(input) {
        if !input.is_file() {
            return Err(FilterError::FileNotFound {
                path: input.display().to_string(),
            });
        }
        return Ok(InputKind::Archive(kind));
    }

    if input.is_dir() {
        return Err(FilterError::InvalidArgument(format!(
            "'{}' is a directory; pass --directory or --recursive",
            input.display()
        )));
    }

    if !input.is_file() {
        return Err(FilterError::FileNotFound {
            path: input.display().to_string(),
        });
    }

    Ok(InputKind::File)
}

/// 由 CLI 参数构造流水线配置
pub fn pipeline_config(cli: &Cli) -> PipelineConfig {
    PipelineConfig::default()
        .with_workers(cli.workers)
        .with_method(cli.method)
        .with_work_dir(&cli.work_dir)
        .with_output(&cli.output)
}

/// 执行一次调用
pub fn run(cli: Cli, cancel: &CancelToken) -> Result<()> {
    let transform = Transform::from_flags(&cli.regex, cli.select, &cli.replace)?;

    match classify(&cli.input, cli.is_directory_mode())? {
        InputKind::File => file::execute(&cli.input, &cli.output, &transform),
        InputKind::Archive(_) => {
            let config = pipeline_config(&cli);
            archive::execute(&cli.input, &transform, config, cancel).map(|_| ())
        }
        InputKind::Directory => {
            let options = directory::DirectoryOptions {
                input: cli.input.clone(),
                output: cli.output.clone(),
                recursive: cli.recursive,
                pattern: cli.pattern.clone(),
                jobs: cli.jobs,
                pipeline: pipeline_config(&cli),
            };
            directory::execute(&options, &transform, cancel)
        }
    }
}
