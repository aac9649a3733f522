//! # 目录模式
//!
//! `--directory` 处理输入目录第一层，`--recursive` 处理整棵树。
//! 输出目录镜像输入的相对路径；树中的 `.zip` 经流水线重建到同一
//! 相对路径，`.gz` 重建为追加 `.zip` 的路径（`x.gz` → `x.gz.zip`），
//! 其余文件逐个变换。多个输入映射到同一输出时，这些输入全部记为失败。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 使用 `batch/` 收集与并行执行
//! - 使用 `commands/archive.rs`, `transform.rs`, `utils/output.rs`

use super::archive;
use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::error::{FilterError, Result};
use crate::pipeline::source::ArchiveKind;
use crate::pipeline::{CancelToken, PipelineConfig};
use crate::transform::Transform;
use crate::utils::output;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// 目录模式参数
#[derive(Debug, Clone)]
pub struct DirectoryOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub recursive: bool,
    /// 文件名 glob
    pub pattern: String,
    /// 并行作业数（0 = CPU 核数）
    pub jobs: usize,
    /// 归档文件的流水线配置（`output` 逐文件覆盖）
    pub pipeline: PipelineConfig,
}

/// 执行目录模式
pub fn execute(options: &DirectoryOptions, transform: &Transform, cancel: &CancelToken) -> Result<()> {
    output::print_header(&format!("Filtering {}", options.input.display()));

    if !options.input.is_dir() {
        return Err(FilterError::DirectoryNotFound {
            path: options.input.display().to_string(),
        });
    }

    fs::create_dir_all(&options.output).map_err(|e| FilterError::FileWriteError {
        path: options.output.display().to_string(),
        source: e,
    })?;

    let in_root = canonical(&options.input)?;
    let out_root = canonical(&options.output)?;

    // 输出目录位于输入树内时跳过它
    let files = FileCollector::new(in_root.clone())
        .with_pattern(&options.pattern)?
        .recursive(options.recursive)
        .exclude(&out_root)
        .collect()?;

    if files.is_empty() {
        output::print_warning(&format!(
            "No files matched '{}' under {}",
            options.pattern,
            options.input.display()
        ));
        return Ok(());
    }

    let collisions = colliding_targets(&files, &in_root, &out_root);

    let runner = BatchRunner::new(options.jobs).with_progress(!output::is_quiet());
    output::print_info(&format!(
        "Found {} files to filter ({} jobs)",
        files.len(),
        runner.jobs()
    ));

    let result = runner.run(files, |file| {
        if cancel.is_cancelled() {
            return ProcessResult::Skipped(file.display().to_string());
        }
        let target = output_path_for(file, &in_root, &out_root);
        if collisions.contains(&target) {
            let err = FilterError::OutputCollision {
                path: target.display().to_string(),
            };
            return ProcessResult::Failed(file.display().to_string(), err.chain());
        }
        match process_file(file, &target, transform, &options.pipeline, cancel) {
            Ok(()) => ProcessResult::Success(file.display().to_string()),
            Err(e) if e.is_cancelled() => ProcessResult::Skipped(file.display().to_string()),
            Err(e) => ProcessResult::Failed(file.display().to_string(), e.chain()),
        }
    });

    output::print_separator();
    output::print_done(&format!(
        "{} succeeded, {} skipped, {} failed (of {})",
        result.success,
        result.skipped,
        result.failed,
        result.total()
    ));
    for (path, _) in &result.failures {
        output::print_warning(&format!("Not written: {}", path));
    }

    if cancel.is_cancelled() {
        return Err(FilterError::Cancelled);
    }
    if result.failed > 0 {
        return Err(FilterError::BatchFailed {
            failed: result.failed,
            total: result.total(),
        });
    }
    output::print_success(&format!("Output written to {}", options.output.display()));
    Ok(())
}

/// 输入文件在输出树中的位置
pub fn output_path_for(file: &Path, in_root: &Path, out_root: &Path) -> PathBuf {
    let rel = file.strip_prefix(in_root).unwrap_or(file);
    let target = out_root.join(rel);
    match ArchiveKind::detect(file) {
        Some(ArchiveKind::Gzip) => {
            let mut name = target.into_os_string();
            name.push(".zip");
            PathBuf::from(name)
        }
        Some(ArchiveKind::Zip) | None => target,
    }
}

/// 被多个输入共用的输出路径
fn colliding_targets(files: &[PathBuf], in_root: &Path, out_root: &Path) -> HashSet<PathBuf> {
    let mut counts: HashMap<PathBuf, usize> = HashMap::new();
    for file in files {
        *counts
            .entry(output_path_for(file, in_root, out_root))
            .or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(target, _)| target)
        .collect()
}

fn process_file(
    file: &Path,
    target: &Path,
    transform: &Transform,
    pipeline: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| FilterError::FileWriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    if ArchiveKind::detect(file).is_some() {
        let config = pipeline.clone().with_output(target);
        archive::rebuild(file, transform, config, cancel).map(|_| ())
    } else {
        transform.apply_file(file, target)
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| FilterError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}
