//! # 归档模式
//!
//! `.zip` / `.gz` 输入：逐条目变换后经流水线重建为 `<output>` 指定的
//! zip 归档。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 与 `commands/directory.rs` 调用
//! - 使用 `pipeline/`, `utils/progress.rs`, `utils/output.rs`

use crate::error::Result;
use crate::pipeline::source::open_source;
use crate::pipeline::{CancelToken, Coordinator, MergeReport, PipelineConfig};
use crate::transform::Transform;
use crate::utils::{output, progress};

use std::path::Path;

/// 重建一个归档（不产生终端输出）
pub fn rebuild(
    input: &Path,
    transform: &Transform,
    config: PipelineConfig,
    cancel: &CancelToken,
) -> Result<MergeReport> {
    let source = open_source(input, transform)?;
    Coordinator::new(source, config)
        .with_cancel(cancel.child())
        .run()
}

/// 执行归档模式
pub fn execute(
    input: &Path,
    transform: &Transform,
    config: PipelineConfig,
    cancel: &CancelToken,
) -> Result<MergeReport> {
    let target = config.output.display().to_string();
    let spinner = progress::create_spinner(&format!(
        "Rebuilding {} with {} workers ({})",
        input.display(),
        config.worker_count(),
        config.method
    ));

    let result = rebuild(input, transform, config, cancel);
    spinner.finish_and_clear();

    let report = result?;
    output::print_done(&format!(
        "{} records from {} parts -> {}",
        report.records, report.parts, target
    ));
    Ok(report)
}
