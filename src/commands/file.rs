//! # 单文件模式
//!
//! 对一个普通文件做整体筛选/替换，结果写入 `<output>`。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 使用 `transform.rs`, `utils/output.rs`

use crate::error::Result;
use crate::transform::Transform;
use crate::utils::output;

use std::path::Path;

/// 执行单文件处理
pub fn execute(input: &Path, output_path: &Path, transform: &Transform) -> Result<()> {
    transform.apply_file(input, output_path)?;
    output::print_conversion(
        &input.display().to_string(),
        &output_path.display().to_string(),
    );
    Ok(())
}
