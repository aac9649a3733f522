//! # 正则变换
//!
//! 对字节内容执行正则选择或替换，单文件模式与归档条目共用。
//!
//! ## 功能
//! - `Select`: 输出所有不重叠的匹配，每个匹配后跟换行
//! - `Replace`: 将所有不重叠的匹配替换为字面量（不展开 `$1` 等引用）
//!
//! ## 依赖关系
//! - 被 `commands/` 与 `pipeline/source.rs` 使用
//! - 使用 `regex::bytes`（按字节匹配，不做 Unicode 规范化）

use crate::error::{FilterError, Result};

use regex::bytes::{NoExpand, Regex};
use std::fs;
use std::path::Path;

/// 变换模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// 仅输出匹配内容
    Select,
    /// 以字面量替换匹配内容
    Replace(Vec<u8>),
}

/// 编译好的正则变换
#[derive(Debug, Clone)]
pub struct Transform {
    regex: Regex,
    mode: Mode,
}

impl Transform {
    /// 编译正则并构造变换
    pub fn new(pattern: &str, mode: Mode) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })?;
        Ok(Self { regex, mode })
    }

    /// 根据 CLI 标志构造变换
    pub fn from_flags(pattern: &str, select: bool, replacement: &str) -> Result<Self> {
        let mode = if select {
            Mode::Select
        } else {
            Mode::Replace(replacement.as_bytes().to_vec())
        };
        Self::new(pattern, mode)
    }

    /// 对内存中的内容执行变换
    pub fn apply(&self, input: &[u8]) -> Vec<u8> {
        match &self.mode {
            Mode::Select => {
                let mut out = Vec::new();
                for m in self.regex.find_iter(input) {
                    out.extend_from_slice(m.as_bytes());
                    out.push(b'\n');
                }
                out
            }
            Mode::Replace(replacement) => self
                .regex
                .replace_all(input, NoExpand(replacement.as_slice()))
                .into_owned(),
        }
    }

    /// 读取整个文件、变换并写入输出路径
    pub fn apply_file(&self, input: &Path, output: &Path) -> Result<()> {
        let content = fs::read(input).map_err(|e| FilterError::FileReadError {
            path: input.display().to_string(),
            source: e,
        })?;

        let filtered = self.apply(&content);

        fs::write(output, filtered).map_err(|e| FilterError::FileWriteError {
            path: output.display().to_string(),
            source: e,
        })
    }
}
