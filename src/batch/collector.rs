//! # 文件收集器
//!
//! 根据输入目录和模式收集待处理文件列表。
//!
//! ## 功能
//! - `--directory`: 仅处理目录第一层
//! - `--recursive`: 递归遍历整棵目录树
//! - glob 模式匹配文件名
//! - 排除指定目录（如位于输入树内的输出目录）
//!
//! ## 依赖关系
//! - 被 `commands/directory.rs` 调用
//! - 使用 `walkdir` 遍历目录, `glob` 匹配文件名

use crate::error::{FilterError, Result};

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入目录
    root: PathBuf,
    /// 匹配模式（None 表示全部匹配）
    pattern: Option<Pattern>,
    /// 是否递归
    recursive: bool,
    /// 跳过的子树
    exclude: Vec<PathBuf>,
}

impl FileCollector {
    /// 创建新的文件收集器（默认匹配所有文件、不递归）
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            pattern: None,
            recursive: false,
            exclude: Vec::new(),
        }
    }

    /// 设置文件名匹配模式
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern).map_err(|e| {
            FilterError::InvalidArgument(format!("Invalid pattern '{}': {}", pattern, e))
        })?;
        self.pattern = Some(compiled);
        Ok(self)
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 跳过某个子树
    pub fn exclude(mut self, path: impl AsRef<Path>) -> Self {
        self.exclude.push(path.as_ref().to_path_buf());
        self
    }

    /// 收集所有匹配的普通文件（按路径排序）
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(FilterError::DirectoryNotFound {
                path: self.root.display().to_string(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e.path()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches(e.path()))
            .map(|e| e.into_path())
            .collect();

        files.sort();
        Ok(files)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|ex| path.starts_with(ex))
    }

    /// 检查文件名是否匹配模式
    fn matches(&self, path: &Path) -> bool {
        let Some(pattern) = &self.pattern else {
            return true;
        };
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => pattern.matches(name),
            None => false,
        }
    }
}
