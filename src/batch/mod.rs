//! # 批量处理模块
//!
//! 目录模式下的文件收集与并行处理。
//!
//! ## 功能
//! - 收集匹配文件列表（单层或递归）
//! - 有界并行处理
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/directory.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchRunner, ProcessResult};
