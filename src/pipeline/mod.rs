//! # 并发归档重建流水线
//!
//! 将一串 `(名称, 字节流)` 条目并行打包为多个中间 zip，再顺序合并为
//! 单个输出归档。
//!
//! ## 数据流
//! ```text
//! EntrySource ──entries──▶ Worker × N ──parts──▶ Merger ──▶ output.zip
//!      (有界, 容量 N)          (tmp-part-*)   (有界, 容量 N)
//! ```
//!
//! ## 并发模型
//! - 所有挂起点（收/发）都与共享 `CancelToken` 做 `select!`
//! - 任一任务出错即取消，协调器返回首个错误
//! - worker 之间无共享可变状态，各自持有自己的中间归档
//!
//! ## 依赖关系
//! - 被 `commands/archive.rs` 使用
//! - 子模块: cancel, config, coordinator, entry, group, merger, source, worker

pub mod cancel;
pub mod config;
pub mod coordinator;
pub mod entry;
pub mod group;
pub mod merger;
pub mod source;
pub mod worker;

pub use cancel::CancelToken;
pub use config::PipelineConfig;
pub use coordinator::Coordinator;
pub use merger::MergeReport;
