//! # 协调器
//!
//! 持有条目源与 worker 池的生命周期，汇集中间归档路径并在所有
//! 生产者退出后启动合并。
//!
//! ## 关闭顺序
//! - `entries` 只由协调器关闭：条目源任务结束时丢弃唯一的 `EntrySink`
//! - `parts` 只由协调器关闭：作用域结束（所有 worker 已退出）后丢弃
//!   最后一个发送端
//! - 合并在 `parts` 关闭之后开始；任务组失败时不合并
//!
//! ## 依赖关系
//! - 被 `commands/archive.rs` 使用
//! - 使用 `pipeline/` 下的 worker, merger, group, cancel
//! - 使用 `crossbeam-channel`

use super::cancel::CancelToken;
use super::config::PipelineConfig;
use super::entry::{Entry, EntrySink, EntrySource};
use super::group::TaskGroup;
use super::merger::{MergeReport, Merger};
use super::worker::Worker;
use crate::error::Result;

use crossbeam_channel::bounded;
use std::path::PathBuf;
use std::thread;

/// 归档重建协调器
pub struct Coordinator<S> {
    source: S,
    config: PipelineConfig,
    cancel: CancelToken,
}

impl<S: EntrySource> Coordinator<S> {
    pub fn new(source: S, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// 在给定令牌下运行（外部取消会中止流水线）
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 运行完整流水线：打包 → 等待 → 合并
    pub fn run(self) -> Result<MergeReport> {
        let Coordinator {
            mut source,
            config,
            cancel,
        } = self;
        let workers = config.worker_count();

        let (entry_tx, entry_rx) = bounded::<Entry>(workers);
        let (part_tx, part_rx) = bounded::<PathBuf>(workers);

        let group = TaskGroup::new(cancel);
        thread::scope(|s| {
            for id in 0..workers {
                let entries = entry_rx.clone();
                let parts = part_tx.clone();
                let worker = Worker::new(id, &config);
                group.spawn(s, move |cancel| worker.run(cancel, &entries, &parts));
            }

            let sink = EntrySink::new(entry_tx, group.token().clone());
            group.spawn(s, move |_| {
                let sink = sink;
                source.produce(&sink)
            });
        });
        drop(entry_rx);
        group.finish()?;

        drop(part_tx);
        Merger::new(&config.output).merge(&part_rx)
    }
}
