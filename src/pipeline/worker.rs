//! # 打包 worker
//!
//! 每个 worker 在工作目录中创建一个唯一命名的中间归档，不断从
//! `entries` 接收条目写入，直到通道关闭或取消；随后封存归档并把
//! 路径发布到 `parts`。
//!
//! ## 错误语义
//! - 单个 worker 内首错优先：写条目失败后停止接收，封存阶段的错误
//!   仅在此前没有错误时采用
//! - 条目的字节流在任何路径上都会被关闭
//! - 取消时中间归档留在磁盘上，不做清理
//!
//! ## 依赖关系
//! - 被 `pipeline/coordinator.rs` 使用
//! - 使用 `zip` 写归档, `tempfile` 分配唯一文件名, `crossbeam-channel`

use super::cancel::CancelToken;
use super::config::{PipelineConfig, PART_PREFIX};
use super::entry::Entry;
use crate::error::{FilterError, Result};

use crossbeam_channel::{select, Receiver, Sender};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// 单个打包 worker
pub struct Worker<'a> {
    id: usize,
    config: &'a PipelineConfig,
}

impl<'a> Worker<'a> {
    pub fn new(id: usize, config: &'a PipelineConfig) -> Self {
        Self { id, config }
    }

    /// 运行 worker 直到 `entries` 关闭或取消
    pub fn run(
        &self,
        cancel: &CancelToken,
        entries: &Receiver<Entry>,
        parts: &Sender<PathBuf>,
    ) -> Result<()> {
        let (file, path) = create_part(&self.config.work_dir, self.id)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        let options = self.config.file_options();

        let mut first_err: Option<FilterError> = None;
        loop {
            let entry = select! {
                recv(cancel.done()) -> _ => {
                    first_err = Some(FilterError::Cancelled);
                    break;
                }
                recv(entries) -> msg => match msg {
                    Ok(entry) => entry,
                    Err(_) => break,
                },
            };

            if let Err(e) = write_entry(&mut writer, entry, options, &path) {
                first_err = Some(e);
                break;
            }
        }

        if let Err(e) = seal(writer, &path) {
            first_err.get_or_insert(e);
        }

        if let Some(e) = first_err {
            return Err(e);
        }

        select! {
            recv(cancel.done()) -> _ => Err(FilterError::Cancelled),
            send(parts, path) -> res => res.map_err(|_| FilterError::ChannelClosed("parts")),
        }
    }
}

/// 在工作目录中创建 `tmp-part-<id>-*` 文件并保留（不随句柄删除）
fn create_part(work_dir: &Path, id: usize) -> Result<(File, PathBuf)> {
    let map_err = |e: io::Error| FilterError::IntermediateCreate {
        dir: work_dir.display().to_string(),
        source: e,
    };
    let tmp = tempfile::Builder::new()
        .prefix(&format!("{}{}-", PART_PREFIX, id))
        .tempfile_in(work_dir)
        .map_err(map_err)?;
    tmp.keep().map_err(|e| map_err(e.error))
}

/// 写入一个条目；无论成败，条目的字节流都会被关闭
fn write_entry<W: Write + io::Seek>(
    writer: &mut ZipWriter<W>,
    mut entry: Entry,
    options: SimpleFileOptions,
    part: &Path,
) -> Result<()> {
    let result = match writer.start_file(entry.name.as_str(), options) {
        Ok(()) => io::copy(&mut entry.content, writer)
            .map(|_| ())
            .map_err(|e| FilterError::EntryWrite {
                name: entry.name.clone(),
                path: part.display().to_string(),
                source: e,
            }),
        Err(e) => Err(FilterError::ArchiveWrite {
            path: part.display().to_string(),
            source: e,
        }),
    };
    drop(entry);
    result
}

/// 写出中央目录、刷新缓冲并关闭文件
fn seal(writer: ZipWriter<BufWriter<File>>, part: &Path) -> Result<()> {
    let buffered = writer.finish().map_err(|e| FilterError::ArchiveWrite {
        path: part.display().to_string(),
        source: e,
    })?;
    let file = buffered
        .into_inner()
        .map_err(|e| FilterError::FileWriteError {
            path: part.display().to_string(),
            source: e.into_error(),
        })?;
    drop(file);
    Ok(())
}
