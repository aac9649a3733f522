//! # 归档合并
//!
//! 按接收顺序读取 `parts` 中的每个中间归档，将其中记录原样（不重新
//! 压缩）拷贝到输出归档，随后删除该中间归档。
//!
//! 输出先写入同目录下的临时文件，全部成功后再改名为目标路径，
//! 失败时目标路径不存在。
//!
//! ## 依赖关系
//! - 被 `pipeline/coordinator.rs` 调用
//! - 使用 `zip` 的 `raw_copy_file`, `tempfile`

use crate::error::{FilterError, Result};

use crossbeam_channel::Receiver;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::{ZipArchive, ZipWriter};

/// 合并统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// 合并的中间归档数
    pub parts: usize,
    /// 写入输出归档的记录数
    pub records: usize,
}

/// 单线程合并器
pub struct Merger {
    output: PathBuf,
}

impl Merger {
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
        }
    }

    /// 读完 `parts`（须已关闭）并写出最终归档
    pub fn merge(&self, parts: &Receiver<PathBuf>) -> Result<MergeReport> {
        let dir = match self.output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staged = tempfile::Builder::new()
            .prefix(".filter-merge-")
            .tempfile_in(&dir)
            .map_err(|e| self.write_err(e))?;

        let mut writer = ZipWriter::new(BufWriter::new(staged));
        let mut report = MergeReport::default();

        for part in parts.iter() {
            report.records += copy_records(&mut writer, &part)?;
            report.parts += 1;
            fs::remove_file(&part).map_err(|e| FilterError::FileWriteError {
                path: part.display().to_string(),
                source: e,
            })?;
        }

        let buffered = writer.finish().map_err(|e| FilterError::ArchiveWrite {
            path: self.output.display().to_string(),
            source: e,
        })?;
        let mut staged = buffered
            .into_inner()
            .map_err(|e| self.write_err(e.into_error()))?;
        staged.flush().map_err(|e| self.write_err(e))?;
        staged
            .persist(&self.output)
            .map_err(|e| self.write_err(e.error))?;

        Ok(report)
    }

    fn write_err(&self, source: std::io::Error) -> FilterError {
        FilterError::FileWriteError {
            path: self.output.display().to_string(),
            source,
        }
    }
}

/// 将一个中间归档的全部记录原样拷贝到输出
fn copy_records<W: Write + std::io::Seek>(writer: &mut ZipWriter<W>, part: &Path) -> Result<usize> {
    let read_err = |e: zip::result::ZipError| FilterError::ArchiveRead {
        path: part.display().to_string(),
        source: e,
    };
    let file = File::open(part).map_err(|e| FilterError::FileReadError {
        path: part.display().to_string(),
        source: e,
    })?;
    let mut archive = ZipArchive::new(file).map_err(read_err)?;

    for i in 0..archive.len() {
        let record = archive.by_index_raw(i).map_err(read_err)?;
        writer
            .raw_copy_file(record)
            .map_err(|e| FilterError::ArchiveWrite {
                path: part.display().to_string(),
                source: e,
            })?;
    }

    Ok(archive.len())
}
