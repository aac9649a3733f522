//! # 条目与条目源
//!
//! `Entry` 是待归档的 `(名称, 字节流)`；`EntrySource` 惰性地把条目
//! 推入 `EntrySink`。
//!
//! 条目源只借用 sink，无法关闭 `entries` 通道；关闭由协调器在条目源
//! 返回后丢弃 sink 完成。
//!
//! ## 依赖关系
//! - 被 `pipeline/worker.rs`, `pipeline/coordinator.rs`, `pipeline/source.rs` 使用
//! - 使用 `crossbeam-channel`

use super::cancel::CancelToken;
use crate::error::{FilterError, Result};

use crossbeam_channel::{select, Sender};
use std::fmt;
use std::io::{Cursor, Read};

/// 待归档条目
///
/// 接收条目的 worker 拥有其字节流，丢弃即关闭。
pub struct Entry {
    /// 归档内的逻辑文件名
    pub name: String,
    /// 条目内容
    pub content: Box<dyn Read + Send>,
}

impl Entry {
    pub fn new(name: impl Into<String>, content: impl Read + Send + 'static) -> Self {
        Self {
            name: name.into(),
            content: Box::new(content),
        }
    }

    /// 由内存字节构造
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, Cursor::new(bytes.into()))
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry").field("name", &self.name).finish()
    }
}

/// `entries` 通道的发送端，附带取消令牌
pub struct EntrySink {
    tx: Sender<Entry>,
    cancel: CancelToken,
}

impl EntrySink {
    pub fn new(tx: Sender<Entry>, cancel: CancelToken) -> Self {
        Self { tx, cancel }
    }

    /// 推送一个条目，在“被接收”与“已取消”之间择一
    ///
    /// 取消时条目被丢弃（其字节流随之关闭）。
    pub fn push(&self, entry: Entry) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(FilterError::Cancelled);
        }
        select! {
            recv(self.cancel.done()) -> _ => Err(FilterError::Cancelled),
            send(self.tx, entry) -> res => res.map_err(|_| FilterError::ChannelClosed("entries")),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// 条目源
pub trait EntrySource: Send {
    /// 将全部条目推入 sink，直到耗尽、取消或出错
    fn produce(&mut self, sink: &EntrySink) -> Result<()>;
}

/// 内存条目列表
#[cfg(test)]
#[derive(Debug, Default)]
pub struct VecSource {
    entries: Vec<Entry>,
}

#[cfg(test)]
impl VecSource {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
impl EntrySource for VecSource {
    fn produce(&mut self, sink: &EntrySink) -> Result<()> {
        for entry in self.entries.drain(..) {
            sink.push(entry)?;
        }
        Ok(())
    }
}

impl<S: EntrySource + ?Sized> EntrySource for Box<S> {
    fn produce(&mut self, sink: &EntrySink) -> Result<()> {
        (**self).produce(sink)
    }
}

/// 以闭包实现的条目源
#[cfg(test)]
pub struct FnSource<F>(F);

#[cfg(test)]
impl<F> FnSource<F>
where
    F: FnMut(&EntrySink) -> Result<()> + Send,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[cfg(test)]
impl<F> EntrySource for FnSource<F>
where
    F: FnMut(&EntrySink) -> Result<()> + Send,
{
    fn produce(&mut self, sink: &EntrySink) -> Result<()> {
        (self.0)(sink)
    }
}
