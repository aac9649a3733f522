//! # 任务组
//!
//! 在 `std::thread::scope` 上派生任务，所有任务共享同一个取消令牌。
//! 任一任务返回错误（或 panic）即触发取消；`finish()` 在所有任务
//! 退出后返回最先记录的错误，其余错误被丢弃。
//!
//! 若先记录的是取消错误而后到达真正的失败原因，以后者为准。
//!
//! panic 转为 `TaskPanicked` 只在 `panic = "unwind"` 下生效（调试构建与
//! 测试）；release 配置为 `panic = "abort"`，任务 panic 直接终止进程。
//!
//! ## 依赖关系
//! - 被 `pipeline/coordinator.rs` 使用
//! - 使用 `pipeline/cancel.rs`

use super::cancel::CancelToken;
use crate::error::{FilterError, Result};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread::Scope;

/// 首错优先的任务组
pub struct TaskGroup {
    cancel: CancelToken,
    first: Mutex<Option<FilterError>>,
}

impl TaskGroup {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            cancel,
            first: Mutex::new(None),
        }
    }

    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }

    /// 在作用域内派生一个任务
    pub fn spawn<'scope, 'env, F>(&'env self, scope: &'scope Scope<'scope, 'env>, task: F)
    where
        F: FnOnce(&CancelToken) -> Result<()> + Send + 'scope,
    {
        scope.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(&self.cancel)));
            let result = match outcome {
                Ok(result) => result,
                Err(payload) => Err(FilterError::TaskPanicked(panic_message(&*payload))),
            };
            if let Err(e) = result {
                self.record(e);
            }
        });
    }

    fn record(&self, err: FilterError) {
        {
            let mut slot = self
                .first
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let replace = match slot.as_ref() {
                None => true,
                Some(current) => current.is_cancelled() && !err.is_cancelled(),
            };
            if replace {
                *slot = Some(err);
            }
        }
        self.cancel.cancel();
    }

    /// 取出聚合结果；须在作用域结束（所有任务已退出）之后调用
    pub fn finish(self) -> Result<()> {
        let first = self
            .first
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match first {
            Some(err) => Err(err),
            None if self.cancel.is_cancelled() => Err(FilterError::Cancelled),
            None => Ok(()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_all_ok() {
        let group = TaskGroup::new(CancelToken::new());
        let ran = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..4 {
                group.spawn(s, |_| {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            }
        });
        assert_eq!(ran.load(Ordering::SeqCst), 4);
        assert!(group.finish().is_ok());
    }

    #[test]
    fn test_error_cancels_siblings() {
        let group = TaskGroup::new(CancelToken::new());
        thread::scope(|s| {
            group.spawn(s, |cancel| {
                cancel.done().recv().ok();
                Err(FilterError::Cancelled)
            });
            group.spawn(s, |_| Err(FilterError::InvalidArgument("boom".to_string())));
        });
        assert!(group.token().is_cancelled());
        match group.finish() {
            Err(FilterError::InvalidArgument(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_first_error_wins() {
        let group = TaskGroup::new(CancelToken::new());
        thread::scope(|s| {
            group.spawn(s, |_| Err(FilterError::InvalidArgument("first".to_string())));
            group.spawn(s, |cancel| {
                // 第一个错误记录之后才会触发取消
                cancel.done().recv().ok();
                Err(FilterError::InvalidArgument("second".to_string()))
            });
        });
        match group.finish() {
            Err(FilterError::InvalidArgument(msg)) => assert_eq!(msg, "first"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_real_error_replaces_cancellation() {
        let group = TaskGroup::new(CancelToken::new());
        group.record(FilterError::Cancelled);
        group.record(FilterError::ChannelClosed("parts"));
        assert!(matches!(
            group.finish(),
            Err(FilterError::ChannelClosed("parts"))
        ));
    }

    #[test]
    fn test_external_cancel_surfaces_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let group = TaskGroup::new(token);
        thread::scope(|s| {
            group.spawn(s, |_| Ok(()));
        });
        assert!(matches!(group.finish(), Err(FilterError::Cancelled)));
    }

    #[test]
    fn test_panic_becomes_error() {
        let group = TaskGroup::new(CancelToken::new());
        thread::scope(|s| {
            group.spawn(s, |_| panic!("worker exploded"));
        });
        match group.finish() {
            Err(FilterError::TaskPanicked(msg)) => assert!(msg.contains("worker exploded")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
