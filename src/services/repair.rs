//! 后台回填任务调度
//!
//! 回填任务挂在进程级的 `TaskTracker` 上，与发起请求的 handler 生命周期无关：
//! 客户端断开导致 handler future 被丢弃时，已提交的回填仍会继续执行

use std::future::Future;
use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

pub struct RepairScheduler {
    tracker: TaskTracker,
}

impl RepairScheduler {
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
        }
    }

    /// 提交一个回填任务，立即返回
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    /// 尚未完成的回填任务数
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// 等待所有已提交的回填任务完成
    ///
    /// 返回 false 表示超时，仍有任务未完成。等待结束后调度器重新开放，
    /// 之后提交的任务照常执行
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            debug!("Waiting for {} repair task(s) to finish", pending);
        }

        let finished = tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok();
        if !finished {
            warn!(
                "Repair drain timed out after {:?}, {} task(s) still running",
                timeout,
                self.tracker.len()
            );
        }

        self.tracker.reopen();
        finished
    }
}

impl Default for RepairScheduler {
    fn default() -> Self {
        Self::new()
    }
}
