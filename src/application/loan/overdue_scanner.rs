use crate::ports::Clock;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::errors::{NotificationFailed, Result};
use super::loan_service::{ServiceDependencies, list_due_soon};
use super::notification;

/// 返却期限通知バッチの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerSettings {
    /// 実行間隔
    pub period: Duration,
    /// 返却期限がこの範囲に入る貸出を通知対象とする
    pub horizon: chrono::Duration,
    /// 1件の通知（通知先の取得 + 送信）のタイムアウト
    pub notification_timeout: Duration,
    /// 同時に送信する通知の数
    pub concurrency: usize,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(24 * 60 * 60),
            horizon: chrono::Duration::hours(24),
            notification_timeout: Duration::from_secs(10),
            concurrency: 4,
        }
    }
}

/// 1回の実行結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// 返却期限が近い貸出の件数
    pub due_soon: usize,
    /// 通知できた件数
    pub notified: usize,
    /// 通知先がないためスキップした件数
    pub skipped: usize,
    /// 通知に失敗した件数
    pub failed: usize,
}

/// 返却期限通知バッチ
///
/// 定期的に実行され、返却期限が近い貸出の利用者にリマインダーを送る。
///
/// ビジネスルール：
/// - 対象は貸出中かつ返却期限が [now, now + horizon) の貸出
/// - 通知先は UserLookup で利用者ごとに解決する
/// - 1件の失敗で残りの通知を止めない（ログに記録して続行）
/// - 1件ごとにタイムアウトを設け、遅い通知で周期全体を止めない
pub struct OverdueScanner {
    deps: ServiceDependencies,
    clock: Arc<dyn Clock>,
    settings: ScannerSettings,
}

impl OverdueScanner {
    pub fn new(deps: ServiceDependencies, clock: Arc<dyn Clock>, settings: ScannerSettings) -> Self {
        Self {
            deps,
            clock,
            settings,
        }
    }

    /// 1回分の走査を同期的に実行する
    ///
    /// # エラー
    /// 返却期限が近い貸出の取得に失敗した場合のみ。個々の通知の失敗は
    /// `ScanReport` に集計される。
    pub async fn tick(&self) -> Result<ScanReport> {
        let now = self.clock.now();
        let loans = list_due_soon(&self.deps, now, self.settings.horizon).await?;

        let mut report = ScanReport {
            due_soon: loans.len(),
            ..ScanReport::default()
        };

        let deps = &self.deps;
        let limit = self.settings.notification_timeout;
        let outcomes: Vec<_> = stream::iter(loans)
            .map(|loan| async move {
                let notice = notification::due_soon_reminder(&loan);
                let result = notification::deliver_notice(
                    deps.user_lookup.as_ref(),
                    deps.notifier.as_ref(),
                    loan.user_id,
                    &notice,
                    limit,
                )
                .await;
                (loan, result)
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        for (loan, result) in outcomes {
            match result {
                Ok(()) => report.notified += 1,
                Err(NotificationFailed::NoContactAddress(user_id)) => {
                    tracing::warn!(
                        loan_id = %loan.loan_id,
                        user_id = %user_id,
                        "Skipping reminder: borrower has no contact address"
                    );
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(loan_id = %loan.loan_id, "Reminder failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// バックグラウンドタスクとして起動する
    ///
    /// 起動直後に1回走査し、以降は `period` ごとに走査する。
    /// 返されたハンドルの `stop()` で停止する。ハンドルを破棄した場合も停止する。
    pub fn spawn(self) -> ScannerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.settings.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(period = ?self.settings.period, "Overdue scanner started");

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => match self.tick().await {
                        Ok(report) => tracing::info!(
                            due_soon = report.due_soon,
                            notified = report.notified,
                            skipped = report.skipped,
                            failed = report.failed,
                            "Overdue scan completed"
                        ),
                        Err(e) => tracing::error!("Overdue scan failed: {}", e),
                    },
                }
            }

            tracing::info!("Overdue scanner stopped");
        });

        ScannerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// 起動中の返却期限通知バッチのハンドル
pub struct ScannerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ScannerHandle {
    /// 停止を要求し、実行中の走査の完了を待つ
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!("Overdue scanner task failed: {}", e);
        }
    }
}
