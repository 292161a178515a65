//! Dispatcher 指标导出模块
//!
//! 将 DispatchStats 快照写入 `metrics` facade。

use contracts::DispatchStats;
use metrics::{counter, gauge};

/// 从 DispatchStats 记录指标
///
/// 计数器是累计值，使用 `absolute` 写入，重复调用是安全的。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_dispatch_stats;
///
/// record_dispatch_stats(&dispatcher.stats());
/// ```
pub fn record_dispatch_stats(stats: &DispatchStats) {
    gauge!("metric_emitter_queue_len").set(stats.queue_len as f64);

    counter!("metric_emitter_points_accepted_total").absolute(stats.accepted);
    counter!("metric_emitter_points_sent_total").absolute(stats.sent_points);
    counter!("metric_emitter_batches_sent_total").absolute(stats.sent_batches);
    counter!("metric_emitter_transport_failures_total").absolute(stats.transport_failures);

    // 丢弃原因分开统计
    counter!("metric_emitter_points_dropped_total", "reason" => "queue_full")
        .absolute(stats.dropped);
    counter!("metric_emitter_points_dropped_total", "reason" => "invalid")
        .absolute(stats.rejected);
    counter!("metric_emitter_points_dropped_total", "reason" => "requeue_overflow")
        .absolute(stats.requeue_dropped);
}

/// 投递率 (已发送 / 已接收)
pub fn delivery_ratio(stats: &DispatchStats) -> f64 {
    if stats.accepted == 0 {
        return 1.0;
    }
    stats.sent_points as f64 / stats.accepted as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_dispatch_stats(&DispatchStats::default());
    }

    #[test]
    fn test_delivery_ratio() {
        assert_eq!(delivery_ratio(&DispatchStats::default()), 1.0);

        let stats = DispatchStats {
            accepted: 4,
            sent_points: 3,
            ..DispatchStats::default()
        };
        assert_eq!(delivery_ratio(&stats), 0.75);
    }
}
