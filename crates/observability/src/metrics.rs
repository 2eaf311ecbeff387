//! Clock sync 指标收集模块
//!
//! 基于 Sample 与 OffsetUpdated 事件收集和统计同步引擎的运行指标。

use contracts::{OffsetUpdated, Sample, UpdateKind};
use metrics::{counter, gauge, histogram};

/// 记录一次同步周期启动
pub fn record_cycle_started(source: &str) {
    counter!("clock_sync_cycles_total", "source" => source.to_string()).increment(1);
}

/// 记录一个成功的往返样本
///
/// 延迟与 offset 均以毫秒记录。
pub fn record_sample(source: &str, sample: &Sample) {
    counter!("clock_sync_samples_total", "source" => source.to_string()).increment(1);
    histogram!(
        "clock_sync_round_trip_latency_ms",
        "source" => source.to_string()
    )
    .record(sample.round_trip_latency * 1000.0);
    histogram!(
        "clock_sync_sample_offset_ms",
        "source" => source.to_string()
    )
    .record(sample.offset * 1000.0);
}

/// 记录一次 provider 失败
pub fn record_provider_failure(source: &str, provider: &str) {
    counter!(
        "clock_sync_provider_failures_total",
        "source" => source.to_string(),
        "provider" => provider.to_string()
    )
    .increment(1);
}

/// 从 OffsetUpdated 事件记录指标
///
/// 每次引擎重新计算 offset 并发布事件时调用。
pub fn record_offset_update(event: &OffsetUpdated) {
    counter!(
        "clock_sync_updates_total",
        "source" => event.source.clone(),
        "kind" => kind_label(event.kind)
    )
    .increment(1);

    gauge!("clock_sync_sample_count", "source" => event.source.clone())
        .set(event.sample_count as f64);

    // 尚无样本时不覆盖上一次的 offset
    if let Some(offset) = event.offset {
        gauge!("clock_sync_offset_ms", "source" => event.source.clone()).set(offset * 1000.0);
    }
}

fn kind_label(kind: UpdateKind) -> &'static str {
    match kind {
        UpdateKind::Partial => "partial",
        UpdateKind::Final => "final",
    }
}

/// 同步指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SyncMetricsAggregator {
    /// 部分更新次数
    pub partial_updates: u64,

    /// 最终更新次数
    pub final_updates: u64,

    /// 没有得到任何 offset 的最终更新次数
    pub final_without_offset: u64,

    /// 最近一次 offset (秒)
    pub last_offset: Option<f64>,

    /// 往返延迟统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 样本 offset 统计 (毫秒)
    pub sample_offset_stats: RunningStats,

    /// 最终 offset 统计 (毫秒)，用于观察多轮同步之间的漂移
    pub final_offset_stats: RunningStats,
}

impl SyncMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新事件统计
    pub fn update(&mut self, event: &OffsetUpdated) {
        match event.kind {
            UpdateKind::Partial => self.partial_updates += 1,
            UpdateKind::Final => {
                self.final_updates += 1;
                match event.offset {
                    Some(offset) => self.final_offset_stats.push(offset * 1000.0),
                    None => self.final_without_offset += 1,
                }
            }
        }
        if event.offset.is_some() {
            self.last_offset = event.offset;
        }
    }

    /// 更新样本统计
    pub fn record_samples(&mut self, samples: &[Sample]) {
        for sample in samples {
            self.latency_stats.push(sample.round_trip_latency * 1000.0);
            self.sample_offset_stats.push(sample.offset * 1000.0);
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            partial_updates: self.partial_updates,
            final_updates: self.final_updates,
            final_without_offset: self.final_without_offset,
            last_offset_ms: self.last_offset.map(|o| o * 1000.0),
            latency_ms: StatsSummary::from(&self.latency_stats),
            sample_offset_ms: StatsSummary::from(&self.sample_offset_stats),
            final_offset_ms: StatsSummary::from(&self.final_offset_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub partial_updates: u64,
    pub final_updates: u64,
    pub final_without_offset: u64,
    pub last_offset_ms: Option<f64>,
    pub latency_ms: StatsSummary,
    pub sample_offset_ms: StatsSummary,
    pub final_offset_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Clock Sync Summary ===")?;
        match self.last_offset_ms {
            Some(offset) => writeln!(f, "Offset: {:+.3} ms", offset)?,
            None => writeln!(f, "Offset: unknown")?,
        }
        writeln!(
            f,
            "Updates: {} partial, {} final ({} without offset)",
            self.partial_updates, self.final_updates, self.final_without_offset
        )?;
        writeln!(f, "Round-trip latency (ms): {}", self.latency_ms)?;
        writeln!(f, "Sample offset (ms): {}", self.sample_offset_ms)?;
        if self.final_offset_ms.count > 1 {
            writeln!(f, "Final offset across runs (ms): {}", self.final_offset_ms)?;
        }
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
