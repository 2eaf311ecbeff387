//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 → 时间源 → 引擎 的装配测试
//! - 模拟服务器 e2e 测试 (暂停时间，结果可复现)
//! - 本地 RFC 868 服务器 e2e 测试

#[cfg(test)]
mod settings_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::SourceConfig;
    use sync_engine::{ClockSync, LocalClock, MonotonicClock, RemoteTimeProvider};
    use time_source::TimeSource;

    /// 配置文件中的参数应完整地流入引擎与时间源
    #[tokio::test(start_paused = true)]
    async fn test_settings_build_engine() {
        let content = r#"
[clock_sync]
max_samples = 4
interval_ms = 20
max_consecutive_errors = 1
event_name = "integration.did_update"

[source]
kind = "simulated"
true_offset_s = 90.0
max_send_ms = 10
max_receive_ms = 10
fixed_latency = true
"#;
        let settings = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        assert!(matches!(settings.source, SourceConfig::Simulated(_)));

        let clock = MonotonicClock::anchored_at(10_000.0);
        let source = TimeSource::from_config(&settings.source, clock);
        let sync = ClockSync::with_clock(settings.clock_sync, source, clock).unwrap();
        assert_eq!(sync.provider().name(), "simulated");

        let mut updates = sync.subscribe();
        assert!(sync.start());

        let first = updates.recv().await.unwrap();
        assert_eq!(first.source, "integration.did_update");
        assert!(!first.is_final());

        let last = updates.recv().await.unwrap();
        assert!(last.is_final());
        assert_eq!(last.sample_count, 4);
        assert!((last.offset.unwrap() - 90.0).abs() < 1e-6);
        assert!((sync.current_time() - clock.now() - 90.0).abs() < 1e-6);
    }
}

#[cfg(test)]
mod simulated_e2e_tests {
    use contracts::SimulatedSourceConfig;
    use observability::SyncMetricsAggregator;
    use sync_engine::{ClockSync, ClockSyncConfig, LocalClock, MonotonicClock, OffsetUpdated};
    use time_source::SimulatedTimeSource;

    const TRUE_OFFSET: f64 = -2000.0;

    fn jittery_source(clock: MonotonicClock, seed: u64) -> SimulatedTimeSource<MonotonicClock> {
        SimulatedTimeSource::new(
            SimulatedSourceConfig {
                true_offset_s: TRUE_OFFSET,
                max_send_ms: 500,
                max_receive_ms: 750,
                fixed_latency: false,
                failure_rate: 0.0,
                seed: Some(seed),
            },
            clock,
        )
    }

    async fn run_to_final(
        sync: &ClockSync<SimulatedTimeSource<MonotonicClock>>,
        aggregator: &mut SyncMetricsAggregator,
    ) -> OffsetUpdated {
        let mut updates = sync.subscribe();
        assert!(sync.start());
        loop {
            let update = updates.recv().await.unwrap();
            aggregator.update(&update);
            if update.is_final() {
                return update;
            }
        }
    }

    /// 不对称随机延迟下，估计误差受半个往返延迟约束
    #[tokio::test(start_paused = true)]
    async fn test_estimate_within_half_round_trip() {
        let clock = MonotonicClock::anchored_at(1_700_000_000.0);
        let config = ClockSyncConfig {
            max_samples: 10,
            interval_ms: 50,
            ..Default::default()
        };
        let sync = ClockSync::with_clock(config, jittery_source(clock, 42), clock).unwrap();
        let mut aggregator = SyncMetricsAggregator::new();

        let update = run_to_final(&sync, &mut aggregator).await;
        let samples = sync.samples();
        assert_eq!(samples.len(), 10);
        assert_eq!(update.sample_count, 10);

        let worst_half_rtt = samples
            .iter()
            .map(|s| s.round_trip_latency / 2.0)
            .fold(0.0, f64::max);
        let error = (update.offset.unwrap() - TRUE_OFFSET).abs();
        assert!(error <= worst_half_rtt + 1e-6, "error {error} > {worst_half_rtt}");

        aggregator.record_samples(&samples);
        let summary = aggregator.summary();
        assert_eq!(summary.partial_updates, 1);
        assert_eq!(summary.final_updates, 1);
        assert_eq!(summary.latency_ms.count, 10);
        assert!(summary.latency_ms.max < 1250.0);
    }

    /// 同一 seed 重放得到完全相同的估计
    #[tokio::test(start_paused = true)]
    async fn test_rewound_source_reproduces_estimate() {
        let clock = MonotonicClock::anchored_at(1_700_000_000.0);
        let config = ClockSyncConfig {
            max_samples: 6,
            interval_ms: 100,
            ..Default::default()
        };
        let sync = ClockSync::with_clock(config, jittery_source(clock, 7), clock).unwrap();
        let mut aggregator = SyncMetricsAggregator::new();

        let first = run_to_final(&sync, &mut aggregator).await;
        let first_samples = sync.samples();

        sync.reset(false);
        assert_eq!(sync.current_offset(), first.offset);
        sync.provider().rewind();

        let second = run_to_final(&sync, &mut aggregator).await;
        assert!((second.offset.unwrap() - first.offset.unwrap()).abs() < 1e-6);
        assert_eq!(sync.provider().request_count(), 6);

        let second_samples = sync.samples();
        assert_eq!(second_samples.len(), first_samples.len());
        for (a, b) in first_samples.iter().zip(&second_samples) {
            assert!((a.offset - b.offset).abs() < 1e-6);
            assert!((a.round_trip_latency - b.round_trip_latency).abs() < 1e-6);
        }

        let summary = aggregator.summary();
        assert_eq!(summary.final_updates, 2);
        assert!(summary.final_offset_ms.std_dev < 1e-3);
    }

    /// 健康源收满样本；持续失败的源在预算耗尽后以无估计结束
    #[tokio::test(start_paused = true)]
    async fn test_healthy_and_failing_sources() {
        let clock = MonotonicClock::anchored_at(1_000.0);
        let source = SimulatedTimeSource::symmetric(3.0, 25, clock);
        let config = ClockSyncConfig {
            max_samples: 5,
            interval_ms: 10,
            max_consecutive_errors: 2,
            ..Default::default()
        };
        let sync = ClockSync::with_clock(config, source, clock).unwrap();
        let mut aggregator = SyncMetricsAggregator::new();

        let update = run_to_final(&sync, &mut aggregator).await;
        assert_eq!(update.sample_count, 5);

        // A failing source on a second engine gives up with no estimate.
        let failing = SimulatedTimeSource::always_failing(clock);
        let config = ClockSyncConfig {
            max_consecutive_errors: 3,
            interval_ms: 10,
            ..Default::default()
        };
        let failing_sync = ClockSync::with_clock(config, failing, clock).unwrap();
        let update = run_to_final(&failing_sync, &mut aggregator).await;
        assert_eq!(update.offset, None);
        assert_eq!(update.sample_count, 0);
        assert_eq!(failing_sync.provider().request_count(), 3);
        assert_eq!(failing_sync.current_time(), clock.now());
    }

    /// 强制失败只消耗预算，不影响最终结果
    #[tokio::test(start_paused = true)]
    async fn test_forced_failures_within_budget() {
        let clock = MonotonicClock::anchored_at(1_000.0);
        let source = SimulatedTimeSource::symmetric(-0.25, 5, clock).fail_next(1);
        let config = ClockSyncConfig {
            max_samples: 3,
            interval_ms: 0,
            max_consecutive_errors: 2,
            ..Default::default()
        };
        let sync = ClockSync::with_clock(config, source, clock).unwrap();
        let mut aggregator = SyncMetricsAggregator::new();

        let update = run_to_final(&sync, &mut aggregator).await;
        assert_eq!(update.sample_count, 3);
        assert!((update.offset.unwrap() + 0.25).abs() < 1e-6);
        assert_eq!(sync.provider().request_count(), 4);
    }
}

#[cfg(test)]
mod rfc868_e2e_tests {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use sync_engine::{ClockSync, ClockSyncConfig};
    use time_source::{unix_to_rfc868, Rfc868TimeSource};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// 本地 RFC 868 服务器，返回 `系统时间 + skew_s`
    async fn spawn_time_server(skew_s: u64) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
                let raw = unix_to_rfc868(now + skew_s);
                let _ = stream.write_all(&raw.to_be_bytes()).await;
            }
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_offset_against_local_server() {
        let (addr, server) = spawn_time_server(3600).await;
        let source = Rfc868TimeSource::new(addr, Duration::from_secs(1));
        let config = ClockSyncConfig {
            max_samples: 5,
            interval_ms: 10,
            request_timeout_ms: Some(1000),
            ..Default::default()
        };
        let sync = ClockSync::new(config, source).unwrap();

        let mut updates = sync.subscribe();
        assert!(sync.start());
        let update = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let update = updates.recv().await.unwrap();
                if update.is_final() {
                    return update;
                }
            }
        })
        .await
        .unwrap();

        // One-second resolution: the server truncates, so the estimate sits just below 3600.
        let offset = update.offset.unwrap();
        assert!((3598.5..=3601.0).contains(&offset), "offset {offset}");
        assert_eq!(update.sample_count, 5);

        let server_now = sync
            .server_time()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();
        let local_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();
        assert!((server_now - local_now - 3600.0).abs() < 1.5);

        server.abort();
    }

    #[tokio::test]
    async fn test_unreachable_server_gives_up() {
        // Bind then drop to get a port with nothing listening.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let source = Rfc868TimeSource::new(addr, Duration::from_millis(500));
        let config = ClockSyncConfig {
            interval_ms: 10,
            max_consecutive_errors: 1,
            ..Default::default()
        };
        let sync = ClockSync::new(config, source).unwrap();

        let mut updates = sync.subscribe();
        assert!(sync.start());
        let update = tokio::time::timeout(Duration::from_secs(10), updates.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(update.is_final());
        assert_eq!(update.offset, None);
        assert!(!sync.is_syncing());
    }
}
