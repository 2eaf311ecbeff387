//! 模拟远端时钟
//!
//! 用于无真实时间服务器环境的测试。每次请求先等待发送延迟，在远端按
//! `本地时间 + true_offset_s` 打时间戳，再等待接收延迟后返回。

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use contracts::{LocalClock, ProviderError, RemoteTimeProvider, SimulatedSourceConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::sleep;
use tracing::trace;

/// 单次请求的抽样结果
#[derive(Debug, Clone, Copy)]
struct Draw {
    send: Duration,
    receive: Duration,
    fail: bool,
}

/// 模拟时间源
///
/// 使用与引擎相同的本地时钟，从而让 offset 估计可被精确验证。
pub struct SimulatedTimeSource<C> {
    config: SimulatedSourceConfig,
    clock: C,
    rng: Mutex<StdRng>,
    /// 接下来必定失败的请求数
    forced_failures: AtomicU32,
    requests: AtomicU64,
}

impl<C: LocalClock> SimulatedTimeSource<C> {
    /// 创建新的模拟时间源
    pub fn new(config: SimulatedSourceConfig, clock: C) -> Self {
        let rng = Self::make_rng(config.seed);
        Self {
            config,
            clock,
            rng: Mutex::new(rng),
            forced_failures: AtomicU32::new(0),
            requests: AtomicU64::new(0),
        }
    }

    /// 固定对称延迟的模拟源
    pub fn symmetric(true_offset_s: f64, one_way_ms: u64, clock: C) -> Self {
        Self::new(
            SimulatedSourceConfig {
                true_offset_s,
                max_send_ms: one_way_ms,
                max_receive_ms: one_way_ms,
                fixed_latency: true,
                ..Default::default()
            },
            clock,
        )
    }

    /// 每次请求都失败的模拟源
    pub fn always_failing(clock: C) -> Self {
        Self::new(
            SimulatedSourceConfig {
                failure_rate: 1.0,
                ..Default::default()
            },
            clock,
        )
    }

    /// 接下来 `count` 次请求必定失败
    pub fn fail_next(self, count: u32) -> Self {
        self.forced_failures.store(count, Ordering::SeqCst);
        self
    }

    /// 恢复到初始随机序列 (需要配置 seed)
    pub fn rewind(&self) {
        *self.rng.lock().unwrap_or_else(PoisonError::into_inner) = Self::make_rng(self.config.seed);
        self.requests.store(0, Ordering::SeqCst);
    }

    /// 已收到的请求数
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// 配置
    pub fn config(&self) -> &SimulatedSourceConfig {
        &self.config
    }

    fn make_rng(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    fn draw(&self) -> Draw {
        let forced = self
            .forced_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let send = latency(&mut rng, self.config.max_send_ms, self.config.fixed_latency);
        let receive = latency(&mut rng, self.config.max_receive_ms, self.config.fixed_latency);
        let fail = forced || rng.random::<f64>() < self.config.failure_rate;

        Draw {
            send,
            receive,
            fail,
        }
    }
}

/// 均匀分布于 [0, max) 毫秒；fixed 时取上限
fn latency(rng: &mut StdRng, max_ms: u64, fixed: bool) -> Duration {
    let ms = if fixed || max_ms == 0 {
        max_ms
    } else {
        rng.random_range(0..max_ms)
    };
    Duration::from_millis(ms)
}

impl<C: LocalClock> RemoteTimeProvider for SimulatedTimeSource<C> {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn fetch(&self) -> Result<f64, ProviderError> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst);
        let draw = self.draw();

        sleep(draw.send).await;
        let remote = self.clock.now() + self.config.true_offset_s;
        sleep(draw.receive).await;

        trace!(
            request,
            send_ms = draw.send.as_millis() as u64,
            receive_ms = draw.receive.as_millis() as u64,
            fail = draw.fail,
            "simulated round trip"
        );

        if draw.fail {
            return Err(ProviderError::unavailable(
                "simulated",
                format!("injected failure on request {request}"),
            ));
        }
        Ok(remote)
    }
}
