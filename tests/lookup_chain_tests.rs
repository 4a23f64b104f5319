//! Lookup chain behaviour against recording test doubles

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use geolocator::cache::{CacheResult, RecordStore};
use geolocator::errors::{GeolocatorError, Result};
use geolocator::metrics_core::MetricsRecorder;
use geolocator::services::{GeoSource, HealthStatus, LookupChain, LookupError, RepairScheduler};
use geolocator::storage::{GeoRecord, IpKey};

// =============================================================================
// Test doubles
// =============================================================================

/// 记录调用次数的存储，可注入读写故障
#[derive(Default)]
struct RecordingStore {
    data: DashMap<String, GeoRecord>,
    gets: AtomicUsize,
    saves: AtomicUsize,
    fail_get: AtomicBool,
    fail_save: AtomicBool,
    save_delay_ms: AtomicU64,
}

impl RecordingStore {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 每次写入前先等待 `delay`
    fn slow(delay: Duration) -> Arc<Self> {
        let store = Self::default();
        store
            .save_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
        Arc::new(store)
    }

    fn with_record(record: GeoRecord) -> Arc<Self> {
        let store = Self::default();
        store.data.insert(record.ip.clone(), record);
        Arc::new(store)
    }

    fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn holds(&self, ip: &str) -> Option<GeoRecord> {
        self.data.get(ip).map(|r| r.clone())
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn get(&self, key: &IpKey) -> Result<CacheResult> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(GeolocatorError::cache_connection("injected read failure"));
        }
        Ok(match self.data.get(&key.to_string()) {
            Some(record) => CacheResult::Found(record.clone()),
            None => CacheResult::Miss,
        })
    }

    async fn save(&self, key: &IpKey, record: GeoRecord) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let delay = self.save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(GeolocatorError::cache_connection("injected write failure"));
        }
        self.data.insert(key.to_string(), record);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// 记录调用次数的权威数据源
struct RecordingSource {
    answer: Option<GeoRecord>,
    fetches: AtomicUsize,
}

impl RecordingSource {
    fn answering(record: GeoRecord) -> Arc<Self> {
        Arc::new(Self {
            answer: Some(record),
            fetches: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: None,
            fetches: AtomicUsize::new(0),
        })
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoSource for RecordingSource {
    async fn fetch(&self, key: &IpKey) -> Result<GeoRecord> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Some(record) => {
                let mut record = record.clone();
                record.ip = key.to_string();
                Ok(record)
            }
            None => Err(GeolocatorError::upstream("rate limited")),
        }
    }

    async fn status(&self) -> HealthStatus {
        if self.answer.is_some() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    fn name(&self) -> &'static str {
        "recording-source"
    }
}

/// 统计回填结果的指标记录器
#[derive(Default)]
struct RepairCounter {
    ok: AtomicUsize,
    errors: AtomicUsize,
    tier_errors: AtomicUsize,
}

impl MetricsRecorder for RepairCounter {
    fn inc_tier_error(&self, _tier: &str) {
        self.tier_errors.fetch_add(1, Ordering::SeqCst);
    }

    fn inc_repair(&self, _tier: &str, status: &str) {
        match status {
            "ok" => self.ok.fetch_add(1, Ordering::SeqCst),
            "error" => self.errors.fetch_add(1, Ordering::SeqCst),
            _ => 0,
        };
    }
}

struct Harness {
    chain: LookupChain,
    local: Arc<RecordingStore>,
    shared: Arc<RecordingStore>,
    source: Arc<RecordingSource>,
    repairs: Arc<RepairScheduler>,
    metrics: Arc<RepairCounter>,
}

impl Harness {
    fn new(
        local: Arc<RecordingStore>,
        shared: Arc<RecordingStore>,
        source: Arc<RecordingSource>,
    ) -> Self {
        let repairs = Arc::new(RepairScheduler::new());
        let metrics = Arc::new(RepairCounter::default());
        let chain = LookupChain::new(
            local.clone(),
            shared.clone(),
            source.clone(),
            repairs.clone(),
            metrics.clone(),
        );
        Self {
            chain,
            local,
            shared,
            source,
            repairs,
            metrics,
        }
    }

    /// 等待所有后台回填完成
    async fn settle(&self) {
        assert!(
            self.repairs.drain(Duration::from_secs(2)).await,
            "repair tasks did not finish"
        );
    }
}

fn record(ip: &str, country_code: &str, city: &str) -> GeoRecord {
    let key: IpKey = ip.parse().unwrap();
    let mut record = GeoRecord::new(&key);
    record.country_code = Some(country_code.to_string());
    record.city = Some(city.to_string());
    record
}

// =============================================================================
// Tier ordering
// =============================================================================

#[tokio::test]
async fn test_local_hit_skips_other_tiers_on_critical_path() {
    let cached = record("1.1.1.1", "AU", "Sydney");
    let h = Harness::new(
        RecordingStore::with_record(cached.clone()),
        RecordingStore::with_record(cached.clone()),
        RecordingSource::answering(record("0.0.0.0", "XX", "Nowhere")),
    );

    let result = h.chain.lookup("1.1.1.1").await.unwrap();
    assert_eq!(result, cached);
    assert_eq!(h.local.gets(), 1);
    assert_eq!(h.source.fetches(), 0);

    // Shared 只在后台被检查，且已有记录时不写入
    h.settle().await;
    assert_eq!(h.source.fetches(), 0);
    assert_eq!(h.shared.saves(), 0);
}

#[tokio::test]
async fn test_local_hit_repairs_missing_shared() {
    let cached = record("1.0.0.1", "AU", "Brisbane");
    let h = Harness::new(
        RecordingStore::with_record(cached.clone()),
        RecordingStore::new(),
        RecordingSource::failing(),
    );

    assert_eq!(h.chain.lookup("1.0.0.1").await.unwrap(), cached);

    h.settle().await;
    assert_eq!(h.shared.holds("1.0.0.1"), Some(cached));
    assert_eq!(h.source.fetches(), 0);
}

#[tokio::test]
async fn test_shared_hit_populates_local() {
    let cached = record("9.9.9.9", "CH", "Zurich");
    let h = Harness::new(
        RecordingStore::new(),
        RecordingStore::with_record(cached.clone()),
        RecordingSource::failing(),
    );

    let result = h.chain.lookup("9.9.9.9").await.unwrap();
    assert_eq!(result, cached);
    assert_eq!(h.source.fetches(), 0);

    h.settle().await;
    assert_eq!(h.local.holds("9.9.9.9"), Some(cached));
    // Shared 命中后不会再写回 Shared
    assert_eq!(h.shared.saves(), 0);
}

#[tokio::test]
async fn test_authoritative_answer_populates_both_tiers() {
    let h = Harness::new(
        RecordingStore::new(),
        RecordingStore::new(),
        RecordingSource::answering(record("0.0.0.0", "DE", "Berlin")),
    );

    let result = h.chain.lookup("5.6.7.8").await.unwrap();
    assert_eq!(result.ip, "5.6.7.8");
    assert_eq!(result.city.as_deref(), Some("Berlin"));
    assert_eq!(h.source.fetches(), 1);

    h.settle().await;
    assert_eq!(h.local.holds("5.6.7.8"), Some(result.clone()));
    assert_eq!(h.shared.holds("5.6.7.8"), Some(result));
    assert_eq!(h.metrics.ok.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Fire-and-forget repairs
// =============================================================================

#[tokio::test]
async fn test_lookup_does_not_wait_for_repairs() {
    let h = Harness::new(
        RecordingStore::slow(Duration::from_millis(800)),
        RecordingStore::slow(Duration::from_millis(800)),
        RecordingSource::answering(record("0.0.0.0", "SE", "Stockholm")),
    );

    let started = Instant::now();
    let result = h.chain.lookup("7.7.7.7").await.unwrap();
    let elapsed = started.elapsed();
    assert!(
        elapsed < Duration::from_millis(400),
        "lookup waited for repairs: {:?}",
        elapsed
    );
    assert!(h.local.holds("7.7.7.7").is_none());
    assert!(h.shared.holds("7.7.7.7").is_none());

    h.settle().await;
    assert_eq!(h.local.holds("7.7.7.7"), Some(result.clone()));
    assert_eq!(h.shared.holds("7.7.7.7"), Some(result));
}

#[tokio::test]
async fn test_repairs_outlive_the_calling_task() {
    let h = Arc::new(Harness::new(
        RecordingStore::slow(Duration::from_millis(300)),
        RecordingStore::slow(Duration::from_millis(300)),
        RecordingSource::answering(record("0.0.0.0", "SE", "Stockholm")),
    ));

    let (tx, rx) = tokio::sync::oneshot::channel();
    let caller = {
        let h = h.clone();
        tokio::spawn(async move {
            let result = h.chain.lookup("7.7.7.7").await;
            let _ = tx.send(result);
            // 模拟请求处理 future 在返回后被丢弃
            std::future::pending::<()>().await;
        })
    };

    let result = rx.await.unwrap().unwrap();
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    h.settle().await;
    assert_eq!(h.local.saves(), 1);
    assert_eq!(h.shared.saves(), 1);
    assert_eq!(h.local.holds("7.7.7.7"), Some(result.clone()));
    assert_eq!(h.shared.holds("7.7.7.7"), Some(result));
    assert_eq!(h.metrics.ok.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_malformed_keys_touch_no_tier() {
    let h = Harness::new(
        RecordingStore::new(),
        RecordingStore::new(),
        RecordingSource::answering(record("0.0.0.0", "US", "Anywhere")),
    );

    for raw in ["999.999.1.1", "abc", "", "::1", "1.2.3"] {
        let err = h.chain.lookup(raw).await.unwrap_err();
        assert!(
            matches!(err, LookupError::InvalidKey(_)),
            "{:?} should be rejected, got {:?}",
            raw,
            err
        );
    }

    h.settle().await;
    assert_eq!(h.local.gets() + h.local.saves(), 0);
    assert_eq!(h.shared.gets() + h.shared.saves(), 0);
    assert_eq!(h.source.fetches(), 0);
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_authoritative_failure_schedules_no_repair() {
    let h = Harness::new(
        RecordingStore::new(),
        RecordingStore::new(),
        RecordingSource::failing(),
    );

    let err = h.chain.lookup("8.8.4.4").await.unwrap_err();
    assert_eq!(err, LookupError::LookupFailed("rate limited".to_string()));

    h.settle().await;
    assert_eq!(h.local.saves(), 0);
    assert_eq!(h.shared.saves(), 0);
}

#[tokio::test]
async fn test_degraded_tiers_are_treated_as_misses() {
    let local = RecordingStore::new();
    let shared = RecordingStore::new();
    local.fail_get.store(true, Ordering::SeqCst);
    shared.fail_get.store(true, Ordering::SeqCst);

    let h = Harness::new(
        local,
        shared,
        RecordingSource::answering(record("0.0.0.0", "JP", "Tokyo")),
    );

    let result = h.chain.lookup("4.4.4.4").await.unwrap();
    assert_eq!(result.city.as_deref(), Some("Tokyo"));
    assert_eq!(h.source.fetches(), 1);
    assert_eq!(h.metrics.tier_errors.load(Ordering::SeqCst), 2);

    // 读失败不影响回填写入
    h.settle().await;
    assert!(h.local.holds("4.4.4.4").is_some());
    assert!(h.shared.holds("4.4.4.4").is_some());
}

#[tokio::test]
async fn test_failed_repair_does_not_change_result() {
    let local = RecordingStore::new();
    let shared = RecordingStore::new();
    local.fail_save.store(true, Ordering::SeqCst);
    shared.fail_save.store(true, Ordering::SeqCst);

    let expected = record("0.0.0.0", "FR", "Paris");
    let h = Harness::new(local, shared, RecordingSource::answering(expected.clone()));

    let result = h.chain.lookup("2.2.2.2").await.unwrap();
    assert_eq!(result.city, expected.city);

    h.settle().await;
    assert_eq!(h.metrics.errors.load(Ordering::SeqCst), 2);
    assert_eq!(h.local.saves(), 1);
    assert_eq!(h.shared.saves(), 1);

    // 回填失败后下一次查询仍然走权威数据源
    let again = h.chain.lookup("2.2.2.2").await.unwrap();
    assert_eq!(again, result);
    assert_eq!(h.source.fetches(), 2);
}

// =============================================================================
// Convergence
// =============================================================================

#[tokio::test]
async fn test_repeated_lookups_are_served_locally() {
    let h = Harness::new(
        RecordingStore::new(),
        RecordingStore::new(),
        RecordingSource::answering(record("0.0.0.0", "NL", "Amsterdam")),
    );

    let first = h.chain.lookup("3.3.3.3").await.unwrap();
    h.settle().await;

    for _ in 0..5 {
        let next = h.chain.lookup("3.3.3.3").await.unwrap();
        assert_eq!(next, first);
    }
    assert_eq!(h.source.fetches(), 1);
}

#[tokio::test]
async fn test_end_to_end_google_dns() {
    let h = Harness::new(
        RecordingStore::new(),
        RecordingStore::new(),
        RecordingSource::answering(record("0.0.0.0", "US", "Mountain View")),
    );

    let first = h.chain.lookup("8.8.8.8").await.unwrap();
    assert_eq!(first.ip, "8.8.8.8");
    assert_eq!(first.country_code.as_deref(), Some("US"));
    assert_eq!(first.city.as_deref(), Some("Mountain View"));
    assert_eq!(h.source.fetches(), 1);

    h.settle().await;
    let shared_gets_before = h.shared.gets();

    let second = h.chain.lookup("8.8.8.8").await.unwrap();
    assert_eq!(second, first);
    assert_eq!(h.source.fetches(), 1);
    assert!(h.local.gets() >= 2);

    // 第二次由 Local 命中，Shared 只可能被后台确认任务读取
    h.settle().await;
    assert_eq!(h.shared.gets(), shared_gets_before + 1);
}

#[tokio::test]
async fn test_concurrent_lookups_may_each_reach_authoritative() {
    let h = Arc::new(Harness::new(
        RecordingStore::new(),
        RecordingStore::new(),
        RecordingSource::answering(record("0.0.0.0", "GB", "London")),
    ));

    let lookups = (0..4).map(|_| {
        let h = h.clone();
        async move { h.chain.lookup("6.6.6.6").await }
    });
    let results = futures_util::future::join_all(lookups).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert!(h.source.fetches() >= 1);
    assert!(h.source.fetches() <= 4);
}
