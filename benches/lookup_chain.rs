//! 查询链性能基准测试

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geolocator::cache::{MokaRecordStore, NullRecordStore, RecordStore};
use geolocator::errors::{GeolocatorError, Result};
use geolocator::metrics_core::NoopMetrics;
use geolocator::services::{GeoSource, HealthStatus, LookupChain, RepairScheduler};
use geolocator::storage::{GeoRecord, IpKey};
use std::sync::Arc;

/// 不联网的权威数据源，只在预热时被调用
struct StaticSource;

#[async_trait]
impl GeoSource for StaticSource {
    async fn fetch(&self, key: &IpKey) -> Result<GeoRecord> {
        let mut record = GeoRecord::new(key);
        record.country_code = Some("US".to_string());
        record.city = Some("Mountain View".to_string());
        Ok(record)
    }

    async fn status(&self) -> HealthStatus {
        HealthStatus::Healthy
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

fn build_chain(local: Arc<dyn RecordStore>) -> Arc<LookupChain> {
    Arc::new(LookupChain::new(
        local,
        Arc::new(NullRecordStore::new()),
        Arc::new(StaticSource),
        Arc::new(RepairScheduler::new()),
        NoopMetrics::arc(),
    ))
}

// ============== Local 命中路径 ==============

fn bench_local_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let chain = build_chain(Arc::new(MokaRecordStore::new(10_000, 3600)));

    rt.block_on(async {
        chain.lookup("8.8.8.8").await.unwrap();
        chain
            .repairs()
            .drain(std::time::Duration::from_secs(1))
            .await;
    });

    c.bench_function("lookup/local_hit", |b| {
        b.to_async(&rt).iter(|| {
            let chain = Arc::clone(&chain);
            async move { chain.lookup("8.8.8.8").await }
        });
    });
}

// ============== 非法输入 ==============

fn bench_invalid_key(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let chain = build_chain(Arc::new(NullRecordStore::new()));

    c.bench_function("lookup/invalid_key", |b| {
        b.to_async(&rt).iter(|| {
            let chain = Arc::clone(&chain);
            async move {
                let err = chain.lookup("999.999.1.1").await.unwrap_err();
                GeolocatorError::from(err)
            }
        });
    });
}

// ============== 预热后批量查询 ==============

fn bench_warm_batch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("lookup/warm_batch");

    for size in [100u32, 1000] {
        let keys: Vec<String> = (0..size)
            .map(|i| format!("10.{}.{}.1", i / 256, i % 256))
            .collect();
        let chain = build_chain(Arc::new(MokaRecordStore::new(10_000, 3600)));
        rt.block_on(async {
            for key in &keys {
                // 私有地址同样由 StaticSource 应答
                chain.lookup(key).await.unwrap();
            }
            chain
                .repairs()
                .drain(std::time::Duration::from_secs(5))
                .await;
        });

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("keys", size), &keys, |b, keys| {
            b.to_async(&rt).iter(|| {
                let chain = Arc::clone(&chain);
                async move {
                    for key in keys {
                        chain.lookup(key).await.unwrap();
                    }
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_local_hit, bench_invalid_key, bench_warm_batch);
criterion_main!(benches);
