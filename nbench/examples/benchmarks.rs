//! NBench Example Benchmarks
//!
//! This example demonstrates NBench features and serves as a template for
//! creating your own benchmark suite.
//!
//! Run with:
//!   cargo run --example benchmarks                      # Run all benchmarks
//!   cargo run --example benchmarks -- --help            # Show all options
//!   cargo run --example benchmarks -- list              # List benchmarks
//!   cargo run --example benchmarks -- '^sort'           # Run only sorting benchmarks
//!   cargo run --example benchmarks -- --format json     # Write a JSON report

use nbench::prelude::*;
use std::hint::black_box;
use std::time::Duration;

#[global_allocator]
static GLOBAL: nbench::TrackingAllocator = nbench::TrackingAllocator;

fn count(ctx: &BenchmarkContext) {
    if let Some(counter) = ctx.counter("ops") {
        counter.increment();
    }
}

// ============================================================================
// Basic Benchmarks
// ============================================================================

fn register_basic(catalog: &mut BenchmarkCatalog) -> anyhow::Result<()> {
    // Throughput: how many additions per second
    catalog.register(
        "addition",
        |b| {
            b.description("Simple arithmetic in throughput mode")
                .run_mode(RunMode::Throughput)
                .run_time(Duration::from_millis(200))
                .counter_throughput("ops", Assertion::greater_than(1_000_000.0))
        },
        || {
            BenchmarkMethods::new(|ctx| {
                black_box(black_box(42u64) + black_box(17u64));
                count(ctx);
            })
        },
    )?;

    // Iterations: one sum per trial, timed
    catalog.register(
        "vector_sum",
        |b| {
            b.iterations(20)
                .measure(MetricName::Timing(TimingMetric::ElapsedTime))
                .assert(
                    MetricName::Timing(TimingMetric::ElapsedTime),
                    Assertion::less_than(50.0),
                    AssertionType::Total,
                )
        },
        || {
            let data: Vec<u64> = (0..100_000).collect();
            BenchmarkMethods::new(move |_| {
                black_box(data.iter().sum::<u64>());
            })
        },
    )?;
    Ok(())
}

// ============================================================================
// Setup / Cleanup
// ============================================================================

fn register_sorting(catalog: &mut BenchmarkCatalog) -> anyhow::Result<()> {
    catalog.register(
        "sort_shuffled",
        |b| {
            b.iterations(10)
                .settle_time(Duration::from_millis(1))
                .measure(MetricName::Timing(TimingMetric::ElapsedTime))
                .measure(MetricName::Timing(TimingMetric::CpuCycles))
        },
        || {
            let data = std::sync::Arc::new(std::sync::Mutex::new(Vec::<u64>::new()));
            let (setup, run) = (data.clone(), data);
            BenchmarkMethods::new(move |_| {
                if let Ok(mut values) = run.lock() {
                    values.sort_unstable();
                    black_box(&*values);
                }
            })
            .with_setup(move |_| {
                if let Ok(mut values) = setup.lock() {
                    *values = (0..50_000u64).map(|i| i.wrapping_mul(2_654_435_761) % 50_000).collect();
                }
                Ok(())
            })
        },
    )?;
    Ok(())
}

// ============================================================================
// Allocation Tracking
// ============================================================================

fn register_allocations(catalog: &mut BenchmarkCatalog) -> anyhow::Result<()> {
    catalog.register(
        "string_building",
        |b| {
            b.iterations(10)
                .measure(MetricName::Memory(MemoryMetric::TotalBytesAllocated))
                .measure(MetricName::Allocations(SizeClass::All))
                .assert(
                    MetricName::Memory(MemoryMetric::AllocationCount),
                    Assertion::greater_than(0.0),
                    AssertionType::Total,
                )
        },
        || {
            BenchmarkMethods::new(|_| {
                let text: String = (0..1_000).map(|i| format!("{i},")).collect();
                black_box(text);
            })
        },
    )?;
    Ok(())
}

// ============================================================================
// Process Metrics (measured only)
// ============================================================================

fn register_process(catalog: &mut BenchmarkCatalog) -> anyhow::Result<()> {
    catalog.register(
        "page_touch",
        |b| {
            b.test_mode(TestMode::Measurement)
                .iterations(5)
                .measure(MetricName::Process(ProcessMetric::MinorFaults))
                .measure(MetricName::Process(ProcessMetric::VoluntaryContextSwitches))
        },
        || {
            BenchmarkMethods::new(|_| {
                let mut pages = vec![0u8; 16 * 1024 * 1024];
                for page in pages.chunks_mut(4096) {
                    page[0] = 1;
                }
                black_box(pages);
            })
        },
    )?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut catalog = BenchmarkCatalog::new();
    register_basic(&mut catalog)?;
    register_sorting(&mut catalog)?;
    register_allocations(&mut catalog)?;
    register_process(&mut catalog)?;
    nbench::run(&catalog)
}
