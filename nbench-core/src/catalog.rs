//! Benchmark Catalog
//!
//! Explicit registration of the benchmarks a binary ships. Each entry pairs
//! validated settings with a factory for the user code, so every run of an
//! entry starts from fresh state.

use crate::benchmark::Benchmark;
use crate::error::BuildError;
use crate::invoker::BenchmarkInvoker;
use crate::settings::{BenchmarkSettings, BenchmarkSettingsBuilder};

type InvokerFactory = Box<dyn Fn() -> Box<dyn BenchmarkInvoker> + Send + Sync>;

/// A registered benchmark
pub struct CatalogEntry {
    settings: BenchmarkSettings,
    factory: InvokerFactory,
}

impl CatalogEntry {
    /// Metric or benchmark name
    pub fn name(&self) -> &str {
        self.settings.name()
    }

    /// Settings the benchmark was registered with
    pub fn settings(&self) -> &BenchmarkSettings {
        &self.settings
    }

    /// Fresh user code for one benchmark execution
    pub fn invoker(&self) -> Box<dyn BenchmarkInvoker> {
        (self.factory)()
    }

    /// A benchmark using the registered settings
    pub fn instantiate(&self) -> Benchmark<Box<dyn BenchmarkInvoker>> {
        self.instantiate_with(self.settings.clone())
    }

    /// A benchmark using `settings` in place of the registered ones
    pub fn instantiate_with(&self, settings: BenchmarkSettings) -> Benchmark<Box<dyn BenchmarkInvoker>> {
        Benchmark::new(settings, self.invoker())
    }
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Registered benchmarks, in registration order
#[derive(Debug, Default)]
pub struct BenchmarkCatalog {
    entries: Vec<CatalogEntry>,
}

impl BenchmarkCatalog {
    /// An empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, configuring its settings through `configure`
    pub fn register<F, I>(
        &mut self,
        name: &str,
        configure: impl FnOnce(BenchmarkSettingsBuilder) -> BenchmarkSettingsBuilder,
        factory: F,
    ) -> Result<&mut Self, BuildError>
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: BenchmarkInvoker + 'static,
    {
        let settings = configure(BenchmarkSettings::builder(name)).build()?;
        self.add(settings, factory)
    }

    /// Register prebuilt settings
    pub fn add<F, I>(&mut self, settings: BenchmarkSettings, factory: F) -> Result<&mut Self, BuildError>
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: BenchmarkInvoker + 'static,
    {
        if self.get(settings.name()).is_some() {
            return Err(BuildError::DuplicateBenchmark(settings.name().to_string()));
        }
        self.entries.push(CatalogEntry {
            settings,
            factory: Box::new(move || -> Box<dyn BenchmarkInvoker> { Box::new(factory()) }),
        });
        Ok(self)
    }

    /// Entry registered under `name`
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Benchmark names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(CatalogEntry::name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
