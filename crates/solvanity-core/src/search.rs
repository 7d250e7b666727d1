//! Vanity search engine

use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use solvanity_pattern::{
    self as pattern, difficulty_f64, format_difficulty, BigUint, ConfigUpdate, Pattern,
    PatternMatcher, SearchConfig,
};

use crate::error::{Result, SearchError};
use crate::keygen::{Candidate, Ed25519Generator, KeygenError, KeypairGenerator};
use crate::schedule::{NoProgress, ProgressObserver, ThreadYield, Yield, YieldPoint};
use crate::stats::{
    estimated_progress, ProgressSnapshot, RunGuard, RunState, SearchState, StopHandle,
};

/// Candidates generated between suspension points
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Engine tuning, fixed for the engine's lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    /// Batch size per loop iteration
    pub batch_size: usize,
    /// Generation threads per batch (1 = inline, 0 = one per CPU)
    pub threads: usize,
    /// Sleep after each progress report in milliseconds (0 = plain yield)
    pub idle_pause_ms: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            threads: 1,
            idle_pause_ms: 0,
        }
    }
}

/// Search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The matching base58 address
    pub public_address: String,
    /// Base58 keypair for the address
    pub private_key_material: String,
    /// Keypairs tested up to and including the match
    pub attempts: u64,
    /// Wall time since the search started
    pub elapsed_millis: u64,
}

impl SearchResult {
    pub fn keys_per_second(&self) -> f64 {
        if self.elapsed_millis > 0 {
            self.attempts as f64 * 1000.0 / self.elapsed_millis as f64
        } else {
            0.0
        }
    }
}

enum Generation {
    Inline,
    Pool(ThreadPool),
}

enum Scan {
    Found(SearchResult),
    Missed(ProgressSnapshot),
}

/// Per-run bookkeeping shared by the blocking and async drivers
struct SearchRun<'a, G> {
    generator: &'a G,
    generation: &'a Generation,
    matcher: PatternMatcher,
    difficulty: f64,
    batch_size: usize,
    attempts: u64,
    started: Instant,
}

impl<'a, G: KeypairGenerator> SearchRun<'a, G> {
    fn new(
        generator: &'a G,
        generation: &'a Generation,
        raw_pattern: &str,
        config: SearchConfig,
        batch_size: usize,
    ) -> Result<Self> {
        let pattern = Pattern::parse(raw_pattern)?;
        let difficulty = pattern::difficulty(pattern.as_str(), config.case_sensitive);

        info!(
            "Searching for {} ({}, {}), difficulty {}",
            pattern,
            config.mode,
            if config.case_sensitive { "case-sensitive" } else { "case-insensitive" },
            format_difficulty(difficulty_f64(&difficulty))
        );

        Ok(Self {
            generator,
            generation,
            matcher: PatternMatcher::new(pattern, config),
            difficulty: difficulty_f64(&difficulty),
            batch_size,
            attempts: 0,
            started: Instant::now(),
        })
    }

    fn next_batch(&self) -> std::result::Result<Vec<Candidate>, KeygenError> {
        let generator = self.generator;
        let size = self.batch_size;
        match self.generation {
            Generation::Inline => (0..size).map(|_| generator.generate()).collect(),
            Generation::Pool(pool) => pool.install(|| {
                (0..size)
                    .into_par_iter()
                    .map(|_| generator.generate())
                    .collect()
            }),
        }
    }

    fn scan(&mut self, batch: Vec<Candidate>) -> Scan {
        let matcher = &self.matcher;
        let hit = batch
            .into_iter()
            .enumerate()
            .find(|(_, candidate)| matcher.is_match(&candidate.public_address));

        if let Some((index, candidate)) = hit {
            return Scan::Found(SearchResult {
                public_address: candidate.public_address,
                private_key_material: candidate.private_key_material,
                attempts: self.attempts + index as u64 + 1,
                elapsed_millis: self.elapsed_millis(),
            });
        }

        self.attempts += self.batch_size as u64;
        let snapshot = ProgressSnapshot {
            attempts: self.attempts,
            elapsed_millis: self.elapsed_millis(),
            estimated_progress_percent: estimated_progress(self.attempts, self.difficulty),
        };
        trace!("Batch missed, {} attempts so far", snapshot.attempts);
        Scan::Missed(snapshot)
    }

    fn succeed<O>(&self, state: &RunState, result: SearchResult, observer: &mut O) -> SearchResult
    where
        O: ProgressObserver + ?Sized,
    {
        state.finish(SearchState::Succeeded);
        info!(
            "Found {} after {} attempts in {}ms",
            result.public_address, result.attempts, result.elapsed_millis
        );
        observer.on_progress(&ProgressSnapshot {
            attempts: result.attempts,
            elapsed_millis: result.elapsed_millis,
            estimated_progress_percent: 100.0,
        });
        result
    }

    fn fail(&self, state: &RunState, err: KeygenError) -> SearchError {
        state.transition(SearchState::Running, SearchState::Failed);
        warn!("Search for {} abandoned: {}", self.matcher.pattern(), err);
        err.into()
    }

    fn cancelled(&self) -> SearchError {
        info!(
            "Search for {} stopped after {} attempts",
            self.matcher.pattern(),
            self.attempts
        );
        SearchError::Cancelled
    }

    fn elapsed_millis(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Vanity search engine.
///
/// Owns its run state, so independent engines can search concurrently. A
/// run borrows the engine mutably; cancel it through a [`StopHandle`].
pub struct SearchEngine<G = Ed25519Generator> {
    config: SearchConfig,
    options: EngineOptions,
    generator: G,
    generation: Generation,
    yielder: Box<dyn Yield>,
    state: Arc<RunState>,
}

impl SearchEngine<Ed25519Generator> {
    /// Engine over real Ed25519 keypairs with default options
    pub fn new(config: SearchConfig) -> Self {
        Self::with_generator(config, Ed25519Generator)
    }
}

impl Default for SearchEngine<Ed25519Generator> {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl<G: KeypairGenerator> SearchEngine<G> {
    /// Engine over a custom keypair source, generating inline
    pub fn with_generator(config: SearchConfig, generator: G) -> Self {
        Self {
            config,
            options: EngineOptions::default(),
            generator,
            generation: Generation::Inline,
            yielder: Box::new(ThreadYield::default()),
            state: RunState::new(),
        }
    }

    /// Engine with explicit tuning; builds a generation pool unless
    /// `options.threads == 1`
    pub fn with_options(
        config: SearchConfig,
        generator: G,
        mut options: EngineOptions,
    ) -> std::result::Result<Self, ThreadPoolBuildError> {
        options.batch_size = options.batch_size.max(1);

        let generation = if options.threads == 1 {
            Generation::Inline
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(options.threads)
                .thread_name(|i| format!("solvanity-gen-{}", i))
                .build()?;
            debug!("Generation pool ready with {} threads", pool.current_num_threads());
            Generation::Pool(pool)
        };

        Ok(Self {
            config,
            yielder: Box::new(ThreadYield::new(Duration::from_millis(options.idle_pause_ms))),
            options,
            generator,
            generation,
            state: RunState::new(),
        })
    }

    /// Replace the suspension hook called between batches
    pub fn with_yield(mut self, yielder: impl Yield + 'static) -> Self {
        self.yielder = Box::new(yielder);
        self
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    /// Replace the supplied config fields; takes effect on the next run
    pub fn update_config(&mut self, update: ConfigUpdate) {
        self.config.apply(update);
        debug!("Config updated: {:?}", self.config);
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn state(&self) -> SearchState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Cancel the current run, if any
    pub fn stop(&self) {
        if self.state.stop() {
            debug!("Stop requested");
        }
    }

    /// Handle for cancelling from another thread or task
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(Arc::clone(&self.state))
    }

    pub fn charset_size(&self) -> usize {
        pattern::charset_size(self.config.case_sensitive)
    }

    pub fn difficulty(&self, pattern: &str) -> BigUint {
        pattern::difficulty(pattern, self.config.case_sensitive)
    }

    pub fn probability50(&self, pattern: &str) -> BigUint {
        pattern::probability50(pattern, self.config.case_sensitive)
    }

    pub fn matches(&self, address: &str, pattern: &str) -> bool {
        pattern::matches(address, pattern, &self.config)
    }

    pub fn normalize(&self, pattern: &str) -> String {
        pattern::normalize(pattern)
    }

    pub fn validate(&self, pattern: &str) -> bool {
        pattern::validate(pattern)
    }

    /// Seconds to cover the full difficulty at `attempts_per_second`
    pub fn estimate_time(&self, pattern: &str, attempts_per_second: NonZeroU64) -> BigUint {
        pattern::estimate_time(pattern, self.config.case_sensitive, attempts_per_second)
    }

    /// Search until a match is found or the run is stopped
    pub fn start(&mut self, raw_pattern: &str) -> Result<SearchResult> {
        self.start_with_progress(raw_pattern, &mut NoProgress)
    }

    /// Like [`start`](Self::start), reporting a snapshot after every batch
    pub fn start_with_progress<O>(
        &mut self,
        raw_pattern: &str,
        observer: &mut O,
    ) -> Result<SearchResult>
    where
        O: ProgressObserver + ?Sized,
    {
        let mut run = SearchRun::new(
            &self.generator,
            &self.generation,
            raw_pattern,
            self.config,
            self.options.batch_size,
        )?;
        let state = Arc::clone(&self.state);
        let _guard = RunGuard::begin(&state);

        while state.is_running() {
            let batch = run.next_batch().map_err(|e| run.fail(&state, e))?;

            self.yielder.pause(YieldPoint::Batch);
            if !state.is_running() {
                break;
            }

            match run.scan(batch) {
                Scan::Found(result) => return Ok(run.succeed(&state, result, observer)),
                Scan::Missed(snapshot) => {
                    observer.on_progress(&snapshot);
                    self.yielder.pause(YieldPoint::Idle);
                }
            }
        }

        Err(run.cancelled())
    }

    /// Async driver: same loop, suspending with `tokio::task::yield_now`
    /// instead of the engine's yield hook
    pub async fn start_async<O>(
        &mut self,
        raw_pattern: &str,
        observer: &mut O,
    ) -> Result<SearchResult>
    where
        O: ProgressObserver + Send + ?Sized,
    {
        let mut run = SearchRun::new(
            &self.generator,
            &self.generation,
            raw_pattern,
            self.config,
            self.options.batch_size,
        )?;
        let state = Arc::clone(&self.state);
        let _guard = RunGuard::begin(&state);

        while state.is_running() {
            let batch = run.next_batch().map_err(|e| run.fail(&state, e))?;

            tokio::task::yield_now().await;
            if !state.is_running() {
                break;
            }

            match run.scan(batch) {
                Scan::Found(result) => return Ok(run.succeed(&state, result, observer)),
                Scan::Missed(snapshot) => {
                    observer.on_progress(&snapshot);
                    tokio::task::yield_now().await;
                }
            }
        }

        Err(run.cancelled())
    }
}
