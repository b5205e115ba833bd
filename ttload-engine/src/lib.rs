//! Load engine for the TrainTicket benchmark
//!
//! A fixed pool of [`LoadWorker`]s each run randomly chosen scenarios
//! against the backend while one [`CacheRefresher`] keeps a shared
//! [`OrderCache`] current. The refresher only touches the cache once it has
//! drained the [`RefreshGate`], so no scenario is in flight during a refresh.
//!
//! [`Warmup`] prepares a backend with orders in every state before a run.

pub mod cache;
pub mod dates;
pub mod error;
pub mod factory;
pub mod gate;
pub mod refresher;
pub mod runner;
pub mod scenario;
pub mod scenarios;
pub mod stats;
pub mod warmup;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{OrderCache, OrderSnapshot};
pub use dates::TravelDates;
pub use error::{EngineError, EngineResult};
pub use factory::ApiFactory;
pub use gate::RefreshGate;
pub use refresher::CacheRefresher;
pub use runner::{run_single, LoadTest, LoadTestSettings};
pub use scenario::{ScenarioKind, ScenarioSet, MASK_LEN};
pub use scenarios::{ScenarioOutcome, ScenarioRunner};
pub use stats::{ScenarioCounts, ScenarioLine, ScenarioStats, StatsReport, WorkerReport};
pub use warmup::{ClassReport, OrderClass, Quotas, Warmup, WarmupReport};
pub use worker::{LoadWorker, WorkerConfig, WorkerSummary};
