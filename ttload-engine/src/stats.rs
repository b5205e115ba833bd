//! Scenario execution counters and the end-of-run report

use crate::scenario::ScenarioKind;
use crate::scenarios::ScenarioOutcome;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Attempts of one scenario. Skipped and failed attempts count as executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioCounts {
    pub executed: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl ScenarioCounts {
    fn record(&mut self, outcome: &ScenarioOutcome) {
        self.executed += 1;
        match outcome {
            ScenarioOutcome::Completed => {}
            ScenarioOutcome::Skipped(_) => self.skipped += 1,
            ScenarioOutcome::Failed(_) => self.failed += 1,
        }
    }

    fn add(&mut self, other: &ScenarioCounts) {
        self.executed += other.executed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

type WorkerCounts = BTreeMap<ScenarioKind, ScenarioCounts>;

/// Per-worker, per-scenario counters shared by all workers of a run
#[derive(Debug)]
pub struct ScenarioStats {
    started: Instant,
    workers: Mutex<BTreeMap<usize, WorkerCounts>>,
}

impl ScenarioStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            workers: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn record(&self, worker_id: usize, kind: ScenarioKind, outcome: &ScenarioOutcome) {
        self.workers
            .lock()
            .entry(worker_id)
            .or_default()
            .entry(kind)
            .or_default()
            .record(outcome);
    }

    /// Scenario attempts recorded so far
    pub fn total(&self) -> u64 {
        self.workers
            .lock()
            .values()
            .flat_map(|counts| counts.values())
            .map(|counts| counts.executed)
            .sum()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn report(&self) -> StatsReport {
        self.report_for(self.elapsed())
    }

    /// Snapshot the counters with rates over `duration`
    pub fn report_for(&self, duration: Duration) -> StatsReport {
        let workers = self.workers.lock().clone();
        let seconds = duration.as_secs_f64();

        let scenarios: BTreeSet<ScenarioKind> = workers
            .values()
            .flat_map(|counts| counts.keys().copied())
            .collect();

        let mut global = WorkerCounts::new();
        let worker_reports = workers
            .iter()
            .map(|(worker_id, counts)| {
                for (kind, count) in counts {
                    global.entry(*kind).or_default().add(count);
                }
                WorkerReport {
                    worker_id: *worker_id,
                    scenarios: scenario_lines(&scenarios, counts, seconds),
                    total: total_line(counts, seconds),
                }
            })
            .collect();

        StatsReport {
            duration_secs: seconds,
            workers: worker_reports,
            global: scenario_lines(&scenarios, &global, seconds),
            total: total_line(&global, seconds),
        }
    }
}

impl Default for ScenarioStats {
    fn default() -> Self {
        Self::new()
    }
}

fn rate(count: u64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        count as f64 / seconds
    } else {
        0.0
    }
}

fn line(name: &str, counts: ScenarioCounts, seconds: f64) -> ScenarioLine {
    ScenarioLine {
        scenario: name.to_string(),
        executed: counts.executed,
        per_second: rate(counts.executed, seconds),
        skipped: counts.skipped,
        failed: counts.failed,
    }
}

fn scenario_lines(scenarios: &BTreeSet<ScenarioKind>, counts: &WorkerCounts, seconds: f64) -> Vec<ScenarioLine> {
    scenarios
        .iter()
        .map(|kind| line(kind.name(), counts.get(kind).copied().unwrap_or_default(), seconds))
        .collect()
}

fn total_line(counts: &WorkerCounts, seconds: f64) -> ScenarioLine {
    let mut total = ScenarioCounts::default();
    for count in counts.values() {
        total.add(count);
    }
    line("Total", total, seconds)
}

/// One row of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioLine {
    pub scenario: String,
    pub executed: u64,
    pub per_second: f64,
    pub skipped: u64,
    pub failed: u64,
}

impl fmt::Display for ScenarioLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  {:<20}: {:>5} total, {:>8.2}/sec",
            self.scenario, self.executed, self.per_second
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub scenarios: Vec<ScenarioLine>,
    pub total: ScenarioLine,
}

/// Counts and rates of a finished run.
///
/// `Display` renders the plain-text table; the struct serializes to JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub duration_secs: f64,
    pub workers: Vec<WorkerReport>,
    pub global: Vec<ScenarioLine>,
    pub total: ScenarioLine,
}

impl StatsReport {
    pub fn total_executed(&self) -> u64 {
        self.total.executed
    }

    pub fn total_failed(&self) -> u64 {
        self.total.failed
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Load Test Statistics:")?;
        writeln!(f, "Total Duration: {:.2} seconds", self.duration_secs)?;
        writeln!(f)?;

        for worker in &self.workers {
            writeln!(f, "Worker {} Statistics:", worker.worker_id)?;
            for line in &worker.scenarios {
                writeln!(f, "{}", line)?;
            }
            writeln!(f, "{}", worker.total)?;
            writeln!(f)?;
        }

        writeln!(f, "Global Statistics:")?;
        for line in &self.global {
            writeln!(f, "{}", line)?;
        }
        writeln!(f, "{}", self.total)?;

        let troubled: Vec<&ScenarioLine> = self
            .global
            .iter()
            .filter(|line| line.skipped > 0 || line.failed > 0)
            .collect();
        if !troubled.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped and Failed:")?;
            for line in troubled {
                writeln!(
                    f,
                    "  {:<20}: {:>5} skipped, {:>5} failed",
                    line.scenario, line.skipped, line.failed
                )?;
            }
        }

        Ok(())
    }
}
