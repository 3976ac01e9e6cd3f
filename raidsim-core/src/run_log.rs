// vim: tw=80
//! Run history and summary statistics
//!
//! The `RunLog` owns every `SimulationResult` recorded during a session.  It
//! is created explicitly and only ever cleared explicitly.

use itertools::{Itertools, MinMaxResult};
use std::{
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};
use time::format_description::well_known::Rfc3339;
use crate::simulation::SimulationResult;

/// Descriptive statistics of one series of samples
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation, with Bessel's correction
    pub std_dev: f64,
    /// Sample variance, with Bessel's correction
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// Summarize `samples`, or return `None` if there are none.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let (min, max) = match samples.iter().copied()
            .minmax_by(|a, b| a.total_cmp(b))
        {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(x) => (x, x),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        let count = samples.len();
        let n = count as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let sorted = samples.iter()
            .copied()
            .sorted_by(|a, b| a.total_cmp(b))
            .collect::<Vec<_>>();
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };
        let variance = if count > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        Some(Stats {
            count,
            mean,
            median,
            std_dev: variance.sqrt(),
            variance,
            min,
            max
        })
    }
}

/// Statistics pooled over every run in a `RunLog`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub runs: usize,
    pub read_time_ms: Option<Stats>,
    pub write_time_ms: Option<Stats>,
}

impl RunSummary {
    /// Write one CSV row per metric.  Metrics without samples have empty
    /// fields.
    pub fn write_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "metric,count,mean,std,median,min,max,variance")?;
        for (name, stats) in [("read_time_ms", &self.read_time_ms),
                              ("write_time_ms", &self.write_time_ms)]
        {
            match stats {
                Some(s) => writeln!(w, "{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
                    name, s.count, s.mean, s.std_dev, s.median, s.min, s.max,
                    s.variance)?,
                None => writeln!(w, "{name},0,,,,,,")?
            }
        }
        Ok(())
    }
}

/// Append-only history of simulation results.
///
/// Appends are serialized by a single lock.  Entries are immutable, so
/// readers get cheap shared handles rather than copies.
#[derive(Debug, Default)]
pub struct RunLog {
    history: Mutex<Vec<Arc<SimulationResult>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn history(&self) -> std::sync::MutexGuard<'_, Vec<Arc<SimulationResult>>>
    {
        // Entries are never modified in place, so a poisoned history is still
        // consistent.
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a result.  Returns a shared handle to the recorded entry.
    #[tracing::instrument(skip_all, fields(level = %result.raid_level,
                                           disks = result.disk_count))]
    pub fn append(&self, result: SimulationResult) -> Arc<SimulationResult> {
        let entry = Arc::new(result);
        let mut history = self.history();
        history.push(entry.clone());
        tracing::debug!(runs = history.len(), "recorded run");
        entry
    }

    pub fn len(&self) -> usize {
        self.history().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history().is_empty()
    }

    /// All recorded results, oldest first
    pub fn snapshot(&self) -> Vec<Arc<SimulationResult>> {
        self.history().clone()
    }

    /// Forget every recorded result
    pub fn clear(&self) {
        self.history().clear();
    }

    /// Pool the raw read and write samples of every run and summarize them.
    pub fn summary(&self) -> RunSummary {
        let history = self.snapshot();
        let reads = history.iter()
            .flat_map(|r| r.read_time_samples.iter().copied())
            .collect::<Vec<_>>();
        let writes = history.iter()
            .flat_map(|r| r.write_time_samples.iter().copied())
            .collect::<Vec<_>>();
        RunSummary {
            runs: history.len(),
            read_time_ms: Stats::from_samples(&reads),
            write_time_ms: Stats::from_samples(&writes),
        }
    }

    /// Write one CSV row per recorded run, oldest first.
    pub fn write_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "timestamp,raid_level,disk_count,file_count,total_bytes,\
            usable_percent,redundancy_percent,efficiency_percent,\
            disk_load_iops,required_disks,binding,mean_read_ms,mean_write_ms,\
            total_time_ms")?;
        for r in self.snapshot() {
            let ts = r.timestamp.format(&Rfc3339)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let opt = |x: Option<f64>| x.map(|v| format!("{v:.4}"))
                .unwrap_or_default();
            writeln!(w, "{},{},{},{},{},{:.2},{:.2},{:.2},{},{},{},{},{},{:.4}",
                ts,
                r.raid_level,
                r.disk_count,
                r.file_count,
                r.total_bytes,
                r.usable_capacity_percent,
                r.redundancy_percent,
                r.efficiency_percent,
                opt(r.disk_load_iops),
                r.required_disks.total,
                r.required_disks.bound,
                opt(r.mean_read_ms()),
                opt(r.mean_write_ms()),
                r.total_time_ms())?;
        }
        Ok(())
    }
}
