// vim: tw=80
//! The Simulation Driver
//!
//! A simulation run applies the formula library to one RAID configuration
//! and one workload, and models per-operation I/O timing with a seedable
//! random source.  Runs touch no shared state, so independent runs may
//! proceed concurrently.

use rand::{
    distributions::{Distribution, Uniform},
    Rng
};
use time::OffsetDateTime;
use crate::{
    config::{Config, SimulationConfig},
    disk::{self, DiskCount},
    raid::{self, ArrayIops, RaidLevel},
    types::*,
    workload::WorkloadModel,
};

/// The outcome of one simulation run.  Immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationResult {
    pub raid_level: RaidLevel,
    pub disk_count: u32,
    pub file_count: usize,
    pub total_bytes: u64,
    pub usable_capacity_gb: f64,
    pub usable_capacity_percent: f64,
    pub redundancy_percent: f64,
    pub efficiency_percent: f64,
    pub write_penalty: u32,
    /// Mean service time of a single disk
    pub service_time_ms: f64,
    /// Front-end IOPS the array can sustain at the configured utilization
    pub array_iops: ArrayIops,
    /// Back-end IOPS demanded by the workload.  Only known when the workload
    /// has an I/O profile.
    pub disk_load_iops: Option<f64>,
    /// Disks needed to meet the workload's capacity and, if known, its
    /// performance requirements
    pub required_disks: DiskCount,
    /// Modeled bytes, data plus parity, stored on each disk
    pub per_disk_bytes: Vec<u64>,
    pub read_time_samples: Vec<f64>,
    pub write_time_samples: Vec<f64>,
    pub timestamp: OffsetDateTime,
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

impl SimulationResult {
    pub fn mean_read_ms(&self) -> Option<f64> {
        mean(&self.read_time_samples)
    }

    pub fn mean_write_ms(&self) -> Option<f64> {
        mean(&self.write_time_samples)
    }

    /// Combined time of every modeled read and write
    pub fn total_time_ms(&self) -> f64 {
        self.read_time_samples.iter()
            .chain(self.write_time_samples.iter())
            .sum()
    }
}

/// Runs simulations for one class of disk
#[derive(Clone, Copy, Debug)]
pub struct Simulator {
    disk: DiskSpec,
    config: SimulationConfig,
}

impl Simulator {
    pub fn new(disk: DiskSpec, config: SimulationConfig) -> Result<Self> {
        disk.validate()?;
        config.validate()?;
        // The slowest sample any level can draw must still be representable
        let service_time_ms = disk.service_time_ms()?;
        let multiplier = RaidLevel::ALL.iter()
            .map(|level| level.write_multiplier())
            .fold(1.0, f64::max);
        if !(service_time_ms * multiplier * (1.0 + config.jitter)).is_finite() {
            return Err(Error::input(format!(
                "service time of {service_time_ms} ms is too large to simulate")));
        }
        Ok(Simulator { disk, config })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Simulator::new(config.disk, config.simulation)
    }

    pub fn disk(&self) -> &DiskSpec {
        &self.disk
    }

    /// IOPS that one disk sustains at the configured utilization
    pub fn per_disk_iops(&self) -> Result<f64> {
        disk::iops(self.disk.service_time_ms()?, self.config.utilization)
    }

    /// Simulate one run of `model` on an array of `disk_count` disks.
    ///
    /// Each modeled operation draws both a read and a write sample.
    ///
    /// Configuration errors are detected before any sample is drawn, so a
    /// failed run consumes nothing from `rng`.
    #[tracing::instrument(skip(self, model, rng),
                          fields(files = model.file_count()))]
    pub fn run<R>(&self, level: RaidLevel, disk_count: u32,
                  model: &WorkloadModel, rng: &mut R)
        -> Result<SimulationResult>
        where R: Rng + ?Sized
    {
        level.validate(disk_count)?;

        let service_time_ms = self.disk.service_time_ms()?;
        let per_disk_iops =
            disk::iops(service_time_ms, self.config.utilization)?;
        tracing::debug!(service_time_ms, per_disk_iops, "disk model");

        let usable_disks = level.usable_disks(disk_count)?;
        let usable_capacity_percent =
            raid::usable_capacity_percent(disk_count, level)?;
        let array_iops = raid::array_iops(disk_count, level, per_disk_iops)?;

        let capacity_disks = disk::disks_for_capacity(
            model.capacity_requirement().total_capacity_gb,
            self.disk.capacity_gb)?;
        let (disk_load_iops, performance_disks) =
            match model.workload(per_disk_iops) {
                Some(w) => {
                    let load = raid::disk_load_iops(w.total_iops,
                        w.read_percent, w.write_percent, level)?;
                    let disks = raid::required_disks_for_iops(&w, level)?;
                    tracing::debug!(disk_load_iops = load, disks,
                        "performance sizing");
                    (Some(load), disks)
                },
                None => (None, 0)
            };
        let required_disks =
            disk::total_disks_required(capacity_disks, performance_disks);
        tracing::debug!(?required_disks, "sizing");

        let placement = model.distribute(level, disk_count)?;

        let nops = if model.file_count() > 0 {
            model.file_count()
        } else {
            tracing::warn!(samples = self.config.default_samples,
                "workload has no files; using a fixed sample count");
            self.config.default_samples
        };
        let read_dist =
            self.jittered(service_time_ms * level.read_multiplier());
        let write_dist =
            self.jittered(service_time_ms * level.write_multiplier());
        let mut read_time_samples = Vec::with_capacity(nops);
        let mut write_time_samples = Vec::with_capacity(nops);
        for _ in 0..nops {
            read_time_samples.push(read_dist.sample(rng));
            write_time_samples.push(write_dist.sample(rng));
        }

        Ok(SimulationResult {
            raid_level: level,
            disk_count,
            file_count: model.file_count(),
            total_bytes: model.total_bytes(),
            usable_capacity_gb:
                f64::from(usable_disks) * self.disk.capacity_gb,
            usable_capacity_percent,
            redundancy_percent: 100.0 - usable_capacity_percent,
            efficiency_percent: usable_capacity_percent,
            write_penalty: level.write_penalty(),
            service_time_ms,
            array_iops,
            disk_load_iops,
            required_disks,
            per_disk_bytes: placement.per_disk_bytes(),
            read_time_samples,
            write_time_samples,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    /// Simulate `model` at every level in `levels` that can be built from
    /// `disk_count` disks.  Other levels are skipped.
    pub fn compare<R>(&self, levels: &[RaidLevel], disk_count: u32,
                      model: &WorkloadModel, rng: &mut R)
        -> Result<Vec<SimulationResult>>
        where R: Rng + ?Sized
    {
        let mut results = Vec::with_capacity(levels.len());
        for &level in levels {
            if let Err(e) = level.validate(disk_count) {
                tracing::info!("Skipping {}: {}", level, e);
                continue;
            }
            results.push(self.run(level, disk_count, model, rng)?);
        }
        Ok(results)
    }

    /// A distribution bounded to `mean * (1 ± jitter)`
    fn jittered(&self, mean: f64) -> Uniform<f64> {
        let j = self.config.jitter;
        Uniform::new_inclusive(mean * (1.0 - j), mean * (1.0 + j))
    }
}

/// Simulate one run with the default timing model.
///
/// See [`Simulator::run`].
pub fn run_simulation<R>(disk: &DiskSpec, level: RaidLevel, disk_count: u32,
                         model: &WorkloadModel, rng: &mut R)
    -> Result<SimulationResult>
    where R: Rng + ?Sized
{
    Simulator::new(*disk, SimulationConfig::default())?
        .run(level, disk_count, model, rng)
}
