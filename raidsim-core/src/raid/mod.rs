// vim: tw=80

//! raidsim RAID layer
//!
//! Closed-form capacity arithmetic for the supported RAID levels, plus the
//! performance and parity formulas in the submodules.

use serde_derive::{Deserialize, Serialize};
use std::{
    fmt,
    str::FromStr
};
use crate::types::*;

mod codec;
mod load;

pub use self::codec::{
    ParityStripe,
    ParityWord,
    XorCodec,
    recover_missing_block,
    xor_parity,
};
pub use self::load::{
    ArrayIops,
    array_iops,
    disk_load_iops,
    required_disks_for_iops,
};

/// Supported RAID levels.
///
/// Each level carries its own constants, so there is no way to name an
/// unsupported level once the text has been parsed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq,
         PartialOrd, Serialize)]
pub enum RaidLevel {
    /// Striping without redundancy
    Raid0,
    /// Mirrored pairs
    Raid1,
    /// Striping with single distributed parity
    Raid5,
    /// Striping with double distributed parity
    Raid6,
}

impl RaidLevel {
    pub const ALL: [RaidLevel; 4] = [
        RaidLevel::Raid0, RaidLevel::Raid1, RaidLevel::Raid5, RaidLevel::Raid6
    ];

    /// Number of back-end I/Os incurred by each front-end write
    pub const fn write_penalty(self) -> u32 {
        match self {
            RaidLevel::Raid0 => 1,
            RaidLevel::Raid1 => 2,
            RaidLevel::Raid5 => 4,
            RaidLevel::Raid6 => 6,
        }
    }

    /// Fewest disks that can form an array of this level
    pub const fn min_disks(self) -> u32 {
        match self {
            RaidLevel::Raid0 | RaidLevel::Raid1 => 2,
            RaidLevel::Raid5 => 3,
            RaidLevel::Raid6 => 4,
        }
    }

    /// Number of disks' worth of parity in each stripe
    pub const fn parity_disks(self) -> u32 {
        match self {
            RaidLevel::Raid0 | RaidLevel::Raid1 => 0,
            RaidLevel::Raid5 => 1,
            RaidLevel::Raid6 => 2,
        }
    }

    /// Check that `n` disks can form an array of this level.
    pub fn validate(self, n: u32) -> Result<()> {
        if n < self.min_disks() {
            return Err(Error::config(format!("{} requires at least {} disks, \
                not {}", self, self.min_disks(), n)));
        }
        if self == RaidLevel::Raid1 && n % 2 != 0 {
            return Err(Error::config(format!(
                "RAID 1 mirrors come in pairs, so {n} disks is invalid")));
        }
        Ok(())
    }

    /// Disks' worth of capacity available for user data in an `n` disk array
    pub fn usable_disks(self, n: u32) -> Result<u32> {
        self.validate(n)?;
        Ok(match self {
            RaidLevel::Raid0 => n,
            RaidLevel::Raid1 => n / 2,
            RaidLevel::Raid5 => n - 1,
            RaidLevel::Raid6 => n - 2,
        })
    }

    /// Mean service time multiplier for reads, relative to a single disk
    pub fn read_multiplier(self) -> f64 {
        1.0
    }

    /// Mean service time multiplier for writes, relative to a single disk
    pub fn write_multiplier(self) -> f64 {
        f64::from(self.write_penalty())
    }
}

impl fmt::Display for RaidLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RaidLevel::Raid0 => f.write_str("RAID 0"),
            RaidLevel::Raid1 => f.write_str("RAID 1"),
            RaidLevel::Raid5 => f.write_str("RAID 5"),
            RaidLevel::Raid6 => f.write_str("RAID 6"),
        }
    }
}

impl FromStr for RaidLevel {
    type Err = Error;

    /// Accepts "raid5", "RAID 5", "raid-5", and plain "5"
    fn from_str(s: &str) -> Result<Self> {
        let norm = s.trim().to_ascii_lowercase().replace([' ', '-', '_'], "");
        let digits = norm.strip_prefix("raid").unwrap_or(&norm);
        match digits {
            "0" => Ok(RaidLevel::Raid0),
            "1" => Ok(RaidLevel::Raid1),
            "5" => Ok(RaidLevel::Raid5),
            "6" => Ok(RaidLevel::Raid6),
            _ => Err(Error::input(format!("Unsupported RAID level: {s}")))
        }
    }
}

/// Back-end write penalty of `level`
pub fn write_penalty(level: RaidLevel) -> u32 {
    level.write_penalty()
}

/// Percentage of raw capacity that is usable for data
pub fn usable_capacity_percent(n: u32, level: RaidLevel) -> Result<f64> {
    let usable = level.usable_disks(n)?;
    Ok(f64::from(usable) / f64::from(n) * 100.0)
}

/// Percentage of raw capacity consumed by redundancy
pub fn redundancy_percent(n: u32, level: RaidLevel) -> Result<f64> {
    usable_capacity_percent(n, level).map(|u| 100.0 - u)
}

/// Usable capacity as a ratio in `[0, 1]`
pub fn space_efficiency(n: u32, level: RaidLevel) -> Result<f64> {
    usable_capacity_percent(n, level).map(|u| u / 100.0)
}

/// Number of disks devoted to each purpose
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CapacityBreakdown {
    pub usable: u32,
    pub parity: u32,
    pub mirror: u32,
}

pub fn capacity_breakdown(n: u32, level: RaidLevel)
    -> Result<CapacityBreakdown>
{
    let usable = level.usable_disks(n)?;
    let (parity, mirror) = match level {
        RaidLevel::Raid1 => (0, n - usable),
        _ => (n - usable, 0)
    };
    Ok(CapacityBreakdown{usable, parity, mirror})
}

/// Raw storage needed to hold a given amount of user data
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct StorageOverhead {
    pub usable_bytes: f64,
    pub parity_bytes: f64,
    pub mirror_bytes: f64,
    pub total_required_bytes: f64,
    pub efficiency: f64,
}

pub fn storage_overhead(total_bytes: u64, n: u32, level: RaidLevel)
    -> Result<StorageOverhead>
{
    let efficiency = space_efficiency(n, level)?;
    let usable_bytes = total_bytes as f64;
    let total_required_bytes = usable_bytes / efficiency;
    let extra = total_required_bytes - usable_bytes;
    let (parity_bytes, mirror_bytes) = match level {
        RaidLevel::Raid1 => (0.0, extra),
        _ => (extra, 0.0)
    };
    Ok(StorageOverhead {
        usable_bytes,
        parity_bytes,
        mirror_bytes,
        total_required_bytes,
        efficiency
    })
}

/// Number of simultaneous disk failures the array is guaranteed to survive.
///
/// A RAID 1 array may survive more, as long as no two failures hit the same
/// pair.
pub fn fault_tolerance(level: RaidLevel) -> u32 {
    match level {
        RaidLevel::Raid0 => 0,
        RaidLevel::Raid1 | RaidLevel::Raid5 => 1,
        RaidLevel::Raid6 => 2,
    }
}

/// Theoretical streaming speedup relative to a single disk
pub fn parallel_speedup(n: u32, level: RaidLevel) -> Result<f64> {
    level.validate(n)?;
    let n = f64::from(n);
    Ok(match level {
        RaidLevel::Raid0 => n,
        RaidLevel::Raid1 => n * 0.5,
        // Parity calculation costs about 15% of the data disks' bandwidth
        RaidLevel::Raid5 => (n - 1.0) * 0.85,
        RaidLevel::Raid6 => (n - 2.0) * 0.85,
    })
}

/// Estimated time in seconds to stream a file of `file_bytes` through the
/// array.  Ignores seek and rotational latency.
pub fn estimate_access_time_s(file_bytes: u64, n: u32, level: RaidLevel,
                              transfer_mbps: f64) -> Result<f64>
{
    check_positive("transfer rate", transfer_mbps)?;
    let speedup = parallel_speedup(n, level)?;
    let mb = file_bytes as f64 / BYTES_PER_MB as f64;
    Ok(mb / (transfer_mbps * speedup))
}

/// Side-by-side capacity figures for one RAID level
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelMetrics {
    pub usable_percent: f64,
    pub redundancy_percent: f64,
    pub efficiency: f64,
    pub speedup: f64,
    pub fault_tolerance: u32,
}

fn level_metrics(n: u32, level: RaidLevel) -> Result<LevelMetrics> {
    let usable_percent = usable_capacity_percent(n, level)?;
    Ok(LevelMetrics {
        usable_percent,
        redundancy_percent: 100.0 - usable_percent,
        efficiency: usable_percent / 100.0,
        speedup: parallel_speedup(n, level)?,
        fault_tolerance: fault_tolerance(level),
    })
}

/// Compare every supported RAID level for an `n` disk array.
///
/// Levels that can't be built from `n` disks report their configuration error
/// instead of metrics.
pub fn compare_levels(n: u32) -> Vec<(RaidLevel, Result<LevelMetrics>)> {
    RaidLevel::ALL.iter()
        .map(|&level| (level, level_metrics(n, level)))
        .collect()
}
