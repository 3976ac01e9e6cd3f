// vim: tw=80
//! Single-disk performance and sizing formulas
//!
//! Every function here is pure.  Units follow the usual textbook conventions:
//! times in milliseconds, sizes in kilobytes or gigabytes, rates in megabytes
//! per second.

use serde_derive::{Deserialize, Serialize};
use std::fmt;
use crate::types::*;

/// Which constraint determined the number of disks in a sizing calculation
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Bound {
    /// Enough disks to hold the data
    Capacity,
    /// Enough disks to service the I/O load
    Performance,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bound::Capacity => f.write_str("capacity"),
            Bound::Performance => f.write_str("performance"),
        }
    }
}

/// The result of combining capacity and performance sizing
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DiskCount {
    /// Disks needed to satisfy the capacity requirement
    pub capacity: u64,
    /// Disks needed to satisfy the performance requirement
    pub performance: u64,
    /// The larger of the two
    pub total: u64,
    /// Which requirement was binding.  Ties are reported as `Capacity`.
    pub bound: Bound,
}

/// How to turn a fractional disk count into a whole one
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Rounding {
    /// Always round up.  Never undersizes.
    #[default]
    Ceiling,
    /// Round to the nearest whole disk, as the course worked examples do.
    Nearest,
}

/// Average rotational latency: half of one revolution, in milliseconds.
pub fn rotational_latency_ms(rpm: u32) -> Result<f64> {
    if rpm == 0 {
        return Err(Error::input("rpm must be positive"));
    }
    Ok(0.5 * (60_000.0 / f64::from(rpm)))
}

/// Time to transfer one block, in milliseconds.
///
/// One kilobyte per megabyte-per-second is exactly one millisecond.
pub fn transfer_time_ms(block_kb: f64, transfer_mbps: f64) -> Result<f64> {
    check_nonnegative("block size", block_kb)?;
    check_positive("transfer rate", transfer_mbps)?;
    Ok(block_kb / transfer_mbps)
}

/// Disk service time `Ts`: seek + rotational latency + transfer, in
/// milliseconds.
pub fn service_time_ms(seek_ms: f64, rpm: u32, block_kb: f64,
                       transfer_mbps: f64) -> Result<f64>
{
    check_nonnegative("seek time", seek_ms)?;
    let rl = rotational_latency_ms(rpm)?;
    let xfer = transfer_time_ms(block_kb, transfer_mbps)?;
    Ok(seek_ms + rl + xfer)
}

/// IOPS that one disk can sustain at the given utilization.
///
/// `utilization` must lie in `(0, 1]`.  70% is the usual recommendation.
pub fn iops(service_time_ms: f64, utilization: f64) -> Result<f64> {
    check_positive("service time", service_time_ms)?;
    if !(utilization > 0.0 && utilization <= 1.0) {
        return Err(Error::input(
            format!("utilization must lie in (0, 1], not {utilization}")));
    }
    Ok(utilization / (service_time_ms * 0.001))
}

fn whole_disks(x: f64, rounding: Rounding) -> u64 {
    match rounding {
        Rounding::Ceiling => x.ceil() as u64,
        Rounding::Nearest => x.round() as u64,
    }
}

/// Number of disks needed to hold `total_gb` of data.
pub fn disks_for_capacity(total_gb: f64, per_disk_gb: f64) -> Result<u64> {
    disks_for_capacity_rounded(total_gb, per_disk_gb, Rounding::Ceiling)
}

/// Like [`disks_for_capacity`], but with a selectable rounding policy.
pub fn disks_for_capacity_rounded(total_gb: f64, per_disk_gb: f64,
                                  rounding: Rounding) -> Result<u64>
{
    check_nonnegative("total capacity", total_gb)?;
    check_positive("per-disk capacity", per_disk_gb)?;
    Ok(whole_disks(total_gb / per_disk_gb, rounding))
}

/// Number of disks needed to service `app_iops`.
pub fn disks_for_performance(app_iops: f64, per_disk_iops: f64) -> Result<u64>
{
    check_nonnegative("application IOPS", app_iops)?;
    check_positive("per-disk IOPS", per_disk_iops)?;
    Ok(whole_disks(app_iops / per_disk_iops, Rounding::Ceiling))
}

/// Combine the capacity and performance disk counts.
pub fn total_disks_required(dc: u64, dp: u64) -> DiskCount {
    let (total, bound) = if dp > dc {
        (dp, Bound::Performance)
    } else {
        (dc, Bound::Capacity)
    };
    DiskCount { capacity: dc, performance: dp, total, bound }
}
