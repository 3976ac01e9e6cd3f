// vim: tw=80
//! Common type definitions used throughout raidsim

use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

/// Bytes in one gigabyte.  Capacities use binary units throughout.
pub const BYTES_PER_GB: u64 = 1 << 30;

/// Bytes in one megabyte.
pub const BYTES_PER_MB: u64 = 1 << 20;

/// raidsim's error type.
///
/// There are only two kinds of failure, and both are deterministic validation
/// failures detected synchronously.  Neither is worth retrying.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// An argument lies outside of a formula's domain, for example a zero
    /// denominator or an empty parity stripe.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The arguments are individually fine but don't make sense together, for
    /// example RAID 1 with an odd number of disks.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl Error {
    pub(crate) fn input<S: Into<String>>(s: S) -> Self {
        Error::InvalidInput(s.into())
    }

    pub(crate) fn config<S: Into<String>>(s: S) -> Self {
        Error::InvalidConfiguration(s.into())
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;

/// Fail with `InvalidInput` unless `x` is a finite, strictly positive number.
pub(crate) fn check_positive(name: &str, x: f64) -> Result<()> {
    if x.is_finite() && x > 0.0 {
        Ok(())
    } else {
        Err(Error::input(format!("{name} must be positive, not {x}")))
    }
}

/// Fail with `InvalidInput` unless `x` is a finite, nonnegative number.
pub(crate) fn check_nonnegative(name: &str, x: f64) -> Result<()> {
    if x.is_finite() && x >= 0.0 {
        Ok(())
    } else {
        Err(Error::input(format!("{name} may not be negative, not {x}")))
    }
}

/// Physical characteristics of one class of disk.
///
/// Used for sizing and for deriving the mean service time of simulated I/O.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct DiskSpec {
    /// Average seek time in milliseconds
    pub seek_time_ms: f64,
    /// Spindle speed in revolutions per minute
    pub rpm: u32,
    /// Size of a typical I/O in kilobytes
    pub block_size_kb: f64,
    /// Media transfer rate in megabytes per second
    pub transfer_rate_mbps: f64,
    /// Formatted capacity in gigabytes
    pub capacity_gb: f64,
}

impl DiskSpec {
    /// Check that every field lies within its domain.
    pub fn validate(&self) -> Result<()> {
        check_positive("seek_time_ms", self.seek_time_ms)?;
        if self.rpm == 0 {
            return Err(Error::input("rpm must be positive"));
        }
        check_positive("block_size_kb", self.block_size_kb)?;
        check_positive("transfer_rate_mbps", self.transfer_rate_mbps)?;
        check_positive("capacity_gb", self.capacity_gb)
    }

    /// Expected time to complete one I/O on this disk
    pub fn service_time_ms(&self) -> Result<f64> {
        crate::disk::service_time_ms(self.seek_time_ms, self.rpm,
            self.block_size_kb, self.transfer_rate_mbps)
    }
}

/// A 15K RPM enterprise disk: the standard disk of the textbook examples.
impl Default for DiskSpec {
    fn default() -> Self {
        DiskSpec {
            seek_time_ms: 5.0,
            rpm: 15000,
            block_size_kb: 4.0,
            transfer_rate_mbps: 40.0,
            capacity_gb: 100.0,
        }
    }
}

/// An application's I/O demand profile, used for performance-driven sizing.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Workload {
    /// Total front-end IOPS generated by the application
    pub total_iops: f64,
    /// Share of I/Os that are reads, in percent
    pub read_percent: f64,
    /// Share of I/Os that are writes, in percent
    pub write_percent: f64,
    /// IOPS that a single disk can service
    pub iops_per_disk: f64,
}

impl Workload {
    pub fn new(total_iops: f64, read_percent: f64, write_percent: f64,
               iops_per_disk: f64) -> Self
    {
        Workload {total_iops, read_percent, write_percent, iops_per_disk}
    }
}

/// A request to store a given amount of data, used for capacity-driven
/// sizing.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct CapacityRequirement {
    pub total_capacity_gb: f64,
}
