// vim: tw=80
//! Back-end load imposed by a workload on a RAID array

use serde_derive::{Deserialize, Serialize};
use crate::{
    disk::disks_for_performance,
    types::*,
};
use super::RaidLevel;

/// Read and write percentages may miss 100 by this much due to rounding.
const PERCENT_EPSILON: f64 = 1e-6;

fn check_mix(read_pct: f64, write_pct: f64) -> Result<()> {
    for (name, pct) in [("read percent", read_pct), ("write percent", write_pct)]
    {
        check_nonnegative(name, pct)?;
        if pct > 100.0 {
            return Err(Error::input(format!("{name} exceeds 100: {pct}")));
        }
    }
    if (read_pct + write_pct - 100.0).abs() > PERCENT_EPSILON {
        return Err(Error::config(format!(
            "read and write percentages must sum to 100, not {}",
            read_pct + write_pct)));
    }
    Ok(())
}

/// Effective back-end IOPS that the array's disks must service.
///
/// Every read costs one back-end I/O; every write costs the level's write
/// penalty.
pub fn disk_load_iops(total_iops: f64, read_pct: f64, write_pct: f64,
                      level: RaidLevel) -> Result<f64>
{
    check_nonnegative("total IOPS", total_iops)?;
    check_mix(read_pct, write_pct)?;
    let reads = total_iops * read_pct / 100.0;
    let writes = total_iops * write_pct / 100.0;
    Ok(reads + writes * f64::from(level.write_penalty()))
}

/// Disks needed to service `workload` at the given RAID level.
///
/// RAID 1 results are rounded up to an even number after the ceiling, since
/// mirrors come in pairs.
pub fn required_disks_for_iops(workload: &Workload, level: RaidLevel)
    -> Result<u64>
{
    let load = disk_load_iops(workload.total_iops, workload.read_percent,
                              workload.write_percent, level)?;
    let disks = disks_for_performance(load, workload.iops_per_disk)?;
    if level == RaidLevel::Raid1 && disks % 2 != 0 {
        Ok(disks + 1)
    } else {
        Ok(disks)
    }
}

/// Aggregate front-end IOPS an array can sustain
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct ArrayIops {
    pub read: f64,
    pub write: f64,
}

/// Front-end IOPS of an `n` disk array whose members each sustain
/// `per_disk_iops`.
pub fn array_iops(n: u32, level: RaidLevel, per_disk_iops: f64)
    -> Result<ArrayIops>
{
    level.validate(n)?;
    check_nonnegative("per-disk IOPS", per_disk_iops)?;
    let raw = per_disk_iops * f64::from(n);
    Ok(ArrayIops {
        read: raw,
        write: raw / f64::from(level.write_penalty())
    })
}
