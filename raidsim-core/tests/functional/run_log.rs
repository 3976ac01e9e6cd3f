// vim: tw=80
//! Accumulating simulation results

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use raidsim_core::{
    raid::RaidLevel,
    run_log::RunLog,
    simulation::{SimulationResult, Simulator},
    workload::{FileDescriptor, FileKind, WorkloadModel},
    BYTES_PER_MB,
    DiskSpec,
};
use std::sync::Arc;

fn run(seed: u64, level: RaidLevel, nfiles: usize) -> SimulationResult {
    let files = (0..nfiles)
        .map(|i| FileDescriptor::new(format!("{i}.png"), 3 * BYTES_PER_MB,
                                     FileKind::Image))
        .collect();
    let model = WorkloadModel::new(files);
    let sim = Simulator::new(DiskSpec::default(), Default::default()).unwrap();
    let mut rng = XorShiftRng::seed_from_u64(seed);
    sim.run(level, 4, &model, &mut rng).unwrap()
}

#[test_log::test]
fn append_preserves_order() {
    let log = RunLog::new();
    assert!(log.is_empty());
    log.append(run(1, RaidLevel::Raid0, 2));
    log.append(run(2, RaidLevel::Raid5, 2));
    log.append(run(3, RaidLevel::Raid6, 2));
    let levels = log.snapshot()
        .iter()
        .map(|r| r.raid_level)
        .collect::<Vec<_>>();
    assert_eq!(levels, vec![RaidLevel::Raid0, RaidLevel::Raid5,
                            RaidLevel::Raid6]);
}

#[test]
fn summary_pools_samples() {
    let log = RunLog::new();
    let a = log.append(run(1, RaidLevel::Raid5, 3));
    let b = log.append(run(2, RaidLevel::Raid5, 5));
    let summary = log.summary();
    assert_eq!(summary.runs, 2);
    let reads = summary.read_time_ms.unwrap();
    assert_eq!(reads.count, 8);
    let all = a.read_time_samples.iter()
        .chain(b.read_time_samples.iter())
        .copied()
        .collect::<Vec<_>>();
    let lo = all.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = all.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(reads.min, lo);
    assert_eq!(reads.max, hi);
    assert!(reads.mean >= lo && reads.mean <= hi);
    assert_eq!(summary.write_time_ms.unwrap().count, 8);
}

#[test]
fn entries_survive_clear() {
    let log = RunLog::new();
    let entry = log.append(run(1, RaidLevel::Raid1, 1));
    log.clear();
    assert!(log.is_empty());
    assert!(log.summary().read_time_ms.is_none());
    // Handles already given out remain valid
    assert_eq!(entry.raid_level, RaidLevel::Raid1);
    assert_eq!(Arc::strong_count(&entry), 1);
}

#[test]
fn concurrent_appends() {
    let log = RunLog::new();
    std::thread::scope(|s| {
        for seed in 0..8 {
            let log = &log;
            s.spawn(move || {
                log.append(run(seed, RaidLevel::Raid5, 2));
            });
        }
    });
    assert_eq!(log.len(), 8);
    assert_eq!(log.summary().read_time_ms.unwrap().count, 16);
}

#[test]
fn csv_report() {
    let log = RunLog::new();
    log.append(run(1, RaidLevel::Raid5, 2));
    log.append(run(2, RaidLevel::Raid1, 2));
    let mut buf = Vec::new();
    log.write_csv(&mut buf).unwrap();
    let s = String::from_utf8(buf).unwrap();
    let lines = s.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("timestamp,raid_level,disk_count"));
    let fields = lines[1].split(',').collect::<Vec<_>>();
    assert_eq!(fields.len(), 14);
    assert_eq!(fields[1], "RAID 5");
    assert_eq!(fields[2], "4");
    assert_eq!(fields[3], "2");
    assert_eq!(fields[5], "75.00");
    // No I/O profile, so no disk load
    assert_eq!(fields[8], "");
    assert!(lines[2].contains(",RAID 1,"));
}
