// vim: tw=80
//! Simulations that exercise the whole pipeline, from files to results

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use raidsim_core::{
    config::Config,
    disk::Bound,
    raid::RaidLevel,
    simulation::{Simulator, run_simulation},
    workload::{FileDescriptor, FileKind, IoProfile, WorkloadModel},
    BYTES_PER_GB,
    DiskSpec,
    Error,
};
use rstest::rstest;

/// A mixed photo and video library totalling 1024 GB
fn library() -> WorkloadModel {
    let mut files = Vec::new();
    for i in 0..768 {
        files.push(FileDescriptor::new(format!("photos/{i}.jpg"),
            BYTES_PER_GB / 4, FileKind::Image));
    }
    for i in 0..832 {
        files.push(FileDescriptor::new(format!("videos/{i}.mkv"),
            BYTES_PER_GB, FileKind::Video));
    }
    WorkloadModel::new(files)
}

#[test_log::test]
fn capacity_bound_library() {
    let mut rng = XorShiftRng::seed_from_u64(12345);
    let model = library();
    assert_eq!(model.capacity_requirement().total_capacity_gb, 1024.0);
    let r = run_simulation(&DiskSpec::default(), RaidLevel::Raid5, 4, &model,
                           &mut rng).unwrap();
    assert_eq!(r.file_count, 1600);
    assert_eq!(r.required_disks.capacity, 11);
    assert_eq!(r.required_disks.total, 11);
    assert_eq!(r.required_disks.bound, Bound::Capacity);
    assert_eq!(r.usable_capacity_percent, 75.0);
    assert_eq!(r.read_time_samples.len(), 1600);
    // Every byte lands somewhere, plus one parity copy per file
    assert_eq!(r.per_disk_bytes.iter().sum::<u64>(), 2 * model.total_bytes());
}

#[test_log::test]
fn performance_bound_library() {
    let mut rng = XorShiftRng::seed_from_u64(12345);
    let profile = IoProfile { total_iops: 4000.0, read_percent: 60.0,
                              write_percent: 40.0 };
    let model = library().with_profile(profile);
    let r = run_simulation(&DiskSpec::default(), RaidLevel::Raid6, 6, &model,
                           &mut rng).unwrap();
    // 0.6 * 4000 + 0.4 * 4000 * 6
    assert_eq!(r.disk_load_iops, Some(12000.0));
    assert_eq!(r.required_disks.bound, Bound::Performance);
    assert!(r.required_disks.performance > r.required_disks.capacity);
}

#[rstest]
#[case(RaidLevel::Raid0, 2)]
#[case(RaidLevel::Raid1, 2)]
#[case(RaidLevel::Raid5, 3)]
#[case(RaidLevel::Raid6, 4)]
fn minimum_arrays(#[case] level: RaidLevel, #[case] n: u32) {
    let mut rng = XorShiftRng::seed_from_u64(12345);
    let r = run_simulation(&DiskSpec::default(), level, n, &library(),
                           &mut rng).unwrap();
    assert_eq!(r.disk_count, n);
    assert_eq!(r.per_disk_bytes.len(), n as usize);
    let e = run_simulation(&DiskSpec::default(), level, n - 1, &library(),
                           &mut rng).unwrap_err();
    assert!(matches!(e, Error::InvalidConfiguration(_)));
}

#[test]
fn configured_disk() {
    let config = Config::from_yaml("
disk:
  capacity_gb: 2048
simulation:
  jitter: 0.0
").unwrap();
    let sim = Simulator::from_config(&config).unwrap();
    let mut rng = XorShiftRng::seed_from_u64(12345);
    let r = sim.run(RaidLevel::Raid1, 4, &library(), &mut rng).unwrap();
    assert_eq!(r.usable_capacity_gb, 4096.0);
    assert_eq!(r.required_disks.capacity, 1);
    assert!(r.read_time_samples.iter().all(|s| (s - 7.1).abs() < 1e-9));
    assert!(r.write_time_samples.iter().all(|s| (s - 14.2).abs() < 1e-9));
}

/// Independent simulations may run on separate threads
#[test]
fn concurrent_runs() {
    let sim = Simulator::new(DiskSpec::default(), Default::default()).unwrap();
    let model = library();
    let results = std::thread::scope(|s| {
        let handles = RaidLevel::ALL.iter()
            .map(|&level| {
                let model = &model;
                s.spawn(move || {
                    let mut rng = XorShiftRng::seed_from_u64(99);
                    sim.run(level, 4, model, &mut rng).unwrap()
                })
            }).collect::<Vec<_>>();
        handles.into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>()
    });
    let levels = results.iter().map(|r| r.raid_level).collect::<Vec<_>>();
    assert_eq!(levels, RaidLevel::ALL.to_vec());
    // Identical seeds give identical read samples, whatever the level
    for r in results.iter() {
        assert_eq!(r.read_time_samples, results[0].read_time_samples);
    }
}
