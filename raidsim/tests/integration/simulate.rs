use std::fs;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::{media_dir, raidsim};

#[test]
fn reports() {
    let dir = media_dir();
    let report = dir.path().join("report.csv");
    let summary = dir.path().join("summary.csv");
    raidsim()
        .args(["simulate", "-n", "4", "-l", "raid5,raid6", "--runs", "2",
               "--seed", "7"])
        .arg("--report")
        .arg(&report)
        .arg("--summary")
        .arg(&summary)
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("RAID 5"))
        .stdout(predicate::str::contains("RAID 6"))
        .stdout(predicate::str::contains("read ms"));

    let report = fs::read_to_string(report).unwrap();
    let lines = report.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("timestamp,raid_level"));
    assert!(lines[1].contains(",RAID 5,4,3,"));
    assert!(lines[2].contains(",RAID 6,4,3,"));

    let summary = fs::read_to_string(summary).unwrap();
    let lines = summary.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    // Two runs of two levels, three files apiece
    assert!(lines[1].starts_with("read_time_ms,12,"));
    assert!(lines[2].starts_with("write_time_ms,12,"));
}

/// The same seed always produces the same samples
#[test]
fn reproducible() {
    let dir = media_dir();
    let run = || {
        raidsim()
            .args(["simulate", "-n", "6", "-l", "raid6", "--seed", "42"])
            .arg(dir.path())
            .output()
            .unwrap()
    };
    let a = run();
    let b = run();
    assert!(a.status.success());
    assert_eq!(String::from_utf8(a.stdout).unwrap(),
               String::from_utf8(b.stdout).unwrap());
}

#[rstest]
#[case("raid1", "3")]
#[case("raid6", "3")]
fn invalid_configuration(#[case] level: &str, #[case] n: &str) {
    let dir = media_dir();
    raidsim()
        .args(["simulate", "-n", n, "-l", level])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn unrepresentable_service_time() {
    let dir = media_dir();
    raidsim()
        .args(["--seek-ms", "1e308", "simulate", "-n", "4", "-l", "raid5"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("too large to simulate"));
}

#[test]
fn compare() {
    let dir = media_dir();
    raidsim()
        .args(["compare", "-n", "3", "--seed", "1"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("66.67 %"))
        .stdout(predicate::str::contains("RAID 6"))
        .stdout(predicate::str::contains("Invalid configuration"));
}
