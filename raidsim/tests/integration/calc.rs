use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::Builder;

use super::raidsim;

#[test]
fn raid5() {
    raidsim()
        .args(["calc", "-n", "4", "-l", "raid5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("75.00 %"))
        .stdout(predicate::str::contains("300 GB"))
        .stdout(predicate::str::is_match(r"Fault tolerance\s+1").unwrap());
}

#[test]
fn raid6_too_few_disks() {
    raidsim()
        .args(["calc", "-n", "3", "-l", "raid6"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn too_many_disks() {
    raidsim()
        .args(["calc", "-n", "13", "-l", "raid0"])
        .assert()
        .failure();
}

#[test]
fn size_ceiling() {
    raidsim()
        .args(["size", "--capacity-gb", "1024"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Total disks\s+11").unwrap());
}

#[test]
fn size_nearest() {
    raidsim()
        .args(["size", "--capacity-gb", "1024", "--nearest"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Total disks\s+10").unwrap());
}

#[test]
fn size_performance_bound() {
    raidsim()
        .args(["size", "--capacity-gb", "100", "--iops", "400",
               "--read-percent", "75", "--write-percent", "25"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Performance disks\s+8").unwrap())
        .stdout(predicate::str::contains("performance"));
}

#[test]
fn size_bad_mix() {
    raidsim()
        .args(["size", "--capacity-gb", "100", "--iops", "400",
               "--read-percent", "75"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sum to 100"));
}

#[test]
fn config_file() {
    let tempdir = Builder::new()
        .prefix(concat!(module_path!(), "."))
        .tempdir()
        .unwrap();
    let path = tempdir.path().join("raidsim.yaml");
    std::fs::write(&path, "disk:\n  rpm: 7200\n  capacity_gb: 2000\n")
        .unwrap();
    raidsim()
        .arg("--config")
        .arg(&path)
        .arg("--seek-ms")
        .arg("8")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("rpm: 7200"))
        .stdout(predicate::str::contains("capacity_gb: 2000"))
        .stdout(predicate::str::contains("seek_time_ms: 8"));
}

#[test]
fn config_file_missing() {
    raidsim()
        .args(["--config", "/nonexistent/raidsim.yaml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}
