use assert_cmd::prelude::*;
use predicates::prelude::*;

use super::raidsim;

#[test]
fn encode() {
    raidsim()
        .args(["parity", "encode", "10", "6", "1"])
        .assert()
        .success()
        .stdout("13\n");
}

#[test]
fn recover() {
    raidsim()
        .args(["parity", "recover", "-p", "13", "10", "1"])
        .assert()
        .success()
        .stdout("6\n");
}

#[test]
fn encode_not_a_number() {
    raidsim()
        .args(["parity", "encode", "10", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
}
