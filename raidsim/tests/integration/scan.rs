use assert_cmd::prelude::*;
use predicates::prelude::*;

use super::{media_dir, raidsim};

#[test]
fn table() {
    let dir = media_dir();
    raidsim()
        .arg("scan")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("3 files"))
        .stdout(predicate::str::contains("c.mov"))
        .stdout(predicate::str::contains("readme.txt").not());
}

#[test]
fn parseable() {
    let dir = media_dir();
    let expected = format!("Image\t2048\t{}\nImage\t4096\t{}\nVideo\t1048576\t{}\n",
        dir.path().join("a.jpg").display(),
        dir.path().join("b.png").display(),
        dir.path().join("videos").join("c.mov").display());
    raidsim()
        .args(["scan", "-p"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn not_a_directory() {
    let dir = media_dir();
    raidsim()
        .arg("scan")
        .arg(dir.path().join("a.jpg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a directory"));
}
