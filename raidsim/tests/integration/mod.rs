use std::{fs, path::Path, process::Command};

use assert_cmd::prelude::*;
use tempfile::{Builder, TempDir};

mod calc;
mod parity;
mod scan;
mod simulate;

pub fn raidsim() -> Command {
    Command::cargo_bin("raidsim").unwrap()
}

fn touch(path: &Path, len: u64) {
    fs::File::create(path).unwrap().set_len(len).unwrap();
}

/// A small media library: two photos, a video, and a file to be ignored
pub fn media_dir() -> TempDir {
    let tempdir = Builder::new()
        .prefix(concat!(module_path!(), "."))
        .tempdir()
        .unwrap();
    let videos = tempdir.path().join("videos");
    fs::create_dir(&videos).unwrap();
    touch(&tempdir.path().join("a.jpg"), 2048);
    touch(&tempdir.path().join("b.png"), 4096);
    touch(&videos.join("c.mov"), 1 << 20);
    touch(&tempdir.path().join("readme.txt"), 100);
    tempdir
}
