// vim: tw=80
//! The modeled workload: a set of media files plus an optional I/O profile
//!
//! File metadata can tell us how much capacity a workload needs, but not how
//! many IOPS it generates.  So the I/O rate is supplied separately, and the
//! model produces two independent sizing requests.

use serde_derive::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use crate::{
    raid::RaidLevel,
    types::*,
};

/// Broad class of a media file
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum FileKind {
    Image,
    Video,
}

impl FileKind {
    const IMAGE_EXTENSIONS: [&'static str; 5] = ["bmp", "gif", "jpeg", "jpg",
        "png"];
    const VIDEO_EXTENSIONS: [&'static str; 5] = ["avi", "mkv", "mov", "mp4",
        "webm"];

    /// Classify a file by its extension, if it's a supported media file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref()
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        ext.parse().ok()
    }
}

impl FromStr for FileKind {
    type Err = Error;

    /// Parse a bare file extension, without the dot
    fn from_str(s: &str) -> Result<Self> {
        let ext = s.to_ascii_lowercase();
        if Self::IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(FileKind::Image)
        } else if Self::VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Ok(FileKind::Video)
        } else {
            Err(Error::input(format!("Not a media file extension: {s}")))
        }
    }
}

/// One file of the workload, as reported by a scanner
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub kind: FileKind,
}

impl FileDescriptor {
    pub fn new<P: Into<PathBuf>>(path: P, size_bytes: u64, kind: FileKind)
        -> Self
    {
        FileDescriptor { path: path.into(), size_bytes, kind }
    }
}

/// A front-end I/O demand profile, without the per-disk IOPS figure.  That
/// comes from the disk model.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct IoProfile {
    pub total_iops: f64,
    pub read_percent: f64,
    pub write_percent: f64,
}

/// A set of files, and optionally how hard they'll be accessed.
#[derive(Clone, Debug, Default)]
pub struct WorkloadModel {
    files: Vec<FileDescriptor>,
    profile: Option<IoProfile>,
}

impl WorkloadModel {
    pub fn new(files: Vec<FileDescriptor>) -> Self {
        WorkloadModel { files, profile: None }
    }

    /// Attach an I/O profile, enabling performance-driven sizing.
    pub fn with_profile(mut self, profile: IoProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn profile(&self) -> Option<&IoProfile> {
        self.profile.as_ref()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    pub fn capacity_requirement(&self) -> CapacityRequirement {
        CapacityRequirement {
            total_capacity_gb: self.total_bytes() as f64 / BYTES_PER_GB as f64
        }
    }

    /// The performance sizing request, if an I/O profile was supplied.
    pub fn workload(&self, iops_per_disk: f64) -> Option<Workload> {
        self.profile.map(|p| Workload::new(p.total_iops, p.read_percent,
                                           p.write_percent, iops_per_disk))
    }

    /// Model how the files would be laid out across an `n` disk array.
    ///
    /// Nothing is copied; this only computes the assignment.
    pub fn distribute(&self, level: RaidLevel, n: u32) -> Result<Placement> {
        level.validate(n)?;
        let n = n as usize;
        let mut placement = Placement {
            disk_bytes: vec![0; n],
            parity_bytes: vec![0; n],
            files: Vec::with_capacity(self.files.len()),
        };
        for (idx, f) in self.files.iter().enumerate() {
            let parity_disks: Vec<usize> = (0..level.parity_disks() as usize)
                .map(|p| (idx + p) % n)
                .collect();
            let data_disks = match level {
                RaidLevel::Raid1 => {
                    let pair = (0..n / 2)
                        .min_by_key(|&p| placement.disk_bytes[2 * p])
                        .unwrap_or(0);
                    vec![2 * pair, 2 * pair + 1]
                },
                _ => {
                    // Ties go to the lowest-numbered disk
                    let target = (0..n)
                        .filter(|d| !parity_disks.contains(d))
                        .min_by_key(|&d| (placement.disk_bytes[d], d))
                        .unwrap_or(0);
                    vec![target]
                }
            };
            for &d in data_disks.iter() {
                placement.disk_bytes[d] += f.size_bytes;
            }
            for &d in parity_disks.iter() {
                placement.parity_bytes[d] += f.size_bytes;
            }
            placement.files.push(FilePlacement { data_disks, parity_disks });
        }
        Ok(placement)
    }
}

/// Where one file's data and parity were placed
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilePlacement {
    pub data_disks: Vec<usize>,
    pub parity_disks: Vec<usize>,
}

/// The modeled assignment of a workload's files to virtual disks
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Placement {
    /// Data bytes on each disk, including mirror copies
    pub disk_bytes: Vec<u64>,
    /// Parity bytes on each disk
    pub parity_bytes: Vec<u64>,
    /// One entry per file, in workload order
    pub files: Vec<FilePlacement>,
}

impl Placement {
    /// Total bytes, data and parity, on each disk
    pub fn per_disk_bytes(&self) -> Vec<u64> {
        self.disk_bytes.iter()
            .zip(self.parity_bytes.iter())
            .map(|(d, p)| d + p)
            .collect()
    }
}
