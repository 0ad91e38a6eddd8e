//! Shared fixtures for fstx integration tests.
//!
//! Lays out a small tree in a temporary directory:
//!
//! ```text
//! test_dir1/
//! test_dir2/test_file1.txt      "foo\nbar\nbaz\n"
//! test_dir2/test_symlink1.txt → test_file1.txt
//! ```

use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const FILE_CONTENT: &str = "foo\nbar\nbaz\n";
pub const LINK_TARGET: &str = "test_file1.txt";

pub struct Fixture {
    pub temp: TempDir,
}

#[allow(unused)]
impl Fixture {
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn dir1(&self) -> PathBuf {
        self.root().join("test_dir1")
    }

    pub fn file1(&self) -> PathBuf {
        self.root().join("test_dir2/test_file1.txt")
    }

    pub fn symlink1(&self) -> PathBuf {
        self.root().join("test_dir2/test_symlink1.txt")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    pub fn assert_file1_restored(&self) {
        let meta = fs::symlink_metadata(self.file1()).unwrap();
        assert!(meta.file_type().is_file(), "expected a regular file");
        assert_eq!(fs::read_to_string(self.file1()).unwrap(), FILE_CONTENT);
    }

    pub fn assert_symlink1_restored(&self) {
        assert_eq!(
            fs::read_link(self.symlink1()).unwrap(),
            PathBuf::from(LINK_TARGET)
        );
    }
}

/// Helper to create the standard test tree
#[allow(unused)]
pub fn create_fixture() -> Fixture {
    let temp = TempDir::new().unwrap();

    fs::create_dir(temp.path().join("test_dir1")).unwrap();
    fs::create_dir(temp.path().join("test_dir2")).unwrap();
    fs::write(temp.path().join("test_dir2/test_file1.txt"), FILE_CONTENT).unwrap();
    std::os::unix::fs::symlink(LINK_TARGET, temp.path().join("test_dir2/test_symlink1.txt"))
        .unwrap();

    Fixture { temp }
}

/// Helper to run the fstx binary in `dir`
#[allow(unused)]
pub fn run_fstx(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("fstx");
    cmd.arg("--dir").arg(dir).args(args).env("NO_COLOR", "1");

    cmd.assert()
}
