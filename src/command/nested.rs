//! A parent transaction with one child.
//!
//! The parent creates `example_nested_1` (a directory), writes
//! `example_nested_2`, runs the child, then increments the counter in
//! `example_nested_3`. The child overwrites `example_nested_2` and points the
//! symlink `example_nested_4` at `.`.
//!
//! `--fail-child` makes only the child roll back. `--fail-parent` makes the
//! parent roll back, which undoes the child as well even though it committed.

use super::report;
use crate::error::Result;
use crate::fs::Transaction;
use crate::tx_log;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::fs::{self, OpenOptions};
use std::path::Path;

pub const DIR: &str = "example_nested_1";
pub const FILE: &str = "example_nested_2";
pub const COUNTER: &str = "example_nested_3";
pub const LINK: &str = "example_nested_4";

#[derive(Parser, Debug, Clone, Copy, Default)]
pub struct NestedArgs {
    /// Fail the child transaction after its changes
    #[arg(long)]
    pub fail_child: bool,

    /// Fail the parent transaction after the child committed
    #[arg(long)]
    pub fail_parent: bool,
}

pub fn execute(args: NestedArgs, dir: &Path) -> Result<()> {
    let counter = dir.join(COUNTER);
    if !counter.exists() {
        fs::write(&counter, "0\n")
            .with_context(|| format!("Failed to seed counter {}", counter.display()))?;
    }

    let mut txn = Transaction::new(args);
    txn.run(|tx| parent(tx, dir));
    report(txn, "Main", dir)
}

fn parent(tx: &mut Transaction<NestedArgs>, dir: &Path) {
    tx.mark_succeeded();
    let args = *tx.context();

    let new_dir = dir.join(DIR);
    let file = dir.join(FILE);
    let counter = dir.join(COUNTER);

    if tx.register(&new_dir, true).is_err()
        || tx.register(&file, true).is_err()
        || tx.register(&counter, false).is_err()
    {
        return tx.mark_failed();
    }

    if tx.create_dir(&new_dir, 0o777).is_err() {
        return;
    }

    if let Err(e) = fs::write(&file, "foobar\n") {
        return tx_log!(tx, "error writing to {}: {}", FILE, e).mark_failed();
    }

    let child = tx.child(args);
    child.run(|tx| child_work(tx, dir));
    if child.ok() {
        println!("{}", "Child transaction successful!".green());
    } else {
        println!("{}", "Child transaction failed!".yellow());
    }

    let Ok(mut f) = tx.open(&counter, OpenOptions::new().read(true)) else {
        return;
    };
    let mut buf = [0u8; 10];
    let Ok(len) = tx.read(&mut f, &mut buf) else {
        return;
    };
    drop(f);

    let count: i64 = String::from_utf8_lossy(&buf[..len]).trim().parse().unwrap_or(0);
    let next = format!("{}\n", count + 1);

    let Ok(mut f) = tx.open(&counter, OpenOptions::new().write(true).truncate(true)) else {
        return;
    };
    if tx.write(&mut f, next.as_bytes()).is_err() {
        return;
    }

    if args.fail_parent {
        tx_log!(tx, "deliberate failure at end of main transaction").mark_failed();
    }
}

fn child_work(tx: &mut Transaction<NestedArgs>, dir: &Path) {
    tx.mark_succeeded();
    let args = *tx.context();

    let file = dir.join(FILE);
    let link = dir.join(LINK);

    if tx.register(&file, false).is_err() || tx.register(&link, true).is_err() {
        return tx.mark_failed();
    }

    let Ok(mut f) = tx.open(&file, OpenOptions::new().write(true).create(true).truncate(true))
    else {
        return;
    };
    if tx.write(&mut f, b"xxx\n").is_err() {
        return;
    }
    drop(f);

    let _ = fs::remove_dir(&link);
    let _ = fs::remove_file(&link);
    if let Err(e) = symlink(".", &link) {
        return tx_log!(tx, "error linking {}: {}", LINK, e).mark_failed();
    }

    if args.fail_child {
        tx_log!(tx, "deliberate failure at end of child transaction").mark_failed();
    }
}

#[cfg(unix)]
fn symlink(target: &str, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &str, link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("cannot create symlink {} on this platform", link.display()),
    ))
}
