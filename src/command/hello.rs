//! Writes `example_hello_1` and creates the directory `example_hello_2`.
//!
//! Both changes happen or neither does. Running it twice fails on the second
//! run, because the directory already exists and cannot be registered, and
//! the rewritten file is put back.

use super::report;
use crate::error::Result;
use crate::fs::Transaction;

use std::fs;
use std::io::Write;
use std::path::Path;

pub const FILE: &str = "example_hello_1";
pub const DIR: &str = "example_hello_2";

pub fn execute(dir: &Path) -> Result<()> {
    let mut txn = Transaction::new(());
    txn.run(|tx| do_stuff(tx, dir));
    report(txn, "Hello", dir)
}

fn do_stuff(tx: &mut Transaction, dir: &Path) {
    let file = dir.join(FILE);
    let new_dir = dir.join(DIR);

    if tx.register(&file, true).is_err() {
        eprintln!("Error adding {} to transaction", FILE);
        return tx.mark_failed();
    }
    if let Err(e) = tx.register(&new_dir, true) {
        eprintln!("Error adding {} to transaction: {}", DIR, e);
        return tx.mark_failed();
    }

    let written = fs::File::create(&file).and_then(|mut f| f.write_all(b"some_data\n"));
    if let Err(e) = written {
        eprintln!("Error writing to file {}: {}", FILE, e);
        return tx.mark_failed();
    }
    eprintln!("Wrote some_data to {} successfully...", FILE);

    if let Err(e) = fs::create_dir(&new_dir) {
        eprintln!("Error creating directory {}: {}", DIR, e);
        return tx.mark_failed();
    }
    eprintln!("Created directory {} successfully...", DIR);

    tx.mark_succeeded();
}
