//! Same effect as `hello`, with the pass-through helpers doing the error
//! bookkeeping.

use super::report;
use crate::error::Result;
use crate::fs::Transaction;

use std::fs::OpenOptions;
use std::path::Path;

pub const FILE: &str = "example_shortcuts_1";
pub const DIR: &str = "example_shortcuts_2";

pub fn execute(dir: &Path) -> Result<()> {
    let mut txn = Transaction::new(());
    txn.run(|tx| do_stuff(tx, dir));
    report(txn, "Shortcuts", dir)
}

fn do_stuff(tx: &mut Transaction, dir: &Path) {
    let file = dir.join(FILE);
    let new_dir = dir.join(DIR);

    if tx.register(&file, true).is_err() || tx.register(&new_dir, true).is_err() {
        return tx.mark_failed();
    }

    let Ok(mut f) = tx.open(&file, OpenOptions::new().write(true).create(true).truncate(true))
    else {
        return;
    };
    if tx.write(&mut f, b"some_data\n").is_err() || tx.outcome().failed() {
        return;
    }
    drop(f);
    eprintln!("Wrote some_data to {} successfully...", FILE);

    if tx.create_dir(&new_dir, 0o777).is_err() {
        return;
    }
    eprintln!("Created directory {} successfully...", DIR);

    tx.mark_succeeded();
}
