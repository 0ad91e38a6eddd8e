#![cfg(unix)]

mod common;

use std::fs;
use std::sync::Arc;

use common::*;
use fstx::fs::Sequence;
use fstx::{Transaction, TxId};

#[test]
fn test_rollback_rolls_back_children() {
    let fx = create_fixture();

    let mut txn: Transaction<Option<TxId>> = Transaction::new(None);
    txn.run(|tx| {
        let child = tx.child(None);
        child.run(|c| {
            c.register(fx.file1(), false).unwrap();
            fs::write(fx.file1(), "child was here").unwrap();
            c.mark_succeeded();
        });
        assert!(child.ok());
        let child_id = child.id();

        tx.set_context(Some(child_id));
        tx.mark_failed();
    });

    assert!(txn.rolled_back_ok(), "{:?}", txn.messages());

    let child_id = txn.context().unwrap();
    let child = txn.find(child_id).unwrap();
    assert!(child.rolled_back_ok());
    assert!(!child.ok());
    fx.assert_file1_restored();
}

#[test]
fn test_committed_child_survives_committed_parent() {
    let fx = create_fixture();

    let mut txn = Transaction::new(());
    txn.run(|tx| {
        tx.child(()).run(|c| {
            c.register(fx.file1(), false).unwrap();
            fs::write(fx.file1(), "child was here").unwrap();
            c.mark_succeeded();
        });
        tx.mark_succeeded();
    });

    assert!(txn.ok());
    assert!(txn.children()[0].ok());
    assert_eq!(fs::read_to_string(fx.file1()).unwrap(), "child was here");
}

#[test]
fn test_failed_child_does_not_fail_parent() {
    let fx = create_fixture();
    let parent_file = fx.path("parent.txt");

    let mut txn = Transaction::new(());
    txn.run(|tx| {
        tx.register(&parent_file, true).unwrap();
        fs::write(&parent_file, "parent").unwrap();

        let child = tx.child(());
        child.run(|c| {
            c.register(fx.file1(), false).unwrap();
            fs::write(fx.file1(), "child was here").unwrap();
            c.mark_failed();
        });
        assert!(child.rolled_back_ok());

        tx.mark_succeeded();
    });

    assert!(txn.ok());
    assert_eq!(fs::read_to_string(&parent_file).unwrap(), "parent");
    fx.assert_file1_restored();
}

#[test]
fn test_children_roll_back_before_parent_entities() {
    let fx = create_fixture();

    // Parent and child touch the same file; undoing the child first and the
    // parent last leaves the parent's capture in place.
    let mut txn = Transaction::new(());
    txn.run(|tx| {
        tx.register(fx.file1(), false).unwrap();
        fs::write(fx.file1(), "parent edit\n").unwrap();

        tx.child(()).run(|c| {
            c.register(fx.file1(), false).unwrap();
            fs::write(fx.file1(), "child edit\n").unwrap();
            c.mark_succeeded();
        });

        tx.mark_failed();
    });

    assert!(txn.rolled_back_ok(), "{:?}", txn.messages());
    fx.assert_file1_restored();
}

#[test]
fn test_most_recent_child_rolls_back_first() {
    let fx = create_fixture();

    let mut txn = Transaction::new(());
    txn.run(|tx| {
        tx.child(()).run(|c| {
            c.register(fx.file1(), false).unwrap();
            fs::write(fx.file1(), "first child\n").unwrap();
            c.mark_succeeded();
        });
        tx.child(()).run(|c| {
            c.register(fx.file1(), false).unwrap();
            fs::write(fx.file1(), "second child\n").unwrap();
            c.mark_succeeded();
        });
        tx.mark_failed();
    });

    assert!(txn.children().iter().all(|c| c.rolled_back_ok()));
    fx.assert_file1_restored();
}

#[test]
fn test_cascade_reaches_grandchildren() {
    let fx = create_fixture();
    let new_dir = fx.path("deep");

    let mut txn = Transaction::with_ids((), Arc::new(Sequence::starting_at(1)));
    txn.run(|tx| {
        tx.child(()).run(|c| {
            c.child(()).run(|g| {
                g.register(&new_dir, true).unwrap();
                g.create_dir(&new_dir, 0o755).unwrap();
                g.mark_succeeded();
            });
            c.mark_succeeded();
        });
        tx.mark_failed();
    });

    assert!(!new_dir.exists());
    let grandchild = txn.find(TxId(3)).unwrap();
    assert!(grandchild.rolled_back_ok());
}

#[test]
fn test_child_rollback_failure_marks_parent_failed() {
    let fx = create_fixture();
    let new_dir = fx.path("grown");

    let mut txn = Transaction::new(());
    txn.run(|tx| {
        tx.child(()).run(|c| {
            c.register(&new_dir, true).unwrap();
            fs::create_dir(&new_dir).unwrap();
            fs::write(new_dir.join("unregistered"), "x").unwrap();
            c.mark_succeeded();
        });
        tx.mark_failed();
    });

    assert!(txn.children()[0].rolled_back_failed());
    assert!(txn.rolled_back_failed());
    assert!(
        txn.messages()
            .iter()
            .any(|m| m.contains("failed to roll back"))
    );
}
