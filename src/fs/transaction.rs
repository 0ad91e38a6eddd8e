//! Transactions over caller-driven file system mutations.
//!
//! Paths are registered before they are touched; the caller then mutates the
//! file system with ordinary calls and declares the outcome. Nothing is
//! intercepted: the engine only captures before and restores after.
//!
//! ## Execution Guarantees
//!
//! - **Fail-closed**: A unit of work that declares neither success nor
//!   failure is rolled back
//! - **Ordering**: Rollback undoes children first, then entities, both in
//!   LIFO order
//! - **Cascade**: Children are rolled back with their parent even if they
//!   committed
//! - **Best-effort**: A failed restoration is logged and the remaining
//!   entities are still processed
//!
//! ## Phases
//!
//! 1. **Register**: Capture paths via `register()` inside the unit of work
//! 2. **Mutate**: Change the file system directly
//! 3. **Decide**: `mark_succeeded()` and/or `mark_failed()`
//! 4. **Rollback** (unless only success was declared): Restore in LIFO order
//!
//! ## Example
//!
//! ```no_run
//! # use fstx::fs::Transaction;
//! # use std::fs;
//! let mut txn = Transaction::new(());
//!
//! txn.run(|tx| {
//!     if tx.register("settings.toml", false).is_err() {
//!         return tx.mark_failed();
//!     }
//!     match fs::write("settings.toml", "answer = 42\n") {
//!         Ok(()) => tx.mark_succeeded(),
//!         Err(e) => fstx::tx_log!(tx, "write failed: {}", e).mark_failed(),
//!     }
//! });
//!
//! if !txn.ok() {
//!     for message in txn.messages() {
//!         eprintln!("{message}");
//!     }
//! }
//! txn.end();
//! ```

use super::entity::{Entity, EntityState};
use super::id::{IdSource, ProcessIds, TxId};
use crate::error::Result;

use colored::Colorize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Upper bound, in bytes, of a single error log message.
pub const MAX_MESSAGE_LEN: usize = 1024;

/// Result of a rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackResult {
    /// Every restoration step succeeded.
    Ok,
    /// At least one step failed; see the error log.
    Failed,
}

/// Outcome flags of a transaction.
///
/// `succeeded` and `failed` are set by the unit of work and may both be set,
/// in which case failure wins. `rollback` is set by the engine only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    succeeded: bool,
    failed: bool,
    rollback: Option<RollbackResult>,
}

impl Outcome {
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn rollback(&self) -> Option<RollbackResult> {
        self.rollback
    }

    /// Neither success nor failure was declared.
    pub fn is_unset(&self) -> bool {
        !self.succeeded && !self.failed
    }

    fn needs_rollback(&self) -> bool {
        self.is_unset() || self.failed
    }
}

/// A unit of file system mutation with an explicit commit/rollback outcome.
///
/// Owns its captured entities, its error log and its children. Fields are
/// declared in teardown order: children, errors, entities.
#[must_use = "Transaction must be run to commit or roll back"]
pub struct Transaction<C = ()> {
    children: Vec<Transaction<C>>,
    errors: Vec<String>,
    entities: Vec<Entity>,
    id: TxId,
    outcome: Outcome,
    decided: bool,
    context: C,
    ids: Arc<dyn IdSource>,
}

impl<C> Transaction<C> {
    /// Creates a standalone transaction numbered from the process-wide counter.
    pub fn new(context: C) -> Self {
        Self::with_ids(context, Arc::new(ProcessIds))
    }

    /// Creates a standalone transaction numbered from `ids`.
    ///
    /// Children inherit the same source.
    pub fn with_ids(context: C, ids: Arc<dyn IdSource>) -> Self {
        let id = ids.next_id();
        log::debug!("Transaction {} created", id);
        Self {
            children: Vec::new(),
            errors: Vec::new(),
            entities: Vec::new(),
            id,
            outcome: Outcome::default(),
            decided: false,
            context,
            ids,
        }
    }

    /// Creates a child transaction owned by this one.
    ///
    /// The child is rolled back whenever this transaction rolls back.
    pub fn child(&mut self, context: C) -> &mut Transaction<C> {
        let child = Transaction::with_ids(context, Arc::clone(&self.ids));
        log::debug!("Transaction {} owns child {}", self.id, child.id);

        let index = self.children.len();
        self.children.push(child);
        &mut self.children[index]
    }

    /// Runs the unit of work, then commits or rolls back.
    ///
    /// Rolls back unless the work declared success without declaring
    /// failure. A transaction is decided once; running it again is ignored.
    pub fn run<F>(&mut self, work: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        if self.decided {
            log::warn!("Transaction {} already ran; ignoring", self.id);
            return self;
        }

        work(&mut *self);
        self.decided = true;

        if self.outcome.needs_rollback() {
            log::debug!(
                "Transaction {} not successful (succeeded: {}, failed: {}), rolling back",
                self.id,
                self.outcome.succeeded,
                self.outcome.failed
            );
            self.rollback();
        } else {
            log::debug!(
                "Transaction {} committed ({} entities)",
                self.id,
                self.entities.len()
            );
        }

        self
    }

    /// Releases this transaction and all descendants.
    ///
    /// Children go first, then the error log, then the captured entities.
    pub fn end(self) {
        let Transaction {
            children,
            errors,
            entities,
            id,
            ..
        } = self;

        for child in children {
            child.end();
        }
        drop(errors);
        drop(entities);

        log::debug!("Transaction {} ended", id);
    }

    /// Captures the current state of `path` so it can be restored.
    ///
    /// On failure the message is appended to the error log, but the
    /// transaction is not marked failed; that is the caller's call.
    pub fn register(&mut self, path: impl AsRef<Path>, allow_missing: bool) -> Result<&mut Self> {
        let path = path.as_ref();

        match Entity::capture(path, allow_missing) {
            Ok(entity) => {
                log::debug!(
                    "Transaction {} registered {} {}",
                    self.id,
                    entity.state().kind(),
                    path.display()
                );
                self.entities.push(entity);
                Ok(self)
            }
            Err(e) => {
                log::warn!("Transaction {}: {}", self.id, e);
                self.log(&e);
                Err(e)
            }
        }
    }

    pub fn mark_succeeded(&mut self) {
        self.outcome.succeeded = true;
    }

    pub fn mark_failed(&mut self) {
        self.outcome.failed = true;
    }

    /// Appends a message to the error log, truncated to [`MAX_MESSAGE_LEN`].
    pub fn log(&mut self, message: impl fmt::Display) -> &mut Self {
        let message = bounded(message.to_string());
        log::debug!("Transaction {} error: {}", self.id, message);
        self.errors.push(message);
        self
    }

    /// Copy of the error log, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.errors.clone()
    }

    pub fn id(&self) -> TxId {
        self.id
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// No failure declared and no rollback attempted.
    pub fn ok(&self) -> bool {
        !self.outcome.failed && self.outcome.rollback.is_none()
    }

    pub fn rolled_back_ok(&self) -> bool {
        self.outcome.rollback == Some(RollbackResult::Ok)
    }

    pub fn rolled_back_failed(&self) -> bool {
        self.outcome.rollback == Some(RollbackResult::Failed)
    }

    pub fn rollback_attempted(&self) -> bool {
        self.outcome.rollback.is_some()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Replaces the context, returning the previous value.
    pub fn set_context(&mut self, context: C) -> C {
        std::mem::replace(&mut self.context, context)
    }

    /// Captured entities in registration order.
    ///
    /// Empty after a rollback, which consumes them.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Children in creation order.
    pub fn children(&self) -> &[Transaction<C>] {
        &self.children
    }

    /// Looks up this transaction or a descendant by id.
    pub fn find(&self, id: TxId) -> Option<&Transaction<C>> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Restores children and entities, most recent first.
    ///
    /// Never fails; every problem ends up in the error log and in
    /// [`RollbackResult::Failed`].
    fn rollback(&mut self) {
        if self.outcome.rollback.is_some() {
            log::debug!("Transaction {} already rolled back", self.id);
            return;
        }
        self.decided = true;

        let mut clean = true;

        for index in (0..self.children.len()).rev() {
            let child = &mut self.children[index];
            child.rollback();
            if child.rolled_back_failed() {
                let message = format!(
                    "rolling back transaction {}, child transaction {} failed to roll back",
                    self.id, child.id
                );
                log::warn!("{}", message);
                self.log(message);
                clean = false;
            }
        }

        while let Some(entity) = self.entities.pop() {
            for failure in entity.restore() {
                let message = format!(
                    "rolling back transaction {}, error restoring {} \"{}\" by {}: {}",
                    self.id,
                    entity.state().kind(),
                    entity.path().display(),
                    failure.step,
                    failure.source
                );
                log::warn!("{}", message);
                self.log(message);
                clean = false;
            }
        }

        self.outcome.rollback = Some(if clean {
            RollbackResult::Ok
        } else {
            RollbackResult::Failed
        });

        if clean {
            log::info!("Transaction {} rolled back", self.id);
        } else {
            log::warn!("Transaction {} rolled back with errors", self.id);
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for Transaction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("outcome", &self.outcome)
            .field("entities", &self.entities)
            .field("errors", &self.errors)
            .field("children", &self.children)
            .field("context", &self.context)
            .finish()
    }
}

fn bounded(mut message: String) -> String {
    if message.len() > MAX_MESSAGE_LEN {
        let mut end = MAX_MESSAGE_LEN;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
    }
    message
}

/// Appends a formatted message to a transaction's error log.
///
/// Evaluates to the transaction so calls can be chained:
/// `tx_log!(tx, "broke: {}", e).mark_failed()`.
#[macro_export]
macro_rules! tx_log {
    ($tx:expr, $($arg:tt)+) => {
        $tx.log(format_args!($($arg)+))
    };
}

impl<C> Transaction<C> {
    /// Prints the outcome, entities and error log of this transaction and
    /// its children to stdout.
    ///
    /// Paths are shown relative to `base` with forward slashes.
    pub fn print_summary(&self, base: &Path) {
        self.print_summary_at(base, 0);
    }

    fn print_summary_at(&self, base: &Path, depth: usize) {
        let indent = "   ".repeat(depth);

        let status = match self.outcome.rollback {
            Some(RollbackResult::Ok) => "rolled back".yellow().bold(),
            Some(RollbackResult::Failed) => "rollback failed".red().bold(),
            None if !self.decided => "not run".dimmed(),
            None if self.outcome.failed => "failed".red().bold(),
            None => "committed".green().bold(),
        };
        println!("{}Transaction {} {}", indent, self.id.to_string().cyan(), status);

        let display_path = |path: &Path| -> String {
            let relative = pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf());
            relative.to_string_lossy().replace('\\', "/")
        };

        for entity in &self.entities {
            let path = display_path(entity.path());
            match entity.state() {
                EntityState::File { .. } => println!("{}   {} {}", indent, "📄", path.dimmed()),
                EntityState::Symlink { target } => println!(
                    "{}   {} {} → {}",
                    indent,
                    "🔗",
                    path.dimmed(),
                    target.display()
                ),
                EntityState::NoEnt => println!("{}   {} {}", indent, "✨", path.dimmed()),
            }
        }

        for (n, message) in self.errors.iter().enumerate() {
            println!(
                "{}   {} Tx_{} error {:02} - {}",
                indent,
                "✗".red(),
                self.id,
                n,
                message
            );
        }

        for child in &self.children {
            child.print_summary_at(base, depth + 1);
        }
    }
}
