//! Process-wide registry of file-backed cursors.
//!
//! Cursors close their streams deterministically when dropped, so unlike
//! the shutdown-hook designs this pattern descends from, nothing here is
//! on the closing path. The registry holds weak references only and exists
//! to answer one question: are there file-backed cursors whose streams are
//! still open? Tests use it to detect leaks; long-running hosts can poll
//! it for diagnostics.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

static REGISTRY: Mutex<Vec<Weak<CursorTicket>>> = Mutex::new(Vec::new());

/// One file-backed cursor's registry entry.
///
/// The owning cursor holds the only strong reference; the registry keeps a
/// weak one, so a ticket never keeps its cursor (or the cursor's file
/// handle) alive.
pub struct CursorTicket {
    path: PathBuf,
    open: AtomicBool,
}

impl CursorTicket {
    pub(crate) fn new(path: PathBuf) -> Arc<Self> {
        let ticket = Arc::new(Self {
            path,
            open: AtomicBool::new(true),
        });
        REGISTRY.lock().push(Arc::downgrade(&ticket));
        ticket
    }

    /// Returns the spill file this cursor reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true while the cursor's stream is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Marks the stream closed, returning whether it was open before.
    pub(crate) fn mark_closed(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }
}

/// Counts the live cursors whose streams are still open.
#[must_use]
pub fn open_cursors() -> usize {
    REGISTRY
        .lock()
        .iter()
        .filter_map(Weak::upgrade)
        .filter(|ticket| ticket.is_open())
        .count()
}

/// Prunes entries for cursors that have been dropped, returning the number
/// of live entries that remain.
pub fn sweep() -> usize {
    let mut registry = REGISTRY.lock();
    registry.retain(|weak| weak.upgrade().is_some());
    registry.len()
}
