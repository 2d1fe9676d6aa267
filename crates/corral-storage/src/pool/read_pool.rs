//! Read-side connections. Under WAL a reader sees the last committed
//! snapshot and never waits on the serializer.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, TryLockError};

use rusqlite::{Connection, OpenFlags};

use corral_core::errors::CorralResult;

use super::pragmas::apply_read_pragmas;
use crate::to_storage_err;

const MAX_READERS: usize = 8;

/// Read-only connections to one database file.
///
/// A read takes the first idle slot, starting from a rotating offset, and
/// only queues behind a busy slot when every slot is busy.
pub struct ReadPool {
    slots: Vec<Mutex<Connection>>,
    cursor: AtomicUsize,
}

impl ReadPool {
    pub fn open(path: &Path, size: usize, busy_timeout_ms: u32) -> CorralResult<Self> {
        let slots = (0..size.clamp(1, MAX_READERS))
            .map(|_| open_reader(path, busy_timeout_ms).map(Mutex::new))
            .collect::<CorralResult<Vec<_>>>()?;
        Ok(Self {
            slots,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> CorralResult<T>
    where
        F: FnOnce(&Connection) -> CorralResult<T>,
    {
        let n = self.slots.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        for offset in 0..n {
            match self.slots[(start + offset) % n].try_lock() {
                Ok(conn) => return f(&conn),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => return Err(poisoned()),
            }
        }
        let conn = self.slots[start % n].lock().map_err(|_| poisoned())?;
        f(&conn)
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }
}

fn open_reader(path: &Path, busy_timeout_ms: u32) -> CorralResult<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| to_storage_err(format!("open reader {}: {e}", path.display())))?;
    apply_read_pragmas(&conn, busy_timeout_ms)?;
    Ok(conn)
}

fn poisoned() -> corral_core::errors::CorralError {
    to_storage_err("read connection poisoned")
}
