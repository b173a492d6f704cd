//! Optimistic mutations with exact rollback
//!
//! A mutation is applied to in-memory state first, then committed. When the
//! commit fails the state is restored from the snapshot taken by `apply`.
use std::future::Future;

use uuid::Uuid;

use crate::error::AppResult;

/// Prefix of ids standing in for a server-assigned id
pub const TEMP_ID_PREFIX: &str = "temp";
/// Prefix of permanent ids of records kept in local storage
pub const LOCAL_ID_PREFIX: &str = "local";

pub fn temporary_id() -> String {
    prefixed_id(TEMP_ID_PREFIX)
}

pub fn local_id() -> String {
    prefixed_id(LOCAL_ID_PREFIX)
}

fn prefixed_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// How a store operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Applied and committed
    Done,
    /// Already in the desired state; nothing was sent
    Duplicate,
    /// Needs a signed-in user; nothing changed
    SignedOut,
    /// Rejected before touching state
    Invalid,
    /// Target record does not exist
    Missing,
    /// Commit failed and state was restored
    RolledBack,
    /// A read failed; state is unchanged
    Failed,
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done)
    }
}

/// Runs `apply` on `state`, then `commit`; on a failed commit hands the
/// snapshot back to `rollback`
///
/// `commit` sees the state after `apply` but the future it returns must not
/// borrow it.
pub async fn attempt<S, Snap, T, Fut>(
    state: &mut S,
    apply: impl FnOnce(&mut S) -> Snap,
    commit: impl FnOnce(&S) -> Fut,
    rollback: impl FnOnce(&mut S, Snap),
) -> AppResult<T>
where
    Fut: Future<Output = AppResult<T>>,
{
    let snapshot = apply(state);
    let pending = commit(&*state);

    match pending.await {
        Ok(value) => Ok(value),
        Err(e) => {
            rollback(state, snapshot);
            Err(e)
        }
    }
}

/// Restores a whole-value snapshot
pub fn restore<S>(state: &mut S, snapshot: S) {
    *state = snapshot;
}
