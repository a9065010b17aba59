//! Adapter token registry.
//!
//! The decoding engine stores a single `void *client_data` value and passes
//! it back on every callback invocation. Handing the engine a raw address
//! would tie callback safety to the exact allocation lifetime of the
//! session; instead the engine holds an opaque *token* — a small integer
//! cast into the pointer slot — and callbacks recover the live adapter
//! state through this process-global indirection table.
//!
//! Tokens are allocated from a monotonically increasing counter and never
//! reused, so a stale token held by a misbehaving engine simply misses the
//! table instead of dereferencing freed memory.
//!
//! # Invariants
//! - A token is registered strictly before the engine's open handshake and
//!   deregistered strictly after the engine's teardown call returns; the
//!   engine may invoke callbacks at any point in between.
//! - Registry entries are only dereferenced on the thread driving the
//!   owning session (callbacks are synchronous and re-entrant within that
//!   session's calls); the mutex makes the table itself sound, not
//!   concurrent use of one session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use libc::c_void;

use crate::source::SourceState;

/// Opaque handle the engine carries in its `client_data` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token(u64);

impl Token {
    /// Encodes the token into the engine's pointer-sized client-data slot.
    ///
    /// This is a value cast, not an address: the result must never be
    /// dereferenced, only handed back to [`lookup`].
    pub(crate) fn as_client_data(self) -> *mut c_void {
        self.0 as usize as *mut c_void
    }

    /// Decodes a token from the engine's client-data slot.
    pub(crate) fn from_client_data(client_data: *mut c_void) -> Self {
        Token(client_data as usize as u64)
    }
}

/// Raw pointer to a live adapter state, type- and lifetime-erased for
/// storage in the global table.
struct SlotPtr(*mut SourceState<'static>);

// A SlotPtr is only dereferenced on the thread driving the session that
// registered it; the table mutex covers insertion and removal.
unsafe impl Send for SlotPtr {}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

fn registry() -> &'static Mutex<HashMap<u64, SlotPtr>> {
    static REGISTRY: OnceLock<Mutex<HashMap<u64, SlotPtr>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Registers a live adapter state and returns its token.
///
/// The caller owns the state and must keep it alive (and pinned at this
/// address) until [`deregister`] is called.
pub(crate) fn register(state: *mut SourceState<'static>) -> Token {
    let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
    registry()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(token, SlotPtr(state));
    Token(token)
}

/// Removes a token from the table.
///
/// Must only be called once the engine can no longer invoke callbacks for
/// this session, i.e. after its teardown call has returned.
pub(crate) fn deregister(token: Token) {
    registry()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .remove(&token.0);
}

/// Recovers the adapter state registered under `token`, if it is live.
pub(crate) fn lookup(token: Token) -> Option<*mut SourceState<'static>> {
    registry()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(&token.0)
        .map(|slot| slot.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trips_through_client_data() {
        let token = Token(42);
        assert_eq!(Token::from_client_data(token.as_client_data()), token);
    }

    #[test]
    fn test_register_lookup_deregister() {
        let mut state = SourceState::streaming(std::io::empty());
        let ptr = state.as_mut() as *mut SourceState<'_> as *mut SourceState<'static>;

        let token = register(ptr);
        assert_eq!(lookup(token), Some(ptr));

        deregister(token);
        assert_eq!(lookup(token), None);
        // Removing twice is harmless.
        deregister(token);
    }

    #[test]
    fn test_tokens_are_never_reused() {
        let mut state = SourceState::streaming(std::io::empty());
        let ptr = state.as_mut() as *mut SourceState<'_> as *mut SourceState<'static>;

        let first = register(ptr);
        deregister(first);
        let second = register(ptr);
        deregister(second);

        assert_ne!(first, second);
        assert_eq!(lookup(first), None);
    }
}
