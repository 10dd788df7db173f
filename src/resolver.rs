//! Alias resolution policies
//!
//! One tagged policy selected at construction rather than separate resolver
//! implementations. All policies resolve known UIDs identically; they differ
//! only in how an unknown UID is handled.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::store::AliasStore;

/// Marker substituted when no alias is known for a UID
pub const UNKNOWN_ALIAS: &str = "unknown";

/// Policy applied to UIDs with no stored alias
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolvePolicy {
    /// Unknown UIDs map to the [`UNKNOWN_ALIAS`] marker; a notice is logged
    #[default]
    ReadOnly,
    /// Unknown UIDs trigger a blocking prompt for a name, which is persisted
    /// immediately. The prompt deliberately suspends the whole event loop.
    InteractiveRegister,
    /// Like [`ReadOnly`](Self::ReadOnly) but without the notice
    SilentDefault,
}

/// Maps UIDs to aliases, consulting and (under some policies) mutating the
/// alias store
#[derive(Debug)]
pub struct AliasResolver {
    policy: ResolvePolicy,
    /// Where registrations are persisted
    store_path: PathBuf,
}

impl AliasResolver {
    /// Create a resolver with the given policy
    pub const fn new(policy: ResolvePolicy, store_path: PathBuf) -> Self {
        Self { policy, store_path }
    }

    /// The policy this resolver applies to unknown UIDs
    pub const fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    /// Resolve a UID to an alias
    pub fn resolve(&self, store: &mut AliasStore, uid: &str) -> String {
        if let Some(alias) = store.resolve(uid) {
            return alias.to_owned();
        }

        match self.policy {
            ResolvePolicy::ReadOnly => {
                info!(uid = %uid, "new UID with no stored alias");
                UNKNOWN_ALIAS.to_owned()
            }
            ResolvePolicy::SilentDefault => UNKNOWN_ALIAS.to_owned(),
            ResolvePolicy::InteractiveRegister => {
                self.register(store, uid, &mut io::stdin().lock())
            }
        }
    }

    /// Prompt for a name and persist the new binding. Empty or whitespace
    /// input declines the registration; the store is untouched.
    fn register(&self, store: &mut AliasStore, uid: &str, input: &mut impl BufRead) -> String {
        let Some(alias) = prompt(input, &format!("New card {uid}. Enter a name (empty to skip): "))
        else {
            return UNKNOWN_ALIAS.to_owned();
        };

        store.insert(uid, alias.clone());
        if let Err(e) = store.save(&self.store_path) {
            warn!(error = %e, path = %self.store_path.display(), "could not persist alias store");
        }

        alias
    }
}

/// Read one trimmed line from `input`; empty input is `None`
fn prompt(input: &mut impl BufRead, message: &str) -> Option<String> {
    print!("{message}");
    io::stdout().flush().ok()?;

    let mut line = String::new();
    input.read_line(&mut line).ok()?;

    let line = line.trim();
    (!line.is_empty()).then(|| line.to_owned())
}
