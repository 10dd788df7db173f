//! The card event loop
//!
//! Consumes batches of card events, resolves aliases on insertion, and
//! pushes the resolved alias into the condition sink on removal. Insertions
//! are processed before removals within every batch, so a card inserted and
//! removed within the same observed batch still resolves correctly. A
//! failure on one card never aborts the rest of the batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::event::{BatchReceiver, CardEvent, EventBatch};
use crate::presence::{CardSignature, PresenceRecord, PresenceTracker, Removal};
use crate::resolver::{AliasResolver, UNKNOWN_ALIAS};
use crate::sink::ConditionSink;
use crate::store::AliasStore;
use crate::transport::Connector;
use crate::uid::read_uid;

/// Event loop dispatching card events to the alias and condition machinery
#[allow(missing_debug_implementations)]
pub struct Watcher<C: Connector> {
    connector: C,
    store: AliasStore,
    resolver: AliasResolver,
    presence: PresenceTracker,
    sink: ConditionSink,
}

impl<C: Connector> Watcher<C> {
    /// Create a watcher
    pub fn new(
        connector: C,
        store: AliasStore,
        resolver: AliasResolver,
        sink: ConditionSink,
    ) -> Self {
        Self {
            connector,
            store,
            resolver,
            presence: PresenceTracker::new(),
            sink,
        }
    }

    /// The alias store
    pub const fn store(&self) -> &AliasStore {
        &self.store
    }

    /// Mutable access to the alias store
    pub const fn store_mut(&mut self) -> &mut AliasStore {
        &mut self.store
    }

    /// Process batches until `running` clears or the channel disconnects
    pub fn run(&mut self, events: &BatchReceiver, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) {
            match events.recv_timeout(Duration::from_millis(200)) {
                Ok(batch) => self.handle_batch(batch),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Process one batch of events, insertions first
    pub fn handle_batch(&mut self, batch: EventBatch) {
        let (inserted, removed): (Vec<_>, Vec<_>) = batch
            .into_iter()
            .partition(|event| matches!(event, CardEvent::Inserted { .. }));

        for event in inserted {
            if let CardEvent::Inserted { reader, atr } = event {
                self.handle_insertion(reader, atr);
            }
        }

        for event in removed {
            if let CardEvent::Removed { reader, atr } = event {
                self.handle_removal(reader, atr);
            }
        }
    }

    fn handle_insertion(&mut self, reader: String, atr: Vec<u8>) {
        let mut transport = match self.connector.connect(&reader) {
            Ok(transport) => transport,
            Err(e) => {
                warn!(reader = %reader, error = %e, "cannot connect to inserted card");
                return;
            }
        };

        let uid = read_uid(&mut transport);
        let alias = match &uid {
            Some(uid) => {
                let alias = self.resolver.resolve(&mut self.store, uid);
                info!(reader = %reader, uid = %uid, alias = %alias, "card inserted");
                alias
            }
            None => {
                info!(reader = %reader, "card inserted, UID unavailable");
                UNKNOWN_ALIAS.to_owned()
            }
        };

        self.presence
            .record_insertion(CardSignature::new(reader, atr), PresenceRecord { uid, alias });
    }

    fn handle_removal(&mut self, reader: String, atr: Vec<u8>) {
        let signature = CardSignature::new(reader.clone(), atr);

        let record = match self.presence.resolve_removal(&signature) {
            Removal::Exact(record) => {
                info!(reader = %reader, alias = %record.alias, "card removed");
                record
            }
            Removal::Fallback(record) => {
                info!(
                    reader = %reader,
                    alias = %record.alias,
                    "card removed, paired by last-inserted fallback"
                );
                record
            }
            Removal::Unknown => {
                info!(reader = %reader, "card removed, no tracked card for reader");
                return;
            }
        };

        match self.sink.write_value(&record.alias) {
            Ok(true) => info!(reader = %reader, alias = %record.alias, "condition document updated"),
            Ok(false) => {
                debug!(reader = %reader, alias = %record.alias, "condition value unchanged, write skipped");
            }
            Err(e) => error!(reader = %reader, error = %e, "failed to update condition document"),
        }
    }
}
