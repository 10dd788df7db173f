//! Smart-card presence watcher for Admira condition documents
//!
//! This crate monitors PC/SC card readers for insertion and removal events,
//! resolves each card's UID to an operator-assigned alias, and writes the
//! resolved alias into an external XML condition document when the card is
//! removed.
//!
//! # Overview
//!
//! - [`CardMonitor`] polls the PC/SC layer and delivers batches of
//!   [`CardEvent`]s over a channel.
//! - [`read_uid`] extracts the card UID over an open [`CardTransport`]
//!   session using the `FF CA 00 00 00` status-query APDU.
//! - [`AliasStore`] is the durable UID-to-alias mapping, persisted as JSON.
//! - [`PresenceTracker`] pairs removal events with the alias that was
//!   resolved at insertion time, falling back to the last card seen on the
//!   same reader when the transport loses the exact card signature.
//! - [`ConditionSink`] patches the `<value>` element of the condition
//!   document, suppressing writes when the value has not changed.
//! - [`Watcher`] is the event loop tying the above together.
//!
//! # Examples
//!
//! ```no_run
//! use cardwatch::{
//!     AliasResolver, AliasStore, CardMonitor, ConditionSink, PcscConnector, ResolvePolicy,
//!     Watcher, batch_channel,
//! };
//! use std::path::Path;
//! use std::sync::atomic::AtomicBool;
//!
//! # fn main() -> cardwatch::Result<()> {
//! let store = AliasStore::load(Path::new("aliases.json"))?;
//! let resolver = AliasResolver::new(ResolvePolicy::ReadOnly, "aliases.json".into());
//! let sink = ConditionSink::new(cardwatch::default_condition_path());
//!
//! let monitor = CardMonitor::create()?;
//! let (sender, receiver) = batch_channel();
//! monitor.watch_channel(sender)?;
//!
//! let running = AtomicBool::new(true);
//! let mut watcher = Watcher::new(PcscConnector::new()?, store, resolver, sink);
//! watcher.run(&receiver, &running);
//! monitor.stop();
//! # Ok(())
//! # }
//! ```

// Core modules
mod config;
mod error;
pub mod event;
mod monitor;
mod presence;
mod reader;
mod resolver;
mod sink;
mod store;
mod transport;
mod uid;
mod watcher;

// Public exports
pub use config::{Config, default_condition_path};
pub use error::{Error, Result};
pub use event::{BatchReceiver, BatchSender, CardEvent, EventBatch, batch_channel};
pub use monitor::CardMonitor;
pub use presence::{CardSignature, PresenceRecord, PresenceTracker, Removal};
pub use reader::ReaderStatus;
pub use resolver::{AliasResolver, ResolvePolicy, UNKNOWN_ALIAS};
pub use sink::{ConditionSink, DEFAULT_CONDITION_ID};
pub use store::AliasStore;
pub use transport::{CardTransport, Connector, PcscConnector, PcscTransport};
pub use uid::{GET_UID_COMMAND, read_uid};
pub use watcher::Watcher;
