//! Monitor implementation for PC/SC card events

use pcsc::{Context, ReaderState, Scope, State};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::event::{BatchSender, CardEvent};

/// Monitor for PC/SC card insertion/removal events
///
/// Each PC/SC status change is delivered as one batch of events. The batch
/// boundary matters to the watcher: a card inserted and removed within the
/// same status change is still resolved in order.
#[allow(missing_debug_implementations)]
pub struct CardMonitor {
    /// PC/SC context
    context: Context,
    /// Whether the monitor is running
    running: Arc<AtomicBool>,
    /// Previously seen reader states (to avoid duplicate events and to keep
    /// the ATR a removal event is paired with)
    previous_states: Arc<Mutex<HashMap<String, (State, Vec<u8>)>>>,
}

impl CardMonitor {
    /// Create a new monitor over an existing context
    pub fn from_context(context: Context) -> Self {
        Self {
            context,
            running: Arc::new(AtomicBool::new(false)),
            previous_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a new monitor with a dedicated context
    pub fn create() -> Result<Self> {
        let context = Context::establish(Scope::User)?;
        Ok(Self::from_context(context))
    }

    /// Monitor for card events in a background thread, sending each batch
    /// over the channel
    ///
    /// The thread exits when [`stop`](Self::stop) is called or the receiving
    /// side of the channel is dropped.
    pub fn watch_channel(&self, sender: BatchSender) -> Result<()> {
        let context = self.context.clone();
        let running = Arc::clone(&self.running);
        let previous_states = Arc::clone(&self.previous_states);

        running.store(true, Ordering::SeqCst);

        thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                let Ok(mut reader_states) = Self::current_reader_states(&context) else {
                    thread::sleep(Duration::from_secs(1));
                    continue;
                };

                if context
                    .get_status_change(Some(Duration::from_secs(1)), &mut reader_states)
                    .is_ok()
                {
                    let batch = {
                        let mut states = previous_states.lock().unwrap();
                        Self::collect_events(&mut states, &reader_states)
                    };

                    if !batch.is_empty() && sender.send(batch).is_err() {
                        break;
                    }
                }

                // Small delay to prevent a tight loop
                thread::sleep(Duration::from_millis(10));
            }
        });

        Ok(())
    }

    /// Stop monitoring
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Build reader states for all current readers plus the PnP notification
    /// slot, synced to their current state
    fn current_reader_states(context: &Context) -> Result<Vec<ReaderState>> {
        let mut reader_states = vec![ReaderState::new(pcsc::PNP_NOTIFICATION(), State::UNAWARE)];

        let readers = context.list_readers_owned()?;
        for reader in readers {
            reader_states.push(ReaderState::new(reader, State::UNAWARE));
        }

        for rs in &mut reader_states {
            rs.sync_current_state();
        }

        Ok(reader_states)
    }

    /// Diff the observed reader states against the previously seen ones and
    /// produce the resulting batch of events
    fn collect_events(
        previous_states: &mut HashMap<String, (State, Vec<u8>)>,
        reader_states: &[ReaderState],
    ) -> Vec<CardEvent> {
        let mut events = Vec::new();

        for rs in reader_states {
            let name = rs.name().to_string_lossy().into_owned();
            let event_state = rs.event_state();

            // Skip PnP notification
            if name == pcsc::PNP_NOTIFICATION().to_string_lossy() {
                continue;
            }

            // Card inserted
            if event_state.contains(State::PRESENT) && !event_state.contains(State::EMPTY) {
                let atr = rs.atr().to_vec();

                // New insertion, or a different card than last seen
                let is_new_event = match previous_states.get(&name) {
                    Some((prev_state, prev_atr)) => {
                        !prev_state.contains(State::PRESENT) || *prev_atr != atr
                    }
                    None => true,
                };

                if is_new_event {
                    events.push(CardEvent::Inserted {
                        reader: name.clone(),
                        atr: atr.clone(),
                    });
                    previous_states.insert(name, (event_state, atr));
                }
            }
            // Card removed
            else if event_state.contains(State::EMPTY) {
                // Don't report removal if we never saw the card present; the
                // removal carries the ATR captured at insertion so it can be
                // paired with the presence record
                if let Some((prev_state, prev_atr)) = previous_states.get(&name) {
                    if prev_state.contains(State::PRESENT) {
                        events.push(CardEvent::Removed {
                            reader: name.clone(),
                            atr: prev_atr.clone(),
                        });
                        previous_states.insert(name, (event_state, Vec::new()));
                    }
                }
            }
        }

        events
    }
}
