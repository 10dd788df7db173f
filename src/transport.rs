//! PC/SC transport and session opening
//!
//! [`CardTransport`] is the seam the UID reader and the watcher operate
//! against; tests substitute scripted implementations. [`PcscConnector`]
//! opens real [`PcscTransport`] sessions against named readers.

use pcsc::{Context, Protocols, Scope, ShareMode};
use std::ffi::CString;
use std::fmt;

use crate::error::{Error, Result};
use crate::reader::ReaderStatus;

/// Command exchange with an open card session
pub trait CardTransport {
    /// Transmit a raw command APDU and return the full response, status word
    /// included
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>>;
}

/// Opens card sessions against named readers
pub trait Connector {
    /// Transport produced for each session
    type Transport: CardTransport;

    /// Open a session to the card currently present in `reader`
    fn connect(&self, reader: &str) -> Result<Self::Transport>;
}

/// Transport implementation using PC/SC
pub struct PcscTransport {
    /// Card connection
    card: pcsc::Card,
    /// Reader name
    reader_name: String,
}

impl fmt::Debug for PcscTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscTransport")
            .field("reader_name", &self.reader_name)
            .finish()
    }
}

impl PcscTransport {
    /// Get the reader name
    pub fn reader_name(&self) -> &str {
        &self.reader_name
    }
}

impl CardTransport for PcscTransport {
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>> {
        // Response APDUs are at most 256 data bytes plus the status word
        let mut response_buffer = [0u8; 258];

        let response = self.card.transmit(command, &mut response_buffer)?;
        Ok(response.to_vec())
    }
}

/// Connector for PC/SC readers
#[allow(missing_debug_implementations)]
pub struct PcscConnector {
    /// PC/SC context
    context: Context,
}

impl PcscConnector {
    /// Create a connector with a dedicated PC/SC context
    pub fn new() -> Result<Self> {
        let context = Context::establish(Scope::User)?;
        Ok(Self { context })
    }

    /// Create a connector over an existing context
    pub const fn from_context(context: Context) -> Self {
        Self { context }
    }

    /// Open a session to the card in the named reader
    pub fn open(&self, reader_name: &str) -> Result<PcscTransport> {
        let reader_cstr = CString::new(reader_name)
            .map_err(|_| Error::ReaderNotFound(reader_name.to_owned()))?;

        match self
            .context
            .connect(&reader_cstr, ShareMode::Shared, Protocols::ANY)
        {
            Ok(card) => Ok(PcscTransport {
                card,
                reader_name: reader_name.to_owned(),
            }),
            Err(pcsc::Error::NoSmartcard) => Err(Error::NoCard(reader_name.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    /// List all available card readers and their card presence
    pub fn list_readers(&self) -> Result<Vec<ReaderStatus>> {
        let readers = self.context.list_readers_owned()?;
        if readers.is_empty() {
            return Err(Error::NoReadersAvailable);
        }

        let mut result = Vec::with_capacity(readers.len());

        for reader_name in readers {
            // One-shot state query to learn whether a card is present
            let mut reader_states = vec![pcsc::ReaderState::new(
                reader_name.as_c_str(),
                pcsc::State::UNAWARE,
            )];

            match self.context.get_status_change(None, &mut reader_states) {
                Ok(()) => {
                    result.push(ReaderStatus::from_reader_state(&reader_states[0]));
                }
                Err(_) => {
                    // If we can't get status, assume no card
                    result.push(ReaderStatus::new(
                        reader_name.to_string_lossy().into_owned(),
                        false,
                        None,
                    ));
                }
            }
        }

        Ok(result)
    }
}

impl Connector for PcscConnector {
    type Transport = PcscTransport;

    fn connect(&self, reader: &str) -> Result<PcscTransport> {
        self.open(reader)
    }
}
