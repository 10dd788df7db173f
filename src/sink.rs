//! Condition document sink
//!
//! Writes a resolved alias into the `<value>` element of an external XML
//! condition document and stamps the enclosing `<condition>` element with
//! `id` and `tstamp` attributes. Writes are suppressed while the value is
//! unchanged; the suppression cache lives in process memory only, so a
//! manual edit of the document between writes is not detected, and the
//! first write after process start is always emitted.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Default value of the `id` attribute stamped onto `<condition>`
pub const DEFAULT_CONDITION_ID: &str = "4";

/// Single-field sink into an external condition document
#[derive(Debug, Clone)]
pub struct ConditionSink {
    /// Document path
    path: PathBuf,
    /// Value stamped into the `id` attribute
    id: String,
    /// Last value physically written. Starts unset so the first write is
    /// always emitted regardless of the document's current content.
    last_written: Option<String>,
}

impl ConditionSink {
    /// Create a sink for the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            id: DEFAULT_CONDITION_ID.to_owned(),
            last_written: None,
        }
    }

    /// Set the `id` attribute value
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Document path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `text` into the document's `<value>` element
    ///
    /// Returns `Ok(false)` without touching the document when `text` equals
    /// the last value written by this sink instance. On a physical write the
    /// `<condition>` element gains/updates its `id` and `tstamp` (Unix epoch
    /// seconds) attributes and the document is atomically replaced.
    pub fn write_value(&mut self, text: &str) -> Result<bool> {
        if self.last_written.as_deref() == Some(text) {
            return Ok(false);
        }

        let tstamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let input = fs::read_to_string(&self.path)?;
        let output = patch_document(&input, text, &self.id, tstamp)?;

        // Write-to-temp plus rename so the downstream consumer never sees a
        // half-written document
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
        tmp.write_all(&output)?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        self.last_written = Some(text.to_owned());
        Ok(true)
    }
}

/// Rewrite the document, patching the first `<condition>` element found at
/// any depth
fn patch_document(input: &str, text: &str, id: &str, tstamp: u64) -> Result<Vec<u8>> {
    let mut reader = Reader::from_str(input);
    let mut writer = Writer::new(Vec::new());

    // Depth inside the first <condition>; zero once it has closed
    let mut condition_depth = 0usize;
    let mut condition_seen = false;
    let mut value_patched = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if !condition_seen && e.local_name().as_ref() == b"condition" => {
                writer.write_event(Event::Start(stamp_condition(&e, id, tstamp)))?;
                condition_seen = true;
                condition_depth = 1;
            }
            Event::Empty(e) if !condition_seen && e.local_name().as_ref() == b"condition" => {
                // A childless <condition/> can hold no <value>
                return Err(Error::MissingValue);
            }
            Event::Start(e)
                if condition_depth > 0
                    && !value_patched
                    && e.local_name().as_ref() == b"value" =>
            {
                let end = e.to_end().into_owned();
                writer.write_event(Event::Start(e.borrow()))?;
                writer.write_event(Event::Text(BytesText::new(text)))?;
                // Discard whatever the element held before
                reader.read_to_end(end.name())?;
                writer.write_event(Event::End(end))?;
                value_patched = true;
            }
            Event::Empty(e)
                if condition_depth > 0
                    && !value_patched
                    && e.local_name().as_ref() == b"value" =>
            {
                let end = e.to_end().into_owned();
                writer.write_event(Event::Start(e.borrow()))?;
                writer.write_event(Event::Text(BytesText::new(text)))?;
                writer.write_event(Event::End(end))?;
                value_patched = true;
            }
            Event::Start(e) => {
                if condition_depth > 0 {
                    condition_depth += 1;
                }
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                if condition_depth > 0 {
                    condition_depth -= 1;
                    if condition_depth == 0 && !value_patched {
                        return Err(Error::MissingValue);
                    }
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    if !condition_seen {
        return Err(Error::MissingCondition);
    }

    Ok(writer.into_inner())
}

/// Rebuild a `<condition>` start tag with `id` and `tstamp` set, preserving
/// its name and any other attributes
fn stamp_condition(start: &BytesStart<'_>, id: &str, tstamp: u64) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut stamped = BytesStart::new(name);

    for attr in start.attributes().flatten() {
        if attr.key.as_ref() != b"id" && attr.key.as_ref() != b"tstamp" {
            stamped.push_attribute(attr);
        }
    }

    stamped.push_attribute(("id", id));
    stamped.push_attribute(("tstamp", tstamp.to_string().as_str()));
    stamped
}
