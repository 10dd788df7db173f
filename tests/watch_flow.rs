//! End-to-end flow: insertion resolves the alias, removal publishes it to
//! the condition document.

use cardwatch::{
    AliasResolver, AliasStore, CardEvent, CardTransport, ConditionSink, Connector, ResolvePolicy,
    Result, Watcher,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Transport whose every command answers with a fixed response
struct FixedTransport {
    response: Vec<u8>,
}

impl CardTransport for FixedTransport {
    fn transmit(&mut self, _command: &[u8]) -> Result<Vec<u8>> {
        Ok(self.response.clone())
    }
}

/// Connector answering from a per-reader table of UID responses
#[derive(Default)]
struct TableConnector {
    responses: RefCell<HashMap<String, Vec<u8>>>,
}

impl TableConnector {
    fn with_uid(self, reader: &str, uid: &[u8]) -> Self {
        let mut response = uid.to_vec();
        response.extend_from_slice(&[0x90, 0x00]);
        self.responses
            .borrow_mut()
            .insert(reader.to_owned(), response);
        self
    }
}

impl Connector for TableConnector {
    type Transport = FixedTransport;

    fn connect(&self, reader: &str) -> Result<FixedTransport> {
        match self.responses.borrow().get(reader) {
            Some(response) => Ok(FixedTransport {
                response: response.clone(),
            }),
            None => Err(cardwatch::Error::NoCard(reader.to_owned())),
        }
    }
}

const CONDITION_DOC: &str = concat!(
    r#"<?xml version="1.0" encoding="utf-8"?>"#,
    r#"<conditions><condition id="0" tstamp="0"><value>none</value></condition></conditions>"#,
);

#[test]
fn badge_flow_updates_condition_document() {
    let dir = tempfile::tempdir().unwrap();

    // Alias store with the known badge
    let store_path = dir.path().join("aliases.json");
    fs::write(&store_path, r#"{"04A1B2C3": "Badge7"}"#).unwrap();
    let store = AliasStore::load(&store_path).unwrap();

    // Condition document the control system consumes
    let doc_path = dir.path().join("biomax.xml");
    fs::write(&doc_path, CONDITION_DOC).unwrap();

    let connector = TableConnector::default().with_uid("ACR122U", &[0x04, 0xA1, 0xB2, 0xC3]);
    let resolver = AliasResolver::new(ResolvePolicy::ReadOnly, store_path);
    let sink = ConditionSink::new(&doc_path);
    let mut watcher = Watcher::new(connector, store, resolver, sink);

    let atr = vec![0x3B, 0x8F, 0x80, 0x01];
    watcher.handle_batch(vec![CardEvent::Inserted {
        reader: "ACR122U".to_owned(),
        atr: atr.clone(),
    }]);
    watcher.handle_batch(vec![CardEvent::Removed {
        reader: "ACR122U".to_owned(),
        atr,
    }]);

    let doc = fs::read_to_string(&doc_path).unwrap();
    assert!(doc.contains("<value>Badge7</value>"), "document: {doc}");
    assert!(doc.contains(r#"id="4""#), "document: {doc}");
    assert!(!doc.contains(r#"tstamp="0""#), "document: {doc}");

    // The declaration and surrounding structure survive the rewrite
    assert!(doc.starts_with("<?xml"));
    assert!(doc.contains("</conditions>"));
}

#[test]
fn stale_alias_store_path_does_not_break_the_flow() {
    let dir = tempfile::tempdir().unwrap();

    let doc_path = dir.path().join("biomax.xml");
    fs::write(&doc_path, CONDITION_DOC).unwrap();

    // No alias store on disk at all: unknown cards still flow through
    let connector = TableConnector::default().with_uid("ACR122U", &[0xDE, 0xAD]);
    let resolver = AliasResolver::new(ResolvePolicy::SilentDefault, PathBuf::new());
    let sink = ConditionSink::new(&doc_path);
    let mut watcher = Watcher::new(connector, AliasStore::new(), resolver, sink);

    watcher.handle_batch(vec![CardEvent::Inserted {
        reader: "ACR122U".to_owned(),
        atr: vec![0x01],
    }]);
    watcher.handle_batch(vec![CardEvent::Removed {
        reader: "ACR122U".to_owned(),
        atr: vec![0x01],
    }]);

    let doc = fs::read_to_string(&doc_path).unwrap();
    assert!(doc.contains("<value>unknown</value>"), "document: {doc}");
}
