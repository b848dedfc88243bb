//! In-memory accounting ledger and document exchange for engine tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tradesync::core::{
    AccountingClient, ClientError, DocumentExchange, FileDocument, FileMetadata, FilePage,
    FileParty, OutgoingFile, STANDARD_NAME,
};

/// A recorded ledger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
}

#[derive(Default)]
struct LedgerState {
    /// Stored records by path, each as its root object.
    records: BTreeMap<String, Value>,
    /// Canned GET responses by exact path.
    responses: BTreeMap<String, Value>,
    failing: BTreeSet<String>,
    next_id: u64,
    calls: Vec<Call>,
}

/// Accounting back-end keeping records as JSON in memory.
///
/// `POST collection` assigns the collection's number field when it is
/// missing and stores the record at `collection/number`. `PUT path` merges
/// the non-null fields of the body into the stored record. Filtered
/// listings (`customers?email=..`, `articles?ean=..`) search the stored
/// records of the collection.
#[derive(Default)]
pub struct FakeLedger {
    state: Mutex<LedgerState>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `{root: record}` at `path`.
    pub fn insert(&self, path: &str, root: &str, record: Value) {
        let mut state = self.state.lock().unwrap();
        state
            .records
            .insert(path.to_string(), json!({ root: record }));
    }

    /// Answer `GET path` with `body`.
    pub fn respond(&self, path: &str, body: Value) {
        let mut state = self.state.lock().unwrap();
        state.responses.insert(path.to_string(), body);
    }

    /// Make every call on `path` fail with a remote error.
    pub fn fail(&self, path: &str) {
        self.state.lock().unwrap().failing.insert(path.to_string());
    }

    /// The record stored at `path`, unwrapped from its root object.
    pub fn record(&self, path: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state.records.get(path).and_then(inner).cloned()
    }

    /// Every record of `collection`, unwrapped, in path order.
    pub fn records(&self, collection: &str) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        collection_records(&state.records, collection)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls with `method` on exactly `path`.
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    fn begin(&self, method: &'static str, path: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method,
            path: path.to_string(),
        });
        if state.failing.contains(path) {
            return Err(ClientError::Remote(format!("{method} {path} refused")));
        }
        Ok(())
    }
}

/// The single value of a root object.
fn inner(root: &Value) -> Option<&Value> {
    root.as_object().and_then(|m| m.values().next())
}

/// Unwrapped records stored directly under `collection/`.
fn collection_records<'a>(records: &'a BTreeMap<String, Value>, collection: &str) -> Vec<&'a Value> {
    let prefix = format!("{collection}/");
    records
        .iter()
        .filter(|(path, _)| {
            path.strip_prefix(&prefix)
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
        })
        .filter_map(|(_, root)| inner(root))
        .collect()
}

/// Field that holds the number of a record in `collection`.
fn number_field(collection: &str) -> &'static str {
    match collection {
        "customers" => "CustomerNumber",
        "suppliers" => "SupplierNumber",
        "articles" => "ArticleNumber",
        "offers" | "orders" | "invoices" => "DocumentNumber",
        "supplierinvoices" => "GivenNumber",
        "accounts" => "Number",
        "prices" => "PriceNumber",
        _ => "Code",
    }
}

fn filter_field(key: &str) -> Option<&'static str> {
    match key {
        "email" => Some("Email"),
        "ean" => Some("EAN"),
        "manufacturerarticlenumber" => Some("ManufacturerArticleNumber"),
        _ => None,
    }
}

fn list_key(collection: &str) -> String {
    let mut chars = collection.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Decode(format!("{path}: {e}")))
}

fn split_root(path: &str, body: Value) -> Result<(String, Map<String, Value>), ClientError> {
    let Value::Object(root) = body else {
        return Err(ClientError::Remote(format!("{path}: body is not an object")));
    };
    match root.into_iter().next() {
        Some((key, Value::Object(record))) => Ok((key, record)),
        _ => Err(ClientError::Remote(format!("{path}: body has no root record"))),
    }
}

#[async_trait]
impl AccountingClient for FakeLedger {
    async fn get<T>(&self, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.begin("GET", path)?;
        let state = self.state.lock().unwrap();
        if let Some(body) = state.responses.get(path) {
            return decode(path, body.clone());
        }
        if let Some(root) = state.records.get(path) {
            return decode(path, root.clone());
        }

        let Some((collection, query)) = path.split_once('?') else {
            return Err(ClientError::NotFound(path.to_string()));
        };
        let Some((key, value)) = query.split_once('=') else {
            return Err(ClientError::NotFound(path.to_string()));
        };
        let Some(field) = filter_field(key) else {
            return Err(ClientError::NotFound(path.to_string()));
        };
        let items: Vec<Value> = collection_records(&state.records, collection)
            .into_iter()
            .filter(|record| record.get(field).and_then(as_text).as_deref() == Some(value))
            .cloned()
            .collect();
        decode(path, json!({ list_key(collection): items }))
    }

    async fn add<B, T>(&self, body: &B, path: &str) -> Result<T, ClientError>
    where
        B: Serialize + Send + Sync,
        T: DeserializeOwned + Send + 'static,
    {
        self.begin("POST", path)?;
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        let (root, mut record) = split_root(path, body)?;

        let mut state = self.state.lock().unwrap();
        let field = number_field(path);
        let number = match record.get(field).and_then(as_text).filter(|n| !n.is_empty()) {
            Some(number) => number,
            None => {
                state.next_id += 1;
                let number = state.next_id.to_string();
                record.insert(field.to_string(), Value::String(number.clone()));
                number
            }
        };
        let stored = json!({ root: record });
        state.records.insert(format!("{path}/{number}"), stored.clone());
        decode(path, stored)
    }

    async fn update<B, T>(&self, body: &B, path: &str) -> Result<T, ClientError>
    where
        B: Serialize + Send + Sync,
        T: DeserializeOwned + Send + 'static,
    {
        self.begin("PUT", path)?;
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        let (root, changes) = split_root(path, body)?;

        let mut state = self.state.lock().unwrap();
        let Some(Value::Object(stored)) = state.records.get(path).and_then(inner).cloned() else {
            return Err(ClientError::NotFound(path.to_string()));
        };
        let mut record = stored;
        for (key, value) in changes {
            if !value.is_null() {
                record.insert(key, value);
            }
        }
        let stored = json!({ root: record });
        state.records.insert(path.to_string(), stored.clone());
        decode(path, stored)
    }

    async fn action(&self, path: &str) -> Result<(), ClientError> {
        self.begin("PUT", path)
    }
}

/// Document exchange serving fixed files and recording what is sent.
#[derive(Default)]
pub struct FakeExchange {
    files: Vec<(FileDocument, Vec<u8>)>,
    refused_recipients: BTreeSet<String>,
    sent: Mutex<Vec<OutgoingFile>>,
    archived: Mutex<Vec<String>>,
}

impl FakeExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a trade document from `sender` under `id`.
    pub fn with_document(mut self, id: &str, sender: &str, document: &Value) -> Self {
        let bytes = serde_json::to_vec(document).unwrap();
        self.files.push((file(id, sender, STANDARD_NAME), bytes));
        self
    }

    /// Offer a raw file.
    pub fn with_file(mut self, file: FileDocument, bytes: Vec<u8>) -> Self {
        self.files.push((file, bytes));
        self
    }

    /// Refuse every file addressed to `email`.
    pub fn refusing(mut self, email: &str) -> Self {
        self.refused_recipients.insert(email.to_string());
        self
    }

    pub fn sent(&self) -> Vec<OutgoingFile> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_filenames(&self) -> Vec<String> {
        self.sent().into_iter().map(|f| f.filename).collect()
    }

    pub fn archived(&self) -> Vec<String> {
        self.archived.lock().unwrap().clone()
    }
}

/// Listing entry of a file sent by `sender`.
pub fn file(id: &str, sender: &str, standard: &str) -> FileDocument {
    FileDocument {
        id: id.to_string(),
        filename: Some(format!("{id}.json")),
        standard_name: Some(standard.to_string()),
        parties: vec![
            FileParty {
                email: sender.to_string(),
                is_sender: true,
            },
            FileParty {
                email: "tenant@example.se".to_string(),
                is_sender: false,
            },
        ],
    }
}

#[async_trait]
impl DocumentExchange for FakeExchange {
    /// Pages of `page_size` files; the continuation token is the offset.
    async fn list_page(
        &self,
        continuation: Option<&str>,
        page_size: u32,
    ) -> Result<FilePage, ClientError> {
        let start = match continuation {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ClientError::Remote(format!("bad continuation {token}")))?,
            None => 0,
        };
        let listed: Vec<_> = self.files.iter().map(|(f, _)| f.clone()).collect();
        let end = (start + page_size as usize).min(listed.len());
        let items = listed.get(start..end).map(<[_]>::to_vec).unwrap_or_default();
        Ok(FilePage {
            items,
            continuation: (end < listed.len()).then(|| end.to_string()),
        })
    }

    async fn fetch(&self, id: &str) -> Result<Vec<u8>, ClientError> {
        self.files
            .iter()
            .find(|(f, _)| f.id == id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    async fn send(&self, file: &OutgoingFile) -> Result<FileMetadata, ClientError> {
        if self.refused_recipients.contains(&file.recipient_email) {
            return Err(ClientError::Remote(format!(
                "recipient {} refused",
                file.recipient_email
            )));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(file.clone());
        Ok(FileMetadata {
            id: format!("sent-{}", sent.len()),
            filename: Some(file.filename.clone()),
        })
    }

    async fn archive(&self, id: &str) -> Result<(), ClientError> {
        self.archived.lock().unwrap().push(id.to_string());
        Ok(())
    }
}
