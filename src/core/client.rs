//! Collaborator interfaces: the accounting API and the document exchange.
//!
//! Both are consumed as async traits. The free functions below wrap the
//! accounting calls with the engine's error policy: a missing record is a
//! silent `None`, any other failure is logged once and also becomes `None`.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::ClientError;
use super::ledger::{Resource, Root};

/// Accounting back-end API.
///
/// Paths are relative to the API root, e.g. `customers/12` or
/// `articles?ean=111`. Request and response bodies are the raw wire
/// objects (single records wrapped in [`Root`]).
#[async_trait]
pub trait AccountingClient: Send + Sync {
    /// `GET path`. A missing record is [`ClientError::NotFound`].
    async fn get<T>(&self, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Send + 'static;

    /// `POST path` with `body`, returning the stored record.
    async fn add<B, T>(&self, body: &B, path: &str) -> Result<T, ClientError>
    where
        B: Serialize + Send + Sync,
        T: DeserializeOwned + Send + 'static;

    /// `PUT path` with `body`, returning the stored record.
    async fn update<B, T>(&self, body: &B, path: &str) -> Result<T, ClientError>
    where
        B: Serialize + Send + Sync,
        T: DeserializeOwned + Send + 'static;

    /// `PUT path` without a body (document actions such as `externalprint`).
    async fn action(&self, path: &str) -> Result<(), ClientError>;
}

/// Fetch a raw response (listing, envelope map). `None` if missing or failed.
pub async fn fetch<C, T>(client: &C, path: &str) -> Option<T>
where
    C: AccountingClient + ?Sized,
    T: DeserializeOwned + Send + 'static,
{
    match client.get::<T>(path).await {
        Ok(value) => Some(value),
        Err(ClientError::NotFound(_)) => None,
        Err(e) => {
            tracing::error!(path, error = %e, "accounting lookup failed");
            None
        }
    }
}

/// Fetch a single record. `None` if missing or failed.
pub async fn find<C, T>(client: &C, path: &str) -> Option<T>
where
    C: AccountingClient + ?Sized,
    T: Resource,
{
    fetch::<C, Root<T>>(client, path).await.map(Root::into_inner)
}

/// Create a record. `None` if the remote side refused it (already logged).
pub async fn create<C, T>(client: &C, record: T, path: &str) -> Option<T>
where
    C: AccountingClient + ?Sized,
    T: Resource,
{
    match client.add::<Root<T>, Root<T>>(&Root(record), path).await {
        Ok(root) => Some(root.into_inner()),
        Err(e) => {
            tracing::error!(path, error = %e, "accounting create failed");
            None
        }
    }
}

/// Replace a record. `None` if the remote side refused it (already logged).
pub async fn replace<C, T>(client: &C, record: T, path: &str) -> Option<T>
where
    C: AccountingClient + ?Sized,
    T: Resource,
{
    match client.update::<Root<T>, Root<T>>(&Root(record), path).await {
        Ok(root) => Some(root.into_inner()),
        Err(e) => {
            tracing::error!(path, error = %e, "accounting update failed");
            None
        }
    }
}

/// Invoke a document action. Returns whether it succeeded.
pub async fn invoke<C>(client: &C, path: &str) -> bool
where
    C: AccountingClient + ?Sized,
{
    match client.action(path).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(path, error = %e, "accounting action failed");
            false
        }
    }
}

/// A file listed on the document exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDocument {
    pub id: String,
    pub filename: Option<String>,
    /// Document standard the file claims to follow.
    pub standard_name: Option<String>,
    pub parties: Vec<FileParty>,
}

impl FileDocument {
    /// The party that sent the file.
    pub fn sender(&self) -> Option<&FileParty> {
        self.parties.iter().find(|p| p.is_sender)
    }
}

/// A sender or recipient of an exchange file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileParty {
    pub email: String,
    pub is_sender: bool,
}

/// One page of an exchange listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePage {
    pub items: Vec<FileDocument>,
    /// Token for the next page, `None` on the last page.
    pub continuation: Option<String>,
}

/// A file to send through the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingFile {
    pub data: Vec<u8>,
    pub recipient_email: String,
    pub filename: String,
    pub charset: String,
    pub standard_name: String,
    pub language_code: String,
    pub version: String,
}

/// Metadata of a file accepted by the exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub id: String,
    pub filename: Option<String>,
}

/// Document-exchange service.
#[async_trait]
pub trait DocumentExchange: Send + Sync {
    /// List files not yet downloaded, starting at `continuation`
    /// (`None` for the first page).
    async fn list_page(
        &self,
        continuation: Option<&str>,
        page_size: u32,
    ) -> Result<FilePage, ClientError>;

    /// Download the content of a file.
    async fn fetch(&self, id: &str) -> Result<Vec<u8>, ClientError>;

    /// Send a file to a recipient.
    async fn send(&self, file: &OutgoingFile) -> Result<FileMetadata, ClientError>;

    /// Mark a file as processed so it is not listed again.
    async fn archive(&self, id: &str) -> Result<(), ClientError>;
}
