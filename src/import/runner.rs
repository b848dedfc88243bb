use super::currency::upsert_currencies;
use super::document::{add_offer, add_order, add_supplier_invoice};
use super::reference::ensure_reference;
use crate::core::ledger::{EmailSenders, ReferenceKind};
use crate::core::{
    AccountingClient, DocumentExchange, DocumentType, FileDocument, LedgerDefaults, RateSource,
    STANDARD_NAME, SyncError, TradeDocument, find,
};

/// Files requested per exchange listing page.
pub const PAGE_SIZE: u32 = 10;

/// Outcome counts of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Files turned into ledger documents and archived.
    pub imported: usize,
    /// Files not meant for import (other standard, untrusted sender, or a
    /// document type that is never imported).
    pub skipped: usize,
    /// Skipped files that were archived because their document type is
    /// never imported. Counted in `skipped` as well.
    pub archived_unimported: usize,
    /// Files that failed; they stay on the exchange for the next run.
    pub failed: usize,
}

/// What became of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Imported,
    /// Left on the exchange.
    Skipped,
    /// Never importable; archived so it is not listed again.
    Ignored,
    Failed,
}

/// Imports exchange files into the accounting back-end.
///
/// One importer serves one run; everything is awaited sequentially.
pub struct Importer<'a, C, X> {
    client: &'a C,
    exchange: &'a X,
    defaults: LedgerDefaults,
}

impl<'a, C: AccountingClient, X: DocumentExchange> Importer<'a, C, X> {
    /// The configured price list is uppercased.
    pub fn new(client: &'a C, exchange: &'a X, defaults: &LedgerDefaults) -> Self {
        let mut defaults = defaults.clone();
        defaults.price_list = defaults.price_list.to_uppercase();
        Self {
            client,
            exchange,
            defaults,
        }
    }

    pub fn defaults(&self) -> &LedgerDefaults {
        &self.defaults
    }

    /// Ensure every configured ledger account and the price list exist.
    pub async fn prepare(&self) {
        for account in self.defaults.accounts() {
            ensure_reference(self.client, ReferenceKind::Account, account).await;
        }
        ensure_reference(self.client, ReferenceKind::PriceList, &self.defaults.price_list).await;
    }

    /// Refresh currency rates from `source` when its snapshot has expired.
    ///
    /// Returns the number of currencies saved, 0 when the snapshot was
    /// still fresh or the source failed.
    pub async fn update_currency_rates<R: RateSource>(&self, source: &R) -> usize {
        match source.refresh(self.defaults.base_currency()).await {
            Ok(Some(rates)) => upsert_currencies(self.client, &rates).await,
            Ok(None) => 0,
            Err(e) => {
                tracing::error!(error = %e, "currency rates unavailable");
                0
            }
        }
    }

    /// Import every pending exchange file.
    ///
    /// Imported files are archived. Files of a type that is never imported
    /// (`quotation`, `order_confirmation`, unknown codes) are archived too,
    /// since no later run could import them. Files in another standard,
    /// from an untrusted sender or that failed stay on the exchange for a
    /// later run.
    ///
    /// Fails only when the first listing page cannot be fetched. A failed
    /// later page is logged and ends the walk.
    pub async fn run(&self) -> Result<ImportSummary, SyncError> {
        tracing::info!("import started");
        let senders = self.trusted_senders().await;
        let mut summary = ImportSummary::default();

        let mut page = self.exchange.list_page(None, PAGE_SIZE).await?;
        loop {
            tracing::info!(files = page.items.len(), "importing page");
            for file in &page.items {
                match self.import_file(file, senders.as_ref()).await {
                    Outcome::Imported => summary.imported += 1,
                    Outcome::Skipped => summary.skipped += 1,
                    Outcome::Ignored => {
                        summary.skipped += 1;
                        summary.archived_unimported += 1;
                    }
                    Outcome::Failed => summary.failed += 1,
                }
            }

            let Some(token) = page.continuation.take().filter(|t| !t.is_empty()) else {
                break;
            };
            page = match self.exchange.list_page(Some(&token), PAGE_SIZE).await {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!(error = %e, "exchange listing failed");
                    break;
                }
            };
        }

        tracing::info!(
            imported = summary.imported,
            skipped = summary.skipped,
            failed = summary.failed,
            "import finished"
        );
        Ok(summary)
    }

    /// The trusted sender list, when only trusted senders are allowed.
    /// A list that cannot be fetched trusts nobody.
    async fn trusted_senders(&self) -> Option<EmailSenders> {
        if !self.defaults.only_allow_trusted_senders {
            return None;
        }
        Some(
            find::<C, EmailSenders>(self.client, "emailsenders")
                .await
                .unwrap_or_default(),
        )
    }

    async fn import_file(&self, file: &FileDocument, senders: Option<&EmailSenders>) -> Outcome {
        let standard = file.standard_name.as_deref().unwrap_or_default();
        if !standard.eq_ignore_ascii_case(STANDARD_NAME) {
            tracing::info!(document_id = %file.id, standard, "not a trade document");
            return Outcome::Skipped;
        }

        let bytes = match self.exchange.fetch(&file.id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(document_id = %file.id, error = %e, "download failed");
                return Outcome::Failed;
            }
        };
        let doc = match TradeDocument::from_json(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(document_id = %file.id, error = %e, "unreadable document");
                return Outcome::Failed;
            }
        };

        let sender = file.sender().map(|p| p.email.as_str()).unwrap_or_default();
        if let Some(senders) = senders {
            if !senders.is_trusted(sender) {
                tracing::info!(document_id = %file.id, email = sender, "sender is not trusted");
                return Outcome::Skipped;
            }
        }

        let outcome = match self.import_document(&file.id, sender, &doc).await {
            Ok(outcome @ (Outcome::Imported | Outcome::Ignored)) => outcome,
            Ok(outcome) => return outcome,
            Err(e) => {
                tracing::error!(document_id = %file.id, error = %e, "import failed");
                return Outcome::Failed;
            }
        };

        if let Err(e) = self.exchange.archive(&file.id).await {
            tracing::error!(document_id = %file.id, error = %e, "archive failed");
        }
        outcome
    }

    /// Dispatch by document type. Types that are never imported are
    /// ignored; a failed step (already logged) fails the file.
    async fn import_document(
        &self,
        id: &str,
        sender: &str,
        doc: &TradeDocument,
    ) -> Result<Outcome, SyncError> {
        let (client, defaults) = (self.client, &self.defaults);
        let created = match &doc.document_type {
            Some(DocumentType::RequestForQuotation) => {
                tracing::info!(document_id = id, "importing offer");
                add_offer(client, defaults, sender, doc).await?.is_some()
            }
            Some(DocumentType::Order) => {
                tracing::info!(document_id = id, "importing order");
                add_order(client, defaults, sender, doc).await?.is_some()
            }
            Some(DocumentType::Invoice | DocumentType::CreditInvoice) => {
                tracing::info!(document_id = id, "importing supplier invoice");
                add_supplier_invoice(client, defaults, sender, doc)
                    .await?
                    .is_some()
            }
            other => {
                let kind = other.as_ref().map(DocumentType::code).unwrap_or_default();
                tracing::info!(document_id = id, document_type = %kind, "document type not imported");
                return Ok(Outcome::Ignored);
            }
        };
        if created {
            tracing::info!(document_id = id, "document imported");
            Ok(Outcome::Imported)
        } else {
            Ok(Outcome::Failed)
        }
    }
}
