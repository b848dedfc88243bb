use chrono::{NaiveDate, Utc};

use super::cache::{RunCache, RunContext};
use super::document::{
    OutboundDocument, SalesParties, invoice, order_confirmation, purchase_order, quotation,
};
use super::gate::{Eligibility, SentMarker, group_by_supplier};
use super::pagination::{DEFAULT_PAGE_SIZE, fetch_all};
use crate::core::ledger::{
    Article, Customer, Invoice, InvoiceList, Offer, OfferList, Order, OrderList, SalesRow,
};
use crate::core::{
    AccountingClient, DocumentExchange, DocumentType, LedgerDefaults, OutgoingFile,
    STANDARD_NAME, SyncError, find, non_empty,
};

/// Outcome counts of one export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Documents accepted by the exchange.
    pub sent: usize,
    /// Source documents without an export label (or unreadable).
    pub skipped: usize,
    /// Documents that could not be sent.
    pub failed: usize,
}

/// Builds outbound documents from unsent ledger documents and sends them.
pub struct Exporter<'a, C> {
    client: &'a C,
    defaults: &'a LedgerDefaults,
    today: NaiveDate,
}

impl<'a, C: AccountingClient> Exporter<'a, C> {
    pub fn new(client: &'a C, defaults: &'a LedgerDefaults) -> Self {
        Self {
            client,
            defaults,
            today: Utc::now().date_naive(),
        }
    }

    /// Override the issue date of derived purchase orders.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Build the quotation for offer `number`, if it carries the export label.
    pub async fn export_offer(
        &self,
        ctx: RunContext<'_>,
        number: &str,
    ) -> Option<OutboundDocument> {
        let offer = find::<C, Offer>(self.client, &format!("offers/{number}")).await?;
        if !Eligibility::from_labels(&offer.header.labels, ctx.labels).document {
            return None;
        }
        let customer = self.customer(offer.header.customer_number.as_deref()).await?;
        let articles = self.articles(&offer.offer_rows).await;

        let document = quotation(&offer, &articles, self.parties(ctx, &customer));
        Some(OutboundDocument {
            document_type: DocumentType::Quotation,
            document,
            email: customer.email,
            language_code: offer.header.language,
        })
    }

    /// Build the order confirmation and purchase orders for order `number`.
    ///
    /// The export label yields a confirmation to the customer; the
    /// purchase-order label yields one purchase order per supplier. Empty
    /// when neither label is attached.
    pub async fn export_order(&self, ctx: RunContext<'_>, number: &str) -> Vec<OutboundDocument> {
        let Some(order) = find::<C, Order>(self.client, &format!("orders/{number}")).await else {
            return Vec::new();
        };
        let eligibility = Eligibility::from_labels(&order.header.labels, ctx.labels);
        if !eligibility.any() {
            return Vec::new();
        }
        let Some(customer) = self.customer(order.header.customer_number.as_deref()).await else {
            return Vec::new();
        };

        let mut documents = Vec::new();
        if eligibility.document {
            let articles = self.articles(&order.order_rows).await;
            let document = order_confirmation(&order, &articles, self.parties(ctx, &customer));
            documents.push(OutboundDocument {
                document_type: DocumentType::OrderConfirmation,
                document,
                email: customer.email.clone(),
                language_code: order.header.language.clone(),
            });
        }
        if eligibility.purchase_orders {
            for group in group_by_supplier(self.client, &order).await {
                let supplier_number = group.supplier.supplier_number.clone().unwrap_or_default();
                documents.push(OutboundDocument {
                    document_type: DocumentType::PurchaseOrder(supplier_number),
                    document: purchase_order(&order, &group, ctx.company, self.today),
                    email: group.supplier.email.clone(),
                    language_code: Some("en".into()),
                });
            }
        }
        documents
    }

    /// Build the invoice or credit invoice for invoice `number`, if it
    /// carries the export label.
    pub async fn export_invoice(
        &self,
        ctx: RunContext<'_>,
        number: &str,
    ) -> Option<OutboundDocument> {
        let ledger = find::<C, Invoice>(self.client, &format!("invoices/{number}")).await?;
        if !Eligibility::from_labels(&ledger.header.labels, ctx.labels).document {
            return None;
        }
        let customer = self.customer(ledger.header.customer_number.as_deref()).await?;
        let articles = self.articles(&ledger.invoice_rows).await;

        let document = invoice(&ledger, &articles, self.parties(ctx, &customer));
        let document_type = document
            .document_type
            .clone()
            .unwrap_or(DocumentType::Invoice);
        Some(OutboundDocument {
            document_type,
            document,
            email: customer.email,
            language_code: ledger.header.language,
        })
    }

    /// Export every unsent offer, order and invoice.
    ///
    /// Fails only when the company settings are unavailable. Each source
    /// document is marked sent once, after its first successful send.
    pub async fn run<X: DocumentExchange>(
        &self,
        exchange: &X,
        cache: &mut RunCache,
    ) -> Result<ExportSummary, SyncError> {
        let Some(ctx) = cache.context(self.client).await else {
            tracing::error!("company settings unavailable, nothing exported");
            return Err(SyncError::Config("company settings unavailable".into()));
        };
        let mut summary = ExportSummary::default();

        let offers = fetch_all::<C, OfferList>(self.client, "offers?sent=false", DEFAULT_PAGE_SIZE)
            .await
            .unwrap_or_default();
        tracing::info!(count = offers.len(), "exporting offers");
        for number in offers.iter().filter_map(|o| non_empty(o.document_number.as_deref())) {
            let documents = self.export_offer(ctx, number).await.into_iter().collect();
            self.deliver(exchange, "offers", number, documents, &mut summary)
                .await;
        }

        let orders = fetch_all::<C, OrderList>(self.client, "orders?sent=false", DEFAULT_PAGE_SIZE)
            .await
            .unwrap_or_default();
        tracing::info!(count = orders.len(), "exporting orders");
        for number in orders.iter().filter_map(|o| non_empty(o.document_number.as_deref())) {
            let documents = self.export_order(ctx, number).await;
            self.deliver(exchange, "orders", number, documents, &mut summary)
                .await;
        }

        let invoices =
            fetch_all::<C, InvoiceList>(self.client, "invoices?sent=false", DEFAULT_PAGE_SIZE)
                .await
                .unwrap_or_default();
        tracing::info!(count = invoices.len(), "exporting invoices");
        for number in invoices.iter().filter_map(|i| non_empty(i.document_number.as_deref())) {
            let documents = self.export_invoice(ctx, number).await.into_iter().collect();
            self.deliver(exchange, "invoices", number, documents, &mut summary)
                .await;
        }

        tracing::info!(
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            "export finished"
        );
        Ok(summary)
    }

    /// Send the documents produced from one source document and mark the
    /// source sent after the first success.
    async fn deliver<X: DocumentExchange>(
        &self,
        exchange: &X,
        collection: &str,
        number: &str,
        documents: Vec<OutboundDocument>,
        summary: &mut ExportSummary,
    ) {
        if documents.is_empty() {
            tracing::info!(collection, document = number, "not exported");
            summary.skipped += 1;
            return;
        }

        let mut marker = SentMarker::new(collection, number);
        for document in &documents {
            if send(exchange, document).await {
                summary.sent += 1;
                marker.mark(self.client).await;
            } else {
                summary.failed += 1;
            }
        }
    }

    fn parties<'p>(&self, ctx: RunContext<'p>, customer: &'p Customer) -> SalesParties<'p> {
        SalesParties {
            company: ctx.company,
            customer,
            penalty_interest: self.defaults.penalty_interest,
        }
    }

    async fn customer(&self, number: Option<&str>) -> Option<Customer> {
        let number = non_empty(number)?;
        find::<C, Customer>(self.client, &format!("customers/{number}")).await
    }

    /// The article of each row, in row order.
    async fn articles(&self, rows: &[SalesRow]) -> Vec<Option<Article>> {
        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            let article = match non_empty(row.article_number.as_deref()) {
                Some(number) => find::<C, Article>(self.client, &format!("articles/{number}")).await,
                None => None,
            };
            articles.push(article);
        }
        articles
    }
}

/// Serialize and send one document. Returns whether the exchange took it.
pub async fn send<X: DocumentExchange>(exchange: &X, document: &OutboundDocument) -> bool {
    let filename = document.filename();
    let Some(email) = non_empty(document.email.as_deref()) else {
        tracing::warn!(file = %filename, "no recipient email, not sent");
        return false;
    };
    let data = match document.document.to_json() {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(file = %filename, error = %e, "document not serializable");
            return false;
        }
    };
    let language_code = document
        .language_code
        .as_deref()
        .filter(|l| !l.is_empty())
        .unwrap_or("en")
        .to_lowercase();

    let file = OutgoingFile {
        data,
        recipient_email: email.to_string(),
        filename: filename.clone(),
        charset: "utf-8".into(),
        standard_name: STANDARD_NAME.into(),
        language_code,
        version: "1".into(),
    };
    match exchange.send(&file).await {
        Ok(_) => {
            tracing::info!(file = %filename, email, "document sent");
            true
        }
        Err(e) => {
            tracing::error!(file = %filename, error = %e, "send failed");
            false
        }
    }
}
