use std::collections::BTreeMap;

use crate::core::ledger::{CompanySettings, LabelList};
use crate::core::{AccountingClient, fetch, find};

static NO_LABELS: BTreeMap<String, String> = BTreeMap::new();

/// Label names and company settings, fetched lazily once per export run.
///
/// Create a fresh cache for every run and never share one between
/// concurrent runs. A failed fetch is not cached; the next access retries.
#[derive(Debug, Default)]
pub struct RunCache {
    labels: Option<BTreeMap<String, String>>,
    company: Option<CompanySettings>,
}

/// Borrowed view of a populated [`RunCache`].
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    /// Label id to label description.
    pub labels: &'a BTreeMap<String, String>,
    pub company: &'a CompanySettings,
}

impl RunCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label id to description. Empty while the labels cannot be fetched.
    pub async fn labels<C: AccountingClient>(&mut self, client: &C) -> &BTreeMap<String, String> {
        self.load_labels(client).await;
        self.labels.as_ref().unwrap_or(&NO_LABELS)
    }

    /// The tenant's company settings.
    pub async fn company<C: AccountingClient>(&mut self, client: &C) -> Option<&CompanySettings> {
        self.load_company(client).await;
        self.company.as_ref()
    }

    /// Labels and company settings together. `None` without company
    /// settings, since no outbound document can be built without them.
    pub async fn context<C: AccountingClient>(&mut self, client: &C) -> Option<RunContext<'_>> {
        self.load_labels(client).await;
        self.load_company(client).await;
        Some(RunContext {
            labels: self.labels.as_ref().unwrap_or(&NO_LABELS),
            company: self.company.as_ref()?,
        })
    }

    async fn load_labels<C: AccountingClient>(&mut self, client: &C) {
        if self.labels.is_some() {
            return;
        }
        if let Some(list) = fetch::<C, LabelList>(client, "labels").await {
            let labels = list
                .labels
                .into_iter()
                .map(|label| (label.id, label.description))
                .collect();
            self.labels = Some(labels);
        }
    }

    async fn load_company<C: AccountingClient>(&mut self, client: &C) {
        if self.company.is_none() {
            self.company = find::<C, CompanySettings>(client, "settings/company").await;
        }
    }
}
