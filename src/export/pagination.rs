use serde::de::DeserializeOwned;

use crate::core::ledger::{DocumentSummary, InvoiceList, MetaInformation, OfferList, OrderList};
use crate::core::{AccountingClient, fetch};

/// Default number of records per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A listing response split into pages.
pub trait Paged: DeserializeOwned + Send + 'static {
    type Item;

    /// Total page count from the response metadata, 1 when absent.
    fn total_pages(&self) -> u32;

    fn into_items(self) -> Vec<Self::Item>;
}

fn pages(meta: Option<&MetaInformation>) -> u32 {
    meta.and_then(|m| m.total_pages).unwrap_or(1)
}

macro_rules! impl_paged {
    ($list:ty, $field:ident) => {
        impl Paged for $list {
            type Item = DocumentSummary;

            fn total_pages(&self) -> u32 {
                pages(self.meta_information.as_ref())
            }

            fn into_items(self) -> Vec<DocumentSummary> {
                self.$field
            }
        }
    };
}

impl_paged!(OfferList, offers);
impl_paged!(OrderList, orders);
impl_paged!(InvoiceList, invoices);

/// Page `page` of `endpoint`, which may already carry a query string.
fn page_path(endpoint: &str, page_size: u32, page: u32) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}limit={page_size}&page={page}")
}

/// Fetch every page of a listing, in page order.
///
/// The page count comes from the first page. `None` when the first page
/// cannot be fetched; a failed later page is logged and ends the walk with
/// the items collected so far.
pub async fn fetch_all<C, P>(client: &C, endpoint: &str, page_size: u32) -> Option<Vec<P::Item>>
where
    C: AccountingClient,
    P: Paged,
{
    let first = fetch::<C, P>(client, &page_path(endpoint, page_size, 1)).await?;
    let total = first.total_pages();
    let mut items = first.into_items();

    for page in 2..=total {
        match fetch::<C, P>(client, &page_path(endpoint, page_size, page)).await {
            Some(next) => items.extend(next.into_items()),
            None => {
                tracing::warn!(endpoint, page, total, "listing page unavailable, stopping");
                break;
            }
        }
    }
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_path_appends_to_existing_query() {
        assert_eq!(page_path("offers?sent=false", 10, 2), "offers?sent=false&limit=10&page=2");
        assert_eq!(page_path("offers", 5, 1), "offers?limit=5&page=1");
    }

    #[test]
    fn missing_metadata_means_one_page() {
        let list: OrderList = serde_json::from_str(r#"{"Orders": []}"#).unwrap();
        assert_eq!(list.total_pages(), 1);
    }
}
