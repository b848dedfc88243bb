use rust_decimal::Decimal;

use crate::core::ledger::{Article, ArticleList, Price};
use crate::core::text::to_alphanumeric;
use crate::core::{AccountingClient, LedgerDefaults, ProductRow, create, fetch, find, non_empty};
use crate::vat::sales_account;

/// Find the article a product row refers to, creating it when unknown.
///
/// Lookup order, first hit wins:
///
/// 1. `gtin` against the article EAN
/// 2. `manufacturer_code` against the manufacturer article number
/// 3. the normalized `product_code` as article number
///
/// A new article gets the normalized product code as number (or lets the
/// ledger assign one), default accounts from `defaults` with the sales
/// account picked by VAT bracket, and one price-list entry at
/// `row.unit_price` from quantity 0. `row.unit_code` is used as given;
/// callers normalize it first.
pub async fn resolve_article<C: AccountingClient>(
    client: &C,
    defaults: &LedgerDefaults,
    row: &ProductRow,
) -> Option<Article> {
    let product_code = non_empty(row.product_code.as_deref()).map(to_alphanumeric);

    if let Some(gtin) = non_empty(row.gtin.as_deref()) {
        if let Some(article) = first_listed(client, &format!("articles?ean={gtin}")).await {
            return Some(article);
        }
    }

    if let Some(code) = non_empty(row.manufacturer_code.as_deref()) {
        let path = format!("articles?manufacturerarticlenumber={code}");
        if let Some(article) = first_listed(client, &path).await {
            return Some(article);
        }
    }

    if let Some(code) = &product_code {
        if let Some(article) = find::<C, Article>(client, &format!("articles/{code}")).await {
            return Some(article);
        }
    }

    create_article(client, defaults, row, product_code).await
}

/// Detail record of the first article a filtered listing returns.
async fn first_listed<C: AccountingClient>(client: &C, path: &str) -> Option<Article> {
    let list = fetch::<C, ArticleList>(client, path).await?;
    let number = list.articles.into_iter().next()?.article_number?;
    find::<C, Article>(client, &format!("articles/{number}")).await
}

async fn create_article<C: AccountingClient>(
    client: &C,
    defaults: &LedgerDefaults,
    row: &ProductRow,
    article_number: Option<String>,
) -> Option<Article> {
    let article = Article {
        article_number,
        description: row.product_name.clone(),
        ean: owned(row.gtin.as_deref()),
        manufacturer_article_number: owned(row.manufacturer_code.as_deref()),
        unit: owned(row.unit_code.as_deref()),
        sales_account: Some(sales_account(row.vat_rate, defaults).to_string()),
        purchase_account: Some(defaults.purchase_account.clone()),
        construction_account: Some(defaults.sales_account_se_reversed_vat.clone()),
        eu_account: Some(defaults.sales_account_eu_reversed_vat.clone()),
        eu_vat_account: Some(defaults.sales_account_eu_vat.clone()),
        export_account: Some(defaults.sales_account_export.clone()),
        stock_goods: Some(defaults.stock_article),
        stock_account: Some(defaults.stock_account.clone()),
        stock_change_account: Some(defaults.stock_change_account.clone()),
        ..Default::default()
    };

    let created = create(client, article, "articles").await?;
    tracing::info!(article = created.article_number.as_deref(), "article created");

    let price = Price {
        article_number: created.article_number.clone(),
        price_list: Some(defaults.price_list.clone()),
        from_quantity: Decimal::ZERO,
        amount: row.unit_price,
    };
    if create(client, price, "prices").await.is_none() {
        tracing::warn!(
            article = created.article_number.as_deref(),
            price_list = %defaults.price_list,
            "article created without a price"
        );
    }

    Some(created)
}

fn owned(value: Option<&str>) -> Option<String> {
    non_empty(value).map(str::to_string)
}
