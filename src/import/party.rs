//! Customer and supplier upserts keyed by email.
//!
//! Merge policy:
//!
//! - "our reference" is set only while empty
//! - names, addresses, contact and VAT-number fields, currency and terms are
//!   overwritten whenever the document supplies a non-empty value
//! - notification emails default to the party email only while empty
//! - customer VAT type is recomputed on every upsert; supplier VAT type
//!   defaults to `NORMAL`

use crate::core::ledger::{Customer, CustomerList, Supplier, SupplierList};
use crate::core::{
    AccountingClient, LedgerDefaults, TradeDocument, create, fetch, find, non_empty, replace,
};
use crate::vat::{VatType, classify_vat};

/// Overwrite `target` when `source` holds a non-empty value.
fn overwrite(target: &mut Option<String>, source: Option<&String>) {
    if let Some(value) = non_empty(source.map(String::as_str)) {
        *target = Some(value.to_string());
    }
}

/// Set `target` to `value` while `target` is empty.
fn fill(target: &mut Option<String>, value: Option<&str>) {
    if non_empty(target.as_deref()).is_none() {
        *target = value.map(str::to_string);
    }
}

/// Create or update the customer behind `doc`'s buyer.
///
/// The customer is found by the buyer email, or `fallback_email` (the
/// sender) when the buyer has none. Returns `None` when there is no email
/// at all (silently) or when the ledger refused the save (already logged).
pub async fn upsert_customer<C: AccountingClient>(
    client: &C,
    defaults: &LedgerDefaults,
    fallback_email: &str,
    doc: &TradeDocument,
) -> Option<Customer> {
    let buyer = doc.buyer_information.as_ref();
    let email = non_empty(buyer.and_then(|b| b.email.as_deref()))
        .or(non_empty(Some(fallback_email)))?
        .to_string();

    let existing = match fetch::<C, CustomerList>(client, &format!("customers?email={email}"))
        .await
        .and_then(|list| list.customers.into_iter().next())
        .and_then(|summary| summary.customer_number)
    {
        Some(number) => find::<C, Customer>(client, &format!("customers/{number}")).await,
        None => None,
    };
    let exists = existing.is_some();
    let mut customer = existing.unwrap_or_default();

    customer.email = Some(email.clone());
    if let Some(seller) = &doc.seller_information {
        fill(&mut customer.our_reference, seller.contact_name.as_deref());
    }
    if let Some(buyer) = buyer {
        overwrite(&mut customer.name, buyer.person_name.as_ref());
        overwrite(&mut customer.organisation_number, buyer.person_id.as_ref());
        overwrite(&mut customer.vat_number, buyer.vat_number.as_ref());
        overwrite(&mut customer.your_reference, buyer.contact_name.as_ref());
        overwrite(&mut customer.phone1, buyer.phone_number.as_ref());
        overwrite(&mut customer.address1, buyer.address_line_1.as_ref());
        overwrite(&mut customer.address2, buyer.address_line_2.as_ref());
        overwrite(&mut customer.zip_code, buyer.postcode.as_ref());
        overwrite(&mut customer.city, buyer.city_name.as_ref());
        overwrite(&mut customer.country_code, buyer.country_code.as_ref());
        fill(&mut customer.email_offer, Some(&email));
        fill(&mut customer.email_order, Some(&email));
        fill(&mut customer.email_invoice, Some(&email));
    }
    if let Some(delivery) = &doc.delivery_information {
        overwrite(&mut customer.delivery_name, delivery.person_name.as_ref());
        overwrite(&mut customer.delivery_phone1, delivery.phone_number.as_ref());
        overwrite(&mut customer.delivery_address1, delivery.address_line_1.as_ref());
        overwrite(&mut customer.delivery_address2, delivery.address_line_2.as_ref());
        overwrite(&mut customer.delivery_city, delivery.city_name.as_ref());
        overwrite(&mut customer.delivery_country_code, delivery.country_code.as_ref());
        overwrite(&mut customer.delivery_zip_code, delivery.postcode.as_ref());
    }
    overwrite(&mut customer.currency, doc.currency_code.as_ref());
    overwrite(&mut customer.terms_of_delivery, doc.terms_of_delivery.as_ref());
    overwrite(&mut customer.terms_of_payment, doc.terms_of_payment.as_ref());
    overwrite(&mut customer.way_of_delivery, doc.mode_of_delivery.as_ref());

    let vat_type = classify_vat(
        customer.country_code.as_deref(),
        customer.delivery_country_code.as_deref(),
        non_empty(customer.vat_number.as_deref()).is_some(),
        customer.vat_type.as_deref().and_then(VatType::from_code),
        defaults.sales_vat_type_se,
    );
    customer.vat_type = Some(vat_type.code().to_string());
    if non_empty(customer.vat_number.as_deref()).is_some() {
        fill(&mut customer.kind, Some("COMPANY"));
    }
    if !defaults.price_list.is_empty() {
        fill(&mut customer.price_list, Some(&defaults.price_list));
    }

    match customer.customer_number.clone().filter(|_| exists) {
        Some(number) => replace(client, customer, &format!("customers/{number}")).await,
        None => create(client, customer, "customers").await,
    }
}

/// Create or update the supplier behind `doc`'s seller.
///
/// The supplier is found by the seller email, or `fallback_email` when the
/// seller has none. Payment options populate BIC/IBAN, bank giro, postal
/// giro or bank account by option name; bank account numbers lose spaces
/// and hyphens.
pub async fn upsert_supplier<C: AccountingClient>(
    client: &C,
    fallback_email: &str,
    doc: &TradeDocument,
) -> Option<Supplier> {
    let seller = doc.seller_information.as_ref();
    let email = non_empty(seller.and_then(|s| s.email.as_deref()))
        .or(non_empty(Some(fallback_email)))?
        .to_string();

    let existing = match fetch::<C, SupplierList>(client, &format!("suppliers?email={email}"))
        .await
        .and_then(|list| list.suppliers.into_iter().next())
        .and_then(|summary| summary.supplier_number)
    {
        Some(number) => find::<C, Supplier>(client, &format!("suppliers/{number}")).await,
        None => None,
    };
    let exists = existing.is_some();
    let mut supplier = existing.unwrap_or_default();

    supplier.email = Some(email);
    if let Some(buyer) = &doc.buyer_information {
        fill(&mut supplier.our_reference, buyer.contact_name.as_deref());
    }
    if let Some(seller) = seller {
        overwrite(&mut supplier.name, seller.person_name.as_ref());
        overwrite(&mut supplier.organisation_number, seller.person_id.as_ref());
        overwrite(&mut supplier.vat_number, seller.vat_number.as_ref());
        overwrite(&mut supplier.your_reference, seller.contact_name.as_ref());
        overwrite(&mut supplier.phone1, seller.phone_number.as_ref());
        overwrite(&mut supplier.address1, seller.address_line_1.as_ref());
        overwrite(&mut supplier.address2, seller.address_line_2.as_ref());
        overwrite(&mut supplier.zip_code, seller.postcode.as_ref());
        overwrite(&mut supplier.city, seller.city_name.as_ref());
        overwrite(&mut supplier.country_code, seller.country_code.as_ref());
    }
    overwrite(&mut supplier.currency, doc.currency_code.as_ref());
    overwrite(&mut supplier.terms_of_payment, doc.terms_of_payment.as_ref());
    fill(&mut supplier.vat_type, Some("NORMAL"));
    overwrite(
        &mut supplier.our_customer_number,
        doc.buyer_references.customer_id.as_ref(),
    );

    for option in &doc.payment_options {
        let Some(name) = option.name.as_deref().map(str::to_uppercase) else {
            continue;
        };
        match name.as_str() {
            "IBAN" => {
                overwrite(&mut supplier.bic, option.bank_identifier_code.as_ref());
                overwrite(&mut supplier.iban, option.account_reference.as_ref());
            }
            "BG" => overwrite(&mut supplier.bg, option.account_reference.as_ref()),
            "PG" => overwrite(&mut supplier.pg, option.account_reference.as_ref()),
            "BANK" => {
                let account = option
                    .account_reference
                    .as_ref()
                    .map(|a| a.replace([' ', '-'], ""));
                overwrite(&mut supplier.bank_account_number, account.as_ref());
                overwrite(&mut supplier.bank, option.bank_name.as_ref());
            }
            other => tracing::debug!(option = other, "payment option ignored"),
        }
    }

    match supplier.supplier_number.clone().filter(|_| exists) {
        Some(number) => replace(client, supplier, &format!("suppliers/{number}")).await,
        None => create(client, supplier, "suppliers").await,
    }
}
