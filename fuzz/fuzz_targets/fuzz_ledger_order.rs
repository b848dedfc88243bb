#![no_main]

use libfuzzer_sys::fuzz_target;
use tradesync::core::ledger::{Order, Root};

fuzz_target!(|data: &[u8]| {
    // Arbitrary accounting responses must not panic the export path.
    if let Ok(root) = serde_json::from_slice::<Root<Order>>(data) {
        let order = root.into_inner();
        let company = Default::default();
        let customer = Default::default();
        let parties = tradesync::export::SalesParties {
            company: &company,
            customer: &customer,
            penalty_interest: Default::default(),
        };
        let _ = tradesync::export::order_confirmation(&order, &[], parties);
    }
});
