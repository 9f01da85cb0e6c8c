//! Conversion from holder-listing wire items to domain records.

use hs_ingestion::HolderItem;
use hs_types::{HolderRecord, TypeError};
use tracing::warn;

/// Convert one API holder item to a [`HolderRecord`].
///
/// `decimals` is the token's fixed-point scale.
pub fn convert_holder(item: &HolderItem, decimals: u32) -> Result<HolderRecord, TypeError> {
    HolderRecord::from_raw(
        &item.address.hash,
        item.address.is_contract,
        &item.value,
        decimals,
    )
}

/// Convert a page of items, skipping any that do not parse.
///
/// A malformed item is logged and dropped rather than stored with a zero
/// balance.
pub fn convert_holders(items: &[HolderItem], decimals: u32) -> Vec<HolderRecord> {
    items
        .iter()
        .filter_map(|item| match convert_holder(item, decimals) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping holder {} with value {}: {}", item.address.hash, item.value, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_ingestion::AddressInfo;
    use rust_decimal_macros::dec;

    fn item(hash: &str, is_contract: bool, value: &str) -> HolderItem {
        HolderItem {
            address: AddressInfo {
                hash: hash.to_string(),
                is_contract,
            },
            value: value.to_string(),
        }
    }

    #[test]
    fn test_convert_holder() {
        let record = convert_holder(
            &item("0xAbCdEf0000000000000000000000000000000001", true, "2500000"),
            6,
        )
        .unwrap();

        assert_eq!(record.address, "0xabcdef0000000000000000000000000000000001");
        assert!(record.is_contract);
        assert_eq!(record.balance, dec!(2.5));
    }

    #[test]
    fn test_convert_holders_skips_bad_items() {
        let items = vec![
            item("0x0000000000000000000000000000000000000001", false, "1000"),
            item("not-an-address", false, "1000"),
            item("0x0000000000000000000000000000000000000002", false, "12.5"),
            item("0x0000000000000000000000000000000000000003", false, "-1"),
            item("0x0000000000000000000000000000000000000004", false, "0"),
        ];

        let records = convert_holders(&items, 3);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].balance, dec!(1));
        assert_eq!(records[1].balance, dec!(0));
    }
}
