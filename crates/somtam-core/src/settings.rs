//! # Shop Settings
//!
//! Typed view over the `settings` key-value table.
//!
//! ```text
//! ┌──────────────────────┐   from_pairs()   ┌──────────────────────────┐
//! │ settings table       │ ───────────────► │ ShopSettings             │
//! │  tax_rate = "7"      │                  │  tax_rate: TaxRate(700)  │
//! │  shop_name = "..."   │ ◄─────────────── │  shop_name: String       │
//! └──────────────────────┘    to_pairs()    └──────────────────────────┘
//! ```
//!
//! Missing keys fall back to defaults. A malformed value is an error rather
//! than a silent default, so a typo in the tax rate never goes unnoticed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::TaxRate;
use crate::pricing::AddonPolicy;
use crate::validation::validate_tax_rate_bps;

pub const KEY_TAX_RATE: &str = "tax_rate";
pub const KEY_SHOP_NAME: &str = "shop_name";
pub const KEY_SHOP_ADDRESS: &str = "shop_address";
pub const KEY_SHOP_PHONE: &str = "shop_phone";
pub const KEY_RECEIPT_FOOTER: &str = "receipt_footer";
pub const KEY_UNKNOWN_ADDON_POLICY: &str = "unknown_addon_policy";

pub const DEFAULT_SHOP_NAME: &str = "Somtam Shop";
pub const DEFAULT_RECEIPT_FOOTER: &str = "Thank you!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShopSettings {
    pub tax_rate: TaxRate,
    pub shop_name: String,
    pub shop_address: Option<String>,
    pub shop_phone: Option<String>,
    pub receipt_footer: String,
    pub unknown_addon_policy: AddonPolicy,
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            tax_rate: TaxRate::default(),
            shop_name: DEFAULT_SHOP_NAME.to_string(),
            shop_address: None,
            shop_phone: None,
            receipt_footer: DEFAULT_RECEIPT_FOOTER.to_string(),
            unknown_addon_policy: AddonPolicy::default(),
        }
    }
}

impl ShopSettings {
    /// Parses the raw key-value pairs. Unrecognised keys are ignored.
    pub fn from_pairs(pairs: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let mut settings = ShopSettings::default();

        if let Some(raw) = non_blank(pairs, KEY_TAX_RATE) {
            let rate = TaxRate::parse_percent(raw)?;
            validate_tax_rate_bps(rate.bps())?;
            settings.tax_rate = rate;
        }
        if let Some(name) = non_blank(pairs, KEY_SHOP_NAME) {
            settings.shop_name = name.to_string();
        }
        settings.shop_address = non_blank(pairs, KEY_SHOP_ADDRESS).map(str::to_string);
        settings.shop_phone = non_blank(pairs, KEY_SHOP_PHONE).map(str::to_string);
        if let Some(footer) = non_blank(pairs, KEY_RECEIPT_FOOTER) {
            settings.receipt_footer = footer.to_string();
        }
        if let Some(raw) = non_blank(pairs, KEY_UNKNOWN_ADDON_POLICY) {
            settings.unknown_addon_policy = raw.parse()?;
        }

        Ok(settings)
    }

    /// Renders back to storable pairs. Tax rate is written as a percentage.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let bps = self.tax_rate.bps();
        let tax = if bps % 100 == 0 {
            format!("{}", bps / 100)
        } else {
            format!("{}.{:02}", bps / 100, bps % 100)
        };

        let mut pairs = vec![
            (KEY_TAX_RATE.to_string(), tax),
            (KEY_SHOP_NAME.to_string(), self.shop_name.clone()),
            (KEY_RECEIPT_FOOTER.to_string(), self.receipt_footer.clone()),
            (
                KEY_UNKNOWN_ADDON_POLICY.to_string(),
                self.unknown_addon_policy.to_string(),
            ),
        ];
        if let Some(address) = &self.shop_address {
            pairs.push((KEY_SHOP_ADDRESS.to_string(), address.clone()));
        }
        if let Some(phone) = &self.shop_phone {
            pairs.push((KEY_SHOP_PHONE.to_string(), phone.clone()));
        }
        pairs
    }
}

fn non_blank<'a>(pairs: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    pairs
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> HashMap<String, String> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_empty() {
        let settings = ShopSettings::from_pairs(&HashMap::new()).unwrap();
        assert_eq!(settings, ShopSettings::default());
        assert_eq!(settings.tax_rate.bps(), 700);
        assert_eq!(settings.unknown_addon_policy, AddonPolicy::Ignore);
    }

    #[test]
    fn test_parse_values() {
        let settings = ShopSettings::from_pairs(&pairs(&[
            ("tax_rate", "8.5"),
            ("shop_name", "Baan Somtam"),
            ("shop_phone", "02-123-4567"),
            ("unknown_addon_policy", "reject"),
            ("theme", "dark"),
        ]))
        .unwrap();

        assert_eq!(settings.tax_rate.bps(), 850);
        assert_eq!(settings.shop_name, "Baan Somtam");
        assert_eq!(settings.shop_phone.as_deref(), Some("02-123-4567"));
        assert_eq!(settings.unknown_addon_policy, AddonPolicy::Reject);
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(ShopSettings::from_pairs(&pairs(&[("tax_rate", "seven")])).is_err());
        assert!(ShopSettings::from_pairs(&pairs(&[("tax_rate", "101")])).is_err());
        assert!(ShopSettings::from_pairs(&pairs(&[("unknown_addon_policy", "maybe")])).is_err());
    }

    #[test]
    fn test_pairs_round_trip() {
        let settings = ShopSettings {
            tax_rate: TaxRate::from_bps(825),
            shop_address: Some("Khon Kaen".to_string()),
            ..ShopSettings::default()
        };
        let map: HashMap<String, String> = settings.to_pairs().into_iter().collect();

        assert_eq!(map["tax_rate"], "8.25");
        assert_eq!(ShopSettings::from_pairs(&map).unwrap(), settings);
    }
}
