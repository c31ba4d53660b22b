//! # Settings Service
//!
//! Shop settings are plain key-value rows. Known keys are validated by
//! parsing the merged result into [`ShopSettings`] before anything is
//! written, so a bad tax rate never reaches the store.

use std::collections::HashMap;
use tracing::info;

use somtam_core::validation::validate_optional_text;
use somtam_core::{ShopSettings, ValidationError};

use super::ServiceContext;
use crate::error::ServiceResult;

const MAX_KEY_LEN: usize = 64;
const MAX_VALUE_LEN: usize = 1000;

#[derive(Clone)]
pub struct SettingsService {
    ctx: ServiceContext,
}

impl SettingsService {
    pub fn new(ctx: ServiceContext) -> Self {
        SettingsService { ctx }
    }

    pub async fn all(&self) -> ServiceResult<HashMap<String, String>> {
        Ok(self.ctx.store().get_settings().await?)
    }

    pub async fn get(&self, key: &str) -> ServiceResult<Option<String>> {
        Ok(self.all().await?.remove(key))
    }

    /// Typed view with defaults filled in.
    pub async fn shop_settings(&self) -> ServiceResult<ShopSettings> {
        self.ctx.shop_settings().await
    }

    pub async fn put(&self, key: &str, value: &str) -> ServiceResult<()> {
        self.put_many(&[(key.to_string(), value.to_string())]).await
    }

    /// Writes all pairs or none.
    pub async fn put_many(&self, pairs: &[(String, String)]) -> ServiceResult<()> {
        let mut merged = self.all().await?;
        for (key, value) in pairs {
            validate_key(key)?;
            validate_optional_text("value", Some(value.as_str()), MAX_VALUE_LEN)?;
            merged.insert(key.clone(), value.clone());
        }
        ShopSettings::from_pairs(&merged)?;

        self.ctx.store().put_settings(pairs, self.ctx.now()).await?;

        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        info!(?keys, "Settings updated");
        Ok(())
    }

    /// Replaces the known keys with the typed settings.
    pub async fn update(&self, settings: &ShopSettings) -> ServiceResult<ShopSettings> {
        self.put_many(&settings.to_pairs()).await?;
        self.shop_settings().await
    }

    /// Returns whether the key existed. The typed view falls back to its
    /// default for a deleted key.
    pub async fn delete(&self, key: &str) -> ServiceResult<bool> {
        let existed = self.ctx.store().delete_setting(key).await?;
        if existed {
            info!(key, "Setting deleted");
        }
        Ok(existed)
    }
}

fn validate_key(key: &str) -> Result<(), ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "key".to_string(),
        });
    }
    if key.len() > MAX_KEY_LEN {
        return Err(ValidationError::TooLong {
            field: "key".to_string(),
            max: MAX_KEY_LEN,
        });
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "key".to_string(),
            reason: "use lowercase letters, digits and underscores".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::services::testing::*;
    use somtam_core::{AddonPolicy, CoreError, TaxRate};

    #[tokio::test]
    async fn test_defaults_then_overrides() {
        for (name, ctx, _) in contexts().await {
            let settings = SettingsService::new(ctx);

            let defaults = settings.shop_settings().await.unwrap();
            assert_eq!(defaults, ShopSettings::default(), "{name}");

            settings.put("tax_rate", "10").await.unwrap();
            settings.put("shop_name", "Tam Dee").await.unwrap();
            let typed = settings.shop_settings().await.unwrap();
            assert_eq!(typed.tax_rate, TaxRate::from_bps(1000), "{name}");
            assert_eq!(typed.shop_name, "Tam Dee", "{name}");
            assert_eq!(settings.get("tax_rate").await.unwrap().as_deref(), Some("10"), "{name}");
        }
    }

    #[tokio::test]
    async fn test_invalid_values_are_not_written() {
        for (name, ctx, _) in contexts().await {
            let settings = SettingsService::new(ctx);

            let err = settings
                .put_many(&[
                    ("shop_name".into(), "Ok".into()),
                    ("tax_rate".into(), "seven".into()),
                ])
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))), "{name}");
            assert!(settings.all().await.unwrap().is_empty(), "{name}");

            assert!(settings.put("unknown_addon_policy", "explode").await.is_err(), "{name}");
            assert!(settings.put("Bad Key", "x").await.is_err(), "{name}");
            assert!(settings.put("", "x").await.is_err(), "{name}");
        }
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        for (name, ctx, _) in contexts().await {
            let settings = SettingsService::new(ctx);

            let wanted = ShopSettings {
                tax_rate: TaxRate::from_bps(750),
                shop_phone: Some("02-123-4567".into()),
                unknown_addon_policy: AddonPolicy::Reject,
                ..ShopSettings::default()
            };
            let stored = settings.update(&wanted).await.unwrap();
            assert_eq!(stored, wanted, "{name}");

            assert!(settings.delete("shop_phone").await.unwrap(), "{name}");
            assert!(!settings.delete("shop_phone").await.unwrap(), "{name}");
            assert_eq!(settings.shop_settings().await.unwrap().shop_phone, None, "{name}");
        }
    }

    #[test]
    fn test_key_format() {
        assert!(validate_key("receipt_footer").is_ok());
        assert!(validate_key("printer2").is_ok());
        assert!(validate_key("Tax").is_err());
        assert!(validate_key(&"k".repeat(65)).is_err());
    }
}
