//! Settings a host application supplies once and reuses for every tag.

use crate::{error::TagError, keys::AuthKey, ndef::MAX_LANGUAGE_CODE_LEN};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Language code written into text records, e.g. `en`
    pub language_code: String,
    /// Key A tried on every Classic sector
    pub default_key: AuthKey,
    /// Package named by an application record appended to written messages
    pub application_package: Option<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        AccessConfig {
            language_code: "en".to_string(),
            default_key: AuthKey::DEFAULT,
            application_package: None,
        }
    }
}

impl AccessConfig {
    /// Parses and validates a JSON configuration. Missing fields take their
    /// default values.
    pub fn from_json(json: &str) -> Result<AccessConfig, TagError> {
        let config: AccessConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TagError> {
        if !self.language_code.is_ascii() || self.language_code.len() > MAX_LANGUAGE_CODE_LEN {
            return Err(TagError::InvalidConfig(format!(
                "language code {:?} must be ASCII and at most {MAX_LANGUAGE_CODE_LEN} bytes",
                self.language_code
            )));
        }
        if let Some(package) = &self.application_package {
            if package.is_empty() {
                return Err(TagError::InvalidConfig("application package is empty".into()));
            }
        }
        Ok(())
    }
}
