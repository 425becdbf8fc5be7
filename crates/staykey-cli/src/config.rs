//! CLI configuration file.
//!
//! A TOML file describing the apartments to reconcile:
//!
//! ```toml
//! sync_secret = "env::STAYKEY_SYNC_SECRET"
//!
//! [[apartments]]
//! name = "Cozy Studio"
//! address = "Rustaveli Ave 42, Tbilisi"
//! airbnb_ical_url = "https://www.airbnb.com/calendar/ical/123.ics?s=abc"
//! booking_ical_url = "https://admin.booking.com/hotel/ical/42.ics"
//! ```
//!
//! `sync_secret` may be a `pass::`/`env::` secret reference.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use staykey_engine::{Apartment, FeedSlot};

use crate::error::{CliError, CliResult};
use crate::secret;

/// One apartment in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApartmentConfig {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub airbnb_ical_url: Option<String>,
    pub booking_ical_url: Option<String>,
    /// Single-feed position for calendars outside the known channels.
    pub ical_url: Option<String>,
}

impl ApartmentConfig {
    /// Returns true when at least one feed URL is present.
    pub fn has_feed(&self) -> bool {
        self.airbnb_ical_url.is_some() || self.booking_ical_url.is_some() || self.ical_url.is_some()
    }

    /// Builds the engine apartment this entry describes.
    pub fn to_apartment(&self, owner_id: Uuid) -> Apartment {
        let mut apartment = Apartment::new(owner_id, &self.name, &self.address);
        if let Some(ref url) = self.airbnb_ical_url {
            apartment.feeds.set_url(FeedSlot::Airbnb, url);
        }
        if let Some(ref url) = self.booking_ical_url {
            apartment.feeds.set_url(FeedSlot::Booking, url);
        }
        if let Some(ref url) = self.ical_url {
            apartment.feeds.set_url(FeedSlot::Legacy, url);
        }
        apartment
    }
}

/// The CLI's configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Shared secret for the scheduled sync entry point; may be a secret
    /// reference.
    pub sync_secret: Option<String>,
    #[serde(default)]
    pub apartments: Vec<ApartmentConfig>,
}

impl CliConfig {
    /// Loads and validates the config file, resolving secret references.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config: Self = toml::from_str(&text)
            .map_err(|e| CliError::Config(format!("cannot parse {}: {}", path.display(), e)))?;

        if let Some(ref secret_ref) = config.sync_secret {
            config.sync_secret = Some(secret::resolve(secret_ref).map_err(CliError::Config)?);
        }

        for apartment in &config.apartments {
            if apartment.name.trim().is_empty() {
                return Err(CliError::Config("apartment name must not be empty".into()));
            }
            if !apartment.has_feed() {
                return Err(CliError::Config(format!(
                    "apartment \"{}\" has no feed URL configured",
                    apartment.name
                )));
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn full_config_parses() {
        let file = write_config(
            r#"
            sync_secret = "cron-secret"

            [[apartments]]
            name = "Cozy Studio"
            address = "Rustaveli Ave 42"
            airbnb_ical_url = "https://www.airbnb.com/calendar/ical/1.ics"
            ical_url = "https://example.com/feed.ics"
            "#,
        );

        let config = CliConfig::load_from(file.path()).unwrap();
        assert_eq!(config.sync_secret.as_deref(), Some("cron-secret"));
        assert_eq!(config.apartments.len(), 1);

        let apartment = config.apartments[0].to_apartment(Uuid::new_v4());
        assert_eq!(apartment.name, "Cozy Studio");
        assert!(apartment.feeds.get(FeedSlot::Airbnb).is_some());
        assert!(apartment.feeds.get(FeedSlot::Booking).is_none());
        assert!(apartment.feeds.get(FeedSlot::Legacy).is_some());
    }

    #[test]
    fn env_secret_reference_resolves() {
        unsafe {
            std::env::set_var("_STAYKEY_CONFIG_TEST_SECRET", "resolved-secret");
        }
        let file = write_config(
            r#"
            sync_secret = "env::_STAYKEY_CONFIG_TEST_SECRET"

            [[apartments]]
            name = "A"
            ical_url = "https://example.com/feed.ics"
            "#,
        );
        let config = CliConfig::load_from(file.path()).unwrap();
        assert_eq!(config.sync_secret.as_deref(), Some("resolved-secret"));
        unsafe {
            std::env::remove_var("_STAYKEY_CONFIG_TEST_SECRET");
        }
    }

    #[test]
    fn feedless_apartment_is_refused() {
        let file = write_config(
            r#"
            [[apartments]]
            name = "No Feeds"
            address = "Somewhere"
            "#,
        );
        let err = CliConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("no feed URL"));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let file = write_config("this is [ not toml");
        assert!(matches!(
            CliConfig::load_from(file.path()),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = CliConfig::load_from(Path::new("/nonexistent/staykey.toml")).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
