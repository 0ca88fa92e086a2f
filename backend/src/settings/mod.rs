//! Runtime configuration loaded via OrthoConfig.
//!
//! Raw settings structs mirror the environment (`TIKTOK_*`, `ONBOARDING_*`)
//! and are validated into typed configs before the server starts.

use std::ffi::OsString;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::workflow::{UnknownProfile, WorkflowProfile};

const DEFAULT_TIKTOK_BASE_URL: &str = "https://business-api.tiktok.com";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POST_LOGIN_PATH: &str = "/";
const PROGRAM_NAME: &str = "pixel-onboarding";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The configuration sources could not be read or merged.
    #[error("failed to load configuration: {message}")]
    Load {
        /// Loader description.
        message: String,
    },
    /// A required key is unset or blank.
    #[error("{key} must be set")]
    Missing {
        /// Environment variable name.
        key: &'static str,
    },
    /// A URL setting does not parse.
    #[error("{key} is not a valid absolute URL: {message}")]
    InvalidUrl {
        /// Environment variable name.
        key: &'static str,
        /// Parser description.
        message: String,
    },
    /// The bind address does not parse.
    #[error("ONBOARDING_BIND_ADDR `{value}` is not a socket address")]
    InvalidBindAddr {
        /// Configured value.
        value: String,
    },
    /// The post-login redirect is not an absolute path.
    #[error("ONBOARDING_POST_LOGIN_PATH `{value}` must start with `/`")]
    InvalidPostLoginPath {
        /// Configured value.
        value: String,
    },
    /// The request timeout is zero.
    #[error("TIKTOK_REQUEST_TIMEOUT_SECONDS must be greater than zero")]
    InvalidTimeout,
    /// The profile name is unknown.
    #[error(transparent)]
    Profile(#[from] UnknownProfile),
}

/// TikTok app credentials and endpoints.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TIKTOK")]
pub struct TikTokSettings {
    /// Developer app id.
    pub app_id: Option<String>,
    /// Developer app secret.
    pub secret: Option<String>,
    /// OAuth redirect URI registered with the app.
    pub redirect_uri: Option<String>,
    /// Business API base URL.
    pub api_base_url: Option<String>,
    /// Authorisation portal base URL.
    pub auth_base_url: Option<String>,
    /// Per-request timeout.
    #[ortho_config(default = 30)]
    pub request_timeout_seconds: u64,
    /// Events Manager test code forwarded with test events.
    pub test_event_code: Option<String>,
}

/// Validated TikTok configuration.
#[derive(Clone)]
pub struct TikTokConfig {
    /// Developer app id.
    pub app_id: String,
    /// Developer app secret.
    pub secret: Zeroizing<String>,
    /// OAuth redirect URI.
    pub redirect_uri: Url,
    /// Business API base URL.
    pub api_base_url: Url,
    /// Authorisation portal base URL.
    pub auth_base_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Events Manager test code.
    pub test_event_code: Option<String>,
}

impl fmt::Debug for TikTokConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TikTokConfig")
            .field("app_id", &self.app_id)
            .field("secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("api_base_url", &self.api_base_url.as_str())
            .field("auth_base_url", &self.auth_base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("test_event_code", &self.test_event_code)
            .finish()
    }
}

impl TikTokSettings {
    /// Load from the environment and configuration files.
    pub fn load_from_env() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from(PROGRAM_NAME)]).map_err(|error| {
            SettingsError::Load {
                message: error.to_string(),
            }
        })
    }

    /// Validate into a [`TikTokConfig`].
    pub fn into_config(self) -> Result<TikTokConfig, SettingsError> {
        if self.request_timeout_seconds == 0 {
            return Err(SettingsError::InvalidTimeout);
        }
        Ok(TikTokConfig {
            app_id: required("TIKTOK_APP_ID", self.app_id)?,
            secret: Zeroizing::new(required("TIKTOK_SECRET", self.secret)?),
            redirect_uri: parse_url(
                "TIKTOK_REDIRECT_URI",
                &required("TIKTOK_REDIRECT_URI", self.redirect_uri)?,
            )?,
            api_base_url: parse_url(
                "TIKTOK_API_BASE_URL",
                non_blank(self.api_base_url).as_deref().unwrap_or(DEFAULT_TIKTOK_BASE_URL),
            )?,
            auth_base_url: parse_url(
                "TIKTOK_AUTH_BASE_URL",
                non_blank(self.auth_base_url).as_deref().unwrap_or(DEFAULT_TIKTOK_BASE_URL),
            )?,
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            test_event_code: non_blank(self.test_event_code),
        })
    }
}

/// Server and workflow settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ONBOARDING")]
pub struct OnboardingSettings {
    /// Listen address.
    #[ortho_config(default = DEFAULT_BIND_ADDR.to_owned())]
    pub bind_addr: String,
    /// Workflow profile name.
    pub profile: Option<String>,
    /// Directory holding the credential file; memory storage when unset.
    pub credential_dir: Option<PathBuf>,
    /// Addresses or `@domain` entries, as a list or one comma separated
    /// string.
    #[serde(default, deserialize_with = "allowlist_entries")]
    pub access_allowlist: Option<Vec<String>>,
    /// Redirect target after the OAuth callback.
    pub post_login_path: Option<String>,
}

/// Validated server and workflow configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingConfig {
    /// Listen address.
    pub bind_addr: SocketAddr,
    /// Workflow profile.
    pub profile: WorkflowProfile,
    /// Credential directory, if file storage is used.
    pub credential_dir: Option<PathBuf>,
    /// Raw allowlist entries.
    pub access_allowlist: Vec<String>,
    /// Redirect target after the OAuth callback.
    pub post_login_path: String,
}

impl OnboardingSettings {
    /// Load from the environment and configuration files.
    pub fn load_from_env() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from(PROGRAM_NAME)]).map_err(|error| {
            SettingsError::Load {
                message: error.to_string(),
            }
        })
    }

    /// Validate into an [`OnboardingConfig`].
    pub fn into_config(self) -> Result<OnboardingConfig, SettingsError> {
        let bind_addr =
            non_blank(Some(self.bind_addr)).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| SettingsError::InvalidBindAddr { value: bind_addr })?;
        let profile = match non_blank(self.profile) {
            Some(name) => name.parse()?,
            None => WorkflowProfile::default(),
        };
        let post_login_path =
            non_blank(self.post_login_path).unwrap_or_else(|| DEFAULT_POST_LOGIN_PATH.to_owned());
        if !post_login_path.starts_with('/') || post_login_path.starts_with("//") {
            return Err(SettingsError::InvalidPostLoginPath {
                value: post_login_path,
            });
        }
        let access_allowlist = self
            .access_allowlist
            .unwrap_or_default()
            .iter()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(OnboardingConfig {
            bind_addr,
            profile,
            credential_dir: self.credential_dir.filter(|dir| !dir.as_os_str().is_empty()),
            access_allowlist,
            post_login_path,
        })
    }
}

/// Accept either a single string or a list; the environment layer yields a
/// list for comma separated values.
fn allowlist_entries<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entries {
        One(String),
        Many(Vec<String>),
    }

    Ok(
        Option::<Entries>::deserialize(deserializer)?.map(|entries| match entries {
            Entries::One(raw) => vec![raw],
            Entries::Many(list) => list,
        }),
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

fn required(key: &'static str, value: Option<String>) -> Result<String, SettingsError> {
    non_blank(value).ok_or(SettingsError::Missing { key })
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|error| SettingsError::InvalidUrl {
        key,
        message: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    //! Environment-driven configuration parsing.

    use super::*;

    use env_lock::lock_env;
    use rstest::rstest;

    const TIKTOK_KEYS: [&str; 7] = [
        "TIKTOK_APP_ID",
        "TIKTOK_SECRET",
        "TIKTOK_REDIRECT_URI",
        "TIKTOK_API_BASE_URL",
        "TIKTOK_AUTH_BASE_URL",
        "TIKTOK_REQUEST_TIMEOUT_SECONDS",
        "TIKTOK_TEST_EVENT_CODE",
    ];
    const ONBOARDING_KEYS: [&str; 5] = [
        "ONBOARDING_BIND_ADDR",
        "ONBOARDING_PROFILE",
        "ONBOARDING_CREDENTIAL_DIR",
        "ONBOARDING_ACCESS_ALLOWLIST",
        "ONBOARDING_POST_LOGIN_PATH",
    ];

    fn env(keys: &[&'static str], set: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        keys.iter()
            .map(|key| {
                let value = set
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| (*value).to_owned());
                (*key, value)
            })
            .collect()
    }

    #[rstest]
    fn tiktok_defaults_fill_optional_values() {
        let _guard = lock_env(env(
            &TIKTOK_KEYS,
            &[
                ("TIKTOK_APP_ID", "app-1"),
                ("TIKTOK_SECRET", "s3cret"),
                ("TIKTOK_REDIRECT_URI", "https://shop.example/oauth/callback"),
            ],
        ));

        let config = TikTokSettings::load_from_env()
            .expect("settings load")
            .into_config()
            .expect("valid config");

        assert_eq!(config.app_id, "app-1");
        assert_eq!(config.secret.as_str(), "s3cret");
        assert_eq!(config.api_base_url.as_str(), "https://business-api.tiktok.com/");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.test_event_code.is_none());
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[rstest]
    fn tiktok_overrides_are_respected() {
        let _guard = lock_env(env(
            &TIKTOK_KEYS,
            &[
                ("TIKTOK_APP_ID", "app-1"),
                ("TIKTOK_SECRET", "s3cret"),
                ("TIKTOK_REDIRECT_URI", "https://shop.example/oauth/callback"),
                ("TIKTOK_API_BASE_URL", "http://127.0.0.1:9000"),
                ("TIKTOK_REQUEST_TIMEOUT_SECONDS", "5"),
                ("TIKTOK_TEST_EVENT_CODE", "TEST123"),
            ],
        ));

        let config = TikTokSettings::load_from_env()
            .expect("settings load")
            .into_config()
            .expect("valid config");

        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.test_event_code.as_deref(), Some("TEST123"));
    }

    #[rstest]
    #[case(&[("TIKTOK_SECRET", "s"), ("TIKTOK_REDIRECT_URI", "https://a.example/cb")], "TIKTOK_APP_ID")]
    #[case(&[("TIKTOK_APP_ID", "a"), ("TIKTOK_REDIRECT_URI", "https://a.example/cb")], "TIKTOK_SECRET")]
    #[case(&[("TIKTOK_APP_ID", "a"), ("TIKTOK_SECRET", "  ")], "TIKTOK_SECRET")]
    fn missing_tiktok_credentials_are_reported(
        #[case] set: &[(&'static str, &'static str)],
        #[case] key: &'static str,
    ) {
        let _guard = lock_env(env(&TIKTOK_KEYS, set));

        let result = TikTokSettings::load_from_env()
            .expect("settings load")
            .into_config();

        assert!(matches!(result, Err(SettingsError::Missing { key: missing }) if missing == key));
    }

    #[rstest]
    fn relative_redirect_uri_is_rejected() {
        let _guard = lock_env(env(
            &TIKTOK_KEYS,
            &[
                ("TIKTOK_APP_ID", "a"),
                ("TIKTOK_SECRET", "s"),
                ("TIKTOK_REDIRECT_URI", "/oauth/callback"),
            ],
        ));

        let result = TikTokSettings::load_from_env()
            .expect("settings load")
            .into_config();

        assert!(matches!(
            result,
            Err(SettingsError::InvalidUrl {
                key: "TIKTOK_REDIRECT_URI",
                ..
            })
        ));
    }

    #[rstest]
    fn onboarding_defaults() {
        let _guard = lock_env(env(&ONBOARDING_KEYS, &[]));

        let config = OnboardingSettings::load_from_env()
            .expect("settings load")
            .into_config()
            .expect("valid config");

        assert_eq!(
            config,
            OnboardingConfig {
                bind_addr: "0.0.0.0:8080".parse().expect("addr"),
                profile: WorkflowProfile::CheckoutIntegration,
                credential_dir: None,
                access_allowlist: Vec::new(),
                post_login_path: "/".to_owned(),
            }
        );
    }

    #[rstest]
    fn onboarding_overrides_are_respected() {
        let _guard = lock_env(env(
            &ONBOARDING_KEYS,
            &[
                ("ONBOARDING_BIND_ADDR", "127.0.0.1:3000"),
                ("ONBOARDING_PROFILE", "pixel-generator"),
                ("ONBOARDING_CREDENTIAL_DIR", "/var/lib/pixel-onboarding"),
                ("ONBOARDING_ACCESS_ALLOWLIST", "owner@shop.example, @agency.example,,"),
                ("ONBOARDING_POST_LOGIN_PATH", "/onboarding"),
            ],
        ));

        let config = OnboardingSettings::load_from_env()
            .expect("settings load")
            .into_config()
            .expect("valid config");

        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.profile, WorkflowProfile::PixelGenerator);
        assert_eq!(
            config.credential_dir,
            Some(PathBuf::from("/var/lib/pixel-onboarding"))
        );
        assert_eq!(
            config.access_allowlist,
            vec!["owner@shop.example".to_owned(), "@agency.example".to_owned()]
        );
        assert_eq!(config.post_login_path, "/onboarding");
    }

    #[rstest]
    #[case("owner@shop.example", &["owner@shop.example"])]
    #[case(" @shop.example ", &["@shop.example"])]
    #[case(",,", &[])]
    fn allowlist_accepts_single_entries(#[case] raw: &str, #[case] expected: &[&str]) {
        let _guard = lock_env(env(&ONBOARDING_KEYS, &[("ONBOARDING_ACCESS_ALLOWLIST", raw)]));

        let config = OnboardingSettings::load_from_env()
            .expect("settings load")
            .into_config()
            .expect("valid config");

        assert_eq!(config.access_allowlist, expected);
    }

    #[rstest]
    fn allowlist_lists_from_files_are_trimmed() {
        let settings = OnboardingSettings {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            profile: None,
            credential_dir: None,
            access_allowlist: Some(vec![
                " owner@shop.example".to_owned(),
                String::new(),
                "@agency.example, @partner.example".to_owned(),
            ]),
            post_login_path: None,
        };

        let config = settings.into_config().expect("valid config");

        assert_eq!(
            config.access_allowlist,
            ["owner@shop.example", "@agency.example", "@partner.example"]
        );
    }

    #[rstest]
    #[case("ONBOARDING_PROFILE", "wizard")]
    #[case("ONBOARDING_BIND_ADDR", "not-an-address")]
    #[case("ONBOARDING_POST_LOGIN_PATH", "https://evil.example")]
    #[case("ONBOARDING_POST_LOGIN_PATH", "//evil.example")]
    fn invalid_onboarding_values_are_rejected(#[case] key: &'static str, #[case] value: &str) {
        let _guard = lock_env(env(&ONBOARDING_KEYS, &[(key, value)]));

        let result = OnboardingSettings::load_from_env()
            .expect("settings load")
            .into_config();

        assert!(result.is_err());
    }
}
