//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `COLOC_*` environment variables, and
//! configuration files. [`AppSettings::session_settings`] validates the
//! cookie toggles and loads the signing key, applying stricter rules in
//! release builds.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroize;

const DEFAULT_HOST: &str = "0.0.0.0";
const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const SAME_SITE_EXPECTED: &str = "Strict|Lax|None";
const FINGERPRINT_BYTES: usize = 8;

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings.
    Debug,
    /// Release builds require a real signing key and secure cookies for
    /// `SameSite=None`.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backend::settings::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Configuration values controlling the HTTP listener and cookie sessions.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "COLOC")]
pub struct AppSettings {
    /// Interface to bind; defaults to all interfaces.
    pub host: Option<String>,
    /// TCP port to listen on.
    #[ortho_config(default = 8080)]
    pub port: u16,
    /// Path of the session signing key file.
    pub session_key_file: Option<PathBuf>,
    /// Whether session cookies are marked `Secure`; defaults to `true`.
    pub cookie_secure: Option<bool>,
    /// `SameSite` policy for session cookies: `Strict`, `Lax`, or `None`.
    pub same_site: Option<String>,
    /// Permit a generated key when the key file cannot be read; defaults to
    /// `false`.
    pub allow_ephemeral: Option<bool>,
}

/// Session settings derived from [`AppSettings`].
pub struct SessionSettings {
    /// Signing key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// Configured `SameSite` policy for session cookies.
    pub same_site: SameSite,
}

impl SessionSettings {
    /// Truncated SHA-256 of the signing key, as 16 hex characters. Safe to
    /// log; lets operators tell which key a deployment is using.
    #[must_use]
    pub fn key_fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key.signing());
        hex::encode(&digest[..FINGERPRINT_BYTES])
    }
}

/// Errors raised while validating settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    /// The configured host is not an IP address.
    #[error("invalid host '{value}'; expected an IP address")]
    InvalidHost { value: String },
    /// The `SameSite` policy is not recognised.
    #[error("invalid same_site '{value}'; expected {expected}")]
    InvalidSameSite {
        value: String,
        expected: &'static str,
    },
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The session key file is too short for release builds.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// `SameSite=None` requires secure cookies in release builds.
    #[error("same_site=None requires cookie_secure=true")]
    InsecureSameSiteNone,
    /// Release builds must not allow ephemeral session keys.
    #[error("allow_ephemeral must be false in release builds")]
    EphemeralNotAllowed,
}

impl AppSettings {
    /// Return the configured host, falling back to all interfaces.
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Return the configured key file path, falling back to the secrets mount.
    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH))
    }

    /// Whether session cookies carry the `Secure` attribute.
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }

    /// Whether a generated key may stand in for an unreadable key file.
    pub fn allow_ephemeral(&self) -> bool {
        self.allow_ephemeral.unwrap_or(false)
    }

    /// Resolve the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidHost`] when the host is not an IP
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let host = self.host();
        let ip: IpAddr = host.parse().map_err(|_| SettingsError::InvalidHost {
            value: host.to_owned(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Validate the cookie toggles and load the signing key.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] when a toggle is invalid for the build mode
    /// or the key cannot be loaded.
    pub fn session_settings(&self, mode: BuildMode) -> Result<SessionSettings, SettingsError> {
        let same_site = self.resolve_same_site(mode)?;
        if self.allow_ephemeral() && !mode.is_debug() {
            return Err(SettingsError::EphemeralNotAllowed);
        }
        let key = self.load_key(mode)?;
        Ok(SessionSettings {
            key,
            cookie_secure: self.cookie_secure(),
            same_site,
        })
    }

    fn resolve_same_site(&self, mode: BuildMode) -> Result<SameSite, SettingsError> {
        let Some(value) = self.same_site.as_deref() else {
            return Ok(if mode.is_debug() {
                SameSite::Lax
            } else {
                SameSite::Strict
            });
        };
        match value.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" => {
                if !self.cookie_secure() {
                    if !mode.is_debug() {
                        return Err(SettingsError::InsecureSameSiteNone);
                    }
                    warn!("same_site=None with insecure cookies; browsers may reject them");
                }
                Ok(SameSite::None)
            }
            _ => Err(SettingsError::InvalidSameSite {
                value: value.to_owned(),
                expected: SAME_SITE_EXPECTED,
            }),
        }
    }

    fn load_key(&self, mode: BuildMode) -> Result<Key, SettingsError> {
        let path = self.session_key_file();
        match std::fs::read(&path) {
            Ok(mut bytes) => {
                let length = bytes.len();
                if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                    bytes.zeroize();
                    return Err(SettingsError::KeyTooShort {
                        path,
                        length,
                        min_len: SESSION_KEY_MIN_LEN,
                    });
                }
                let key = Key::derive_from(&bytes);
                bytes.zeroize();
                Ok(key)
            }
            Err(source) if mode.is_debug() || self.allow_ephemeral() => {
                warn!(
                    path = %path.display(),
                    error = %source,
                    "using temporary session key (dev only)"
                );
                Ok(Key::generate())
            }
            Err(source) => Err(SettingsError::KeyRead { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and session validation.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "COLOC_HOST",
        "COLOC_PORT",
        "COLOC_SESSION_KEY_FILE",
        "COLOC_COOKIE_SECURE",
        "COLOC_SAME_SITE",
        "COLOC_ALLOW_EPHEMERAL",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("backend")]).expect("config should load")
    }

    fn settings(same_site: Option<&str>, cookie_secure: bool) -> AppSettings {
        AppSettings {
            host: None,
            port: 8080,
            session_key_file: Some(PathBuf::from("/nonexistent/coloc/session_key")),
            cookie_secure: Some(cookie_secure),
            same_site: same_site.map(str::to_owned),
            allow_ephemeral: None,
        }
    }

    fn write_key(name: &str, len: usize) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, vec![b'k'; len]).expect("write key file");
        path
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.host(), DEFAULT_HOST);
        assert_eq!(settings.port, 8080);
        assert!(settings.cookie_secure());
        assert!(!settings.allow_ephemeral());
        assert_eq!(
            settings.session_key_file(),
            PathBuf::from(SESSION_KEY_DEFAULT_PATH)
        );
        assert_eq!(
            settings.bind_addr().expect("valid address").to_string(),
            "0.0.0.0:8080"
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("COLOC_HOST", Some("127.0.0.1".to_owned())),
            ("COLOC_PORT", Some("9090".to_owned())),
            ("COLOC_SESSION_KEY_FILE", Some("/tmp/coloc_key".to_owned())),
            ("COLOC_COOKIE_SECURE", Some("false".to_owned())),
            ("COLOC_SAME_SITE", Some("Strict".to_owned())),
            ("COLOC_ALLOW_EPHEMERAL", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("valid address").to_string(),
            "127.0.0.1:9090"
        );
        assert_eq!(settings.session_key_file(), PathBuf::from("/tmp/coloc_key"));
        assert!(!settings.cookie_secure());
        assert_eq!(settings.same_site.as_deref(), Some("Strict"));
        assert!(settings.allow_ephemeral());
    }

    #[rstest]
    fn unset_cookie_flags_fall_back_to_secure_defaults() {
        let mut settings = settings(None, true);
        settings.cookie_secure = None;
        settings.allow_ephemeral = None;

        assert!(settings.cookie_secure());
        assert!(!settings.allow_ephemeral());
        let session = settings
            .session_settings(BuildMode::Debug)
            .expect("debug tolerates missing key");
        assert!(session.cookie_secure);
    }

    fn session_with_key(bytes: &[u8]) -> SessionSettings {
        SessionSettings {
            key: Key::derive_from(bytes),
            cookie_secure: true,
            same_site: SameSite::Strict,
        }
    }

    #[rstest]
    fn key_fingerprint_is_stable_per_key() {
        let first = session_with_key(&[b'a'; 64]).key_fingerprint();
        assert_eq!(first, session_with_key(&[b'a'; 64]).key_fingerprint());
        assert_ne!(first, session_with_key(&[b'b'; 64]).key_fingerprint());
        assert_eq!(first.len(), FINGERPRINT_BYTES * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[rstest]
    fn hostnames_are_rejected() {
        let mut settings = settings(None, true);
        settings.host = Some("localhost".to_owned());
        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::InvalidHost { .. })
        ));
    }

    #[rstest]
    #[case(None, BuildMode::Debug, SameSite::Lax)]
    #[case(None, BuildMode::Release, SameSite::Strict)]
    #[case(Some("lax"), BuildMode::Release, SameSite::Lax)]
    #[case(Some("None"), BuildMode::Release, SameSite::None)]
    fn same_site_resolution(
        #[case] value: Option<&str>,
        #[case] mode: BuildMode,
        #[case] expected: SameSite,
    ) {
        let resolved = settings(value, true)
            .resolve_same_site(mode)
            .expect("valid same_site");
        assert_eq!(resolved, expected);
    }

    #[rstest]
    fn unknown_same_site_is_rejected() {
        let err = settings(Some("sideways"), true)
            .resolve_same_site(BuildMode::Debug)
            .expect_err("invalid same_site");
        assert!(matches!(err, SettingsError::InvalidSameSite { .. }));
    }

    #[rstest]
    fn insecure_same_site_none_fails_in_release() {
        let err = settings(Some("None"), false)
            .resolve_same_site(BuildMode::Release)
            .expect_err("insecure None");
        assert!(matches!(err, SettingsError::InsecureSameSiteNone));
    }

    #[rstest]
    fn missing_key_generates_ephemeral_key_in_debug() {
        let settings = settings(None, true)
            .session_settings(BuildMode::Debug)
            .expect("debug tolerates missing key");
        assert!(settings.cookie_secure);
    }

    #[rstest]
    fn missing_key_fails_in_release() {
        let err = settings(None, true)
            .session_settings(BuildMode::Release)
            .err()
            .expect("release requires a key");
        assert!(matches!(err, SettingsError::KeyRead { .. }));
    }

    #[rstest]
    fn ephemeral_keys_are_refused_in_release() {
        let mut settings = settings(None, true);
        settings.allow_ephemeral = Some(true);
        let err = settings
            .session_settings(BuildMode::Release)
            .err()
            .expect("release refuses ephemeral keys");
        assert!(matches!(err, SettingsError::EphemeralNotAllowed));
    }

    #[rstest]
    #[case(32, false)]
    #[case(64, true)]
    fn release_key_length_is_enforced(#[case] len: usize, #[case] accepted: bool) {
        let path = write_key(&format!("coloc_session_key_{len}"), len);
        let mut settings = settings(Some("Strict"), true);
        settings.session_key_file = Some(path.clone());

        let result = settings.session_settings(BuildMode::Release);
        std::fs::remove_file(&path).expect("remove key file");

        match result {
            Ok(_) => assert!(accepted),
            Err(err) => {
                assert!(!accepted);
                assert!(matches!(err, SettingsError::KeyTooShort { length, .. } if length == len));
            }
        }
    }
}
