// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Configuration file handling.

use crate::vendor::{ArmingScope, Credentials};
use config::Config;
use log::{info, warn};
use serde_with::{DurationSeconds, serde_as};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Default configuration file.
pub const DEF_CONFIG_FILE: &str = "configuration.yaml";

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "ADC";

const MIN_UPDATE_INTERVAL_SEC: u64 = 10;

#[derive(Default, Clone, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub account: AccountSettings,
    #[serde(default)]
    pub options: EntryOptions,
    #[serde(default)]
    pub controller: ControllerSettings,
}

/// Alarm.com account credentials.
#[derive(Default, Clone, serde::Deserialize, serde::Serialize)]
pub struct AccountSettings {
    pub username: String,
    pub password: String,
    /// Cookie of a device trusted for two-factor authentication.
    #[serde(default)]
    pub two_factor_cookie: Option<String>,
}

/// User options of a configured account.
#[derive(Debug, Default, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct EntryOptions {
    /// Code required to arm and disarm alarm panels.
    pub arm_code: Option<String>,
    /// Code required to lock and unlock locks.
    pub lock_code: Option<String>,
    pub force_bypass: ArmingOption,
    pub no_entry_delay: ArmingOption,
    pub silent_arming: ArmingOption,
}

/// When an arming flag applies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmingOption {
    #[default]
    Never,
    Home,
    Away,
    Always,
}

impl ArmingOption {
    pub fn to_vendor(self) -> ArmingScope {
        match self {
            ArmingOption::Never => ArmingScope::Never,
            ArmingOption::Home => ArmingScope::StayOnly,
            ArmingOption::Away => ArmingScope::AwayOnly,
            ArmingOption::Always => ArmingScope::Always,
        }
    }
}

#[serde_as]
#[derive(Clone, Copy, serde::Deserialize, serde::Serialize)]
pub struct ControllerSettings {
    /// How often device states are pulled from the API.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "update_interval_sec")]
    pub update_interval: Duration,
    /// Max time allowed for the initial login.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "login_timeout_sec")]
    pub login_timeout: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(60),
            login_timeout: Duration::from_secs(10),
        }
    }
}

impl Display for ControllerSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Update interval={:?}, login timeout={:?}",
            self.update_interval, self.login_timeout
        )
    }
}

impl Settings {
    /// Login data for the vendor API client.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.account.username.clone(),
            password: self.account.password.clone(),
            two_factor_cookie: self.account.two_factor_cookie.clone(),
            force_bypass: self.options.force_bypass.to_vendor(),
            no_entry_delay: self.options.no_entry_delay.to_vendor(),
            silent_arming: self.options.silent_arming.to_vendor(),
        }
    }
}

/// Load the configuration settings.
///
/// The application provides default values which can be overriden in the following order:
/// 1. Configuration settings in the yaml or json configuration file specified in `filename`
/// 2. Environment variables with prefix `ADC_`. Nested keys are separated by `__`, e.g.
///    `ADC_OPTIONS__ARM_CODE=1234` sets the `options.arm_code` key.
pub fn get_configuration(filename: Option<&str>) -> Result<Settings, config::ConfigError> {
    load_configuration(filename, env_source())
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

fn load_configuration(
    filename: Option<&str>,
    env: config::Environment,
) -> Result<Settings, config::ConfigError> {
    // default configuration
    let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);
    // read optional configuration file to override defaults
    if let Some(filename) = filename {
        info!("Loading configuration file: {filename}");
        config = config.add_source(config::File::with_name(filename));
    }

    let settings: Settings = config.add_source(env).build()?.try_deserialize()?;

    check_cfg_values(settings)
}

fn check_cfg_values(mut settings: Settings) -> Result<Settings, config::ConfigError> {
    if settings.controller.update_interval.as_secs() < MIN_UPDATE_INTERVAL_SEC
        || settings.controller.login_timeout.is_zero()
    {
        warn!("Invalid controller settings, using defaults.");
        settings.controller = Default::default();
    }

    settings.options.arm_code = normalize_code(settings.options.arm_code.take());
    settings.options.lock_code = normalize_code(settings.options.lock_code.take());

    if settings.account.username.trim().is_empty() {
        return Err(config::ConfigError::Message(
            "account.username must not be empty".into(),
        ));
    }

    Ok(settings)
}

/// A blank code is the same as no code.
fn normalize_code(code: Option<String>) -> Option<String> {
    code.filter(|c| !c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn settings() -> Settings {
        Settings {
            account: AccountSettings {
                username: "joe".into(),
                password: "secret".into(),
                two_factor_cookie: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn default_controller_settings() {
        let cfg = ControllerSettings::default();
        assert_eq!(Duration::from_secs(60), cfg.update_interval);
        assert_eq!(Duration::from_secs(10), cfg.login_timeout);
    }

    #[rstest]
    #[case(Some(""), None)]
    #[case(Some("   "), None)]
    #[case(None, None)]
    #[case(Some("1234"), Some("1234"))]
    #[case(Some(" ab "), Some(" ab "))]
    fn blank_codes_are_removed(#[case] code: Option<&str>, #[case] expected: Option<&str>) {
        let mut cfg = settings();
        cfg.options.arm_code = code.map(|c| c.to_string());
        cfg.options.lock_code = code.map(|c| c.to_string());

        let cfg = check_cfg_values(cfg).unwrap();
        assert_eq!(expected, cfg.options.arm_code.as_deref());
        assert_eq!(expected, cfg.options.lock_code.as_deref());
    }

    #[test]
    fn too_short_update_interval_falls_back_to_defaults() {
        let mut cfg = settings();
        cfg.controller.update_interval = Duration::from_secs(1);

        let cfg = check_cfg_values(cfg).unwrap();
        assert_eq!(Duration::from_secs(60), cfg.controller.update_interval);
    }

    #[test]
    fn missing_username_is_rejected() {
        let cfg = Settings::default();
        assert!(check_cfg_values(cfg).is_err());
    }

    #[rstest]
    #[case(ArmingOption::Never, ArmingScope::Never)]
    #[case(ArmingOption::Home, ArmingScope::StayOnly)]
    #[case(ArmingOption::Away, ArmingScope::AwayOnly)]
    #[case(ArmingOption::Always, ArmingScope::Always)]
    fn arming_option_to_vendor(#[case] option: ArmingOption, #[case] expected: ArmingScope) {
        assert_eq!(expected, option.to_vendor());
    }

    #[test]
    fn credentials_carry_arming_options() {
        let mut cfg = settings();
        cfg.options.silent_arming = ArmingOption::Away;

        let credentials = cfg.credentials();
        assert_eq!("joe", credentials.username);
        assert_eq!(ArmingScope::AwayOnly, credentials.silent_arming);
        assert_eq!(ArmingScope::Never, credentials.force_bypass);
    }

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(vars))
    }

    #[test]
    fn env_overrides_keys_with_underscores() {
        let cfg = load_configuration(
            None,
            env(&[
                ("ADC_ACCOUNT__USERNAME", "joe"),
                ("ADC_ACCOUNT__TWO_FACTOR_COOKIE", "trusted"),
                ("ADC_OPTIONS__ARM_CODE", "1234"),
                ("ADC_OPTIONS__LOCK_CODE", "0042"),
                ("ADC_OPTIONS__FORCE_BYPASS", "home"),
                ("ADC_CONTROLLER__UPDATE_INTERVAL_SEC", "120"),
            ]),
        )
        .unwrap();

        assert_eq!("joe", cfg.account.username);
        assert_eq!(Some("trusted"), cfg.account.two_factor_cookie.as_deref());
        assert_eq!(Some("1234"), cfg.options.arm_code.as_deref());
        assert_eq!(Some("0042"), cfg.options.lock_code.as_deref());
        assert_eq!(ArmingOption::Home, cfg.options.force_bypass);
        assert_eq!(Duration::from_secs(120), cfg.controller.update_interval);
        assert_eq!(Duration::from_secs(10), cfg.controller.login_timeout);
    }

    #[test]
    fn env_without_username_is_rejected() {
        let result = load_configuration(None, env(&[("ADC_OPTIONS__ARM_CODE", "1234")]));
        assert!(result.is_err());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: EntryOptions =
            serde_json::from_str(r#"{"arm_code": "1234", "force_bypass": "home"}"#).unwrap();
        assert_eq!(Some("1234"), options.arm_code.as_deref());
        assert_eq!(None, options.lock_code);
        assert_eq!(ArmingOption::Home, options.force_bypass);
        assert_eq!(ArmingOption::Never, options.silent_arming);
    }
}
