//! GlobalOpts-aware wrapper over `foundation-config`.
//!
//! Picks the active profile and layers CLI flags on top of it. Core never
//! sees these types; it receives a finished `ClientConfig`.

use secrecy::SecretString;

use foundation_config::{Overrides, Profile};
use foundation_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Build a `ClientConfig` from the config file, profile, and CLI flags.
///
/// One-shot commands pass `realtime = false`: nothing would be listening.
pub fn build_client_config(global: &GlobalOpts, realtime: bool) -> Result<ClientConfig, CliError> {
    let cfg = foundation_config::load_config()?;
    let profile_name = foundation_config::active_profile_name(global.profile.as_deref(), &cfg);
    let overrides = overrides(global, realtime);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return Ok(foundation_config::resolve_profile(
            profile,
            &profile_name,
            &overrides,
        )?);
    }

    // A named profile that doesn't exist is a mistake, not a fallback.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: cfg.profile_names().join(", "),
        });
    }

    // No profile: build from flags / env vars alone.
    let url = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: foundation_config::config_path().display().to_string(),
    })?;
    let profile = Profile::new(url);
    Ok(foundation_config::resolve_profile(
        &profile,
        &profile_name,
        &overrides,
    )?)
}

fn overrides(global: &GlobalOpts, realtime: bool) -> Overrides {
    Overrides {
        url: global.url.clone(),
        api_key: global.api_key.clone().map(SecretString::from),
        uid: None,
        insecure: global.insecure,
        timeout_secs: global.timeout,
        no_realtime: !realtime,
    }
}
