//! Stealth profiles: ordered bundles of evasion scripts injected on every
//! new document. Ordering matters; later scripts assume earlier patches.

use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

const UTILS: &str = include_str!("scripts/utils.js");
const WEBDRIVER: &str = include_str!("scripts/webdriver.js");
const NAVIGATOR_VENDOR: &str = include_str!("scripts/navigator_vendor.js");
const NAVIGATOR_PLUGINS: &str = include_str!("scripts/navigator_plugins.js");
const CHROME_RUNTIME: &str = include_str!("scripts/chrome_runtime.js");
const WEBGL_VENDOR: &str = include_str!("scripts/webgl_vendor.js");
const IFRAME_CONTENT_WINDOW: &str = include_str!("scripts/iframe_content_window.js");
const USER_AGENT: &str = include_str!("scripts/user_agent.js");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StealthProfile {
    #[default]
    Off,
    Minimal,
    Moderate,
    Maximum,
}

impl StealthProfile {
    /// Evasion scripts for this profile, in injection order. Each entry is
    /// wrapped with the shared helpers so scripts stay self-contained.
    pub fn scripts(&self) -> Vec<String> {
        let sources: &[&str] = match self {
            StealthProfile::Off => &[],
            StealthProfile::Minimal => &[WEBDRIVER],
            StealthProfile::Moderate => &[WEBDRIVER, NAVIGATOR_VENDOR, CHROME_RUNTIME, USER_AGENT],
            StealthProfile::Maximum => &[
                WEBDRIVER,
                NAVIGATOR_VENDOR,
                NAVIGATOR_PLUGINS,
                CHROME_RUNTIME,
                WEBGL_VENDOR,
                IFRAME_CONTENT_WINDOW,
                USER_AGENT,
            ],
        };

        sources
            .iter()
            .map(|src| format!("(() => {{\n{UTILS}\n{src}\n}})();"))
            .collect()
    }

    /// Profiles that include the user-agent script also need the protocol
    /// level UA override to keep headers consistent with the JS view.
    pub fn rewrites_user_agent(&self) -> bool {
        matches!(self, StealthProfile::Moderate | StealthProfile::Maximum)
    }
}

impl FromStr for StealthProfile {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(StealthProfile::Off),
            "minimal" => Ok(StealthProfile::Minimal),
            "moderate" => Ok(StealthProfile::Moderate),
            "maximum" => Ok(StealthProfile::Maximum),
            other => Err(EngineError::UnknownStealthProfile(other.to_string())),
        }
    }
}

impl fmt::Display for StealthProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StealthProfile::Off => "off",
            StealthProfile::Minimal => "minimal",
            StealthProfile::Moderate => "moderate",
            StealthProfile::Maximum => "maximum",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_script_counts() {
        assert_eq!(StealthProfile::Off.scripts().len(), 0);
        assert_eq!(StealthProfile::Minimal.scripts().len(), 1);
        assert_eq!(StealthProfile::Moderate.scripts().len(), 4);
        assert_eq!(StealthProfile::Maximum.scripts().len(), 7);
    }

    #[test]
    fn test_webdriver_evasion_comes_first() {
        for profile in [
            StealthProfile::Minimal,
            StealthProfile::Moderate,
            StealthProfile::Maximum,
        ] {
            let scripts = profile.scripts();
            assert!(scripts[0].contains("webdriver"), "profile {}", profile);
        }
    }

    #[test]
    fn test_scripts_carry_shared_helpers() {
        for script in StealthProfile::Maximum.scripts() {
            assert!(script.contains("patchGetter"));
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for name in ["off", "minimal", "moderate", "maximum"] {
            let profile: StealthProfile = name.parse().unwrap();
            assert_eq!(profile.to_string(), name);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let profile: StealthProfile = "Maximum".parse().unwrap();
        assert_eq!(profile, StealthProfile::Maximum);
    }

    #[test]
    fn test_unknown_profile_names_valid_ones() {
        let err = "paranoid".parse::<StealthProfile>().unwrap_err();
        assert!(err.to_string().contains("off, minimal, moderate, maximum"));
    }

    #[test]
    fn test_ua_rewrite_only_on_profiles_with_ua_script() {
        assert!(!StealthProfile::Off.rewrites_user_agent());
        assert!(!StealthProfile::Minimal.rewrites_user_agent());
        assert!(StealthProfile::Moderate.rewrites_user_agent());
        assert!(StealthProfile::Maximum.rewrites_user_agent());
    }
}
