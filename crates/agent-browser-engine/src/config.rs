//! Launch-time browser configuration, passed explicitly into `Engine::launch`.

use std::path::PathBuf;
use std::time::Duration;

use crate::stealth::StealthProfile;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub headless: bool,
    /// Per-operation deadline for navigation and waits.
    pub timeout: Duration,
    /// Polling cadence for the waiter loop and download watcher.
    pub poll_interval: Duration,
    pub viewport: (u32, u32),
    pub stealth: StealthProfile,
    pub download_dir: Option<PathBuf>,
    pub browser_path: Option<PathBuf>,
    pub browser_args: Vec<String>,
    pub user_agent: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            viewport: (1920, 1080),
            stealth: StealthProfile::Off,
            download_dir: None,
            browser_path: None,
            browser_args: Vec::new(),
            user_agent: None,
            locale: None,
            timezone: None,
        }
    }
}
