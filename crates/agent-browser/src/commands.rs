use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
pub use clap_complete::Shell;

use agent_browser_engine::{EngineConfig, StealthProfile};

const LONG_ABOUT: &str = r#"agent-browser lets AI agents drive a real browser through a persistent session.

WORKFLOW:
    1. Start a browser session
    2. Navigate, then snapshot to see the page and its element refs
    3. Interact using click, fill, select, hover
    4. Wait for content to appear
    5. Stop the session when done

ELEMENT REFS:
    Snapshots assign sequential refs like @e1, @e2, @e3 to interactive
    elements (links, buttons, inputs) in document order. Use them as
    targets for click/fill/select/hover instead of CSS selectors.

    Refs reset on each snapshot or tree call. Always use the latest
    snapshot's refs. CSS selectors and XPath (leading /) also work as
    targets at any time.

EXAMPLES:
    # Log into a site
    agent-browser start https://example.com/login
    agent-browser snapshot
    agent-browser fill @e1 "alice@example.com"
    agent-browser fill @e2 "hunter2"
    agent-browser click @e3
    agent-browser wait "text=Welcome"
    agent-browser stop

    # Scrape a page as markdown
    agent-browser start
    agent-browser go news.ycombinator.com
    agent-browser md

    # Check session status
    agent-browser status"#;

#[derive(Parser)]
#[command(name = "agent-browser")]
#[command(author, version)]
#[command(about = "CLI for AI agents to drive a real browser through a persistent session")]
#[command(long_about = LONG_ABOUT)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by `start` (which forwards them) and the hidden `daemon`
/// subcommand (which consumes them).
#[derive(Args, Debug, Clone, Default)]
pub struct StartOptions {
    /// Run with a visible browser window instead of headless
    #[arg(long)]
    pub headed: bool,

    /// Stealth profile: off, minimal, moderate, maximum
    #[arg(long, default_value = "off")]
    pub stealth: String,

    /// Override the browser user agent
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, default_value = "1920x1080")]
    pub viewport: String,

    /// Timeout in seconds for startup, navigation and waits
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Poll interval for wait operations, in milliseconds
    #[arg(long, default_value = "100")]
    pub poll_interval_ms: u64,

    /// Path to the Chromium/Chrome executable
    #[arg(long)]
    pub browser_path: Option<PathBuf>,

    /// Directory for downloads (enables wait-download)
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Timezone override, e.g. Europe/Berlin
    #[arg(long)]
    pub timezone: Option<String>,

    /// Browser UI locale, e.g. en-US
    #[arg(long)]
    pub locale: Option<String>,

    /// Extra argument passed to the browser binary (repeatable)
    #[arg(long = "chrome-arg", allow_hyphen_values = true)]
    pub chrome_args: Vec<String>,
}

impl StartOptions {
    pub fn engine_config(&self) -> Result<EngineConfig, String> {
        let stealth: StealthProfile = self.stealth.parse().map_err(
            |e: agent_browser_engine::EngineError| e.to_string(),
        )?;
        Ok(EngineConfig {
            headless: !self.headed,
            timeout: Duration::from_secs(self.timeout),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            viewport: parse_viewport(&self.viewport)?,
            stealth,
            download_dir: self.download_dir.clone(),
            browser_path: self.browser_path.clone(),
            browser_args: self.chrome_args.clone(),
            user_agent: self.user_agent.clone(),
            locale: self.locale.clone(),
            timezone: self.timezone.clone(),
        })
    }

    /// The argv tail for the spawned daemon process, mirroring these flags.
    pub fn to_daemon_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headed {
            args.push("--headed".to_string());
        }
        args.push("--stealth".to_string());
        args.push(self.stealth.clone());
        args.push("--viewport".to_string());
        args.push(self.viewport.clone());
        args.push("--timeout".to_string());
        args.push(self.timeout.to_string());
        args.push("--poll-interval-ms".to_string());
        args.push(self.poll_interval_ms.to_string());
        if let Some(ua) = &self.user_agent {
            args.push("--user-agent".to_string());
            args.push(ua.clone());
        }
        if let Some(path) = &self.browser_path {
            args.push("--browser-path".to_string());
            args.push(path.display().to_string());
        }
        if let Some(dir) = &self.download_dir {
            args.push("--download-dir".to_string());
            args.push(dir.display().to_string());
        }
        if let Some(tz) = &self.timezone {
            args.push("--timezone".to_string());
            args.push(tz.clone());
        }
        if let Some(locale) = &self.locale {
            args.push("--locale".to_string());
            args.push(locale.clone());
        }
        for arg in &self.chrome_args {
            args.push("--chrome-arg".to_string());
            args.push(arg.clone());
        }
        args
    }
}

fn parse_viewport(raw: &str) -> Result<(u32, u32), String> {
    let invalid = || format!("invalid viewport '{}': expected WIDTHxHEIGHT, e.g. 1280x720", raw);
    let (width, height) = raw.split_once('x').ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a browser session in the background
    #[command(long_about = r#"Start a browser session in the background.

Launches the daemon, waits for the browser to become ready, and records the
session so later commands can reach it. Fails if a session is already running.

EXAMPLES:
    agent-browser start
    agent-browser start https://example.com
    agent-browser start --headed --viewport 1280x720
    agent-browser start --stealth maximum --download-dir ~/Downloads"#)]
    Start {
        /// URL to open after startup
        url: Option<String>,

        #[command(flatten)]
        options: StartOptions,
    },

    /// Stop the running browser session
    Stop,

    /// Show whether a browser session is running
    Status,

    /// Navigate to a URL (https:// is assumed when no scheme is given)
    #[command(visible_alias = "go")]
    Navigate {
        url: String,
    },

    /// Go back in history
    Back,

    /// Go forward in history
    Forward,

    /// Reload the current page
    Refresh,

    /// Capture the page: title, URL, interactive elements with refs, markdown
    #[command(visible_alias = "snap")]
    #[command(long_about = r#"Capture the page: title, URL, interactive elements, markdown content.

Assigns fresh element refs (@e1, @e2, ...) to interactive elements in
document order. Any refs from an earlier snapshot stop working.

EXAMPLES:
    agent-browser snapshot
    agent-browser snap"#)]
    Snapshot,

    /// List interactive elements with refs, without page content
    Tree,

    /// Print the page content as markdown, keeping existing refs valid
    #[command(visible_alias = "md")]
    Markdown,

    /// Click an element
    #[command(long_about = r#"Click an element.

TARGET is an element ref (@e1), a CSS selector, or an XPath (leading /).

EXAMPLES:
    agent-browser click @e3
    agent-browser click "button.submit"
    agent-browser click "//a[contains(text(), 'Next')]""#)]
    Click {
        target: String,
    },

    /// Clear an input and type a value into it
    Fill {
        target: String,
        value: String,
    },

    /// Select a dropdown option by value
    Select {
        target: String,
        value: String,
    },

    /// Move the mouse over an element
    Hover {
        target: String,
    },

    /// Type text into whatever currently holds focus
    Type {
        text: String,
    },

    /// Print the current URL
    Url,

    /// Print the current page title
    Title,

    /// Evaluate a JavaScript expression and print the result
    Eval {
        expression: String,
    },

    /// Save a screenshot (default: timestamped PNG in the current directory)
    Screenshot {
        path: Option<String>,
    },

    /// Switch the stealth profile of the running session
    Stealth {
        /// off, minimal, moderate, maximum
        profile: String,
    },

    /// Wait for an element or text to appear
    #[command(long_about = r##"Wait for an element or text to appear.

SELECTOR is an element ref, CSS selector, XPath, or text=... for visible text.

EXAMPLES:
    agent-browser wait "#results"
    agent-browser wait "text=Order confirmed" --timeout 60"##)]
    Wait {
        selector: String,

        /// Override the wait timeout, in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Wait for a download to finish in the configured download directory
    #[command(name = "wait-download")]
    WaitDownload {
        /// Exact filename to wait for (default: any new file)
        filename: Option<String>,

        /// Override the wait timeout, in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Generate shell completions
    Completions {
        shell: Shell,
    },

    /// Run the daemon process (used internally by start)
    #[command(hide = true)]
    Daemon {
        #[command(flatten)]
        options: StartOptions,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewport() {
        assert_eq!(parse_viewport("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_viewport("800x600").unwrap(), (800, 600));
        assert!(parse_viewport("1920").is_err());
        assert!(parse_viewport("0x600").is_err());
        assert!(parse_viewport("widexhigh").is_err());
    }

    #[test]
    fn test_default_options_build_default_config() {
        let cli = Cli::try_parse_from(["agent-browser", "daemon"]).unwrap();
        let Commands::Daemon { options } = cli.command else {
            panic!("expected daemon");
        };
        let config = options.engine_config().unwrap();
        assert!(config.headless);
        assert_eq!(config.viewport, (1920, 1080));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.stealth, StealthProfile::Off);
    }

    #[test]
    fn test_unknown_stealth_profile_is_rejected() {
        let options = StartOptions {
            stealth: "paranoid".to_string(),
            viewport: "1920x1080".to_string(),
            ..Default::default()
        };
        let err = options.engine_config().unwrap_err();
        assert!(err.contains("off, minimal, moderate, maximum"));
    }

    #[test]
    fn test_daemon_args_round_trip() {
        let cli = Cli::try_parse_from([
            "agent-browser",
            "start",
            "https://example.com",
            "--headed",
            "--stealth",
            "moderate",
            "--viewport",
            "1280x720",
            "--timeout",
            "45",
            "--download-dir",
            "/tmp/dl",
            "--chrome-arg",
            "--disable-gpu",
        ])
        .unwrap();
        let Commands::Start { options, url } = cli.command else {
            panic!("expected start");
        };
        assert_eq!(url.as_deref(), Some("https://example.com"));

        let mut argv = vec!["agent-browser".to_string(), "daemon".to_string()];
        argv.extend(options.to_daemon_args());
        let reparsed = Cli::try_parse_from(&argv).unwrap();
        let Commands::Daemon { options: daemon_options } = reparsed.command else {
            panic!("expected daemon");
        };

        let config = daemon_options.engine_config().unwrap();
        assert!(!config.headless);
        assert_eq!(config.stealth, StealthProfile::Moderate);
        assert_eq!(config.viewport, (1280, 720));
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert_eq!(config.download_dir, Some(PathBuf::from("/tmp/dl")));
        assert_eq!(config.browser_args, vec!["--disable-gpu".to_string()]);
    }
}
