//! The browser session facade: one engine, one live reference table, the
//! full operation set the server dispatches into.
//!
//! Construction order matters: stealth before the user-agent override so an
//! explicit override always wins, environment overrides before the first
//! navigation so the page never sees the unpatched state.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use agent_browser_core::ax;
use agent_browser_core::markdown;
use agent_browser_core::refs::RefTable;
use agent_browser_core::snapshot::Snapshot;
use agent_browser_core::target::Target;
use agent_browser_engine::{Engine, EngineConfig, StealthProfile};

use crate::actions::with_retry;
use crate::downloads;
use crate::error::SessionError;
use crate::resolve::resolve_target;
use crate::waiter::Waiter;

/// Cap on the best-effort post-click navigation wait.
const CLICK_SETTLE: Duration = Duration::from_secs(3);
/// Downloads poll slower than DOM waits; disk writes are chunky.
const DOWNLOAD_POLL: Duration = Duration::from_millis(500);

pub struct BrowserSession {
    engine: Engine,
    table: RefTable,
    generation: u64,
}

impl BrowserSession {
    pub fn start(config: EngineConfig) -> Result<Self, SessionError> {
        let engine = Engine::launch(config)?;
        let config = engine.config().clone();

        if config.stealth != StealthProfile::Off {
            engine.apply_stealth(config.stealth)?;
        }
        if let Some(user_agent) = &config.user_agent {
            engine.set_user_agent(user_agent)?;
        }
        if let Some(timezone) = &config.timezone {
            engine.set_timezone(timezone)?;
        }
        if let Some(dir) = &config.download_dir {
            fs::create_dir_all(dir).map_err(|e| SessionError::Download(e.to_string()))?;
            engine.set_download_dir(dir)?;
        }

        Ok(Self {
            engine,
            table: RefTable::new(0),
            generation: 0,
        })
    }

    fn waiter(&self, timeout_secs: Option<u64>) -> Waiter {
        let timeout = timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.engine.config().timeout);
        Waiter::new(timeout, self.engine.config().poll_interval)
    }

    // --- navigation ---

    pub fn navigate(&mut self, url: &str) -> Result<String, SessionError> {
        let url = normalize_url(url);
        self.engine.goto(&url)?;
        Ok(format!("Navigated to {}", self.engine.current_url()?))
    }

    pub fn back(&mut self) -> Result<String, SessionError> {
        self.engine.back()?;
        self.engine.wait_until_settled(CLICK_SETTLE);
        Ok(format!("Went back to {}", self.engine.current_url()?))
    }

    pub fn forward(&mut self) -> Result<String, SessionError> {
        self.engine.forward()?;
        self.engine.wait_until_settled(CLICK_SETTLE);
        Ok(format!("Went forward to {}", self.engine.current_url()?))
    }

    pub fn refresh(&mut self) -> Result<String, SessionError> {
        self.engine.refresh()?;
        Ok(format!("Refreshed {}", self.engine.current_url()?))
    }

    pub fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.engine.current_url()?)
    }

    pub fn title(&self) -> Result<String, SessionError> {
        Ok(self.engine.title()?)
    }

    // --- content ---

    /// Full page view. Swaps in the new table generation, so earlier tokens
    /// are invalidated the moment this returns.
    pub fn snapshot(&mut self) -> Result<String, SessionError> {
        let table = self.extract_table()?;
        let markdown = markdown::convert(&self.engine.visible_html()?);
        let snapshot = Snapshot {
            url: self.engine.current_url()?,
            title: self.engine.title()?,
            markdown,
            table,
        };
        let rendered = snapshot.render();
        self.table = snapshot.table;
        Ok(rendered)
    }

    /// Interactive elements only. Also swaps the table generation.
    pub fn tree(&mut self) -> Result<String, SessionError> {
        let table = self.extract_table()?;
        let rendered = if table.is_empty() {
            "No interactive elements found".to_string()
        } else {
            table.format_tree()
        };
        self.table = table;
        Ok(rendered)
    }

    /// Markdown-only view. Read-only: existing refs stay valid.
    pub fn markdown(&mut self) -> Result<String, SessionError> {
        Ok(markdown::convert(&self.engine.visible_html()?))
    }

    fn extract_table(&mut self) -> Result<RefTable, SessionError> {
        let nodes = self.engine.full_ax_tree()?;
        self.generation += 1;
        Ok(ax::extract(&nodes, self.generation))
    }

    // --- actions ---

    pub fn click(&mut self, raw_target: &Value) -> Result<String, SessionError> {
        let target = Target::parse(raw_target)?;
        let before = self.engine.current_url()?;

        let engine = &self.engine;
        let table = &self.table;
        with_retry(|| {
            let handle = resolve_target(engine, table, &target)?;
            engine.click(&handle)?;
            Ok(())
        })?;

        // A click may or may not start a navigation; give it a moment.
        self.engine.wait_until_settled(CLICK_SETTLE);
        let after = self.engine.current_url()?;
        if after != before {
            Ok(format!("Clicked {} → {}", target, after))
        } else {
            Ok(format!("Clicked {}", target))
        }
    }

    pub fn fill(&mut self, raw_target: &Value, value: &str) -> Result<String, SessionError> {
        let target = Target::parse(raw_target)?;
        let engine = &self.engine;
        let table = &self.table;
        with_retry(|| {
            let handle = resolve_target(engine, table, &target)?;
            engine.fill(&handle, value)?;
            Ok(())
        })?;
        Ok(format!("Filled {}", target))
    }

    pub fn select(&mut self, raw_target: &Value, value: &str) -> Result<String, SessionError> {
        let target = Target::parse(raw_target)?;
        let engine = &self.engine;
        let table = &self.table;
        let selected = with_retry(|| {
            let handle = resolve_target(engine, table, &target)?;
            Ok(engine.select_value(&handle, value)?)
        })?;
        if selected.is_null() {
            return Err(SessionError::OptionNotFound {
                target: target.to_string(),
                value: value.to_string(),
            });
        }
        Ok(format!("Selected {} in {}", value, target))
    }

    pub fn hover(&mut self, raw_target: &Value) -> Result<String, SessionError> {
        let target = Target::parse(raw_target)?;
        let engine = &self.engine;
        let table = &self.table;
        with_retry(|| {
            let handle = resolve_target(engine, table, &target)?;
            engine.hover(&handle)?;
            Ok(())
        })?;
        Ok(format!("Hovered {}", target))
    }

    /// Types into whatever currently holds focus.
    pub fn type_text(&mut self, text: &str) -> Result<String, SessionError> {
        self.engine.insert_text(text)?;
        Ok(format!("Typed {}", text))
    }

    // --- script + capture ---

    pub fn eval(&mut self, expression: &str) -> Result<Value, SessionError> {
        Ok(self.engine.evaluate(expression)?)
    }

    pub fn screenshot(&mut self, path: Option<&str>) -> Result<String, SessionError> {
        let path = path
            .map(PathBuf::from)
            .unwrap_or_else(default_screenshot_path);
        self.engine.screenshot(&path, false)?;
        Ok(format!("Screenshot saved to {}", path.display()))
    }

    pub fn set_stealth(&mut self, profile: &str) -> Result<String, SessionError> {
        let profile: StealthProfile = profile.parse().map_err(SessionError::Engine)?;
        self.engine.apply_stealth(profile)?;
        Ok(format!("Stealth set to {}", profile))
    }

    // --- waits ---

    pub fn wait(
        &mut self,
        selector: &str,
        timeout_secs: Option<u64>,
    ) -> Result<String, SessionError> {
        let target = wait_target(selector)?;
        let waiter = self.waiter(timeout_secs);
        let engine = &self.engine;
        let table = &self.table;

        let found = waiter.poll_until(|| match resolve_target(engine, table, &target) {
            Ok(_) => Ok(Some(())),
            // "Not there yet" is the normal polling state, never fatal.
            Err(SessionError::ElementNotFound(_)) => Ok(None),
            // A token missing from the table will never appear by waiting.
            Err(fatal @ SessionError::RefNotFound(_)) => Err(fatal),
            Err(SessionError::Engine(e)) if e.is_transient() => Ok(None),
            Err(other) => Err(other),
        })?;

        match found {
            Some(()) => Ok(format!("Element {} found", selector)),
            None => Err(SessionError::Timeout {
                target: selector.to_string(),
                seconds: waiter.timeout_secs(),
            }),
        }
    }

    pub fn wait_download(
        &mut self,
        filename: Option<&str>,
        timeout_secs: Option<u64>,
    ) -> Result<String, SessionError> {
        let dir = self
            .engine
            .config()
            .download_dir
            .clone()
            .ok_or(SessionError::NoDownloadDir)?;
        let timeout = timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.engine.config().timeout);
        let waiter = Waiter::new(timeout, DOWNLOAD_POLL);
        let path = downloads::wait_for_download(&dir, filename, &waiter)?;
        Ok(format!("Download complete: {}", path.display()))
    }

    // --- teardown ---

    pub fn quit(self) -> Result<(), SessionError> {
        info!("quitting browser session");
        self.engine.quit()?;
        Ok(())
    }
}

/// Bare hostnames get the scheme the web expects.
fn normalize_url(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

fn default_screenshot_path() -> PathBuf {
    PathBuf::from(format!(
        "screenshot-{}.png",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ))
}

/// `text=…` waits on visible text; anything else is a regular target.
fn wait_target(selector: &str) -> Result<Target, SessionError> {
    match selector.strip_prefix("text=") {
        Some(text) => {
            let literal = xpath_literal(text)?;
            Ok(Target::XPath(format!(
                "//*[contains(text(), {})]",
                literal
            )))
        }
        None => Ok(Target::parse_str(selector)),
    }
}

/// XPath has no escape sequences inside string literals; pick whichever
/// quote the text does not use.
fn xpath_literal(text: &str) -> Result<String, SessionError> {
    if !text.contains('\'') {
        Ok(format!("'{}'", text))
    } else if !text.contains('"') {
        Ok(format!("\"{}\"", text))
    } else {
        Err(SessionError::InvalidTarget(
            "text to wait for cannot mix single and double quotes".to_string(),
        ))
    }
}
