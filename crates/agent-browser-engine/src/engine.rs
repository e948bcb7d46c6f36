//! Synchronous facade over a chromiumoxide browser.
//!
//! The engine owns its own tokio runtime and blocks on every protocol call,
//! so the daemon above it stays a plain single-threaded loop. The CDP event
//! handler is driven by a task spawned on that runtime.

use std::path::Path;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::accessibility::{AxNode, GetFullAxTreeParams};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::dom::{
    BackendNodeId, DescribeNodeParams, FocusParams, GetBoxModelParams, RequestNodeParams,
    ResolveNodeParams,
};
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, ReloadParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{CallFunctionOnParams, RemoteObjectId};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, info};

use agent_browser_core::ax::AxNodeData;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::stealth::StealthProfile;

/// Serializes the visible document for markdown conversion.
const VISIBILITY_FILTER: &str = include_str!("scripts/visibility_filter.js");

/// A materialized DOM node, addressable through all three CDP id spaces.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    pub backend_node_id: i64,
    pub node_id: i64,
    pub object_id: RemoteObjectId,
    pub node_name: Option<String>,
}

pub struct Engine {
    rt: tokio::runtime::Runtime,
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    config: EngineConfig,
}

fn cdp(err: CdpError) -> EngineError {
    EngineError::classify(err.to_string())
}

impl Engine {
    pub fn launch(config: EngineConfig) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        let (browser, page, handler_task) = rt.block_on(async {
            let (width, height) = config.viewport;
            let mut builder = BrowserConfig::builder()
                .window_size(width, height)
                .request_timeout(config.timeout)
                .arg("--no-first-run")
                .arg("--disable-blink-features=AutomationControlled");
            builder = if config.headless {
                builder.headless_mode(HeadlessMode::New)
            } else {
                builder.with_head()
            };
            if let Some(path) = &config.browser_path {
                builder = builder.chrome_executable(path);
            }
            if let Some(locale) = &config.locale {
                builder = builder.arg(format!("--lang={}", locale));
            }
            for arg in &config.browser_args {
                builder = builder.arg(arg.clone());
            }

            let browser_config = builder.build().map_err(EngineError::Launch)?;
            let (browser, mut handler) = Browser::launch(browser_config)
                .await
                .map_err(|e| EngineError::Launch(e.to_string()))?;

            let handler_task = tokio::spawn(async move {
                while handler.next().await.is_some() {}
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| EngineError::Launch(e.to_string()))?;

            Ok::<_, EngineError>((browser, page, handler_task))
        })?;

        info!(
            headless = config.headless,
            viewport = ?config.viewport,
            "browser launched"
        );

        Ok(Self {
            rt,
            browser,
            page,
            handler_task,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- navigation ---

    pub fn goto(&self, url: &str) -> Result<()> {
        debug!(url, "navigate");
        self.rt.block_on(async {
            self.page
                .goto(url)
                .await
                .map_err(|e| EngineError::Navigation(e.to_string()))?;
            Ok(())
        })
    }

    pub fn back(&self) -> Result<()> {
        self.evaluate("history.back()").map(|_| ())
    }

    pub fn forward(&self) -> Result<()> {
        self.evaluate("history.forward()").map(|_| ())
    }

    pub fn refresh(&self) -> Result<()> {
        self.rt.block_on(async {
            self.page
                .execute(ReloadParams::default())
                .await
                .map_err(|e| EngineError::Navigation(e.to_string()))?;
            let _ = self.page.wait_for_navigation().await;
            Ok(())
        })
    }

    /// Waits for an in-flight navigation to land. Best effort: returns
    /// whether the page settled within the window.
    pub fn wait_until_settled(&self, window: Duration) -> bool {
        self.rt.block_on(async {
            tokio::time::timeout(window, self.page.wait_for_navigation())
                .await
                .map(|outcome| outcome.is_ok())
                .unwrap_or(false)
        })
    }

    pub fn current_url(&self) -> Result<String> {
        self.rt.block_on(async {
            let url = self.page.url().await.map_err(cdp)?;
            Ok(url.unwrap_or_else(|| "about:blank".to_string()))
        })
    }

    pub fn title(&self) -> Result<String> {
        self.rt.block_on(async {
            let title = self.page.get_title().await.map_err(cdp)?;
            Ok(title.unwrap_or_default())
        })
    }

    // --- script evaluation ---

    pub fn evaluate(&self, expression: &str) -> Result<Value> {
        self.rt.block_on(async {
            let evaluation = self.page.evaluate(expression).await.map_err(cdp)?;
            Ok(evaluation.value().cloned().unwrap_or(Value::Null))
        })
    }

    /// The document's visible HTML after the in-page filter pass. Falls back
    /// to the raw document when the filter itself fails.
    pub fn visible_html(&self) -> Result<String> {
        let filtered = self.evaluate(VISIBILITY_FILTER)?;
        if let Some(html) = filtered.as_str() {
            return Ok(html.to_string());
        }
        let raw = self.evaluate("document.documentElement.outerHTML")?;
        Ok(raw.as_str().unwrap_or_default().to_string())
    }

    // --- accessibility ---

    pub fn full_ax_tree(&self) -> Result<Vec<AxNodeData>> {
        self.rt.block_on(async {
            let resp = self
                .page
                .execute(GetFullAxTreeParams::builder().build())
                .await
                .map_err(cdp)?;
            Ok(resp.result.nodes.iter().map(ax_node_data).collect())
        })
    }

    // --- node materialization ---

    /// Turns a backend node id from an earlier accessibility pass into a
    /// live handle: resolve to a remote object, describe it, then push it
    /// into the agent's DOM node map.
    pub fn resolve_backend_node(&self, backend_node_id: i64) -> Result<NodeHandle> {
        self.rt.block_on(async {
            let backend = BackendNodeId::new(backend_node_id);
            let resolved = self
                .page
                .execute(
                    ResolveNodeParams::builder()
                        .backend_node_id(backend.clone())
                        .build(),
                )
                .await
                .map_err(cdp)?;
            let object_id = resolved.result.object.object_id.clone().ok_or_else(|| {
                EngineError::NodeNotFound(format!("backend node {}", backend_node_id))
            })?;

            let described = self
                .page
                .execute(DescribeNodeParams::builder().backend_node_id(backend).build())
                .await
                .map_err(cdp)?;
            let node_name = described.result.node.node_name.to_lowercase();

            let requested = self
                .page
                .execute(RequestNodeParams::new(object_id.clone()))
                .await
                .map_err(cdp)?;

            Ok(NodeHandle {
                backend_node_id,
                node_id: requested.result.node_id.inner().to_owned(),
                object_id,
                node_name: Some(node_name),
            })
        })
    }

    pub fn find_css(&self, selector: &str) -> Result<NodeHandle> {
        self.rt.block_on(async {
            let element = self
                .page
                .find_element(selector)
                .await
                .map_err(|_| EngineError::NodeNotFound(selector.to_string()))?;
            Ok(NodeHandle {
                backend_node_id: element.backend_node_id.inner().to_owned(),
                node_id: element.node_id.inner().to_owned(),
                object_id: element.remote_object_id.clone(),
                node_name: None,
            })
        })
    }

    pub fn find_xpath(&self, query: &str) -> Result<NodeHandle> {
        self.rt.block_on(async {
            let element = self
                .page
                .find_xpath(query)
                .await
                .map_err(|_| EngineError::NodeNotFound(query.to_string()))?;
            Ok(NodeHandle {
                backend_node_id: element.backend_node_id.inner().to_owned(),
                node_id: element.node_id.inner().to_owned(),
                object_id: element.remote_object_id.clone(),
                node_name: None,
            })
        })
    }

    // --- actions ---

    pub fn click(&self, handle: &NodeHandle) -> Result<()> {
        self.scroll_into_view(handle)?;
        self.rt.block_on(async {
            let (x, y) = self.node_center(handle).await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseMoved, x, y, 0)
                .await?;
            self.dispatch_mouse(DispatchMouseEventType::MousePressed, x, y, 1)
                .await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseReleased, x, y, 1)
                .await?;
            Ok(())
        })
    }

    pub fn hover(&self, handle: &NodeHandle) -> Result<()> {
        self.scroll_into_view(handle)?;
        self.rt.block_on(async {
            let (x, y) = self.node_center(handle).await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseMoved, x, y, 0)
                .await
        })
    }

    pub fn focus(&self, handle: &NodeHandle) -> Result<()> {
        self.rt.block_on(async {
            self.page
                .execute(
                    FocusParams::builder()
                        .backend_node_id(BackendNodeId::new(handle.backend_node_id))
                        .build(),
                )
                .await
                .map_err(cdp)?;
            Ok(())
        })
    }

    /// Replaces the element's current value, then types the new one so the
    /// page sees real input events.
    pub fn fill(&self, handle: &NodeHandle, text: &str) -> Result<()> {
        self.call_function(
            handle,
            "function() { if ('value' in this) { this.value = ''; } \
             else if (this.isContentEditable) { this.textContent = ''; } }",
        )?;
        self.focus(handle)?;
        self.insert_text(text)
    }

    /// Appends to whatever is focused after focusing the element.
    pub fn type_text(&self, handle: &NodeHandle, text: &str) -> Result<()> {
        self.focus(handle)?;
        self.insert_text(text)
    }

    /// Sets a `<select>` value and fires input/change. Returns the value the
    /// element reports afterwards, so callers can tell whether an option
    /// actually matched.
    pub fn select_value(&self, handle: &NodeHandle, value: &str) -> Result<Value> {
        let literal =
            serde_json::to_string(value).map_err(|e| EngineError::Cdp(e.to_string()))?;
        let declaration = format!(
            "function() {{ \
               const wanted = {literal}; \
               this.value = wanted; \
               this.dispatchEvent(new Event('input', {{ bubbles: true }})); \
               this.dispatchEvent(new Event('change', {{ bubbles: true }})); \
               return this.value === wanted ? this.value : null; \
             }}"
        );
        self.call_function(handle, &declaration)
    }

    pub fn scroll_into_view(&self, handle: &NodeHandle) -> Result<()> {
        self.call_function(
            handle,
            "function() { this.scrollIntoView({ block: 'center', inline: 'center' }); }",
        )
        .map(|_| ())
    }

    /// Types into whatever currently holds focus.
    pub fn insert_text(&self, text: &str) -> Result<()> {
        self.rt.block_on(async {
            self.page
                .execute(InsertTextParams::new(text))
                .await
                .map_err(cdp)?;
            Ok(())
        })
    }

    fn call_function(&self, handle: &NodeHandle, declaration: &str) -> Result<Value> {
        self.rt.block_on(async {
            let params = CallFunctionOnParams::builder()
                .object_id(handle.object_id.clone())
                .function_declaration(declaration)
                .return_by_value(true)
                .build()
                .map_err(EngineError::Cdp)?;
            let resp = self.page.execute(params).await.map_err(cdp)?;
            if let Some(details) = &resp.result.exception_details {
                return Err(EngineError::Cdp(details.text.clone()));
            }
            Ok(resp.result.result.value.clone().unwrap_or(Value::Null))
        })
    }

    async fn node_center(&self, handle: &NodeHandle) -> Result<(f64, f64)> {
        let resp = self
            .page
            .execute(
                GetBoxModelParams::builder()
                    .backend_node_id(BackendNodeId::new(handle.backend_node_id))
                    .build(),
            )
            .await
            .map_err(cdp)?;
        let quad = resp.result.model.content.inner().clone();
        center_of(&quad).ok_or_else(|| {
            EngineError::Transient("element has no content box".to_string())
        })
    }

    async fn dispatch_mouse(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
        click_count: i64,
    ) -> Result<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(click_count)
            .build()
            .map_err(EngineError::Cdp)?;
        self.page.execute(params).await.map_err(cdp)?;
        Ok(())
    }

    // --- environment overrides ---

    pub fn apply_stealth(&self, profile: StealthProfile) -> Result<usize> {
        let scripts = profile.scripts();
        let applied = scripts.len();
        self.rt.block_on(async {
            for script in &scripts {
                self.page
                    .execute(AddScriptToEvaluateOnNewDocumentParams::new(script.clone()))
                    .await
                    .map_err(cdp)?;
                // Also patch the page that is already open.
                self.page.evaluate(script.as_str()).await.map_err(cdp)?;
            }
            Ok(())
        })?;

        if profile.rewrites_user_agent() && self.config.user_agent.is_none() {
            let ua = self.user_agent()?;
            if ua.contains("HeadlessChrome") {
                self.set_user_agent(&ua.replace("HeadlessChrome", "Chrome"))?;
            }
        }
        debug!(%profile, scripts = applied, "stealth applied");
        Ok(applied)
    }

    pub fn user_agent(&self) -> Result<String> {
        let value = self.evaluate("navigator.userAgent")?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.rt.block_on(async {
            self.page
                .execute(SetUserAgentOverrideParams::new(user_agent))
                .await
                .map_err(cdp)?;
            Ok(())
        })
    }

    pub fn set_timezone(&self, timezone: &str) -> Result<()> {
        self.rt.block_on(async {
            self.page
                .execute(SetTimezoneOverrideParams::new(timezone))
                .await
                .map_err(cdp)?;
            Ok(())
        })
    }

    pub fn set_download_dir(&self, dir: &Path) -> Result<()> {
        self.rt.block_on(async {
            let params = SetDownloadBehaviorParams::builder()
                .behavior(SetDownloadBehaviorBehavior::Allow)
                .download_path(dir.display().to_string())
                .build()
                .map_err(EngineError::Cdp)?;
            self.browser.execute(params).await.map_err(cdp)?;
            Ok(())
        })
    }

    // --- screenshots ---

    pub fn screenshot(&self, path: &Path, full_page: bool) -> Result<()> {
        self.rt.block_on(async {
            let params = ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .full_page(full_page)
                .build();
            self.page
                .save_screenshot(params, path)
                .await
                .map_err(cdp)?;
            Ok(())
        })
    }

    // --- shutdown ---

    pub fn quit(mut self) -> Result<()> {
        info!("closing browser");
        let outcome = self.rt.block_on(async {
            self.browser
                .close()
                .await
                .map_err(|e| EngineError::Cdp(e.to_string()))?;
            let _ = self.browser.wait().await;
            Ok(())
        });
        self.handler_task.abort();
        outcome
    }
}

fn ax_node_data(node: &AxNode) -> AxNodeData {
    AxNodeData {
        role: node
            .role
            .as_ref()
            .and_then(|v| v.value.as_ref())
            .and_then(value_to_string),
        name: node
            .name
            .as_ref()
            .and_then(|v| v.value.as_ref())
            .and_then(value_to_string),
        value: node
            .value
            .as_ref()
            .and_then(|v| v.value.as_ref())
            .and_then(value_to_string),
        description: node
            .description
            .as_ref()
            .and_then(|v| v.value.as_ref())
            .and_then(value_to_string),
        ignored: node.ignored,
        backend_node_id: node
            .backend_dom_node_id
            .as_ref()
            .map(|id| id.inner().to_owned()),
        properties: node
            .properties
            .as_ref()
            .map(|props| {
                props
                    .iter()
                    .map(|p| {
                        (
                            enum_name(&p.name),
                            p.value.value.clone().unwrap_or(Value::Null),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Stringifies a protocol value without quoting plain strings.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Serde-visible name of a generated protocol enum variant.
fn enum_name<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Center of a CDP quad: four corner points, clockwise from top-left.
fn center_of(quad: &[f64]) -> Option<(f64, f64)> {
    if quad.len() < 8 {
        return None;
    }
    let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
    let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
    Some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_center_of_rectangle() {
        let quad = [10.0, 20.0, 110.0, 20.0, 110.0, 70.0, 10.0, 70.0];
        assert_eq!(center_of(&quad), Some((60.0, 45.0)));
    }

    #[test]
    fn test_center_of_short_quad_is_none() {
        assert_eq!(center_of(&[1.0, 2.0]), None);
    }

    #[test]
    fn test_value_to_string_keeps_plain_strings_unquoted() {
        assert_eq!(value_to_string(&json!("button")), Some("button".to_string()));
        assert_eq!(value_to_string(&json!(3)), Some("3".to_string()));
        assert_eq!(value_to_string(&json!(true)), Some("true".to_string()));
        assert_eq!(value_to_string(&Value::Null), None);
    }
}
