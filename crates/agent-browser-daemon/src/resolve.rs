//! Target resolution: token or selector in, live node handle out.

use agent_browser_core::refs::RefTable;
use agent_browser_core::target::Target;
use agent_browser_engine::{Engine, EngineError, NodeHandle};

use crate::error::SessionError;

/// Materializes a handle for the target against the current table. A token
/// from an older generation, or one whose node left the DOM, reports
/// RefNotFound; selector queries that match nothing report ElementNotFound.
pub fn resolve_target(
    engine: &Engine,
    table: &RefTable,
    target: &Target,
) -> Result<NodeHandle, SessionError> {
    match target {
        Target::Ref(token) => {
            let descriptor = table
                .get(token)
                .ok_or_else(|| SessionError::RefNotFound(token.clone()))?;
            match engine.resolve_backend_node(descriptor.backend_node_id) {
                Ok(handle) => Ok(handle),
                Err(EngineError::NodeNotFound(_)) => {
                    Err(SessionError::RefNotFound(token.clone()))
                }
                Err(other) => Err(other.into()),
            }
        }
        Target::Css(selector) => named_query(engine.find_css(selector), selector),
        Target::XPath(query) => named_query(engine.find_xpath(query), query),
    }
}

fn named_query(
    result: Result<NodeHandle, EngineError>,
    raw: &str,
) -> Result<NodeHandle, SessionError> {
    match result {
        Ok(handle) => Ok(handle),
        Err(EngineError::NodeNotFound(_)) => {
            Err(SessionError::ElementNotFound(raw.to_string()))
        }
        Err(other) => Err(other.into()),
    }
}
