//! Thin client-side handlers: send one request, print the one result.

use serde_json::Value;

use agent_browser_ipc::{Client, ClientError};

pub fn call_and_print(method: &str, args: Vec<Value>) -> Result<(), ClientError> {
    let result = Client::new().call(method, args)?;
    if let Some(text) = render(&result) {
        println!("{}", text);
    }
    Ok(())
}

/// Strings print bare, null prints nothing, everything else prints as JSON.
fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => serde_json::to_string_pretty(other).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_strings_bare() {
        assert_eq!(
            render(&json!("Navigated to https://example.com")),
            Some("Navigated to https://example.com".to_string())
        );
    }

    #[test]
    fn test_render_null_prints_nothing() {
        assert_eq!(render(&Value::Null), None);
    }

    #[test]
    fn test_render_structures_as_json() {
        let rendered = render(&json!({"count": 3})).unwrap();
        assert!(rendered.contains("\"count\": 3"));
    }
}
