use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// One request record: a method name and an ordered argument list.
/// Exactly one request travels over a connection, newline-terminated.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Request {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(|v| v.as_str())
    }
}

/// One response record: `result` or `error`, never both.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success(result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_method_and_args() {
        let req = Request::new("fill", vec![json!("@e1"), json!("hello")]);
        let encoded = serde_json::to_string(&req).unwrap();
        assert!(encoded.contains("\"method\":\"fill\""));
        assert!(encoded.contains("\"args\":[\"@e1\",\"hello\"]"));
    }

    #[test]
    fn test_request_args_default_to_empty() {
        let req: Request = serde_json::from_str(r#"{"method":"snapshot"}"#).unwrap();
        assert_eq!(req.method, "snapshot");
        assert!(req.args.is_empty());
    }

    #[test]
    fn test_request_arg_str() {
        let req = Request::new("click", vec![json!("@e2"), json!(42)]);
        assert_eq!(req.arg_str(0), Some("@e2"));
        assert_eq!(req.arg_str(1), None);
        assert_eq!(req.arg_str(2), None);
    }

    #[test]
    fn test_success_response_omits_error() {
        let resp = Response::success(json!("Navigated to https://example.com"));
        let encoded = serde_json::to_string(&resp).unwrap();
        assert!(encoded.contains("\"result\""));
        assert!(!encoded.contains("\"error\""));
    }

    #[test]
    fn test_failure_response_omits_result() {
        let resp = Response::failure("Unknown method: frobnicate");
        let encoded = serde_json::to_string(&resp).unwrap();
        assert!(encoded.contains("\"error\":\"Unknown method: frobnicate\""));
        assert!(!encoded.contains("\"result\""));
    }

    #[test]
    fn test_response_roundtrip() {
        let decoded: Response = serde_json::from_str(r#"{"result":"Stopped"}"#).unwrap();
        assert_eq!(decoded.result, Some(json!("Stopped")));
        assert!(decoded.error.is_none());
    }
}
