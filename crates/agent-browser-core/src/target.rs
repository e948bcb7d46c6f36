//! The target union accepted by every action operation.
//!
//! Precedence: ref token pattern, structured `{css}`/`{xpath}` value, leading
//! `/` for XPath, anything else is CSS.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Ref(String),
    Css(String),
    XPath(String),
}

#[derive(Error, Debug)]
pub enum TargetError {
    #[error("Invalid target: {0}")]
    Invalid(String),
}

fn ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^@e\d+$").expect("ref pattern"))
}

impl Target {
    pub fn parse_str(target: &str) -> Self {
        if ref_pattern().is_match(target) {
            Target::Ref(target.to_string())
        } else if target.starts_with('/') {
            Target::XPath(target.to_string())
        } else {
            Target::Css(target.to_string())
        }
    }

    pub fn parse(value: &Value) -> Result<Self, TargetError> {
        match value {
            Value::String(s) => Ok(Self::parse_str(s)),
            Value::Object(map) => {
                if let Some(css) = map.get("css").and_then(|v| v.as_str()) {
                    Ok(Target::Css(css.to_string()))
                } else if let Some(xpath) = map.get("xpath").and_then(|v| v.as_str()) {
                    Ok(Target::XPath(xpath.to_string()))
                } else {
                    Err(TargetError::Invalid(
                        "structured target must have a 'css' or 'xpath' key".to_string(),
                    ))
                }
            }
            other => Err(TargetError::Invalid(format!(
                "expected a string or css/xpath object, got {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Ref(t) | Target::Css(t) | Target::XPath(t) => write!(f, "{}", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ref_token_pattern() {
        assert_eq!(Target::parse_str("@e1"), Target::Ref("@e1".to_string()));
        assert_eq!(Target::parse_str("@e42"), Target::Ref("@e42".to_string()));
    }

    #[test]
    fn test_near_miss_tokens_are_css() {
        assert_eq!(Target::parse_str("@e"), Target::Css("@e".to_string()));
        assert_eq!(Target::parse_str("@e1x"), Target::Css("@e1x".to_string()));
        assert_eq!(Target::parse_str("e1"), Target::Css("e1".to_string()));
    }

    #[test]
    fn test_leading_slash_is_xpath() {
        assert_eq!(
            Target::parse_str("//a[@href]"),
            Target::XPath("//a[@href]".to_string())
        );
        assert_eq!(
            Target::parse_str("/html/body"),
            Target::XPath("/html/body".to_string())
        );
    }

    #[test]
    fn test_plain_string_is_css() {
        assert_eq!(
            Target::parse_str("button.primary"),
            Target::Css("button.primary".to_string())
        );
    }

    #[test]
    fn test_structured_css_target() {
        let t = Target::parse(&json!({"css": "#login"})).unwrap();
        assert_eq!(t, Target::Css("#login".to_string()));
    }

    #[test]
    fn test_structured_xpath_target() {
        let t = Target::parse(&json!({"xpath": "//form"})).unwrap();
        assert_eq!(t, Target::XPath("//form".to_string()));
    }

    #[test]
    fn test_structured_target_without_keys_is_invalid() {
        let err = Target::parse(&json!({"id": "login"})).unwrap_err();
        assert!(err.to_string().contains("'css' or 'xpath'"));
    }

    #[test]
    fn test_non_string_target_is_invalid() {
        assert!(Target::parse(&json!(17)).is_err());
        assert!(Target::parse(&json!(null)).is_err());
    }
}
