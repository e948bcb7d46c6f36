//! The closed set of wire methods. Dispatch is exhaustive over this enum;
//! an unknown method name is a single explicit parse miss.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Navigate,
    Back,
    Forward,
    Refresh,
    Snapshot,
    Tree,
    Markdown,
    Click,
    Fill,
    Select,
    Hover,
    Type,
    Url,
    Title,
    Eval,
    Screenshot,
    Stealth,
    Wait,
    WaitDownload,
    Stop,
}

impl Method {
    pub fn parse(name: &str) -> Option<Method> {
        let method = match name {
            "navigate" => Method::Navigate,
            "back" => Method::Back,
            "forward" => Method::Forward,
            "refresh" => Method::Refresh,
            "snapshot" => Method::Snapshot,
            "tree" => Method::Tree,
            "markdown" => Method::Markdown,
            "click" => Method::Click,
            "fill" => Method::Fill,
            "select" => Method::Select,
            "hover" => Method::Hover,
            "type" => Method::Type,
            "url" => Method::Url,
            "title" => Method::Title,
            "eval" => Method::Eval,
            "screenshot" => Method::Screenshot,
            "stealth" => Method::Stealth,
            "wait" => Method::Wait,
            "wait_download" => Method::WaitDownload,
            "stop" => Method::Stop,
            _ => return None,
        };
        Some(method)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Method::Navigate => "navigate",
            Method::Back => "back",
            Method::Forward => "forward",
            Method::Refresh => "refresh",
            Method::Snapshot => "snapshot",
            Method::Tree => "tree",
            Method::Markdown => "markdown",
            Method::Click => "click",
            Method::Fill => "fill",
            Method::Select => "select",
            Method::Hover => "hover",
            Method::Type => "type",
            Method::Url => "url",
            Method::Title => "title",
            Method::Eval => "eval",
            Method::Screenshot => "screenshot",
            Method::Stealth => "stealth",
            Method::Wait => "wait",
            Method::WaitDownload => "wait_download",
            Method::Stop => "stop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Method; 20] = [
        Method::Navigate,
        Method::Back,
        Method::Forward,
        Method::Refresh,
        Method::Snapshot,
        Method::Tree,
        Method::Markdown,
        Method::Click,
        Method::Fill,
        Method::Select,
        Method::Hover,
        Method::Type,
        Method::Url,
        Method::Title,
        Method::Eval,
        Method::Screenshot,
        Method::Stealth,
        Method::Wait,
        Method::WaitDownload,
        Method::Stop,
    ];

    #[test]
    fn test_every_method_round_trips_through_its_name() {
        for method in ALL {
            assert_eq!(Method::parse(method.name()), Some(method));
        }
    }

    #[test]
    fn test_unknown_method_is_a_parse_miss() {
        assert_eq!(Method::parse("frobnicate"), None);
        assert_eq!(Method::parse(""), None);
        assert_eq!(Method::parse("Snapshot"), None);
    }
}
