//! Fetch completion notifications

/// Message published on a key's topic when its fetch finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The record has been written to the cache
    Ready,
    /// The fetch failed; nothing was cached
    Failed(String),
}

impl Notification {
    /// Serialize to the wire message format
    pub fn to_message(&self) -> String {
        match self {
            Notification::Ready => "ready".to_string(),
            Notification::Failed(reason) => format!("failed:{}", reason),
        }
    }

    /// Parse from the wire message format
    pub fn from_message(msg: &str) -> Option<Self> {
        if msg == "ready" {
            return Some(Notification::Ready);
        }

        let (prefix, reason) = msg.split_once(':')?;
        match prefix {
            "failed" => Some(Notification::Failed(reason.to_string())),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Notification::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_format() {
        assert_eq!(Notification::Ready.to_message(), "ready");
        assert_eq!(
            Notification::Failed("timeout".into()).to_message(),
            "failed:timeout"
        );
    }

    #[test]
    fn test_parse_keeps_colons_in_reason() {
        let parsed = Notification::from_message("failed:cache unavailable: refused");
        assert_eq!(
            parsed,
            Some(Notification::Failed("cache unavailable: refused".into()))
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Notification::from_message("bogus"), None);
        assert_eq!(Notification::from_message("other:x"), None);
    }
}
