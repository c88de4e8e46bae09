//! Topic parsing and validation
//!
//! Airlink topics follow the server's naming convention:
//! ```text
//! namespace:identifier
//! radio:audio_stream
//! radio:bandscope
//! ```

use crate::{Error, Result, CONTROL_TOPIC};

/// Maximum topic length accepted by the server
pub const MAX_TOPIC_LENGTH: usize = 256;

/// A validated channel topic
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    raw: String,
}

impl Topic {
    /// Parse a topic string
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidTopic("empty topic".to_string()));
        }

        if s.len() > MAX_TOPIC_LENGTH {
            return Err(Error::InvalidTopic(format!("topic too long: {}", s.len())));
        }

        if !s.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
            return Err(Error::InvalidTopic(format!(
                "topic contains invalid characters: {}",
                s
            )));
        }

        match s.split_once(':') {
            Some((ns, id)) if !ns.is_empty() && !id.is_empty() => Ok(Self { raw: s.to_string() }),
            _ => Err(Error::InvalidTopic(format!(
                "topic must be namespace:identifier: {}",
                s
            ))),
        }
    }

    /// The reserved connection-level control topic
    ///
    /// Exempt from the `namespace:identifier` rule; carries heartbeats only.
    pub fn control() -> Self {
        Self {
            raw: CONTROL_TOPIC.to_string(),
        }
    }

    /// Get the raw topic string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Get the namespace (part before the colon)
    pub fn namespace(&self) -> &str {
        self.raw.split_once(':').map(|(ns, _)| ns).unwrap_or(&self.raw)
    }

    /// Get the identifier (part after the colon)
    pub fn identifier(&self) -> &str {
        self.raw.split_once(':').map(|(_, id)| id).unwrap_or("")
    }

    /// Check whether this is the reserved control topic
    pub fn is_control(&self) -> bool {
        self.raw == CONTROL_TOPIC
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl TryFrom<&str> for Topic {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Topic::parse(s)
    }
}

impl TryFrom<String> for Topic {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Topic::parse(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let topic = Topic::parse("radio:audio_stream").unwrap();
        assert_eq!(topic.namespace(), "radio");
        assert_eq!(topic.identifier(), "audio_stream");
        assert_eq!(topic.as_str(), "radio:audio_stream");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Topic::parse("").is_err());
        assert!(Topic::parse("nocolon").is_err());
        assert!(Topic::parse(":missing_namespace").is_err());
        assert!(Topic::parse("missing_identifier:").is_err());
        assert!(Topic::parse("has\ncontrol:chars").is_err());
    }

    #[test]
    fn test_control_topic() {
        let topic = Topic::control();
        assert!(topic.is_control());
        assert_eq!(topic.as_str(), "phoenix");
        // The reserved name is not reachable through parse
        assert!(Topic::parse("phoenix").is_err());
    }

    #[test]
    fn test_length_limit() {
        let long = format!("ns:{}", "a".repeat(MAX_TOPIC_LENGTH));
        assert!(Topic::parse(&long).is_err());
    }
}
