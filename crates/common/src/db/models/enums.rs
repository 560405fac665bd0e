//! Enumerations stored as text columns
//!
//! Values are stored by member name (`S3`, `AVAILABLE`, ...) and decoded
//! explicitly when read.

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a source data item is reached
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Protocol {
    S3,
    Kernel,
    Local,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::S3, Protocol::Kernel, Protocol::Local];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::S3 => "S3",
            Protocol::Kernel => "KERNEL",
            Protocol::Local => "LOCAL",
        }
    }

    /// Lowercase value used by locators such as the LFN
    pub fn value(&self) -> &'static str {
        match self {
            Protocol::S3 => "s3",
            Protocol::Kernel => "kernel",
            Protocol::Local => "local",
        }
    }
}

impl FromStr for Protocol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::InvalidFieldValue {
                entity: "source_data".to_string(),
                message: format!("unknown protocol {s}"),
            })
    }
}

/// Lifecycle of a source data item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceDataStatus {
    Created,
    Processing,
    Failed,
    Available,
    Unavailable,
    Inactive,
}

impl SourceDataStatus {
    pub const ALL: [SourceDataStatus; 6] = [
        SourceDataStatus::Created,
        SourceDataStatus::Processing,
        SourceDataStatus::Failed,
        SourceDataStatus::Available,
        SourceDataStatus::Unavailable,
        SourceDataStatus::Inactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceDataStatus::Created => "CREATED",
            SourceDataStatus::Processing => "PROCESSING",
            SourceDataStatus::Failed => "FAILED",
            SourceDataStatus::Available => "AVAILABLE",
            SourceDataStatus::Unavailable => "UNAVAILABLE",
            SourceDataStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for SourceDataStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceDataStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::InvalidFieldValue {
                entity: "source_data".to_string(),
                message: format!("unknown status {s}"),
            })
    }
}

/// Discriminator of the message hierarchy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    MessageBase,
    UserMessage,
    AgentMessage,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::MessageBase => "message_base",
            MessageKind::UserMessage => "user_message",
            MessageKind::AgentMessage => "agent_message",
        }
    }
}

impl FromStr for MessageKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message_base" => Ok(MessageKind::MessageBase),
            "user_message" => Ok(MessageKind::UserMessage),
            "agent_message" => Ok(MessageKind::AgentMessage),
            _ => Err(AppError::UnknownDiscriminator { value: s.to_string() }),
        }
    }
}

macro_rules! stored_as_text {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.as_str().to_string()
                }
            }
        )+
    };
}

stored_as_text!(Protocol, SourceDataStatus, MessageKind);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_stored_by_name() {
        assert_eq!(String::from(Protocol::Kernel), "KERNEL");
        assert_eq!("LOCAL".parse::<Protocol>().unwrap(), Protocol::Local);
        assert_eq!(Protocol::S3.value(), "s3");
        assert!("s3".parse::<Protocol>().is_err());

        for status in SourceDataStatus::ALL {
            assert_eq!(status.as_str().parse::<SourceDataStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_serde_matches_stored_text() {
        assert_eq!(serde_json::to_value(Protocol::S3).unwrap(), "S3");
        assert_eq!(serde_json::to_value(SourceDataStatus::Available).unwrap(), "AVAILABLE");
        assert_eq!(serde_json::to_value(MessageKind::AgentMessage).unwrap(), "agent_message");
    }

    #[test]
    fn test_unknown_discriminator() {
        let err = "system_message".parse::<MessageKind>().unwrap_err();
        assert!(matches!(err, AppError::UnknownDiscriminator { value } if value == "system_message"));
    }
}
