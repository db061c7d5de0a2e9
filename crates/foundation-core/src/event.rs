// ── Push events ──
//
// Typed view of realtime frames. Decoding is strict about the envelope
// and lenient about event names: unknown names decode fine and are
// ignored by the dispatcher.

use foundation_api::PushEnvelope;

use crate::error::CoreError;

pub const VARIABLE_UPDATED: &str = "variable.updated";
pub const CONFIGURATION_PUBLISHED: &str = "configuration.published";
pub const ENVIRONMENT_UPDATED: &str = "environment.updated";

/// An invalidation event pushed by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// `variable.updated` with `payload.name`.
    VariableUpdated { name: String },
    /// `configuration.published`
    ConfigurationPublished,
    /// `environment.updated`
    EnvironmentUpdated,
    /// Any other `type`.
    Unknown(String),
}

impl PushEvent {
    /// Decode one realtime frame.
    pub fn decode(frame: &[u8]) -> Result<Self, CoreError> {
        let envelope: PushEnvelope = serde_json::from_slice(frame)
            .map_err(|e| CoreError::decode(&e, &String::from_utf8_lossy(frame)))?;

        Ok(match envelope.kind.as_str() {
            VARIABLE_UPDATED => {
                let Some(name) = envelope.payload.get("name").and_then(|n| n.as_str()) else {
                    return Err(CoreError::Decode {
                        message: "variable.updated payload has no name".into(),
                        body: String::from_utf8_lossy(frame).into_owned(),
                    });
                };
                Self::VariableUpdated {
                    name: name.to_owned(),
                }
            }
            CONFIGURATION_PUBLISHED => Self::ConfigurationPublished,
            ENVIRONMENT_UPDATED => Self::EnvironmentUpdated,
            _ => Self::Unknown(envelope.kind),
        })
    }

    /// Wire name of the event, as passed to observers.
    pub fn name(&self) -> &str {
        match self {
            Self::VariableUpdated { .. } => VARIABLE_UPDATED,
            Self::ConfigurationPublished => CONFIGURATION_PUBLISHED,
            Self::EnvironmentUpdated => ENVIRONMENT_UPDATED,
            Self::Unknown(name) => name,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decode_variable_updated() {
        let event =
            PushEvent::decode(br#"{"type":"variable.updated","payload":{"name":"banner"}}"#)
                .unwrap();
        assert_eq!(
            event,
            PushEvent::VariableUpdated {
                name: "banner".into()
            }
        );
        assert_eq!(event.name(), "variable.updated");
    }

    #[test]
    fn decode_without_payload() {
        let event = PushEvent::decode(br#"{"type":"configuration.published"}"#).unwrap();
        assert_eq!(event, PushEvent::ConfigurationPublished);

        let event = PushEvent::decode(br#"{"type":"environment.updated","payload":{}}"#).unwrap();
        assert_eq!(event, PushEvent::EnvironmentUpdated);
    }

    #[test]
    fn unknown_type_decodes() {
        let event = PushEvent::decode(br#"{"type":"team.renamed","payload":{}}"#).unwrap();
        assert_eq!(event, PushEvent::Unknown("team.renamed".into()));
        assert_eq!(event.name(), "team.renamed");
    }

    #[test]
    fn malformed_frames_fail() {
        assert!(PushEvent::decode(b"not json").is_err());
        assert!(PushEvent::decode(br#"{"payload":{}}"#).is_err());
        assert!(PushEvent::decode(br#"{"type":"variable.updated","payload":{}}"#).is_err());
        assert!(PushEvent::decode(br#"{"type":"variable.updated","payload":{"name":7}}"#).is_err());
    }
}
