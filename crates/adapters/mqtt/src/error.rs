//! MQTT adapter error types.

use growhub_domain::error::GrowHubError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// Failed to parse an incoming MQTT payload as JSON.
    #[error("failed to parse MQTT payload")]
    PayloadParse(#[source] serde_json::Error),

    /// Failed to encode an outgoing document.
    #[error("failed to encode MQTT payload")]
    PayloadEncode(#[source] serde_json::Error),

    /// A domain-level error (validation, closed control loop, etc.).
    #[error("domain error")]
    Domain(#[source] GrowHubError),
}

impl MqttError {
    /// Convert into a [`GrowHubError::Publication`] for propagation across
    /// port boundaries.
    pub fn into_domain(self) -> GrowHubError {
        match self {
            Self::Domain(err) => err,
            other => GrowHubError::Publication(Box::new(other)),
        }
    }
}

impl From<MqttError> for GrowHubError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

impl From<GrowHubError> for MqttError {
    fn from(err: GrowHubError) -> Self {
        Self::Domain(err)
    }
}

impl From<growhub_domain::error::ValidationError> for MqttError {
    fn from(err: growhub_domain::error::ValidationError) -> Self {
        Self::Domain(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use growhub_domain::error::ValidationError;

    #[test]
    fn should_convert_client_side_errors_to_publication_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err: GrowHubError = MqttError::PayloadParse(json_err).into();
        assert!(matches!(err, GrowHubError::Publication(_)));
    }

    #[test]
    fn should_convert_domain_error_back_to_domain() {
        let mqtt_err = MqttError::from(ValidationError::MissingField("actuator"));
        let back: GrowHubError = mqtt_err.into();
        assert!(matches!(back, GrowHubError::Validation(_)));
    }

    #[test]
    fn should_display_payload_parse_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err = MqttError::PayloadParse(json_err);
        assert_eq!(err.to_string(), "failed to parse MQTT payload");
    }
}
