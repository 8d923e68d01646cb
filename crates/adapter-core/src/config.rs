//! The adapter's own configuration record.
//!
//! The record is created and edited by the operator, persisted by an
//! external store, and loaded by the lifecycle manager at start. It must
//! validate successfully before the adapter may transition to Running.

use crate::error::{AdapterError, AdapterResult};
use crate::types::ServerId;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Default listen address when no config has been persisted yet
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1";

/// Default listen port when no config has been persisted yet
pub const DEFAULT_LISTEN_PORT: u16 = 11223;

/// Listener configuration for the protocol adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// IPv4 literal or the literal host name `localhost`
    pub listen_address: String,

    /// TCP port to listen on, 1-65535
    pub listen_port: u16,

    /// Reference into the backend registry; resolved at start time
    pub target_server_id: ServerId,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            target_server_id: ServerId::new(""),
        }
    }
}

impl AdapterConfig {
    /// Create a config for the given address, port, and target server
    pub fn new(address: impl Into<String>, port: u16, target: ServerId) -> Self {
        Self {
            listen_address: address.into(),
            listen_port: port,
            target_server_id: target,
        }
    }

    /// Validate the record without performing any I/O.
    ///
    /// Target existence and activity are checked separately against the
    /// registry; this only covers the syntactic rules.
    ///
    /// # Errors
    /// Returns [`AdapterError::Validation`] naming the offending field.
    pub fn validate(&self) -> AdapterResult<()> {
        if self.listen_address != "localhost"
            && self.listen_address.parse::<Ipv4Addr>().is_err()
        {
            return Err(AdapterError::validation(
                format!(
                    "listen address must be an IPv4 literal or 'localhost', got '{}'",
                    self.listen_address
                ),
                Some("listen_address".to_string()),
            ));
        }

        if self.listen_port == 0 {
            return Err(AdapterError::validation(
                "listen port must be between 1 and 65535",
                Some("listen_port".to_string()),
            ));
        }

        if self.target_server_id.is_empty() {
            return Err(AdapterError::validation(
                "target server is not configured",
                Some("target_server_id".to_string()),
            ));
        }

        Ok(())
    }

    /// The `host:port` string the listener binds to
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_address, self.listen_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AdapterConfig {
        AdapterConfig::new("127.0.0.1", 11223, ServerId::new("srv-1"))
    }

    #[test]
    fn default_config_has_no_target() {
        let config = AdapterConfig::default();
        assert_eq!(config.listen_address, "127.0.0.1");
        assert_eq!(config.listen_port, 11223);
        assert!(config.validate().is_err());
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn localhost_literal_is_accepted() {
        let mut config = valid_config();
        config.listen_address = "localhost".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn host_names_other_than_localhost_are_rejected() {
        let mut config = valid_config();
        config.listen_address = "example.com".to_string();
        let err = config.validate().expect_err("should fail");
        assert!(matches!(err, AdapterError::Validation { field: Some(f), .. } if f == "listen_address"));
    }

    #[test]
    fn port_zero_is_rejected() {
        let mut config = valid_config();
        config.listen_port = 0;
        let err = config.validate().expect_err("should fail");
        assert!(matches!(err, AdapterError::Validation { field: Some(f), .. } if f == "listen_port"));
    }

    #[test]
    fn out_of_range_ports_fail_deserialization() {
        // The record carries the port as u16, so 65536 and -1 never
        // construct; callers surface the serde failure as a validation error.
        assert!(serde_json::from_str::<AdapterConfig>(
            r#"{"listen_address":"127.0.0.1","listen_port":65536,"target_server_id":"s"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<AdapterConfig>(
            r#"{"listen_address":"127.0.0.1","listen_port":-1,"target_server_id":"s"}"#
        )
        .is_err());
    }

    #[test]
    fn bind_addr_formats_host_and_port() {
        assert_eq!(valid_config().bind_addr(), "127.0.0.1:11223");
    }
}
