//! MCP capability negotiation during initialization.

use crate::types::{InitializeParams, InitializeResult, MCP_VERSION};

/// Build the `initialize` result, echoing the client's protocol version.
///
/// No per-connection state is kept; the handshake only informs the client.
pub fn negotiate(params: InitializeParams) -> InitializeResult {
    let mut result = InitializeResult::default_result();

    if let Some(version) = params.protocol_version.filter(|v| !v.is_empty()) {
        if version != MCP_VERSION {
            tracing::info!(
                "Client requested protocol version {version}, server default is {MCP_VERSION}. Echoing client version."
            );
        }
        result.protocol_version = version;
    }

    match params.client_info {
        Some(client) => tracing::info!("Initialized with client: {} v{}", client.name, client.version),
        None => tracing::info!("Initialized with anonymous client"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Implementation, SERVER_NAME};

    #[test]
    fn test_echoes_client_version() {
        let params = InitializeParams {
            protocol_version: Some("2025-03-26".to_string()),
            client_info: Some(Implementation {
                name: "test-client".to_string(),
                version: "1.0".to_string(),
            }),
            ..Default::default()
        };
        let result = negotiate(params);
        assert_eq!(result.protocol_version, "2025-03-26");
        assert_eq!(result.server_info.name, SERVER_NAME);
        assert!(result.capabilities.tools.is_some());
    }

    #[test]
    fn test_defaults_without_version() {
        let result = negotiate(InitializeParams::default());
        assert_eq!(result.protocol_version, MCP_VERSION);
    }
}
