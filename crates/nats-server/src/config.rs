//! Rendering of the static cluster configuration consumed by `nats-server`
//! at launch. The route set is fixed for the lifetime of the daemon; new or
//! departed peers are only picked up by nodes that bootstrap later.

static CONFIG_TEMPLATE: &str = include_str!("../templates/nats-server.conf");
static CLUSTER_CONFIG_TEMPLATE: &str = include_str!("../templates/cluster.conf");

/// Default port for client connections.
pub const DEFAULT_CLIENT_PORT: u16 = 4242;

/// Default port for the HTTP monitoring endpoint.
pub const DEFAULT_HTTP_PORT: u16 = 8222;

/// Default port cluster routes bind and dial.
pub const DEFAULT_CLUSTER_PORT: u16 = 7244;

/// The generated cluster configuration artifact.
///
/// Rendering is deterministic and order-preserving over `route_addresses`:
/// the same input always produces byte-identical output. An empty address
/// set renders a valid config with an empty route list, which is the legal
/// single-node terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Port to listen on for client connections.
    pub client_port: u16,

    /// Port for the HTTP monitoring endpoint.
    pub http_port: u16,

    /// Port the cluster listener binds; also the port dialed on every peer.
    pub cluster_port: u16,

    /// Peer addresses to route to, in discovery order.
    pub route_addresses: Vec<String>,
}

impl ClusterConfig {
    /// Creates a config on the default ports for the given peer set.
    #[must_use]
    pub const fn new(route_addresses: Vec<String>) -> Self {
        Self {
            client_port: DEFAULT_CLIENT_PORT,
            http_port: DEFAULT_HTTP_PORT,
            cluster_port: DEFAULT_CLUSTER_PORT,
            route_addresses,
        }
    }

    /// Renders the configuration file text.
    #[must_use]
    pub fn render(&self) -> String {
        let routes = self
            .route_addresses
            .iter()
            .map(|address| format!("\"nats-route://{}:{}\"", address, self.cluster_port))
            .collect::<Vec<_>>()
            .join("\n    ");

        let mut config = CONFIG_TEMPLATE
            .replace("{client_port}", &self.client_port.to_string())
            .replace("{http_port}", &self.http_port.to_string());

        config.push_str(
            &CLUSTER_CONFIG_TEMPLATE
                .replace("{cluster_port}", &self.cluster_port.to_string())
                .replace("{cluster_routes}", &routes),
        );

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_deterministic() {
        let config = ClusterConfig::new(vec!["10.0.0.2".to_string(), "10.0.0.3".to_string()]);
        assert_eq!(config.render(), config.render());
    }

    #[test]
    fn test_single_route() {
        let config = ClusterConfig::new(vec!["10.0.0.2".to_string()]);
        let rendered = config.render();

        assert_eq!(rendered.matches("nats-route://").count(), 1);
        assert!(rendered.contains("\"nats-route://10.0.0.2:7244\""));
        assert!(rendered.contains("port: 4242"));
        assert!(rendered.contains("http_port: 8222"));
        assert!(rendered.contains("port: 7244"));
    }

    #[test]
    fn test_route_order_preserved() {
        let config = ClusterConfig::new(vec![
            "10.0.0.3".to_string(),
            "10.0.0.1".to_string(),
            "10.0.0.2".to_string(),
        ]);
        let rendered = config.render();

        let positions: Vec<_> = ["10.0.0.3", "10.0.0.1", "10.0.0.2"]
            .iter()
            .map(|addr| rendered.find(*addr).unwrap())
            .collect();

        assert!(positions[0] < positions[1]);
        assert!(positions[1] < positions[2]);
    }

    #[test]
    fn test_empty_peer_set_renders_empty_route_list() {
        let config = ClusterConfig::new(Vec::new());
        let rendered = config.render();

        assert!(rendered.contains("cluster {"));
        assert!(rendered.contains("routes = ["));
        assert!(!rendered.contains("nats-route://"));
    }

    #[test]
    fn test_non_default_ports() {
        let config = ClusterConfig {
            client_port: 4222,
            http_port: 8322,
            cluster_port: 6222,
            route_addresses: vec!["10.0.0.2".to_string()],
        };
        let rendered = config.render();

        assert!(rendered.contains("port: 4222"));
        assert!(rendered.contains("http_port: 8322"));
        assert!(rendered.contains("\"nats-route://10.0.0.2:6222\""));
    }
}
