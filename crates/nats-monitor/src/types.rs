use serde::{Deserialize, Serialize};

/// One active route as reported by the `/routez` endpoint.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Route {
    pub rid: Option<u64>,
    pub remote_id: Option<String>,
    pub remote_name: Option<String>,
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub uptime: Option<String>,
}

/// Represents the routes information (Routez) from the NATS server.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Routez {
    pub server_id: String,
    pub now: String,
    pub num_routes: u32,
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// Represents the general server information (Varz) from the NATS server.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Varz {
    pub server_id: String,
    pub server_name: Option<String>,
    pub version: String,
    pub uptime: Option<String>,
    pub connections: Option<u64>,
}
