pub mod http_client;
pub mod proxy;

pub use http_client::{HttpTransport, RawResponse, TransportOptions};
pub use proxy::{ProxyConfig, ProxyKind};
