pub mod client;
pub mod errors;
pub mod http;
pub mod types;

#[cfg(any(test, feature = "dev-context"))]
pub mod testing;

pub use client::{ChainGateway, VmQueryClient};
pub use errors::{GatewayError, GatewayResult};
pub use http::GatewayHttpClient;
