use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),

    #[error("transport error calling {0}: {1}")]
    Transport(String, String),

    #[error("gateway returned status {status} for {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("gateway error for {endpoint}: {message}")]
    Gateway { endpoint: String, message: String },

    #[error("vm query '{function}' failed with return code '{code}'")]
    VmQueryFailed { function: String, code: String },
}
