use shardview_cache::CacheError;
use shardview_codec::CodecError;
use shardview_gateway::GatewayError;
use thiserror::Error;

pub type NodesResult<T> = Result<T, NodesError>;

/// Aggregation-engine errors. `Clone` because build results are shared with
/// every caller waiting on the same cached computation; upstream errors are
/// carried as strings for that reason.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodesError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("resolver error: {0}")]
    Resolver(String),

    #[error("malformed contract response from '{function}': {reason}")]
    MalformedContractResponse { function: String, reason: String },

    #[error("sort field '{0}' does not apply to the auction view")]
    UnsupportedAuctionSort(String),
}

impl From<GatewayError> for NodesError {
    fn from(err: GatewayError) -> Self {
        NodesError::Gateway(err.to_string())
    }
}
