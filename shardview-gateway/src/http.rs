use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::{body::Bytes, header, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use log::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::{
    client::{ChainGateway, VmQueryClient},
    errors::{GatewayError, GatewayResult},
    types::{Auction, HeartbeatEntry, NetworkConfig, TrieStatistics, ValidatorStatistics},
};

const VM_QUERY_OK: &str = "ok";

/// Envelope every gateway endpoint wraps its payload in.
#[derive(Debug, Deserialize)]
struct GatewayResponse<T> {
    data: Option<T>,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct HeartbeatData {
    heartbeats: Vec<HeartbeatEntry>,
}

#[derive(Debug, Deserialize)]
struct StatisticsData {
    statistics: ValidatorStatistics,
}

#[derive(Debug, Deserialize)]
struct ConfigData {
    config: NetworkConfig,
}

#[derive(Debug, Deserialize)]
struct AuctionData {
    #[serde(rename = "auctionList", default)]
    auction_list: Vec<Auction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VmQueryRequest<'a> {
    sc_address: &'a str,
    func_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caller: Option<&'a str>,
    args: &'a [String],
}

#[derive(Debug, Deserialize)]
struct VmQueryData {
    data: VmQueryOutcome,
}

#[derive(Debug, Deserialize)]
struct VmQueryOutcome {
    #[serde(rename = "returnData", default)]
    return_data: Option<Vec<String>>,
    #[serde(rename = "returnCode", default)]
    return_code: String,
}

// -----------------
// GatewayHttpClient
// -----------------
/// [ChainGateway] and [VmQueryClient] over the gateway's JSON/HTTP API.
pub struct GatewayHttpClient {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: Url,
}

impl GatewayHttpClient {
    pub fn new(base_url: &str) -> GatewayResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| GatewayError::InvalidUrl(format!("{base_url}: {err}")))?;
        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self { client, base_url })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> GatewayResult<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| GatewayError::InvalidUrl(format!("{path}: {err}")))?;
        let uri: hyper::Uri = url
            .as_str()
            .parse()
            .map_err(|err| GatewayError::InvalidUrl(format!("{url}: {err}")))?;

        trace!("{method} {uri}");
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|err| GatewayError::Transport(path.to_string(), err.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|err| GatewayError::Transport(path.to_string(), err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::UnexpectedStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|err| GatewayError::Transport(path.to_string(), err.to_string()))?
            .to_bytes();

        let envelope: GatewayResponse<T> = serde_json::from_slice(&bytes)
            .map_err(|err| GatewayError::MalformedResponse {
                endpoint: path.to_string(),
                reason: err.to_string(),
            })?;

        envelope.data.ok_or_else(|| GatewayError::Gateway {
            endpoint: path.to_string(),
            message: envelope.error,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        self.request(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<T> {
        let body = serde_json::to_vec(body).map_err(|err| GatewayError::MalformedResponse {
            endpoint: path.to_string(),
            reason: err.to_string(),
        })?;
        self.request(Method::POST, path, Some(body)).await
    }
}

#[async_trait]
impl ChainGateway for GatewayHttpClient {
    async fn get_node_heartbeat_status(&self) -> GatewayResult<Vec<HeartbeatEntry>> {
        let data: HeartbeatData = self.get("node/heartbeatstatus").await?;
        Ok(data.heartbeats)
    }

    async fn get_validator_statistics(&self) -> GatewayResult<ValidatorStatistics> {
        let data: StatisticsData = self.get("validator/statistics").await?;
        Ok(data.statistics)
    }

    async fn get_network_config(&self) -> GatewayResult<NetworkConfig> {
        let data: ConfigData = self.get("network/config").await?;
        Ok(data.config)
    }

    async fn get_trie_statistics(&self, shard: u32) -> GatewayResult<TrieStatistics> {
        self.get(&format!("network/trie-statistics/{shard}")).await
    }

    async fn get_validator_auctions(&self) -> GatewayResult<Vec<Auction>> {
        let data: AuctionData = self.get("validator/auction").await?;
        Ok(data.auction_list)
    }
}

#[async_trait]
impl VmQueryClient for GatewayHttpClient {
    async fn vm_query(
        &self,
        contract: &str,
        function: &str,
        caller: Option<&str>,
        args: &[String],
    ) -> GatewayResult<Vec<String>> {
        let request = VmQueryRequest {
            sc_address: contract,
            func_name: function,
            caller,
            args,
        };
        let data: VmQueryData = self.post("vm-values/query", &request).await?;
        if data.data.return_code != VM_QUERY_OK {
            return Err(GatewayError::VmQueryFailed {
                function: function.to_string(),
                code: data.data.return_code,
            });
        }
        Ok(data.data.return_data.unwrap_or_default())
    }
}
