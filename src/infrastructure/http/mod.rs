//! Outbound HTTP clients built on `reqwest`.

mod hop_client;
mod source_fetcher;

pub use hop_client::ReqwestHopClient;
pub use source_fetcher::ReqwestSourceFetcher;
