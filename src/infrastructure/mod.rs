pub mod database;
pub mod gateway;
pub mod http;
pub mod ledger;
pub mod rpc;

pub use database::SqliteLedger;
pub use gateway::{GatewayError, PinataGateway, StorageGateway};
pub use http::{https_client, HttpsClient};
pub use ledger::{Ledger, LedgerError};
pub use rpc::{RpcLedger, RpcSettings};
