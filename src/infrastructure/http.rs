use hyper::client::HttpConnector;
use hyper::{Body, Client};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};

pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Client for the gateway and the ledger provider. Speaks both `https://`
/// and plain `http://`; server certificates are checked against the
/// bundled webpki roots.
pub fn https_client() -> HttpsClient {
    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();

    Client::builder().build(connector)
}
