use async_imap::{Client, Session};
use log::info;
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::settings::Endpoint;

pub type ImapSession = Session<tokio_native_tls::TlsStream<TcpStream>>;

fn connection_error(endpoint: &Endpoint, reason: impl ToString) -> Error {
    Error::Connection {
        endpoint: format!("{}:{}", endpoint.host, endpoint.port),
        reason: reason.to_string(),
    }
}

// Establish a TLS-encrypted connection to the IMAP server
async fn connect_to_server(endpoint: &Endpoint) -> Result<tokio_native_tls::TlsStream<TcpStream>> {
    let addr = (endpoint.host.as_str(), endpoint.port);
    let tcp_stream = TcpStream::connect(addr)
        .await
        .map_err(|err| connection_error(endpoint, err))?;
    let connector = native_tls::TlsConnector::new().map_err(|err| connection_error(endpoint, err))?;
    let tls = tokio_native_tls::TlsConnector::from(connector);
    let tls_stream = tls
        .connect(&endpoint.host, tcp_stream)
        .await
        .map_err(|err| connection_error(endpoint, err))?;

    info!("-- connected to {}:{}", endpoint.host, endpoint.port);
    Ok(tls_stream)
}

// Login to the IMAP server and return an authenticated session
pub async fn open_session(endpoint: &Endpoint, email: &str, password: &str) -> Result<ImapSession> {
    let tls_stream = connect_to_server(endpoint).await?;
    let client = Client::new(tls_stream);

    let session = client
        .login(email, password)
        .await
        .map_err(|(err, _client)| Error::Auth(format!("{} ({})", email, err)))?;

    info!("-- logged in as {}", email);
    Ok(session)
}
