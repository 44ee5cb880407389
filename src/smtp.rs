use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::info;

use crate::error::{Error, Result};
use crate::settings::Account;

/// A plain-text message to submit.
#[derive(Debug)]
pub struct Outbound<'a> {
    pub to: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub cc: Option<&'a str>,
}

fn parse_mailbox(addr: &str) -> Result<Mailbox> {
    addr.parse()
        .map_err(|err| Error::Send(format!("invalid address '{}': {}", addr, err)))
}

fn build_transport(account: &Account, password: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    // relay() opens a TLS wrapper connection, the implicit-TLS port 465 style
    let builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&account.smtp.host)
        .map_err(|err| Error::Send(format!("invalid SMTP host '{}': {}", account.smtp.host, err)))?;

    Ok(builder
        .port(account.smtp.port)
        .credentials(Credentials::new(
            account.email.clone(),
            password.to_string(),
        ))
        .build())
}

/// Compose a plain-text message from the account's address and submit it
/// through the account's outbound endpoint. Authentication or delivery
/// rejection surfaces as `Error::Send`; there are no retries.
pub async fn send_message(account: &Account, password: &str, outbound: &Outbound<'_>) -> Result<()> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&account.email)?)
        .to(parse_mailbox(outbound.to)?)
        .subject(outbound.subject);
    if let Some(cc) = outbound.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }
    let message = builder
        .header(ContentType::TEXT_PLAIN)
        .body(outbound.body.to_string())
        .map_err(|err| Error::Send(err.to_string()))?;

    let transport = build_transport(account, password)?;
    transport
        .send(message)
        .await
        .map_err(|err| Error::Send(err.to_string()))?;

    info!("-- message sent to {}", outbound.to);
    Ok(())
}
