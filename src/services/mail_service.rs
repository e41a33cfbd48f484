use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::error;

use crate::config::get_config;
use crate::error::{Error, Result};

/// SMTP delivery for account mail. The transport connects lazily, so
/// construction succeeds without a reachable relay.
#[derive(Clone)]
pub struct MailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl MailService {
    pub fn new() -> Result<Self> {
        let config = get_config();
        Self::with_options(
            &config.smtp_host,
            config.smtp_port,
            config.smtp_encryption.as_str(),
            config.smtp_username.as_deref(),
            config.smtp_password.as_deref(),
            config.smtp_from.clone(),
        )
    }

    /// `encryption` selects the transport mode: `tls` for implicit TLS,
    /// `none` for an unencrypted local relay, anything else STARTTLS.
    pub fn with_options(
        host: &str,
        port: u16,
        encryption: &str,
        username: Option<&str>,
        password: Option<&str>,
        from: String,
    ) -> Result<Self> {
        let mut builder = match encryption {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| Error::Config(format!("SMTP relay: {}", e)))?
                .port(port),
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port),
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| Error::Config(format!("SMTP STARTTLS: {}", e)))?
                .port(port),
        };

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| Error::Internal("invalid sender address".to_string()))?,
            )
            .to(to
                .parse()
                .map_err(|_| Error::BadRequest("invalid recipient address".to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| Error::Internal(e.to_string()))?;

        self.transport.send(message).await.map_err(|err| {
            error!(error = %err, to, "mail delivery failed");
            Error::Upstream("email is not sent".to_string())
        })?;
        Ok(())
    }

    /// Recovery mail pointing at the reset endpoint. The wording is part of
    /// the API surface; existing clients parse it.
    pub async fn send_password_recovery(&self, to: &str, reset_url: &str) -> Result<()> {
        let body = format!(
            "your password link is as follow:\n\n{}\n\n if you have not requested this, then please ignore that",
            reset_url
        );
        self.send(to, "jobs-api password recovery", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_is_lazy_for_every_mode() {
        for mode in ["starttls", "tls", "none"] {
            let service = MailService::with_options(
                "nonexistent.invalid",
                2525,
                mode,
                Some("postmaster"),
                Some("secret"),
                "noreply@example.com".to_string(),
            );
            assert!(service.is_ok(), "mode {} should build lazily", mode);
        }
    }
}
