//! Transactional email over SMTP.
//!
//! When no relay is configured the mailer logs the message and reports
//! nothing; outbound failures never fail the triggering request.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::SmtpConfig;

/// Transactional email sender with a log-only fallback.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl Mailer {
    /// Build a mailer. `None` config yields the log-only variant.
    pub fn new(config: Option<&SmtpConfig>) -> Self {
        let Some(config) = config else {
            warn!("SMTP not configured: transactional email will be logged only");
            return Self {
                transport: None,
                from: String::new(),
            };
        };

        match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host) {
            Ok(builder) => {
                let transport = builder
                    .port(config.port)
                    .credentials(Credentials::new(
                        config.username.clone(),
                        config.password.clone(),
                    ))
                    .build();
                info!(host = %config.host, port = config.port, "Created SMTP mailer");
                Self {
                    transport: Some(transport),
                    from: config.from.clone(),
                }
            }
            Err(err) => {
                warn!(error = %err, "SMTP relay setup failed: falling back to log-only mailer");
                Self {
                    transport: None,
                    from: String::new(),
                }
            }
        }
    }

    /// Send a plain-text email. Failures are logged, never returned: email is
    /// best-effort and must not fail the request that triggered it.
    pub async fn send(&self, to: &str, subject: &str, body: String) {
        let Some(transport) = &self.transport else {
            info!(to = %to, subject = %subject, "Email not sent (no SMTP relay configured)");
            return;
        };

        let message = match self.build_message(to, subject, body) {
            Ok(message) => message,
            Err(err) => {
                warn!(to = %to, error = %err, "Email build failed");
                return;
            }
        };

        match transport.send(message).await {
            Ok(_) => info!(to = %to, subject = %subject, "Email sent"),
            Err(err) => warn!(to = %to, error = %err, "Email send failed"),
        }
    }

    fn build_message(&self, to: &str, subject: &str, body: String) -> Result<Message, String> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| format!("From address: {e}"))?;
        let to: Mailbox = to.parse().map_err(|e| format!("To address '{to}': {e}"))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body)
            .map_err(|e| e.to_string())
    }
}
