//! Transactional-mail provider over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{Email, MailError, Mailer};
use crate::config::MailConfig;

#[derive(Serialize)]
struct Outgoing<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Posts each message as JSON to the configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &MailConfig, timeout: Duration) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let body = Outgoing {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected(status.as_u16()));
        }
        tracing::debug!(to = %email.to, "Email accepted by provider");
        Ok(())
    }
}
