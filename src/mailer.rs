// src/mailer.rs

//! Failure-notification mailer.
//!
//! Used by the CI entry points after a failed build: renders `{{ NAME }}`
//! placeholders in the subject and body templates from a data map (in
//! practice the process environment, so things like `BUILD_URL` resolve)
//! and hands the message to the SMTP relay configured via `SMTP_*`
//! variables.

use std::collections::BTreeMap;

use anyhow::Context;
use lettre::message::{Mailbox, Mailboxes};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::errors::Result;
use crate::logger::Logger;

/// Sends templated notification messages through a plain SMTP relay.
pub struct Mailer {
    log: Logger,
    server: String,
    port: u16,
    user: String,
    password: String,
}

impl Mailer {
    pub fn new(log: Logger, server: impl Into<String>, port: u16) -> Self {
        Self {
            log,
            server: server.into(),
            port,
            user: String::new(),
            password: String::new(),
        }
    }

    /// Sets the credentials used against the relay. An empty user means
    /// unauthenticated SMTP.
    pub fn credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Renders and sends one message. `receiver` may be a comma-separated
    /// list of addresses.
    pub async fn send(
        &self,
        sender: &str,
        receiver: &str,
        data: &BTreeMap<String, String>,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        let subject = render_template(subject, data);
        let body = render_template(body, data);

        let from: Mailbox = sender
            .parse()
            .with_context(|| format!("parsing sender address '{sender}'"))?;
        let to: Mailboxes = receiver
            .parse()
            .with_context(|| format!("parsing receiver addresses '{receiver}'"))?;

        let mut builder = Message::builder().from(from).subject(subject.trim());
        for mailbox in to {
            builder = builder.to(mailbox);
        }
        let message = builder.body(body).context("building mail message")?;

        let mut transport =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.server)
                .port(self.port);
        if !self.user.is_empty() {
            transport = transport
                .credentials(Credentials::new(self.user.clone(), self.password.clone()));
        }
        let transport = transport.build();

        self.log.info(&format!("Sending notification to {receiver}"))?;
        transport
            .send(message)
            .await
            .with_context(|| format!("sending mail via {}:{}", self.server, self.port))?;
        Ok(())
    }
}

/// Replaces every `{{ NAME }}` placeholder with the matching value from
/// `data`. Placeholders with no matching entry are left as they are.
pub fn render_template(template: &str, data: &BTreeMap<String, String>) -> String {
    let mut result = template.to_string();
    for (name, value) in data {
        result = result.replace(&format!("{{{{ {name} }}}}"), value);
    }
    result
}
