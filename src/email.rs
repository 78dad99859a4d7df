use crate::error::{GeneratedError, Result};
use crate::response::{json_type_name, JsonMap};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde_json::Value;
use std::fmt;

/// Sends email through an authenticated SMTP relay (e.g. Amazon SES)
#[derive(Clone)]
pub struct EmailService {
    pub smtp_hostname: String,
    pub smtp_port: u16,
    pub sender_address: String,
    pub sender_user_id: String,
    pub sender_password: String,
}

fn required_str(config: &JsonMap, key: &str) -> Result<String> {
    match config.get(key) {
        None => Err(GeneratedError::user(format!("No {}", key)).into()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(GeneratedError::user(format!(
            "{} is not a string: it is {}",
            key,
            json_type_name(other)
        ))
        .into()),
    }
}

fn required_port(config: &JsonMap, key: &str) -> Result<u16> {
    let value = config
        .get(key)
        .ok_or_else(|| GeneratedError::user(format!("No {}", key)))?;
    let number = value.as_f64().ok_or_else(|| {
        GeneratedError::user(format!(
            "{} is not a number: it is {}",
            key,
            json_type_name(value)
        ))
    })?;
    if number.fract() != 0.0 {
        return Err(GeneratedError::user(format!("Fractional number for {}", key)).into());
    }
    if !(0.0..=f64::from(u16::MAX)).contains(&number) {
        return Err(GeneratedError::user(format!("{} is out of range", key)).into());
    }
    Ok(number as u16)
}

impl EmailService {
    /// Build a service from a JSON configuration object.
    ///
    /// Expected keys: `SES_SMTP_hostname`, `SES_SMTP_Port`, `SenderAddress`,
    /// `SenderUserId`, `SenderPassword`.
    pub fn from_config(config: &JsonMap) -> Result<Self> {
        Ok(EmailService {
            smtp_hostname: required_str(config, "SES_SMTP_hostname")?,
            smtp_port: required_port(config, "SES_SMTP_Port")?,
            sender_address: required_str(config, "SenderAddress")?,
            sender_user_id: required_str(config, "SenderUserId")?,
            sender_password: required_str(config, "SenderPassword")?,
        })
    }

    /// Assemble a multipart/alternative message with text and HTML bodies
    pub fn build_message(
        &self,
        email_address: &str,
        subject: &str,
        text_message: &str,
        html_message: &str,
    ) -> Result<Message> {
        let from: Mailbox = self.sender_address.parse()?;
        let to: Mailbox = email_address.parse()?;

        let message = Message::builder()
            .from(from.clone())
            .sender(from)
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text_message.to_string(),
                html_message.to_string(),
            ))?;
        Ok(message)
    }

    /// Send a message to one recipient over STARTTLS
    pub fn send_email(
        &self,
        email_address: &str,
        subject: &str,
        text_message: &str,
        html_message: &str,
    ) -> Result<()> {
        let message = self.build_message(email_address, subject, text_message, html_message)?;

        let mailer = SmtpTransport::starttls_relay(&self.smtp_hostname)?
            .port(self.smtp_port)
            .credentials(Credentials::new(
                self.sender_user_id.clone(),
                self.sender_password.clone(),
            ))
            .build();
        mailer.send(&message)?;

        tracing::info!(to = %email_address, host = %self.smtp_hostname, "email sent");
        Ok(())
    }
}

impl fmt::Debug for EmailService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailService")
            .field("smtp_hostname", &self.smtp_hostname)
            .field("smtp_port", &self.smtp_port)
            .field("sender_address", &self.sender_address)
            .field("sender_user_id", &self.sender_user_id)
            .finish_non_exhaustive()
    }
}
