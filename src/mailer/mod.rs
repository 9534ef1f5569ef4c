//! Outbound verification mail.

use std::sync::Mutex;
use tracing::info;

/// Delivery of account verification links. Delivery is fire-and-forget:
/// a lost mail is recovered by registering interest again, not by
/// failing the registration.
pub trait VerificationMailer: Send + Sync {
    fn send_verification(&self, email: &str, username: &str, verify_url: &str);
}

/// Writes the verification link to the log instead of delivering mail.
/// Stands in until an SMTP relay is configured; also handy when running
/// locally.
pub struct LogMailer;

impl VerificationMailer for LogMailer {
    fn send_verification(&self, email: &str, username: &str, verify_url: &str) {
        info!(
            "Verification mail for {} <{}>: {}",
            username, email, verify_url
        );
    }
}

#[derive(Debug, Clone)]
pub struct SentVerification {
    pub email: String,
    pub username: String,
    pub verify_url: String,
}

/// Captures outgoing mail so tests can fish the verification token back
/// out instead of scraping logs.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentVerification>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentVerification> {
        self.sent.lock().unwrap().clone()
    }

    /// The token carried by the most recently sent verification link.
    pub fn last_token(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .and_then(|mail| mail.verify_url.split("token=").nth(1))
            .map(|token| token.to_string())
    }

    /// The token from the most recent mail sent to `email`.
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|mail| mail.email == email)
            .and_then(|mail| mail.verify_url.split("token=").nth(1))
            .map(|token| token.to_string())
    }
}

impl VerificationMailer for RecordingMailer {
    fn send_verification(&self, email: &str, username: &str, verify_url: &str) {
        self.sent.lock().unwrap().push(SentVerification {
            email: email.to_string(),
            username: username.to_string(),
            verify_url: verify_url.to_string(),
        });
    }
}
