// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transactional Email
//!
//! Message type, recipient normalization, a token generator and a log-only
//! mailer. No transport is configured: [`LogMailer`] records what would be
//! sent and reports success.

pub mod templates;

use base64ct::{Base64UrlUnpadded, Encoding};
use ring::rand::{SecureRandom, SystemRandom};
use unicode_normalization::UnicodeNormalization;

pub use templates::{password_reset_email, verification_email, EmailContent};

/// Number of random bytes in a verification or reset token.
pub const TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("invalid link: {0}")]
    InvalidUrl(String),

    #[error("system random generator failed")]
    Random,

    #[error("failed to send email: {0}")]
    Send(String),
}

/// Trim, NFKC-normalize and lowercase the domain of an address.
///
/// The address must contain exactly one `@` with non-empty parts on both
/// sides and no whitespace.
pub fn normalize_address(raw: &str) -> Result<String, EmailError> {
    let normalized: String = raw.trim().nfkc().collect();
    let invalid = || EmailError::InvalidAddress(raw.to_string());

    let (local, domain) = normalized.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || normalized.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(format!("{local}@{}", domain.to_lowercase()))
}

/// An outgoing message with a normalized recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

impl EmailMessage {
    pub fn new(
        to: &str,
        subject: impl Into<String>,
        text: impl Into<String>,
        html: Option<String>,
    ) -> Result<Self, EmailError> {
        Ok(Self {
            to: normalize_address(to)?,
            subject: subject.into(),
            text: text.into(),
            html,
        })
    }

    /// Message from rendered template content.
    pub fn from_content(to: &str, content: EmailContent) -> Result<Self, EmailError> {
        Self::new(to, content.subject, content.text, Some(content.html))
    }
}

/// Delivers email.
pub trait Mailer: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Mailer that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            has_html = message.html.is_some(),
            "Email delivery disabled, message logged only"
        );
        tracing::debug!(to = %message.to, body = %message.text, "Email body");
        Ok(())
    }
}

/// 32 random bytes, base64url without padding.
pub fn generate_token() -> Result<String, EmailError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| EmailError::Random)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}
