// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use chrono::Datelike;
use url::Url;

use super::EmailError;

const BRAND: &str = "AmourScans";
const ACCENT: &str = "#7c3aed";

/// Rendered subject and bodies of a transactional email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Account verification email. The link expires after 24 hours.
pub fn verification_email(username: &str, link: &str) -> Result<EmailContent, EmailError> {
    let link = checked_link(link)?;
    let subject = format!("Verify your {BRAND} account");
    let text = format!(
        "Hi {username},\n\n\
         Welcome to {BRAND}! Confirm your email address by opening this link:\n\
         {link}\n\n\
         This link will expire in 24 hours.\n\n\
         If you didn't create an account, you can ignore this email."
    );
    let html = render_html(
        "Verify Your Email",
        &format!("Welcome to {BRAND}!"),
        username,
        "Thanks for signing up. Confirm your email address to finish creating your account.",
        "Verify Email Address",
        &link,
        "This link will expire in 24 hours.",
        "If you didn't create an account, you can ignore this email.",
    );
    Ok(EmailContent {
        subject,
        text,
        html,
    })
}

/// Password reset email. The link expires after one hour.
pub fn password_reset_email(username: &str, link: &str) -> Result<EmailContent, EmailError> {
    let link = checked_link(link)?;
    let subject = format!("Reset your {BRAND} password");
    let text = format!(
        "Hi {username},\n\n\
         We received a request to reset your password. Open this link to choose a new one:\n\
         {link}\n\n\
         This link will expire in 1 hour.\n\n\
         If you didn't request a password reset, please ignore this email and your \
         password will remain unchanged."
    );
    let html = render_html(
        "Reset Your Password",
        "Reset Your Password",
        username,
        "We received a request to reset your password. Use the button below to choose a new one.",
        "Reset Password",
        &link,
        "This link will expire in 1 hour.",
        "If you didn't request a password reset, please ignore this email and your \
         password will remain unchanged.",
    );
    Ok(EmailContent {
        subject,
        text,
        html,
    })
}

/// Links must be absolute http(s) URLs.
fn checked_link(raw: &str) -> Result<String, EmailError> {
    let url = Url::parse(raw).map_err(|e| EmailError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(EmailError::InvalidUrl(format!("unsupported scheme {other}"))),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn render_html(
    title: &str,
    heading: &str,
    username: &str,
    intro: &str,
    button: &str,
    link: &str,
    expiry: &str,
    ignore_note: &str,
) -> String {
    let username = escape_html(username);
    let link = escape_html(link);
    let year = chrono::Utc::now().year();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1 style="color: {ACCENT};">{heading}</h1>
  <p>Hi {username},</p>
  <p>{intro}</p>
  <p style="text-align: center; margin: 30px 0;">
    <a href="{link}" style="background-color: {ACCENT}; color: #fff; padding: 12px 30px; text-decoration: none; border-radius: 5px; display: inline-block;">{button}</a>
  </p>
  <p>Or copy and paste this link into your browser:</p>
  <p style="word-break: break-all; color: {ACCENT};">{link}</p>
  <p>{expiry}</p>
  <p>{ignore_note}</p>
  <hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">
  <p style="font-size: 12px; color: #999; text-align: center;">&copy; {year} {BRAND}. All rights reserved.</p>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_mentions_link_and_expiry() {
        let content = verification_email("reader", "https://amour.example/verify?token=abc").unwrap();
        assert!(content.subject.contains("Verify"));
        assert!(content.text.contains("https://amour.example/verify?token=abc"));
        assert!(content.text.contains("24 hours"));
        assert!(content.html.contains("Verify Email Address"));
        assert!(content.html.contains("24 hours"));
        let year = chrono::Utc::now().year().to_string();
        assert!(content.html.contains(&year));
    }

    #[test]
    fn reset_expires_in_an_hour() {
        let content = password_reset_email("reader", "http://localhost:5000/reset?t=1").unwrap();
        assert!(content.text.contains("1 hour"));
        assert!(content.html.contains("Reset Password"));
        assert!(!content.html.contains("24 hours"));
    }

    #[test]
    fn username_is_escaped_in_html() {
        let content =
            verification_email("<script>alert('x')</script>", "https://amour.example/v").unwrap();
        assert!(!content.html.contains("<script>"));
        assert!(content.html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn link_query_is_escaped_in_html() {
        let content = verification_email("reader", "https://amour.example/v?a=1&b=2").unwrap();
        assert!(content.html.contains("a=1&amp;b=2"));
    }

    #[test]
    fn relative_or_foreign_links_are_rejected() {
        assert!(matches!(
            verification_email("reader", "/verify?token=abc"),
            Err(EmailError::InvalidUrl(_))
        ));
        assert!(matches!(
            password_reset_email("reader", "javascript:alert(1)"),
            Err(EmailError::InvalidUrl(_))
        ));
    }
}
