//! Outbound transactional e-mail.
//!
//! The core only renders and hands messages to a [`Mailer`]. The default
//! [`OutboxMailer`] persists them in `email_outbox`, where an external relay
//! picks them up; delivery itself happens outside this crate.

use crate::db::outbox;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Confirmation,
    Recovery,
    MagicLink,
    Invite,
    Generic,
    WaiverRequest,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::Confirmation => "confirmation",
            EmailKind::Recovery => "recovery",
            EmailKind::MagicLink => "magic_link",
            EmailKind::Invite => "invite",
            EmailKind::Generic => "generic",
            EmailKind::WaiverRequest => "waiver_request",
        }
    }
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values substituted into the templates. Unused fields are ignored by the
/// kinds that don't need them.
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    pub organization: String,
    pub recipient_name: Option<String>,
    pub link: Option<String>,
    pub volunteer_name: Option<String>,
    pub temporary_password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

pub trait Mailer {
    fn send(&self, to: &str, kind: EmailKind, data: &TemplateData) -> AppResult<()>;
}

fn org(data: &TemplateData) -> &str {
    if data.organization.trim().is_empty() {
        "VolunteerHub"
    } else {
        data.organization.trim()
    }
}

fn link_block(label: &str, link: Option<&str>) -> String {
    match link {
        Some(l) => format!("{label}:\n{l}\n"),
        None => String::new(),
    }
}

/// Plain-text subject and body for `kind`.
pub fn render(kind: EmailKind, data: &TemplateData) -> RenderedEmail {
    let org = org(data);
    let greeting = match &data.recipient_name {
        Some(n) => format!("Hello {n},\n\n"),
        None => "Hello,\n\n".to_string(),
    };
    let link = data.link.as_deref();

    let (subject, text) = match kind {
        EmailKind::Confirmation => (
            format!("Welcome to {org} - Confirm Your Account"),
            format!(
                "Please use the link below to confirm your account.\n\n{}",
                link_block("Confirm account", link)
            ),
        ),
        EmailKind::Recovery => (
            format!("Reset Your {org} Password"),
            format!(
                "Use the link below to reset your password.\n\n{}\nIf you didn't request this, please ignore this email.\n",
                link_block("Reset password", link)
            ),
        ),
        EmailKind::MagicLink => (
            format!("Your {org} Login Link"),
            format!(
                "Use the link below to log in.\n\n{}",
                link_block("Log in", link)
            ),
        ),
        EmailKind::Invite => {
            let password = data
                .temporary_password
                .as_deref()
                .map(|p| {
                    format!("Your temporary password is: {p}\nYou will be asked to change it at first login.\n\n")
                })
                .unwrap_or_default();
            (
                format!("You've been invited to {org}"),
                format!(
                    "You've been invited to join our volunteer management system.\n\n{}{}",
                    password,
                    link_block("Accept invitation", link)
                ),
            )
        }
        EmailKind::WaiverRequest => {
            let volunteer = data.volunteer_name.as_deref().unwrap_or("your child");
            let expiry = data
                .expires_at
                .map(|e| format!("This link expires on {}.\n", e.format("%Y-%m-%d")))
                .unwrap_or_default();
            (
                format!("Liability waiver for {volunteer} - {org}"),
                format!(
                    "{volunteer} has registered to volunteer with {org}. Because they are under 18, \
                     a parent or guardian must sign the liability waiver before they can check in.\n\n{}{}",
                    link_block("Review and sign the waiver", link),
                    expiry
                ),
            )
        }
        EmailKind::Generic => (
            format!("{org} Notification"),
            format!(
                "{}\n\n{}",
                data.message
                    .as_deref()
                    .unwrap_or("You have a notification from us."),
                link_block("Continue", link)
            ),
        ),
    };

    RenderedEmail {
        subject,
        body: format!("{greeting}{text}\n{org}\n"),
    }
}

/// Queues every message in the `email_outbox` table.
pub struct OutboxMailer<'a> {
    conn: &'a Connection,
    from: String,
}

impl<'a> OutboxMailer<'a> {
    pub fn new(conn: &'a Connection, from: impl Into<String>) -> Self {
        Self {
            conn,
            from: from.into(),
        }
    }
}

impl Mailer for OutboxMailer<'_> {
    fn send(&self, to: &str, kind: EmailKind, data: &TemplateData) -> AppResult<()> {
        let to = to.trim();
        if to.is_empty() || !to.contains('@') {
            return Err(AppError::Email(format!("invalid recipient '{to}'")));
        }

        let mail = render(kind, data);
        let id = outbox::enqueue(
            self.conn,
            to,
            &self.from,
            kind.as_str(),
            &mail.subject,
            &mail.body,
            Utc::now(),
        )?;
        info!(outbox_id = id, kind = %kind, "email queued");
        Ok(())
    }
}
