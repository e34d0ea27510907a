//! Contact form: validation, storage and the operator notification.

use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::Contact;
use crate::db::{self, NewContactMessage, Pool};
use crate::mailer::{Mailer, OutgoingEmail};
use crate::render::escape_html;
use crate::validate::{self, ValidationErrors};

const MAX_NAME: usize = 100;
const MAX_SUBJECT: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl ContactForm {
    pub fn validate(&self) -> Result<NewContactMessage, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = validate::required_text(&mut errors, "name", self.name.as_deref(), Some(MAX_NAME));
        let email = validate::required_email(&mut errors, "email", self.email.as_deref());
        let subject =
            validate::required_text(&mut errors, "subject", self.subject.as_deref(), Some(MAX_SUBJECT));
        let message = validate::required_text(&mut errors, "message", self.message.as_deref(), None);
        errors.into_result()?;
        Ok(NewContactMessage {
            name,
            email,
            subject,
            message,
        })
    }
}

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Operator notification for a stored message.
pub fn compose_notification(msg: &NewContactMessage, settings: &Contact) -> OutgoingEmail {
    let text = format!(
        "Name: {}\nEmail: {}\nSubject: {}\n\nMessage:\n{}",
        msg.name, msg.email, msg.subject, msg.message
    );
    let html = format!(
        "<p><strong>Name:</strong> {}</p>\n<p><strong>Email:</strong> {}</p>\n\
         <p><strong>Subject:</strong> {}</p>\n<p><strong>Message:</strong><br>{}</p>",
        escape_html(&msg.name),
        escape_html(&msg.email),
        escape_html(&msg.subject),
        escape_html(&msg.message).replace('\n', "<br>"),
    );
    OutgoingEmail {
        to: settings.operator_email.clone(),
        from: settings.from_email.clone(),
        subject: format!("LonergardenHotel Contact: {}", msg.name),
        text,
        html,
    }
}

#[derive(Clone)]
pub struct ContactService {
    pool: Pool,
    mailer: Arc<dyn Mailer>,
    settings: Contact,
}

impl ContactService {
    pub fn new(pool: Pool, mailer: Arc<dyn Mailer>, settings: Contact) -> Self {
        Self {
            pool,
            mailer,
            settings,
        }
    }

    /// Store the message and notify the operator. A failed notification is
    /// logged; the stored message is kept.
    #[instrument(skip_all)]
    pub async fn submit(&self, form: &ContactForm) -> Result<i64, ContactError> {
        let msg = form.validate()?;
        let id = db::insert_contact_message(&self.pool, &msg).await?;
        info!(id, "contact message stored");

        let email = compose_notification(&msg, &self.settings);
        if let Err(err) = self.mailer.send(&email).await {
            error!(id, error = %err, "failed to send contact notification");
        }
        Ok(id)
    }
}
