//! Confirmation notices for newly registered warranties
//!
//! Notification is fire-and-forget: the service spawns the notifier after the
//! warranty is persisted and only logs a failure.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::warranty::{ValidityWindow, Warranty};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("warranty {0} has no email address")]
    NoRecipient(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Delivers the registration confirmation to the customer
#[async_trait]
pub trait WarrantyNotifier: Send + Sync + 'static {
    async fn warranty_registered(&self, warranty: &Warranty) -> Result<(), NotifyError>;
}

/// A rendered plain-text confirmation email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ConfirmationEmail {
    pub const SUBJECT: &'static str = "Warranty Registration Confirmation";

    /// Renders the email for `warranty`, or `None` when it has no address
    pub fn render(from: &str, warranty: &Warranty, window: ValidityWindow) -> Option<Self> {
        let to = warranty.email.as_deref()?.to_string();
        let body = format!(
            "Dear {name},\n\
             \n\
             Thank you for your purchase. Your warranty registration has been completed.\n\
             \n\
             WARRANTY DETAILS\n\
             - Car plate: {plate}\n\
             - Purchase date: {purchase}\n\
             - Expiry date: {expiry}\n\
             \n\
             WARRANTY TERMS\n\
             1) Valid until {window} from the date of purchase\n\
             2) Valid only if the tyre has above 6mm of tread depth left\n\
             3) Valid only after a minimum purchase of 2 pcs in a single receipt\n\
             4) Valid only for digital receipts\n\
             5) Invalid for tyre damage that is beyond repair\n\
             \n\
             To file a claim, visit your nearest participating shop with this car plate.\n",
            name = warranty.name,
            plate = warranty.car_plate,
            purchase = warranty.purchase_date.format("%B %-d, %Y"),
            expiry = warranty.expiry_date.format("%B %-d, %Y"),
            window = window.describe(),
        );

        Some(Self {
            from: from.to_string(),
            to,
            subject: Self::SUBJECT.to_string(),
            body,
        })
    }
}

/// Notifier that renders the email and writes it to the log
///
/// No mail transport is bundled; deployments that need delivery provide
/// their own `WarrantyNotifier`.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    from: String,
    window: ValidityWindow,
}

impl LogNotifier {
    pub fn new(from: impl Into<String>, window: ValidityWindow) -> Self {
        Self {
            from: from.into(),
            window,
        }
    }
}

#[async_trait]
impl WarrantyNotifier for LogNotifier {
    async fn warranty_registered(&self, warranty: &Warranty) -> Result<(), NotifyError> {
        let email = ConfirmationEmail::render(&self.from, warranty, self.window)
            .ok_or_else(|| NotifyError::NoRecipient(warranty.id.to_string()))?;

        info!(
            warranty_id = %warranty.id,
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            body_bytes = email.body.len(),
            "Warranty confirmation email rendered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use core_kernel::WarrantyId;

    fn warranty(email: Option<&str>) -> Warranty {
        Warranty {
            id: WarrantyId::new(),
            name: "Aisyah".to_string(),
            phone_number: "0123456789".to_string(),
            email: email.map(str::to_string),
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            car_plate: "ABC123".to_string(),
            receipt: "RCPT-1".to_string(),
            is_used: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_includes_dates_and_plate() {
        let email = ConfirmationEmail::render(
            "warranty@example.com",
            &warranty(Some("aisyah@example.com")),
            ValidityWindow::Months(6),
        )
        .unwrap();

        assert_eq!(email.to, "aisyah@example.com");
        assert!(email.body.contains("ABC123"));
        assert!(email.body.contains("January 1, 2024"));
        assert!(email.body.contains("July 1, 2024"));
        assert!(email.body.contains("6 months"));
    }

    #[test]
    fn test_render_without_email_is_none() {
        assert!(ConfirmationEmail::render("x@example.com", &warranty(None), ValidityWindow::default()).is_none());
    }

    #[tokio::test]
    async fn test_log_notifier_requires_recipient() {
        let notifier = LogNotifier::new("x@example.com", ValidityWindow::default());
        assert!(notifier.warranty_registered(&warranty(Some("a@example.com"))).await.is_ok());
        assert!(matches!(
            notifier.warranty_registered(&warranty(None)).await,
            Err(NotifyError::NoRecipient(_))
        ));
    }
}
