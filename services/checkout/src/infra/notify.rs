use anyhow::Context as _;
use tracing::debug;

use crate::domain::repository::Notifier;
use crate::domain::types::OrderConfirmation;
use crate::error::CheckoutServiceError;

/// Posts order confirmations to the mail service. Without a URL every send is a no-op.
#[derive(Clone)]
pub struct HttpNotifier {
    pub client: reqwest::Client,
    pub url: Option<String>,
}

impl Notifier for HttpNotifier {
    async fn send_order_confirmation(
        &self,
        confirmation: &OrderConfirmation,
    ) -> Result<(), CheckoutServiceError> {
        let Some(url) = &self.url else {
            debug!(order_number = %confirmation.order_number, "notification url unset, skipping");
            return Ok(());
        };
        self.client
            .post(url)
            .json(confirmation)
            .send()
            .await
            .context("send order confirmation")?
            .error_for_status()
            .context("notification service rejected confirmation")?;
        Ok(())
    }
}
