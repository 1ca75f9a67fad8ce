use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Checkout service error variants surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutServiceError {
    #[error("order items required")]
    EmptyOrder,
    #[error("too many order items (max {max})")]
    TooManyItems { max: usize },
    #[error("shipping address required")]
    MissingShippingAddress,
    #[error("payment method required")]
    MissingPaymentMethod,
    #[error("quantity must be between 1 and {max}")]
    InvalidQuantity { max: i32 },
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("job not found")]
    JobNotFound,
    #[error("system busy, please retry shortly")]
    QueueBusy,
    #[error("checkout temporarily unavailable, please retry")]
    QueueUnavailable(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl CheckoutServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyOrder => "EMPTY_ORDER",
            Self::TooManyItems { .. } => "TOO_MANY_ITEMS",
            Self::MissingShippingAddress => "MISSING_SHIPPING_ADDRESS",
            Self::MissingPaymentMethod => "MISSING_PAYMENT_METHOD",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::JobNotFound => "JOB_NOT_FOUND",
            Self::QueueBusy => "QUEUE_BUSY",
            Self::QueueUnavailable(_) => "QUEUE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Re-label a storage failure on the submit path as retryable.
    pub fn into_unavailable(self) -> Self {
        match self {
            Self::Internal(e) => Self::QueueUnavailable(e),
            other => other,
        }
    }
}

impl IntoResponse for CheckoutServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::EmptyOrder
            | Self::TooManyItems { .. }
            | Self::MissingShippingAddress
            | Self::MissingPaymentMethod
            | Self::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::JobNotFound => StatusCode::NOT_FOUND,
            Self::QueueBusy | Self::QueueUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 4xx and admission rejections are expected; TraceLayer already records them.
        match &self {
            Self::Internal(e) => tracing::error!(error = %e, kind = "INTERNAL", "internal error"),
            Self::QueueUnavailable(e) => {
                tracing::error!(error = %e, kind = "QUEUE_UNAVAILABLE", "enqueue failed")
            }
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
