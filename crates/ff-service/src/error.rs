use ff_auth::{PasswordError, TokenError};
use ff_db::DbError;
use ff_orders::{StockError, TransitionError};
use ff_routing::RoutingError;
use thiserror::Error;

/// Everything a caller of [`crate::Platform`] may need to branch on.
///
/// Front-ends map the variant to a status code ([`ServiceError::code`] gives
/// the stable wire name); the message is safe to show to the end user.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    InvalidTransition(TransitionError),

    #[error(transparent)]
    InsufficientStock(StockError),

    #[error("routing provider: {0}")]
    Upstream(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION",
            ServiceError::Unauthorized(_) => "UNAUTHORIZED",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::InvalidTransition(_) => "INVALID_TRANSITION",
            ServiceError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            ServiceError::Upstream(_) => "UPSTREAM",
            ServiceError::Internal(_) => "INTERNAL",
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub(crate) fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Forbidden(msg.into())
    }
}

impl From<StockError> for ServiceError {
    fn from(e: StockError) -> Self {
        match e {
            StockError::Insufficient { .. } => ServiceError::InsufficientStock(e),
            StockError::NotInOrder(_) | StockError::RemoveExceedsHeld { .. } => {
                ServiceError::Conflict(e.to_string())
            }
            StockError::NonPositiveQuantity(_)
            | StockError::TooManyItems { .. }
            | StockError::Overflow(_) => {
                ServiceError::Validation(e.to_string())
            }
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { .. } => ServiceError::NotFound(e.to_string()),
            DbError::Conflict(msg) => ServiceError::Conflict(msg),
            DbError::Transition(t) => ServiceError::InvalidTransition(t),
            DbError::Stock(s) => s.into(),
            DbError::Sqlx(_) | DbError::Decode(_) => ServiceError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(e: PasswordError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl From<TokenError> for ServiceError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => ServiceError::Unauthorized("token expired".to_string()),
            TokenError::Invalid(_) => ServiceError::Unauthorized("invalid token".to_string()),
            TokenError::Config(_) => ServiceError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<RoutingError> for ServiceError {
    fn from(e: RoutingError) -> Self {
        ServiceError::Upstream(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff_orders::OrderEvent;
    use ff_schemas::OrderStatus;

    #[test]
    fn db_errors_map_to_service_variants() {
        let nf: ServiceError = DbError::NotFound {
            entity: "order",
            id: "x".to_string(),
        }
        .into();
        assert_eq!(nf.code(), "NOT_FOUND");

        let tr: ServiceError = DbError::Transition(TransitionError {
            from: OrderStatus::Delivered,
            event: OrderEvent::Cancel,
        })
        .into();
        assert_eq!(tr.code(), "INVALID_TRANSITION");

        let st: ServiceError = DbError::Stock(StockError::Insufficient {
            requested: 3,
            available: 1,
        })
        .into();
        assert_eq!(st.code(), "INSUFFICIENT_STOCK");
        assert!(st.to_string().contains("available 1"));

        let held: ServiceError = DbError::Stock(StockError::RemoveExceedsHeld {
            requested: 3,
            held: 1,
        })
        .into();
        assert_eq!(held.code(), "CONFLICT");

        let bad_qty: ServiceError = StockError::NonPositiveQuantity(0).into();
        assert_eq!(bad_qty.code(), "VALIDATION");

        let capped: ServiceError = DbError::Stock(StockError::TooManyItems { total: 6, max: 5 }).into();
        assert_eq!(capped.code(), "VALIDATION");

        let dec: ServiceError = DbError::Decode("bad role".to_string()).into();
        assert_eq!(dec.code(), "INTERNAL");
    }

    #[test]
    fn token_errors_never_leak_detail() {
        let e: ServiceError = TokenError::Invalid("InvalidSignature".to_string()).into();
        assert_eq!(e.code(), "UNAUTHORIZED");
        assert_eq!(e.to_string(), "invalid token");
    }
}
