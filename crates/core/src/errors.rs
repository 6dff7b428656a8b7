use thiserror::Error;

use crate::flows::FlowError;
use crate::intake::IntakeError;
use crate::pricing::PricingError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unprocessable: {message}")]
    Unprocessable { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Unprocessable { .. } => {
                "No price is configured for this item, quantity and discount combination."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Unprocessable { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unprocessable { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = || "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::Pricing(
                error @ PricingError::TierNotFound { .. },
            )) => Self::Unprocessable { message: error.to_string(), correlation_id: unassigned() },
            ApplicationError::Domain(DomainError::Pricing(error)) => {
                Self::Internal { message: error.to_string(), correlation_id: unassigned() }
            }
            ApplicationError::Domain(DomainError::Flow(
                error @ FlowError::IncompleteRequest { .. },
            )) => Self::Internal { message: error.to_string(), correlation_id: unassigned() },
            ApplicationError::Domain(DomainError::Flow(error)) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned() }
            }
            ApplicationError::Domain(DomainError::Intake(error)) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned() }
            }
            ApplicationError::Domain(DomainError::InvariantViolation(_)) => Self::BadRequest {
                message: "domain validation failed".to_owned(),
                correlation_id: unassigned(),
            },
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: unassigned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: unassigned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::catalog::DiscountClass;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::flows::{ConversationStep, FlowError};
    use crate::intake::IntakeError;
    use crate::pricing::PricingError;

    #[test]
    fn tier_not_found_maps_to_unprocessable() {
        let interface = ApplicationError::from(DomainError::from(PricingError::TierNotFound {
            item: "ゲームシャツ".to_owned(),
            discount_class: DiscountClass::Early,
            quantity: 10,
        }))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::Unprocessable { ref correlation_id, ref message }
                if correlation_id == "req-1" && message.contains("ゲームシャツ")
        ));
    }

    #[test]
    fn invalid_answer_maps_to_bad_request_with_user_safe_message() {
        let interface = ApplicationError::from(DomainError::from(FlowError::InvalidAnswer {
            step: ConversationStep::AwaitQuantity,
            answer: "25".to_owned(),
        }))
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn intake_errors_are_bad_requests() {
        let interface = ApplicationError::from(DomainError::from(IntakeError::Incomplete(
            "print position".to_owned(),
        )))
        .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
    }

    #[test]
    fn incomplete_engine_request_is_internal() {
        let interface = ApplicationError::from(DomainError::from(
            PricingError::IncompleteRequest("no active print position".to_owned()),
        ))
        .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface =
            ApplicationError::Persistence("sink unavailable".to_owned()).into_interface("req-5");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }
}
