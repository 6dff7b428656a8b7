pub mod web_order;

use thiserror::Error;

pub use web_order::{WebOrderContact, WebOrderForm, WebOrderIntake, WebPositionBlock};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("form field `{field}` has an unsupported value `{value}`")]
    InvalidAnswer { field: String, value: String },
    #[error("form is missing {0}")]
    Incomplete(String),
    #[error("form payload is malformed: {0}")]
    Malformed(String),
}
