//! Router Errors
//!
//! Faults raised by the cost model and allocation search. Unfilled
//! backtests and empty sweeps are valid outcomes, not errors, and never
//! appear here.

/// Which input failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    AskPrice,
    AskSize,
    Fee,
    Rebate,
    OrderSize,
    Allocation,
    LotStep,
    LambdaOver,
    LambdaUnder,
    ThetaQueue,
}

impl InputField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AskPrice => "ask price",
            Self::AskSize => "ask size",
            Self::Fee => "fee",
            Self::Rebate => "rebate",
            Self::OrderSize => "order size",
            Self::Allocation => "allocated quantity",
            Self::LotStep => "lot step",
            Self::LambdaOver => "lambda_over",
            Self::LambdaUnder => "lambda_under",
            Self::ThetaQueue => "theta_queue",
        }
    }
}

/// Error returned by the routing core.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterError {
    /// Negative or non-finite price, size, fee, rebate, order size, lot step or
    /// penalty coefficient.
    InvalidInput {
        field: InputField,
        /// Venue the value belongs to, if it came from a quote.
        venue: Option<String>,
        /// Offending value, rendered for the message.
        value: String,
    },
    /// Allocation vector does not line up with the venue list.
    AllocationMismatch { allocation_len: usize, venue_count: usize },
}

impl RouterError {
    pub fn invalid(field: InputField, value: impl ToString) -> Self {
        Self::InvalidInput {
            field,
            venue: None,
            value: value.to_string(),
        }
    }

    pub fn invalid_quote(field: InputField, venue: &str, value: impl ToString) -> Self {
        Self::InvalidInput {
            field,
            venue: Some(venue.to_string()),
            value: value.to_string(),
        }
    }
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput {
                field,
                venue: Some(venue),
                value,
            } => write!(f, "invalid input: {} {} at venue {}", field.name(), value, venue),
            Self::InvalidInput {
                field,
                venue: None,
                value,
            } => write!(f, "invalid input: {} {}", field.name(), value),
            Self::AllocationMismatch {
                allocation_len,
                venue_count,
            } => write!(
                f,
                "invalid input: allocation has {} entries for {} venues",
                allocation_len, venue_count
            ),
        }
    }
}

impl std::error::Error for RouterError {}

pub type RouterResult<T> = Result<T, RouterError>;
