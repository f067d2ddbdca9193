pub mod error_helpers;
pub mod logger;

pub use error_helpers::{
    extract_error_message, format_error, get_error_stack,
    is_insufficient_balance_or_allowance_error, ErrorResponse,
};
