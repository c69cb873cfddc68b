//! HTTP handlers for the loan submission service

pub mod health;
pub mod submission;

pub use health::health_check;
pub use submission::{invoke_submission, submit_loan_application};
