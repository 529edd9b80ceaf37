pub mod password;
pub mod token;

pub use token::{issue_token, validate_token, Claims};
