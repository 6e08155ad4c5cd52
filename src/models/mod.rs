pub mod messages;
pub mod tokens;
