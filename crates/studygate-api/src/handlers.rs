//! Request handlers.

pub mod health;
pub mod quota;

pub use health::*;
pub use quota::*;
