//! Comment module
//!
//! Comment entity, construction and submission validation.

pub mod builder;
pub mod model;
pub mod validator;

pub use builder::CommentBuilder;
pub use model::*;
pub use validator::CommentValidator;
