// Core types shared by the upload pipeline, the store and the CLI

pub mod context;
pub mod fields;
pub mod record;

pub use context::ContextLevel;
pub use record::{ActingUser, CommentRecord};
