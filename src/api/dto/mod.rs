//! Data Transfer Objects for REST request/response serialization.
//!
//! Request enums (statuses, roles) arrive as plain strings and are parsed
//! after extraction, so unknown values surface as structured 400 errors
//! instead of extractor rejections.

pub mod common_dto;
pub mod task_dto;
pub mod template_dto;
pub mod user_dto;

pub use common_dto::*;
pub use task_dto::*;
pub use template_dto::*;
pub use user_dto::*;
