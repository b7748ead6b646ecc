//! Data models
//!
//! This module contains the projections used throughout studytrack.
//! Models represent:
//! - Catalog entries (Category, Topic) written by the seed loader
//! - API request/response types (users, progress, study sessions)
//! - Stored documents (`*Document`), which never carry their own key
//! - The validation engine every projection is built through

mod category;
mod patch;
mod progress;
mod session;
mod topic;
mod user;
pub mod validation;

pub use category::{Category, CategoryDocument};
pub use patch::Patch;
pub use progress::{ProgressCreate, ProgressDocument, ProgressResponse, ProgressUpdate};
pub use session::{SessionDocument, SessionItem, SessionRequest, SessionResponse};
pub use topic::{check_category_id, check_details, check_title, TopicCreate, TopicDocument, TopicResponse};
pub use user::{UserCreate, UserDocument, UserResponse};
pub use validation::{FieldError, Fields, Rule, Schema, ValidationError, Validator};
