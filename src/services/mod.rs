//! Services layer - Business logic
//!
//! Services implement the rules of the learning tracker on top of the
//! document repository:
//! - Seeding the topic catalog from a JSON file
//! - Catalog reads, user registration, progress tracking, study sessions

pub mod catalog;
pub mod password;
pub mod progress;
pub mod seed;
pub mod session;
pub mod user;

pub use catalog::{CatalogService, CatalogServiceError};
pub use password::hash_password;
pub use progress::{ProgressService, ProgressServiceError};
pub use seed::{SeedCatalog, SeedError, SeedLoader, SeedReport, SkippedEntry};
pub use session::{SessionService, SessionServiceError};
pub use user::{UserService, UserServiceError};
