//! Services layer - Business logic
//!
//! Services validate input, enforce uniqueness and existence rules and
//! coordinate repositories with the file storage and notifier
//! collaborators. HTTP concerns stay in `api`.

pub mod auth;
pub mod blog;
pub mod contact;
pub mod error;
pub mod locale;
pub mod notifier;
pub mod password;
pub mod project;
pub mod rate_limiter;
pub mod resume;
pub mod skill;
pub mod storage;
pub mod token;
pub mod upload;
pub mod validation;

pub use auth::{AuthError, AuthService, LoginInput, LoginResponse};
pub use blog::BlogService;
pub use contact::ContactService;
pub use error::ServiceError;
pub use locale::{localize, localize_all, Locale};
pub use notifier::{DynNotifier, Notifier, TelegramNotifier};
pub use password::{hash_password, verify_password};
pub use project::ProjectService;
pub use rate_limiter::{RateLimitDecision, RateLimiters, SlidingWindowLimiter};
pub use resume::ResumeService;
pub use skill::SkillService;
pub use storage::{create_storage, DynFileStorage, FileStorage, LocalStorage, SupabaseStorage};
pub use token::{Claims, TokenService};
pub use upload::{validate_image, UploadError, ValidatedImage};
pub use validation::{FieldError, ValidationErrors};
