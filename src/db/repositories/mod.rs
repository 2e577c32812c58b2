//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod admin_user;
pub mod blog;
pub mod contact;
pub mod cv_file;
pub mod project;
pub mod resume;
pub mod skill;

pub use admin_user::{AdminUserRepository, SqlxAdminUserRepository};
pub use blog::{BlogRepository, SqlxBlogRepository};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use cv_file::{CvFileRepository, SqlxCvFileRepository};
pub use project::{ProjectRepository, SqlxProjectRepository};
pub use resume::{ResumeRepository, SqlxResumeRepository};
pub use skill::{
    SkillCategoryRepository, SkillRepository, SqlxSkillCategoryRepository, SqlxSkillRepository,
};
