//! Data models
//!
//! Database entities and the API input types used to create and update them.
//! Entities serialize with camelCase keys; translatable fields carry an
//! `En`/`Ru`/`Uz` suffix (see `services::locale`).

mod admin_user;
mod blog;
mod contact;
mod cv_file;
mod project;
mod resume;
mod skill;

pub use admin_user::{AdminUser, UserRole, UserSummary};
pub use blog::{BlogPost, CreateBlogPostInput, UpdateBlogPostInput};
pub use contact::{
    Contact, ContactIcon, ContactMessageInput, ContactType, CreateContactInput, UpdateContactInput,
};
pub use cv_file::{CvFile, DEFAULT_CV_KEY};
pub use project::{CreateProjectInput, Project, UpdateProjectInput};
pub use resume::{CreateResumeSectionInput, ResumeSection, UpdateResumeSectionInput};
pub use skill::{
    CreateSkillCategoryInput, CreateSkillInput, Skill, SkillCategory, SkillCategoryWithSkills,
    UpdateSkillCategoryInput, UpdateSkillInput,
};

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes "absent" from `null`.
///
/// Use with `#[serde(default)]`: absent gives `None`, `null` gives
/// `Some(None)` and a value gives `Some(Some(v))`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
