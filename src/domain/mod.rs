pub mod analysis;
pub mod category;
pub mod user;

pub use analysis::{
    ClassificationRequest, ClassificationResult, InstapaperOutcome, TodoistOutcome,
    OTHER_CATEGORY,
};
pub use category::{branch, Category, CategoryNode, CategoryTree};
pub use user::{ApiKey, PublicApiKey, PublicUser, User, UserSettings};
