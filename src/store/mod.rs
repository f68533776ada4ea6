//! Per-entity store interfaces and their implementations.
//!
//! Every mutating method is atomic: it either applies completely or leaves the
//! store untouched. Uniqueness is enforced by the store itself (constraint or
//! lock), never only by a caller's pre-check.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    auth::repo_types::{NewUser, User},
    characters::repo_types::{Character, CharacterPatch, NewCharacter},
    reviews::repo_types::{NewReview, Review, ReviewPatch},
    sitcoms::repo_types::{NewSitcom, Sitcom, SitcomPatch},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Unique constraints a write can trip over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    SitcomTitle,
    ReviewAuthorSitcom,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
            UniqueField::SitcomTitle => "sitcom title",
            UniqueField::ReviewAuthorSitcom => "review for this author and sitcom",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0} already exists")]
    Conflict(UniqueField),

    /// A foreign key points at a row that does not exist (or vanished mid-write).
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a user; `Conflict` on a taken username or email.
    async fn insert_user(&self, new: NewUser) -> RepoResult<User>;
    async fn find_user(&self, id: i64) -> RepoResult<Option<User>>;
    /// Look a user up by username or email.
    async fn find_user_by_login(&self, login: &str) -> RepoResult<Option<User>>;
}

#[async_trait]
pub trait SitcomRepo: Send + Sync {
    async fn insert_sitcom(&self, new: NewSitcom) -> RepoResult<Sitcom>;
    async fn get_sitcom(&self, id: i64) -> RepoResult<Option<Sitcom>>;
    /// All sitcoms in insertion order.
    async fn list_sitcoms(&self) -> RepoResult<Vec<Sitcom>>;
    async fn update_sitcom(&self, id: i64, patch: SitcomPatch) -> RepoResult<Option<Sitcom>>;
    /// Delete the sitcom together with its characters and reviews.
    async fn delete_sitcom(&self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait CharacterRepo: Send + Sync {
    async fn insert_character(&self, new: NewCharacter) -> RepoResult<Character>;
    async fn list_characters(&self, sitcom_id: i64) -> RepoResult<Vec<Character>>;
    /// `None` if the character is absent or belongs to another sitcom.
    async fn get_character(&self, sitcom_id: i64, id: i64) -> RepoResult<Option<Character>>;
    async fn update_character(
        &self,
        sitcom_id: i64,
        id: i64,
        patch: CharacterPatch,
    ) -> RepoResult<Option<Character>>;
    async fn delete_character(&self, sitcom_id: i64, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait ReviewRepo: Send + Sync {
    /// Insert a review; `Conflict` if the author already reviewed the sitcom.
    async fn insert_review(&self, new: NewReview) -> RepoResult<Review>;
    async fn list_reviews(&self, sitcom_id: i64) -> RepoResult<Vec<Review>>;
    async fn get_review(&self, sitcom_id: i64, id: i64) -> RepoResult<Option<Review>>;
    async fn update_review(
        &self,
        sitcom_id: i64,
        id: i64,
        patch: ReviewPatch,
    ) -> RepoResult<Option<Review>>;
    async fn delete_review(&self, sitcom_id: i64, id: i64) -> RepoResult<bool>;
}

/// Everything the HTTP layer needs from storage.
pub trait Store: UserRepo + SitcomRepo + CharacterRepo + ReviewRepo {}

impl<T> Store for T where T: UserRepo + SitcomRepo + CharacterRepo + ReviewRepo {}
