//! In-memory store. One `RwLock` guards all tables, so every write is atomic
//! and uniqueness checks cannot race with inserts.

use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    CharacterRepo, RepoError, RepoResult, ReviewRepo, SitcomRepo, UniqueField, UserRepo,
};
use crate::{
    auth::repo_types::{NewUser, User},
    characters::repo_types::{Character, CharacterPatch, NewCharacter},
    reviews::repo_types::{NewReview, Review, ReviewPatch},
    sitcoms::repo_types::{average_rating, NewSitcom, Sitcom, SitcomPatch},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    sitcoms: BTreeMap<i64, Sitcom>,
    characters: BTreeMap<i64, Character>,
    reviews: BTreeMap<i64, Review>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn with_rating(&self, sitcom: &Sitcom) -> Sitcom {
        let scores: Vec<i32> = self
            .reviews
            .values()
            .filter(|r| r.sitcom_id == sitcom.id)
            .map(|r| r.score)
            .collect();
        Sitcom {
            average_rating: average_rating(&scores),
            ..sitcom.clone()
        }
    }

    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.sitcoms
            .values()
            .any(|s| s.title == title && Some(s.id) != except)
    }
}

/// Timestamp for a mutation, never earlier than the row's `created_at`.
fn touched(created_at: OffsetDateTime) -> OffsetDateTime {
    OffsetDateTime::now_utc().max(created_at)
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> RepoResult<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.username == new.username) {
            return Err(RepoError::Conflict(UniqueField::Username));
        }
        if t.users.values().any(|u| u.email == new.email) {
            return Err(RepoError::Conflict(UniqueField::Email));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: t.allocate_id(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> RepoResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users
            .values()
            .find(|u| u.username == login || u.email == login)
            .cloned())
    }
}

#[async_trait]
impl SitcomRepo for MemoryStore {
    async fn insert_sitcom(&self, new: NewSitcom) -> RepoResult<Sitcom> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&new.owner_id) {
            return Err(RepoError::MissingReference("User"));
        }
        if t.title_taken(&new.title, None) {
            return Err(RepoError::Conflict(UniqueField::SitcomTitle));
        }
        let now = OffsetDateTime::now_utc();
        let sitcom = Sitcom {
            id: t.allocate_id(),
            title: new.title,
            creator: new.creator,
            genre: new.genre,
            years_active: new.years_active,
            number_of_seasons: new.number_of_seasons,
            synopsis: new.synopsis,
            owner_id: new.owner_id,
            average_rating: None,
            created_at: now,
            updated_at: now,
        };
        t.sitcoms.insert(sitcom.id, sitcom.clone());
        Ok(sitcom)
    }

    async fn get_sitcom(&self, id: i64) -> RepoResult<Option<Sitcom>> {
        let t = self.tables.read().await;
        Ok(t.sitcoms.get(&id).map(|s| t.with_rating(s)))
    }

    async fn list_sitcoms(&self) -> RepoResult<Vec<Sitcom>> {
        let t = self.tables.read().await;
        Ok(t.sitcoms.values().map(|s| t.with_rating(s)).collect())
    }

    async fn update_sitcom(&self, id: i64, patch: SitcomPatch) -> RepoResult<Option<Sitcom>> {
        let mut t = self.tables.write().await;
        let Some(mut sitcom) = t.sitcoms.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply(&mut sitcom);
        if t.title_taken(&sitcom.title, Some(id)) {
            return Err(RepoError::Conflict(UniqueField::SitcomTitle));
        }
        sitcom.updated_at = touched(sitcom.created_at);
        t.sitcoms.insert(id, sitcom.clone());
        Ok(Some(t.with_rating(&sitcom)))
    }

    async fn delete_sitcom(&self, id: i64) -> RepoResult<bool> {
        let mut t = self.tables.write().await;
        if t.sitcoms.remove(&id).is_none() {
            return Ok(false);
        }
        t.characters.retain(|_, c| c.sitcom_id != id);
        t.reviews.retain(|_, r| r.sitcom_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CharacterRepo for MemoryStore {
    async fn insert_character(&self, new: NewCharacter) -> RepoResult<Character> {
        let mut t = self.tables.write().await;
        if !t.sitcoms.contains_key(&new.sitcom_id) {
            return Err(RepoError::MissingReference("Sitcom"));
        }
        let now = OffsetDateTime::now_utc();
        let character = Character {
            id: t.allocate_id(),
            name: new.name,
            actor: new.actor,
            role: new.role,
            description: new.description,
            sitcom_id: new.sitcom_id,
            created_at: now,
            updated_at: now,
        };
        t.characters.insert(character.id, character.clone());
        Ok(character)
    }

    async fn list_characters(&self, sitcom_id: i64) -> RepoResult<Vec<Character>> {
        let t = self.tables.read().await;
        Ok(t.characters
            .values()
            .filter(|c| c.sitcom_id == sitcom_id)
            .cloned()
            .collect())
    }

    async fn get_character(&self, sitcom_id: i64, id: i64) -> RepoResult<Option<Character>> {
        let t = self.tables.read().await;
        Ok(t.characters
            .get(&id)
            .filter(|c| c.sitcom_id == sitcom_id)
            .cloned())
    }

    async fn update_character(
        &self,
        sitcom_id: i64,
        id: i64,
        patch: CharacterPatch,
    ) -> RepoResult<Option<Character>> {
        let mut t = self.tables.write().await;
        let Some(character) = t.characters.get_mut(&id).filter(|c| c.sitcom_id == sitcom_id)
        else {
            return Ok(None);
        };
        patch.apply(character);
        character.updated_at = touched(character.created_at);
        Ok(Some(character.clone()))
    }

    async fn delete_character(&self, sitcom_id: i64, id: i64) -> RepoResult<bool> {
        let mut t = self.tables.write().await;
        let belongs = t.characters.get(&id).is_some_and(|c| c.sitcom_id == sitcom_id);
        if belongs {
            t.characters.remove(&id);
        }
        Ok(belongs)
    }
}

#[async_trait]
impl ReviewRepo for MemoryStore {
    async fn insert_review(&self, new: NewReview) -> RepoResult<Review> {
        let mut t = self.tables.write().await;
        if !t.sitcoms.contains_key(&new.sitcom_id) {
            return Err(RepoError::MissingReference("Sitcom"));
        }
        if !t.users.contains_key(&new.author_id) {
            return Err(RepoError::MissingReference("User"));
        }
        let duplicate = t
            .reviews
            .values()
            .any(|r| r.author_id == new.author_id && r.sitcom_id == new.sitcom_id);
        if duplicate {
            return Err(RepoError::Conflict(UniqueField::ReviewAuthorSitcom));
        }
        let now = OffsetDateTime::now_utc();
        let review = Review {
            id: t.allocate_id(),
            score: new.score,
            text: new.text,
            author_id: new.author_id,
            sitcom_id: new.sitcom_id,
            created_at: now,
            updated_at: now,
        };
        t.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn list_reviews(&self, sitcom_id: i64) -> RepoResult<Vec<Review>> {
        let t = self.tables.read().await;
        Ok(t.reviews
            .values()
            .filter(|r| r.sitcom_id == sitcom_id)
            .cloned()
            .collect())
    }

    async fn get_review(&self, sitcom_id: i64, id: i64) -> RepoResult<Option<Review>> {
        let t = self.tables.read().await;
        Ok(t.reviews.get(&id).filter(|r| r.sitcom_id == sitcom_id).cloned())
    }

    async fn update_review(
        &self,
        sitcom_id: i64,
        id: i64,
        patch: ReviewPatch,
    ) -> RepoResult<Option<Review>> {
        let mut t = self.tables.write().await;
        let Some(review) = t.reviews.get_mut(&id).filter(|r| r.sitcom_id == sitcom_id) else {
            return Ok(None);
        };
        patch.apply(review);
        review.updated_at = touched(review.created_at);
        Ok(Some(review.clone()))
    }

    async fn delete_review(&self, sitcom_id: i64, id: i64) -> RepoResult<bool> {
        let mut t = self.tables.write().await;
        let belongs = t.reviews.get(&id).is_some_and(|r| r.sitcom_id == sitcom_id);
        if belongs {
            t.reviews.remove(&id);
        }
        Ok(belongs)
    }
}
