//! Postgres store backed by `sqlx::PgPool`.
//!
//! Each mutation opens its own transaction; the `*_tx` helpers below only ever
//! run inside one. Constraint violations are mapped back to [`RepoError`] by
//! constraint name.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use tracing::debug;

use super::{
    CharacterRepo, RepoError, RepoResult, ReviewRepo, SitcomRepo, UniqueField, UserRepo,
};
use crate::{
    auth::repo_types::{NewUser, User},
    characters::repo_types::{Character, CharacterPatch, NewCharacter},
    reviews::repo_types::{NewReview, Review, ReviewPatch},
    sitcoms::repo_types::{round_rating, NewSitcom, Sitcom, SitcomPatch},
};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

const SITCOM_SELECT: &str = r#"
    SELECT s.id, s.title, s.creator, s.genre, s.years_active, s.number_of_seasons,
           s.synopsis, s.owner_id,
           (SELECT AVG(r.score)::float8 FROM reviews r WHERE r.sitcom_id = s.id) AS average_rating,
           s.created_at, s.updated_at
      FROM sitcoms s
"#;

const CHARACTER_COLUMNS: &str =
    "id, name, actor, role, description, sitcom_id, created_at, updated_at";

const REVIEW_COLUMNS: &str = "id, score, text, author_id, sitcom_id, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded migrations in `./migrations`.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }

    async fn begin(&self) -> RepoResult<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }
}

/// Translate constraint violations into domain-level repo errors.
fn map_db_err(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some("users_username_key") => Some(UniqueField::Username),
                Some("users_email_key") => Some(UniqueField::Email),
                Some("sitcoms_title_key") => Some(UniqueField::SitcomTitle),
                Some("reviews_author_sitcom_key") => Some(UniqueField::ReviewAuthorSitcom),
                _ => None,
            };
            if let Some(field) = field {
                return RepoError::Conflict(field);
            }
        }
        if db.is_foreign_key_violation() {
            let entity = match db.constraint() {
                Some(c) if c.contains("sitcom_id") => "Sitcom",
                _ => "User",
            };
            return RepoError::MissingReference(entity);
        }
    }
    RepoError::Database(err)
}

fn with_rounded_rating(mut sitcom: Sitcom) -> Sitcom {
    sitcom.average_rating = sitcom.average_rating.map(round_rating);
    sitcom
}

// ---- Transaction helpers ----

async fn select_sitcom_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> RepoResult<Option<Sitcom>> {
    let sql = format!("{SITCOM_SELECT} WHERE s.id = $1");
    let row = sqlx::query_as::<_, Sitcom>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_err)?;
    Ok(row.map(with_rounded_rating))
}

/// Lock the sitcom row for the rest of the transaction.
async fn lock_sitcom_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> RepoResult<Option<Sitcom>> {
    let row = sqlx::query_as::<_, Sitcom>(
        r#"
        SELECT id, title, creator, genre, years_active, number_of_seasons, synopsis,
               owner_id, NULL::float8 AS average_rating, created_at, updated_at
          FROM sitcoms
         WHERE id = $1
           FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_db_err)?;
    Ok(row)
}

async fn lock_character_tx(
    tx: &mut Transaction<'_, Postgres>,
    sitcom_id: i64,
    id: i64,
) -> RepoResult<Option<Character>> {
    let sql = format!(
        "SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = $1 AND sitcom_id = $2 FOR UPDATE"
    );
    let row = sqlx::query_as::<_, Character>(&sql)
        .bind(id)
        .bind(sitcom_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_err)?;
    Ok(row)
}

async fn lock_review_tx(
    tx: &mut Transaction<'_, Postgres>,
    sitcom_id: i64,
    id: i64,
) -> RepoResult<Option<Review>> {
    let sql = format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1 AND sitcom_id = $2 FOR UPDATE"
    );
    let row = sqlx::query_as::<_, Review>(&sql)
        .bind(id)
        .bind(sitcom_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_err)?;
    Ok(row)
}

#[async_trait]
impl UserRepo for PgStore {
    async fn insert_user(&self, new: NewUser) -> RepoResult<User> {
        let mut tx = self.begin().await?;
        let sql = format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?;
        tx.commit().await?;
        debug!(user_id = user.id, "user row inserted");
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_login(&self, login: &str) -> RepoResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1 ORDER BY id LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl SitcomRepo for PgStore {
    async fn insert_sitcom(&self, new: NewSitcom) -> RepoResult<Sitcom> {
        let mut tx = self.begin().await?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sitcoms (title, creator, genre, years_active, number_of_seasons, synopsis, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&new.title)
        .bind(&new.creator)
        .bind(&new.genre)
        .bind(&new.years_active)
        .bind(new.number_of_seasons)
        .bind(&new.synopsis)
        .bind(new.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;

        let sitcom = select_sitcom_tx(&mut tx, id)
            .await?
            .ok_or(RepoError::MissingReference("Sitcom"))?;
        tx.commit().await?;
        Ok(sitcom)
    }

    async fn get_sitcom(&self, id: i64) -> RepoResult<Option<Sitcom>> {
        let sql = format!("{SITCOM_SELECT} WHERE s.id = $1");
        let row = sqlx::query_as::<_, Sitcom>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(with_rounded_rating))
    }

    async fn list_sitcoms(&self) -> RepoResult<Vec<Sitcom>> {
        let sql = format!("{SITCOM_SELECT} ORDER BY s.id ASC");
        let rows = sqlx::query_as::<_, Sitcom>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(with_rounded_rating).collect())
    }

    async fn update_sitcom(&self, id: i64, patch: SitcomPatch) -> RepoResult<Option<Sitcom>> {
        let mut tx = self.begin().await?;
        let Some(mut sitcom) = lock_sitcom_tx(&mut tx, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut sitcom);

        sqlx::query(
            r#"
            UPDATE sitcoms
               SET title = $2, creator = $3, genre = $4, years_active = $5,
                   number_of_seasons = $6, synopsis = $7, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&sitcom.title)
        .bind(&sitcom.creator)
        .bind(&sitcom.genre)
        .bind(&sitcom.years_active)
        .bind(sitcom.number_of_seasons)
        .bind(&sitcom.synopsis)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

        let updated = select_sitcom_tx(&mut tx, id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_sitcom(&self, id: i64) -> RepoResult<bool> {
        let mut tx = self.begin().await?;
        if lock_sitcom_tx(&mut tx, id).await?.is_none() {
            return Ok(false);
        }

        let reviews = sqlx::query("DELETE FROM reviews WHERE sitcom_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?
            .rows_affected();
        let characters = sqlx::query("DELETE FROM characters WHERE sitcom_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?
            .rows_affected();
        sqlx::query("DELETE FROM sitcoms WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

        tx.commit().await?;
        debug!(sitcom_id = id, reviews, characters, "sitcom deleted with dependents");
        Ok(true)
    }
}

#[async_trait]
impl CharacterRepo for PgStore {
    async fn insert_character(&self, new: NewCharacter) -> RepoResult<Character> {
        let mut tx = self.begin().await?;
        let sql = format!(
            r#"
            INSERT INTO characters (name, actor, role, description, sitcom_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CHARACTER_COLUMNS}
            "#
        );
        let character = sqlx::query_as::<_, Character>(&sql)
            .bind(&new.name)
            .bind(&new.actor)
            .bind(&new.role)
            .bind(&new.description)
            .bind(new.sitcom_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?;
        tx.commit().await?;
        Ok(character)
    }

    async fn list_characters(&self, sitcom_id: i64) -> RepoResult<Vec<Character>> {
        let sql = format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE sitcom_id = $1 ORDER BY id ASC"
        );
        let rows = sqlx::query_as::<_, Character>(&sql)
            .bind(sitcom_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_character(&self, sitcom_id: i64, id: i64) -> RepoResult<Option<Character>> {
        let sql =
            format!("SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = $1 AND sitcom_id = $2");
        let row = sqlx::query_as::<_, Character>(&sql)
            .bind(id)
            .bind(sitcom_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_character(
        &self,
        sitcom_id: i64,
        id: i64,
        patch: CharacterPatch,
    ) -> RepoResult<Option<Character>> {
        let mut tx = self.begin().await?;
        let Some(mut character) = lock_character_tx(&mut tx, sitcom_id, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut character);

        let sql = format!(
            r#"
            UPDATE characters
               SET name = $2, actor = $3, role = $4, description = $5, updated_at = now()
             WHERE id = $1
         RETURNING {CHARACTER_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Character>(&sql)
            .bind(id)
            .bind(&character.name)
            .bind(&character.actor)
            .bind(&character.role)
            .bind(&character.description)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?;
        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_character(&self, sitcom_id: i64, id: i64) -> RepoResult<bool> {
        let mut tx = self.begin().await?;
        let affected = sqlx::query("DELETE FROM characters WHERE id = $1 AND sitcom_id = $2")
            .bind(id)
            .bind(sitcom_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?
            .rows_affected();
        tx.commit().await?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl ReviewRepo for PgStore {
    async fn insert_review(&self, new: NewReview) -> RepoResult<Review> {
        let mut tx = self.begin().await?;
        let sql = format!(
            r#"
            INSERT INTO reviews (score, text, author_id, sitcom_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "#
        );
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(new.score)
            .bind(&new.text)
            .bind(new.author_id)
            .bind(new.sitcom_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?;
        tx.commit().await?;
        Ok(review)
    }

    async fn list_reviews(&self, sitcom_id: i64) -> RepoResult<Vec<Review>> {
        let sql =
            format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE sitcom_id = $1 ORDER BY id ASC");
        let rows = sqlx::query_as::<_, Review>(&sql)
            .bind(sitcom_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_review(&self, sitcom_id: i64, id: i64) -> RepoResult<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1 AND sitcom_id = $2");
        let row = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .bind(sitcom_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_review(
        &self,
        sitcom_id: i64,
        id: i64,
        patch: ReviewPatch,
    ) -> RepoResult<Option<Review>> {
        let mut tx = self.begin().await?;
        let Some(mut review) = lock_review_tx(&mut tx, sitcom_id, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut review);

        let sql = format!(
            r#"
            UPDATE reviews
               SET score = $2, text = $3, updated_at = now()
             WHERE id = $1
         RETURNING {REVIEW_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .bind(review.score)
            .bind(&review.text)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?;
        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_review(&self, sitcom_id: i64, id: i64) -> RepoResult<bool> {
        let mut tx = self.begin().await?;
        let affected = sqlx::query("DELETE FROM reviews WHERE id = $1 AND sitcom_id = $2")
            .bind(id)
            .bind(sitcom_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?
            .rows_affected();
        tx.commit().await?;
        Ok(affected > 0)
    }
}
