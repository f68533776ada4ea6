use serde_json::Value;
use tracing::{info, warn};

use super::{
    dto::{CreateSitcomRequest, UpdateSitcomRequest},
    repo_types::{NewSitcom, Sitcom, SitcomPatch},
};
use crate::{
    access::{self, Access},
    error::AppError,
    store::Store,
    validate,
};

fn parse_seasons(value: &Value) -> Result<i32, AppError> {
    let seasons = validate::integer(value, "Number of seasons must be an integer")?;
    if seasons < 0 {
        return Err(AppError::InvalidInput(
            "Number of seasons cannot be negative".into(),
        ));
    }
    i32::try_from(seasons)
        .map_err(|_| AppError::InvalidInput("Number of seasons is out of range".into()))
}

/// Fetch a sitcom or fail with `NotFound`.
pub(crate) async fn find_sitcom(store: &dyn Store, id: i64) -> Result<Sitcom, AppError> {
    store
        .get_sitcom(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sitcom not found".into()))
}

/// Fetch a sitcom and require `caller_id` to own it; `forbidden` is the denial message.
pub(crate) async fn owned_sitcom(
    store: &dyn Store,
    id: i64,
    caller_id: i64,
    forbidden: &str,
) -> Result<Sitcom, AppError> {
    let sitcom = find_sitcom(store, id).await?;
    match access::sitcom_ownership(caller_id, &sitcom) {
        Access::Allow => Ok(sitcom),
        Access::Deny(reason) => {
            warn!(sitcom_id = id, caller_id, owner_id = sitcom.owner_id, ?reason, "ownership denied");
            Err(AppError::Forbidden(forbidden.into()))
        }
    }
}

pub async fn create_sitcom(
    store: &dyn Store,
    owner_id: i64,
    payload: CreateSitcomRequest,
) -> Result<Sitcom, AppError> {
    let title = validate::required_text(payload.title, "Title is required")?;
    let genre = validate::required_text(payload.genre, "Genre is required")?;
    let number_of_seasons = payload
        .number_of_seasons
        .filter(|v| !v.is_null())
        .map(|v| parse_seasons(&v))
        .transpose()?;

    let sitcom = store
        .insert_sitcom(NewSitcom {
            owner_id,
            title,
            genre,
            creator: payload.creator,
            years_active: payload.years_active,
            number_of_seasons,
            synopsis: payload.synopsis,
        })
        .await
        .map_err(|e| AppError::from_repo(e, "Error creating sitcom"))?;

    info!(sitcom_id = sitcom.id, owner_id, title = %sitcom.title, "sitcom created");
    Ok(sitcom)
}

pub async fn get_sitcom(store: &dyn Store, id: i64) -> Result<Sitcom, AppError> {
    find_sitcom(store, id).await
}

pub async fn list_sitcoms(store: &dyn Store) -> Result<Vec<Sitcom>, AppError> {
    Ok(store.list_sitcoms().await?)
}

pub async fn update_sitcom(
    store: &dyn Store,
    id: i64,
    caller_id: i64,
    payload: UpdateSitcomRequest,
) -> Result<Sitcom, AppError> {
    owned_sitcom(store, id, caller_id, "Forbidden: You can only update sitcoms you created")
        .await?;
    if payload.is_empty() {
        return Err(AppError::InvalidInput("No input data provided".into()));
    }

    let patch = SitcomPatch {
        title: validate::patched_text(payload.title, "Title cannot be empty")?,
        genre: validate::patched_text(payload.genre, "Genre cannot be empty")?,
        creator: payload.creator,
        years_active: payload.years_active,
        number_of_seasons: payload
            .number_of_seasons
            .map(|v| v.map(|v| parse_seasons(&v)).transpose())
            .transpose()?,
        synopsis: payload.synopsis,
    };

    let sitcom = store
        .update_sitcom(id, patch)
        .await
        .map_err(|e| AppError::from_repo(e, "Error updating sitcom"))?
        .ok_or_else(|| AppError::NotFound("Sitcom not found".into()))?;
    info!(sitcom_id = id, caller_id, "sitcom updated");
    Ok(sitcom)
}

/// Delete a sitcom; its characters and reviews go with it.
pub async fn delete_sitcom(store: &dyn Store, id: i64, caller_id: i64) -> Result<(), AppError> {
    owned_sitcom(store, id, caller_id, "Forbidden: You can only delete sitcoms you created")
        .await?;
    let deleted = store
        .delete_sitcom(id)
        .await
        .map_err(|e| AppError::from_repo(e, "Error deleting sitcom"))?;
    if !deleted {
        return Err(AppError::NotFound("Sitcom not found".into()));
    }
    info!(sitcom_id = id, caller_id, "sitcom deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        auth::repo_types::NewUser,
        store::{MemoryStore, UserRepo},
    };

    async fn user(store: &MemoryStore, name: &str) -> i64 {
        store
            .insert_user(NewUser {
                username: name.into(),
                email: format!("{name}@x.com"),
                password_hash: "hash".into(),
            })
            .await
            .unwrap()
            .id
    }

    fn friends() -> CreateSitcomRequest {
        CreateSitcomRequest {
            title: Some("Friends".into()),
            genre: Some("Comedy".into()),
            creator: Some("David Crane".into()),
            number_of_seasons: Some(json!(10)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_links_sitcom_to_owner() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let sitcom = create_sitcom(&store, alice, friends()).await.unwrap();
        assert_eq!(sitcom.owner_id, alice);
        assert_eq!(sitcom.number_of_seasons, Some(10));
        assert_eq!(sitcom.average_rating, None);
    }

    #[tokio::test]
    async fn create_requires_title_and_genre() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;

        let err = create_sitcom(
            &store,
            alice,
            CreateSitcomRequest {
                title: None,
                ..friends()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "Title is required"));

        let err = create_sitcom(
            &store,
            alice,
            CreateSitcomRequest {
                genre: Some(String::new()),
                ..friends()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "Genre is required"));
    }

    #[tokio::test]
    async fn negative_or_non_integer_seasons_create_nothing() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;

        for bad in [json!(-1), json!("many"), json!(2.5)] {
            let err = create_sitcom(
                &store,
                alice,
                CreateSitcomRequest {
                    number_of_seasons: Some(bad),
                    ..friends()
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
        assert!(list_sitcoms(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_title_conflicts() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        create_sitcom(&store, alice, friends()).await.unwrap();
        let err = create_sitcom(&store, alice, friends()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn non_owner_update_is_forbidden_and_row_unchanged() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let sitcom = create_sitcom(&store, alice, friends()).await.unwrap();

        let err = update_sitcom(
            &store,
            sitcom.id,
            bob,
            UpdateSitcomRequest {
                title: Some("Enemies".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(get_sitcom(&store, sitcom.id).await.unwrap(), sitcom);
    }

    #[tokio::test]
    async fn update_is_a_merge_patch() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let sitcom = create_sitcom(&store, alice, friends()).await.unwrap();

        let updated = update_sitcom(
            &store,
            sitcom.id,
            alice,
            UpdateSitcomRequest {
                synopsis: Some(Some("Six friends in New York".into())),
                creator: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Friends");
        assert_eq!(updated.genre, "Comedy");
        assert_eq!(updated.number_of_seasons, Some(10));
        assert_eq!(updated.creator, None);
        assert_eq!(updated.synopsis.as_deref(), Some("Six friends in New York"));
    }

    #[tokio::test]
    async fn update_revalidates_seasons_and_rejects_empty_patch() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let sitcom = create_sitcom(&store, alice, friends()).await.unwrap();

        let err = update_sitcom(
            &store,
            sitcom.id,
            alice,
            UpdateSitcomRequest {
                number_of_seasons: Some(Some(json!(-3))),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = update_sitcom(&store, sitcom.id, alice, UpdateSitcomRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "No input data provided"));
    }

    #[tokio::test]
    async fn missing_sitcom_is_not_found_before_ownership() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let err = delete_sitcom(&store, 999, alice).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_owner_can_delete() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let sitcom = create_sitcom(&store, alice, friends()).await.unwrap();

        assert!(matches!(
            delete_sitcom(&store, sitcom.id, bob).await.unwrap_err(),
            AppError::Forbidden(_)
        ));
        delete_sitcom(&store, sitcom.id, alice).await.unwrap();
        assert!(matches!(
            get_sitcom(&store, sitcom.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
