//! Ownership predicates evaluated per request.
//!
//! Two separate rules: sitcom ownership governs a
//! sitcom and its characters, review authorship governs a review. Owning a
//! sitcom grants nothing over other users' reviews of it.

use crate::{reviews::repo_types::Review, sitcoms::repo_types::Sitcom};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotSitcomOwner,
    NotReviewAuthor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny(Denial),
}

impl Access {
    pub fn is_allowed(self) -> bool {
        matches!(self, Access::Allow)
    }
}

/// Pure identity check between the token subject and a row's owner column.
pub fn verify_ownership(subject_id: i64, resource_owner_id: i64) -> bool {
    subject_id == resource_owner_id
}

/// May `subject_id` mutate this sitcom or any of its characters?
pub fn sitcom_ownership(subject_id: i64, sitcom: &Sitcom) -> Access {
    if verify_ownership(subject_id, sitcom.owner_id) {
        Access::Allow
    } else {
        Access::Deny(Denial::NotSitcomOwner)
    }
}

/// May `subject_id` mutate this review?
pub fn review_authorship(subject_id: i64, review: &Review) -> Access {
    if verify_ownership(subject_id, review.author_id) {
        Access::Allow
    } else {
        Access::Deny(Denial::NotReviewAuthor)
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn sitcom_owned_by(owner_id: i64) -> Sitcom {
        let now = OffsetDateTime::now_utc();
        Sitcom {
            id: 10,
            title: "Scrubs".into(),
            creator: None,
            genre: "Comedy".into(),
            years_active: None,
            number_of_seasons: None,
            synopsis: None,
            owner_id,
            average_rating: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn review_by(author_id: i64, sitcom_id: i64) -> Review {
        let now = OffsetDateTime::now_utc();
        Review {
            id: 20,
            score: 3,
            text: None,
            author_id,
            sitcom_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_may_mutate_sitcom() {
        assert_eq!(sitcom_ownership(1, &sitcom_owned_by(1)), Access::Allow);
        assert_eq!(
            sitcom_ownership(2, &sitcom_owned_by(1)),
            Access::Deny(Denial::NotSitcomOwner)
        );
    }

    #[test]
    fn sitcom_owner_cannot_edit_someone_elses_review() {
        let sitcom = sitcom_owned_by(1);
        let review = review_by(2, sitcom.id);
        assert!(sitcom_ownership(1, &sitcom).is_allowed());
        assert_eq!(
            review_authorship(1, &review),
            Access::Deny(Denial::NotReviewAuthor)
        );
        assert!(review_authorship(2, &review).is_allowed());
    }

    #[test]
    fn verify_ownership_is_plain_equality() {
        assert!(verify_ownership(5, 5));
        assert!(!verify_ownership(5, 6));
    }
}
