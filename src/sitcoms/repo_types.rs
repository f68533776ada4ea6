use sqlx::FromRow;
use time::OffsetDateTime;

/// Sitcom record. `average_rating` is never stored; stores fill it on every read.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Sitcom {
    pub id: i64,
    pub title: String,
    pub creator: Option<String>,
    pub genre: String,
    pub years_active: Option<String>,
    pub number_of_seasons: Option<i32>,
    pub synopsis: Option<String>,
    pub owner_id: i64,
    pub average_rating: Option<f64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSitcom {
    pub owner_id: i64,
    pub title: String,
    pub genre: String,
    pub creator: Option<String>,
    pub years_active: Option<String>,
    pub number_of_seasons: Option<i32>,
    pub synopsis: Option<String>,
}

/// Merge patch: `None` leaves the column alone, `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct SitcomPatch {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub creator: Option<Option<String>>,
    pub years_active: Option<Option<String>>,
    pub number_of_seasons: Option<Option<i32>>,
    pub synopsis: Option<Option<String>>,
}

impl SitcomPatch {
    pub fn apply(self, sitcom: &mut Sitcom) {
        if let Some(title) = self.title {
            sitcom.title = title;
        }
        if let Some(genre) = self.genre {
            sitcom.genre = genre;
        }
        if let Some(creator) = self.creator {
            sitcom.creator = creator;
        }
        if let Some(years_active) = self.years_active {
            sitcom.years_active = years_active;
        }
        if let Some(seasons) = self.number_of_seasons {
            sitcom.number_of_seasons = seasons;
        }
        if let Some(synopsis) = self.synopsis {
            sitcom.synopsis = synopsis;
        }
    }
}

/// Rounds a mean score to one decimal place, ties to even (4.25 -> 4.2).
pub fn round_rating(mean: f64) -> f64 {
    (mean * 10.0).round_ties_even() / 10.0
}

/// Mean of `scores` rounded to one decimal, `None` when there are no reviews.
pub fn average_rating(scores: &[i32]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
    Some(round_rating(sum as f64 / scores.len() as f64))
}
