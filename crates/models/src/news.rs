use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Minimum length of the article body, in characters.
pub const MIN_TEXT_CHARS: usize = 500;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "news")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub author: String,
    pub publication_date: DateTimeWithTimeZone,
    pub first_hand: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_text(text: &str) -> Result<(), ModelError> {
    if text.chars().count() < MIN_TEXT_CHARS {
        return Err(ModelError::Validation(format!(
            "news text must be at least {} characters long",
            MIN_TEXT_CHARS
        )));
    }
    Ok(())
}

/// `now` is passed in rather than read from the system clock so callers stay
/// deterministic under test.
pub fn validate_publication_date(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ModelError> {
    if date < now {
        return Err(ModelError::Validation(
            "publication date cannot be in the past".into(),
        ));
    }
    Ok(())
}
