#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a stored file is for, relative to its owner.
///
/// Together with an owner id this names a replaceable slot of files.
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileCategory {
    /// Cover image of a book.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COVER"))]
    #[serde(alias = "cover")]
    Cover,
    /// Profile picture.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "AVATAR"))]
    #[serde(alias = "avatar")]
    Avatar,
    /// Any other file attached to an owner.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ATTACHMENT"))]
    #[serde(alias = "attachment")]
    Attachment,
}

impl FileCategory {
    /// All possible categories.
    pub const ALL: &'static [FileCategory] = &[Self::Cover, Self::Avatar, Self::Attachment];

    /// Returns the canonical string representation (SCREAMING_SNAKE_CASE).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cover => "COVER",
            Self::Avatar => "AVATAR",
            Self::Attachment => "ATTACHMENT",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid category string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError {
    invalid: String,
}

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid category '{}'. Valid values: {}",
            self.invalid,
            FileCategory::ALL
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for FileCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseCategoryError {
                invalid: s.to_string(),
            })
    }
}
