//! The declared field set of a category.

use common::AggregateId;
use serde::{Deserialize, Serialize};
use slugs::Slug;

use super::CategoryError;

/// Reference to a picture owned by the picture service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PictureId(String);

impl PictureId {
    /// Creates a picture reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PictureId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Locales the catalog is translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Pl,
}

impl Locale {
    /// Every supported locale.
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Pl];

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Pl => "pl",
        }
    }
}

/// Translated name and description for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// One translation slot per supported locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<Translation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pl: Option<Translation>,
}

impl Translations {
    /// Returns the translation for a locale, if one was provided.
    pub fn get(&self, locale: Locale) -> Option<&Translation> {
        match locale {
            Locale::En => self.en.as_ref(),
            Locale::Pl => self.pl.as_ref(),
        }
    }

    /// Sets the translation for a locale.
    pub fn set(&mut self, locale: Locale, translation: Translation) {
        match locale {
            Locale::En => self.en = Some(translation),
            Locale::Pl => self.pl = Some(translation),
        }
    }

    /// Builder-style variant of [`Translations::set`].
    pub fn with(mut self, locale: Locale, translation: Translation) -> Self {
        self.set(locale, translation);
        self
    }

    /// Returns true if no locale has a translation.
    pub fn is_empty(&self) -> bool {
        Locale::ALL.iter().all(|l| self.get(*l).is_none())
    }
}

/// Every field a category command declares.
///
/// Updates replace the whole set; fields left as `None` are cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Translations::is_empty")]
    pub translations: Translations,
    #[serde(default)]
    pub picture: Option<PictureId>,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub parent: Option<AggregateId>,
}

impl CategoryFields {
    /// Creates a field set with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<Slug>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_parent(mut self, parent: AggregateId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_picture(mut self, picture: impl Into<PictureId>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    pub fn with_translation(mut self, locale: Locale, translation: Translation) -> Self {
        self.translations.set(locale, translation);
        self
    }

    /// Checks the fields the service validates itself.
    pub fn validate(&self) -> Result<(), CategoryError> {
        if self.name.trim().is_empty() {
            return Err(CategoryError::ValidationFailed {
                field: "name",
                reason: "empty",
            });
        }
        Ok(())
    }

    /// Returns the requested slug, treating an empty string as absent.
    pub fn requested_slug(&self) -> Option<&Slug> {
        self.slug.as_ref().filter(|s| !s.is_empty())
    }
}
