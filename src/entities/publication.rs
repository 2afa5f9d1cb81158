// 📰 Publication - articles of the school's public magazine

use crate::program::fold_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Draft,
    #[default]
    Published,
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationStatus::Draft => "draft",
            PublicationStatus::Published => "published",
        }
    }

    pub fn parse(tag: &str) -> Option<PublicationStatus> {
        match tag.trim() {
            "draft" => Some(PublicationStatus::Draft),
            "published" => Some(PublicationStatus::Published),
            _ => None,
        }
    }

    pub fn toggled(&self) -> PublicationStatus {
        match self {
            PublicationStatus::Draft => PublicationStatus::Published,
            PublicationStatus::Published => PublicationStatus::Draft,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub cover_url: Option<String>,
    pub status: PublicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Publication {
    /// New article; the slug is derived from the title when none is given.
    pub fn new(title: &str, content: &str, slug: Option<&str>) -> Self {
        let now = Utc::now();
        let slug = slugify(slug.filter(|s| !s.trim().is_empty()).unwrap_or(title));

        Publication {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            slug,
            content: content.to_string(),
            cover_url: None,
            status: PublicationStatus::Published,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PublicationStatus::Published
    }
}

/// URL slug: accents folded, lower-case, runs of other characters
/// collapsed to a single dash.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in fold_text(text).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("Rentrée 2025 : les inscriptions sont ouvertes !"),
            "rentree-2025-les-inscriptions-sont-ouvertes"
        );
        assert_eq!(slugify("  --Maquillage   Avancé--  "), "maquillage-avance");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_new_publication_derives_slug() {
        let post = Publication::new("Journée portes ouvertes", "Bienvenue", None);
        assert_eq!(post.slug, "journee-portes-ouvertes");
        assert!(post.is_published());

        let custom = Publication::new("Titre", "Texte", Some("Mon Slug"));
        assert_eq!(custom.slug, "mon-slug");
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(PublicationStatus::Draft.toggled(), PublicationStatus::Published);
        assert_eq!(PublicationStatus::Published.toggled(), PublicationStatus::Draft);
        assert_eq!(PublicationStatus::parse("draft"), Some(PublicationStatus::Draft));
        assert_eq!(PublicationStatus::parse("archived"), None);
    }
}
