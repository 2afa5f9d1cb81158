// 💬 Testimonial - messages left by students and parents on the public site

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of testimonials the public page shows
pub const PUBLIC_TESTIMONIAL_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    pub created_at: DateTime<Utc>,

    #[serde(rename = "nom")]
    pub name: String,

    pub message: String,

    /// Optional 1..=5 star rating
    #[serde(rename = "note")]
    pub rating: Option<u8>,
}

impl Testimonial {
    pub fn new(name: &str, message: &str, rating: Option<u8>) -> Self {
        Testimonial {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            name: name.trim().to_string(),
            message: message.trim().to_string(),
            rating,
        }
    }

    /// "★★★★☆" for a rating of 4, empty when unrated
    pub fn stars(&self) -> String {
        match self.rating {
            Some(n) => {
                let n = n.min(5) as usize;
                format!("{}{}", "★".repeat(n), "☆".repeat(5 - n))
            }
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_fields() {
        let t = Testimonial::new("  Nadia ", " Merci Kisa ! ", Some(5));
        assert_eq!(t.name, "Nadia");
        assert_eq!(t.message, "Merci Kisa !");
        assert_eq!(t.stars(), "★★★★★");
    }

    #[test]
    fn test_stars_for_partial_and_missing_rating() {
        assert_eq!(Testimonial::new("a", "b", Some(3)).stars(), "★★★☆☆");
        assert_eq!(Testimonial::new("a", "b", None).stars(), "");
    }
}
