//! Listing rows as stored in the listings table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::error::Result;

/// Base of the click-to-chat link built for a listing's contact number
pub const CONTACT_BASE_URL: &str = "https://api.whatsapp.com/send";

/// Reference to a stored photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Owner of the photo; also the middle segment of its storage path
    #[serde(rename = "uid")]
    pub owner_id: String,

    /// Generated unique name; the last segment of its storage path
    pub name: String,

    /// Durable download URL
    pub url: String,
}

/// A car for sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Assigned by the backend
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Upper-cased at creation so prefix search can be case-insensitive
    pub name: String,
    pub model: String,
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(rename = "km", deserialize_with = "string_or_number")]
    pub odometer: String,
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    pub city: String,
    #[serde(rename = "whatsapp")]
    pub contact: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "owner")]
    pub owner_name: String,
    #[serde(rename = "uid")]
    pub owner_id: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// A listing about to be written; the backend assigns the id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    pub name: String,
    pub model: String,
    pub year: String,
    #[serde(rename = "km")]
    pub odometer: String,
    pub price: String,
    pub city: String,
    #[serde(rename = "whatsapp")]
    pub contact: String,
    pub description: String,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "owner")]
    pub owner_name: String,
    #[serde(rename = "uid")]
    pub owner_id: String,
    pub images: Vec<ImageRef>,
}

impl NewListing {
    /// Attach the id the backend assigned
    pub fn with_id(self, id: String) -> Listing {
        Listing {
            id,
            name: self.name,
            model: self.model,
            year: self.year,
            odometer: self.odometer,
            price: self.price,
            city: self.city,
            contact: self.contact,
            description: self.description,
            created_at: self.created_at,
            owner_name: self.owner_name,
            owner_id: self.owner_id,
            images: self.images,
        }
    }
}

impl Listing {
    /// Photo shown on the listing card
    pub fn cover_image(&self) -> Option<&ImageRef> {
        self.images.first()
    }

    /// Click-to-chat link for the contact number with a prefilled message
    pub fn contact_url(&self) -> Result<Url> {
        let text = format!(
            "Hi! I saw the {} listed on the marketplace and I'm interested.",
            self.name
        );
        let url = Url::parse_with_params(
            CONTACT_BASE_URL,
            &[("phone", self.contact.as_str()), ("text", text.as_str())],
        )?;
        Ok(url)
    }
}

// Older rows store numeric fields as JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> serde_json::Value {
        json!({
            "id": 7,
            "name": "ONIX 1.0",
            "model": "1.0 Flex Plus",
            "year": "2016/2016",
            "km": 23900,
            "price": 69000.5,
            "city": "Campinas - SP",
            "whatsapp": "11900000000",
            "description": "Single owner",
            "created": "2024-05-01T12:00:00+00:00",
            "owner": "Dealer",
            "uid": "user-1",
            "images": [{ "uid": "user-1", "name": "abc", "url": "https://cdn.example.com/abc" }]
        })
    }

    #[test]
    fn reads_wire_names_and_numeric_fields() {
        let listing: Listing = serde_json::from_value(row()).unwrap();
        assert_eq!(listing.id, "7");
        assert_eq!(listing.odometer, "23900");
        assert_eq!(listing.price, "69000.5");
        assert_eq!(listing.contact, "11900000000");
        assert_eq!(listing.owner_id, "user-1");
        assert_eq!(listing.cover_image().unwrap().name, "abc");
    }

    #[test]
    fn new_listing_uses_wire_names() {
        let listing: Listing = serde_json::from_value(row()).unwrap();
        let new = NewListing {
            name: listing.name.clone(),
            model: listing.model.clone(),
            year: listing.year.clone(),
            odometer: listing.odometer.clone(),
            price: listing.price.clone(),
            city: listing.city.clone(),
            contact: listing.contact.clone(),
            description: listing.description.clone(),
            created_at: listing.created_at,
            owner_name: listing.owner_name.clone(),
            owner_id: listing.owner_id.clone(),
            images: listing.images.clone(),
        };

        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(value["km"], "23900");
        assert_eq!(value["whatsapp"], "11900000000");
        assert_eq!(value["uid"], "user-1");
        assert_eq!(value["owner"], "Dealer");
        assert!(value.get("id").is_none());
        assert_eq!(value["images"][0]["uid"], "user-1");
    }

    #[test]
    fn contact_url_prefills_the_car_name() {
        let listing: Listing = serde_json::from_value(row()).unwrap();
        let url = listing.contact_url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(url.host_str(), Some("api.whatsapp.com"));
        assert_eq!(pairs[0], ("phone".to_string(), "11900000000".to_string()));
        assert!(pairs[1].1.contains("ONIX 1.0"));
    }
}
