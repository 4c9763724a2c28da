use serde::{Deserialize, Serialize};
use uuid::Uuid;
use rust_decimal::Decimal;
use crate::models::geo::Coordinate;

pub const FALLBACK_BRAND_CODE: &str = "ORD";

/// Restaurant sub-brand. A cart only ever holds dishes of one brand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Brand(pub String);

impl Brand {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Up to three leading letters, uppercased ("THE БЫК" -> "THE").
    /// Brands without any letter or digit get `FALLBACK_BRAND_CODE`.
    pub fn short_code(&self) -> String {
        let code: String = self
            .0
            .chars()
            .filter(|c| c.is_alphanumeric())
            .take(3)
            .flat_map(char::to_uppercase)
            .collect();
        if code.is_empty() {
            FALLBACK_BRAND_CODE.to_string()
        } else {
            code
        }
    }
}

impl std::fmt::Display for Brand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Menu item as supplied by the menu read API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub brand: Brand,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool { true }

impl Dish {
    pub fn new(name: impl Into<String>, price: Decimal, category: impl Into<String>, brand: Brand) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price,
            category: category.into(),
            brand,
            is_available: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub location: Coordinate,
    pub brand: Brand,
    /// Kitchen baseline before the courier leaves, in minutes
    pub delivery_time_minutes: u32,
    pub address: String,
}

impl Restaurant {
    pub fn new(
        name: impl Into<String>,
        location: Coordinate,
        brand: Brand,
        delivery_time_minutes: u32,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location,
            brand,
            delivery_time_minutes,
            address: address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_short_code() {
        assert_eq!(Brand::new("THE БЫК").short_code(), "THE");
        assert_eq!(Brand::new("mosca").short_code(), "MOS");
        assert_eq!(Brand::new("Ы").short_code(), "Ы");
    }

    #[test]
    fn test_brand_short_code_without_letters() {
        assert_eq!(Brand::new("★ & ★").short_code(), FALLBACK_BRAND_CODE);
        assert_eq!(Brand::new("").short_code(), "ORD");
    }

    #[test]
    fn test_dish_defaults_to_available() {
        let json = r#"
            {
                "id": "6f1c1f5e-3a57-4a53-8a0e-1f6a8f3b7d11",
                "name": "Ribeye",
                "price": 3200.0,
                "category": "Steaks",
                "brand": "THE BYK"
            }
        "#;
        let dish: Dish = serde_json::from_str(json).expect("Failed to deserialize");
        assert!(dish.is_available);
        assert_eq!(dish.price, Decimal::from(3200));
        assert_eq!(dish.brand, Brand::new("THE BYK"));
    }
}
