//! Payment products (point packages).

use reqwest::Method;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::{AdminApi, ApiError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProduct {
    pub id: i64,
    pub product_id: i64,
    pub points: i64,
    pub amount: i64,
    #[serde(default)]
    pub is_promotion: bool,
    #[serde(default)]
    pub promotion_period: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl PaymentProduct {
    /// The promotion period split into its two ends, when well formed.
    pub fn promotion(&self) -> Option<PromotionPeriod> {
        self.promotion_period.as_deref()?.parse().ok()
    }
}

/// Promotion window, sent as `start~end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionPeriod {
    pub start: String,
    pub end: String,
}

impl fmt::Display for PromotionPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.start, self.end)
    }
}

impl FromStr for PromotionPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('~')
            .ok_or_else(|| format!("promotion period must look like start~end: {}", s))?;
        let (start, end) = (start.trim(), end.trim());
        if start.is_empty() || end.is_empty() {
            return Err(format!("promotion period needs both a start and an end: {}", s));
        }
        Ok(Self {
            start: start.to_string(),
            end: end.to_string(),
        })
    }
}

/// Body for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    pub points: i64,
    pub amount: i64,
    pub is_promotion: bool,
    /// Only sent when `is_promotion` is set; otherwise `null`.
    #[serde(rename = "promotionPeriod", serialize_with = "serialize_period")]
    pub promotion: Option<PromotionPeriod>,
}

fn serialize_period<S: Serializer>(period: &Option<PromotionPeriod>, serializer: S) -> Result<S::Ok, S::Error> {
    match period {
        Some(period) => serializer.collect_str(period),
        None => serializer.serialize_none(),
    }
}

impl ProductForm {
    pub fn new(points: i64, amount: i64, promotion: Option<PromotionPeriod>) -> Self {
        Self {
            points,
            amount,
            is_promotion: promotion.is_some(),
            promotion,
        }
    }
}

impl AdminApi {
    /// GET `/admin/products`
    pub async fn products(&self) -> Result<Vec<PaymentProduct>, ApiError> {
        self.get_json(self.endpoint("/admin/products")?).await
    }

    /// POST `/admin/products`
    pub async fn create_product(&self, form: &ProductForm) -> Result<(), ApiError> {
        self.send_json(Method::POST, self.endpoint("/admin/products")?, form).await
    }

    /// PUT `/admin/products/{productId}`
    pub async fn update_product(&self, product_id: i64, form: &ProductForm) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/products/{}", product_id))?;
        self.send_json(Method::PUT, url, form).await
    }

    /// DELETE `/admin/products/{productId}`
    pub async fn delete_product(&self, product_id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/products/{}", product_id))?;
        self.send_empty(Method::DELETE, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_period_parse() {
        let p: PromotionPeriod = "2026-10-01~2026-10-31".parse().unwrap();
        assert_eq!(p.start, "2026-10-01");
        assert_eq!(p.end, "2026-10-31");
        assert_eq!(p.to_string(), "2026-10-01~2026-10-31");

        assert!("2026-10-01".parse::<PromotionPeriod>().is_err());
        assert!("2026-10-01~".parse::<PromotionPeriod>().is_err());
    }

    #[test]
    fn test_form_serializes_period_string() {
        let form = ProductForm::new(100, 1200, Some("2026-10-01~2026-10-31".parse().unwrap()));
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            json!({
                "points": 100,
                "amount": 1200,
                "isPromotion": true,
                "promotionPeriod": "2026-10-01~2026-10-31",
            })
        );
    }

    #[test]
    fn test_form_without_promotion_sends_null() {
        let form = ProductForm::new(100, 1200, None);
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["isPromotion"], json!(false));
        assert_eq!(value["promotionPeriod"], json!(null));
    }

    #[test]
    fn test_product_promotion_accessor() {
        let product: PaymentProduct = serde_json::from_value(json!({
            "id": 1,
            "productId": 11,
            "points": 100,
            "amount": 1000,
            "isPromotion": true,
            "promotionPeriod": "a~b",
            "active": true,
        }))
        .unwrap();
        assert_eq!(product.promotion().unwrap().end, "b");
    }
}
