//! Epic Games Store catalog adapter
//!
//! Endpoint: https://store-site-backend-static.ak.epicgames.com/freeGamesPromotions
//!
//! Response shape (only the fields we read):
//! ```json
//! { "data": { "Catalog": { "searchStore": { "elements": [
//!     { "title": "...", "description": "...", "productSlug": "...",
//!       "keyImages": [{ "type": "OfferImageWide", "url": "..." }],
//!       "promotions": { "promotionalOffers": [
//!           { "promotionalOffers": [
//!               { "endDate": "2024-01-11T16:00:00.000Z",
//!                 "discountSetting": { "discountPercentage": 0 } } ] } ] } } ] } } } }
//! ```
//!
//! An element is a giveaway when its first active promotional offer has a
//! discount of exactly 0 or 100. Anything in between is a paid discount.
//! Upcoming offers (`upcomingPromotionalOffers`) are ignored.

use super::{get_text, FetchError, SourceAdapter};
use crate::models::Game;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const EPIC_API_URL: &str =
    "https://store-site-backend-static.ak.epicgames.com/freeGamesPromotions";
pub const EPIC_STORE_PAGE_BASE: &str = "https://store.epicgames.com/p/";
pub const EPIC_PLATFORM: &str = "Epic Games";

#[derive(Debug, Deserialize)]
struct PromotionsResponse {
    data: Option<PromotionsData>,
}

#[derive(Debug, Deserialize)]
struct PromotionsData {
    #[serde(rename = "Catalog")]
    catalog: Option<Catalog>,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(rename = "searchStore")]
    search_store: Option<SearchStore>,
}

#[derive(Debug, Deserialize)]
struct SearchStore {
    /// Kept untyped so one malformed element cannot fail the whole listing
    elements: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct CatalogElement {
    title: String,
    description: Option<String>,
    #[serde(rename = "productSlug")]
    product_slug: Option<String>,
    #[serde(rename = "keyImages")]
    key_images: Option<Vec<KeyImage>>,
    promotions: Option<Promotions>,
}

#[derive(Debug, Deserialize)]
struct KeyImage {
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Promotions {
    #[serde(rename = "promotionalOffers")]
    promotional_offers: Option<Vec<PromotionalOfferGroup>>,
}

#[derive(Debug, Deserialize)]
struct PromotionalOfferGroup {
    #[serde(rename = "promotionalOffers")]
    promotional_offers: Option<Vec<PromotionalOffer>>,
}

#[derive(Debug, Deserialize)]
struct PromotionalOffer {
    #[serde(rename = "endDate")]
    end_date: String,
    #[serde(rename = "discountSetting")]
    discount_setting: DiscountSetting,
}

#[derive(Debug, Deserialize)]
struct DiscountSetting {
    #[serde(rename = "discountPercentage")]
    discount_percentage: f64,
}

/// 0 and 100 both mean "free" in this feed; anything else is a sale price
pub fn is_free_discount(discount_percentage: f64) -> bool {
    discount_percentage == 0.0 || discount_percentage == 100.0
}

pub struct EpicGamesSource {
    client: reqwest::Client,
    endpoint: String,
}

impl EpicGamesSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, EPIC_API_URL)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for EpicGamesSource {
    fn name(&self) -> &str {
        EPIC_PLATFORM
    }

    async fn fetch_free_games(&self) -> Result<Vec<Game>, FetchError> {
        let body = get_text(&self.client, &self.endpoint).await?;
        parse_promotions(&body)
    }
}

/// Extract the current giveaways from a `freeGamesPromotions` body
///
/// Fails only when the body is not JSON at all; missing containers yield an
/// empty list and malformed elements are skipped.
pub fn parse_promotions(body: &str) -> Result<Vec<Game>, FetchError> {
    let response: PromotionsResponse = serde_json::from_str(body)?;

    let elements = response
        .data
        .and_then(|d| d.catalog)
        .and_then(|c| c.search_store)
        .and_then(|s| s.elements)
        .unwrap_or_default();

    let mut games = Vec::new();
    for value in elements {
        let element: CatalogElement = match serde_json::from_value(value) {
            Ok(element) => element,
            Err(e) => {
                log::debug!("Skipping malformed Epic catalog element: {}", e);
                continue;
            }
        };

        if let Some(game) = normalize_element(element) {
            log::info!("🎁 Found free game '{}' on {}", game.title, EPIC_PLATFORM);
            games.push(game);
        }
    }

    Ok(games)
}

fn normalize_element(element: CatalogElement) -> Option<Game> {
    let offer = element
        .promotions?
        .promotional_offers?
        .into_iter()
        .next()?
        .promotional_offers?
        .into_iter()
        .next()?;

    if !is_free_discount(offer.discount_setting.discount_percentage) {
        log::debug!(
            "Skipping '{}': {}% discount is not a giveaway",
            element.title,
            offer.discount_setting.discount_percentage
        );
        return None;
    }

    let end_date = match DateTime::parse_from_rfc3339(&offer.end_date) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            log::debug!("Skipping '{}': bad endDate '{}': {}", element.title, offer.end_date, e);
            return None;
        }
    };

    let slug = match element.product_slug.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => {
            log::debug!("Skipping '{}': no product slug", element.title);
            return None;
        }
    };

    let mut game = Game::new(
        element.title,
        format!("{}{}", EPIC_STORE_PAGE_BASE, slug),
        EPIC_PLATFORM,
    )
    .with_end_date(end_date);

    if let Some(description) = element.description.filter(|d| !d.trim().is_empty()) {
        game = game.with_description(description);
    }

    if let Some(image_url) = pick_image(element.key_images.unwrap_or_default()) {
        game = game.with_image_url(image_url);
    }

    Some(game)
}

fn pick_image(images: Vec<KeyImage>) -> Option<String> {
    let find = |wanted: &str| {
        images
            .iter()
            .find(|img| img.kind.as_deref() == Some(wanted))
            .and_then(|img| img.url.clone())
    };
    find("OfferImageWide").or_else(|| find("Thumbnail"))
}
