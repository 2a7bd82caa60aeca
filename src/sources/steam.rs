//! Steam store search adapter
//!
//! Scrapes the search page filtered to zero-price specials. Each result row
//! is an `<a>` under `#search_resultsRows` with a `.title` span and the app
//! page as `href`. Rows mentioning "Free To Play" are permanent F2P titles,
//! not limited-time giveaways, and are dropped. The page carries no expiry,
//! so `end_date` stays unset.

use super::{get_text, FetchError, SourceAdapter};
use crate::models::Game;
use async_trait::async_trait;
use scraper::{Html, Selector};

pub const STEAM_SEARCH_URL: &str = "https://store.steampowered.com/search/?maxprice=free&specials=1";
pub const STEAM_PLATFORM: &str = "Steam";

const FREE_TO_PLAY_MARKER: &str = "Free To Play";

pub struct SteamSource {
    client: reqwest::Client,
    endpoint: String,
}

impl SteamSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, STEAM_SEARCH_URL)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for SteamSource {
    fn name(&self) -> &str {
        STEAM_PLATFORM
    }

    async fn fetch_free_games(&self) -> Result<Vec<Game>, FetchError> {
        let html = get_text(&self.client, &self.endpoint).await?;
        parse_search_results(&html)
    }
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Parse(format!("selector '{}': {:?}", css, e)))
}

/// Extract limited-time giveaways from a search results page
pub fn parse_search_results(html: &str) -> Result<Vec<Game>, FetchError> {
    let document = Html::parse_document(html);
    let row_selector = selector("#search_resultsRows a")?;
    let title_selector = selector(".title")?;
    let image_selector = selector("img")?;

    let mut games = Vec::new();
    for row in document.select(&row_selector) {
        let title = match row.select(&title_selector).next() {
            Some(node) => node.text().collect::<String>().trim().to_string(),
            None => {
                log::debug!("Skipping Steam row without a title");
                continue;
            }
        };
        if title.is_empty() {
            continue;
        }

        let url = match row.value().attr("href") {
            Some(href) if !href.trim().is_empty() => href.trim().to_string(),
            _ => {
                log::debug!("Skipping Steam row '{}': no link", title);
                continue;
            }
        };

        let row_text: String = row.text().collect();
        if row_text.contains(FREE_TO_PLAY_MARKER) {
            log::debug!("Skipping '{}': permanently free to play", title);
            continue;
        }

        let mut game = Game::new(title, url, STEAM_PLATFORM);
        if let Some(src) = row
            .select(&image_selector)
            .next()
            .and_then(|img| img.value().attr("src"))
        {
            game = game.with_image_url(src);
        }

        log::info!("🎁 Found free game '{}' on {}", game.title, STEAM_PLATFORM);
        games.push(game);
    }

    Ok(games)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::build_http_client;
    use std::time::Duration;

    const SEARCH_PAGE: &str = r#"
        <html><body>
        <div id="search_resultsRows">
            <a href="https://store.steampowered.com/app/1001/Giveaway_One/?snr=1_7_7" class="search_result_row">
                <div class="search_capsule"><img src="https://cdn.example/1001.jpg"></div>
                <div class="responsive_search_name_combined">
                    <span class="title"> Giveaway One </span>
                    <div class="search_price">-100% $19.99 Free</div>
                </div>
            </a>
            <a href="https://store.steampowered.com/app/1002/Forever_Free/" class="search_result_row">
                <span class="title">Forever Free</span>
                <div class="search_price">Free To Play</div>
            </a>
            <a href="https://store.steampowered.com/app/1003/No_Title/" class="search_result_row">
                <div class="search_price">Free</div>
            </a>
            <a class="search_result_row">
                <span class="title">No Link</span>
            </a>
            <a href="https://store.steampowered.com/app/1005/Giveaway_Two/" class="search_result_row">
                <span class="title">Giveaway Two</span>
            </a>
        </div>
        <a href="https://store.steampowered.com/outside"><span class="title">Outside Results</span></a>
        </body></html>
    "#;

    #[test]
    fn test_parse_search_results() {
        let games = parse_search_results(SEARCH_PAGE).unwrap();

        let titles: Vec<&str> = games.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Giveaway One", "Giveaway Two"]);

        let first = &games[0];
        assert_eq!(first.url, "https://store.steampowered.com/app/1001/Giveaway_One/?snr=1_7_7");
        assert_eq!(first.platform, "Steam");
        assert!(first.end_date.is_none());
        assert_eq!(first.image_url.as_deref(), Some("https://cdn.example/1001.jpg"));
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        assert!(parse_search_results("<html></html>").unwrap().is_empty());
        assert!(parse_search_results("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_against_mock_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search/")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(SEARCH_PAGE)
            .create_async()
            .await;

        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let source = SteamSource::with_endpoint(
            client,
            format!("{}/search/?maxprice=free&specials=1", server.url()),
        );

        let games = source.fetch_free_games().await.unwrap();
        assert_eq!(games.len(), 2);
        mock.assert_async().await;
    }
}
