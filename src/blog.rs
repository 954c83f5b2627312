use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FEED_URL: &str = "https://medium.com/feed/@dinmaybrahma";
pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const DESCRIPTION_CHARS: usize = 200;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid HTML tag pattern"));

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("Failed to fetch Medium RSS: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Failed to fetch Medium RSS: {0}")]
    Status(StatusCode),
    #[error("{0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub title: String,
    pub link: String,
    pub pub_date: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostQuery {
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Link,
    PubDate,
    Description,
    Creator,
    Guid,
    Category,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"pubDate" => Some(Self::PubDate),
            b"description" => Some(Self::Description),
            b"dc:creator" => Some(Self::Creator),
            b"guid" => Some(Self::Guid),
            b"category" => Some(Self::Category),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct RawItem {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    description: Option<String>,
    creator: Option<String>,
    guid: Option<String>,
    categories: Vec<String>,
}

impl RawItem {
    fn push(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::Description => &mut self.description,
            Field::Creator => &mut self.creator,
            Field::Guid => &mut self.guid,
            Field::Category => {
                self.categories.push(text.to_string());
                return;
            }
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn into_post(self, default_author: &str) -> BlogPost {
        let link = self.link.unwrap_or_default();
        BlogPost {
            title: self.title.unwrap_or_else(|| "Untitled".to_string()),
            guid: Some(self.guid.unwrap_or_else(|| link.clone())),
            link,
            pub_date: self.pub_date.unwrap_or_default(),
            description: self
                .description
                .map(|html| summarize(&html))
                .unwrap_or_else(|| "No description available".to_string()),
            author: Some(self.creator.unwrap_or_else(|| default_author.to_string())),
            tags: self.categories,
        }
    }
}

/// Strips markup and keeps the first 200 characters.
fn summarize(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, "");
    let excerpt: String = text.trim().chars().take(DESCRIPTION_CHARS).collect();
    format!("{}...", excerpt)
}

/// Parses the `<item>` entries of an RSS 2.0 document.
pub fn parse_feed(xml: &str, default_author: &str) -> Result<Vec<BlogPost>, BlogError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut saw_rss = false;
    let mut posts = Vec::new();
    let mut item: Option<RawItem> = None;
    let mut field: Option<Field> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| BlogError::Parse(err.to_string()))?;

        match event {
            Event::Start(start) => match start.name().as_ref() {
                b"rss" => saw_rss = true,
                b"item" => item = Some(RawItem::default()),
                tag if item.is_some() => field = Field::from_tag(tag),
                _ => {}
            },
            Event::End(end) => {
                if end.name().as_ref() == b"item" {
                    if let Some(done) = item.take() {
                        posts.push(done.into_post(default_author));
                    }
                }
                field = None;
            }
            Event::Text(text) => {
                if let (Some(item), Some(field)) = (item.as_mut(), field) {
                    let text = text
                        .unescape()
                        .map_err(|err| BlogError::Parse(err.to_string()))?;
                    item.push(field, &text);
                }
            }
            Event::CData(data) => {
                if let (Some(item), Some(field)) = (item.as_mut(), field) {
                    item.push(field, &String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_rss {
        return Err(BlogError::Parse("document has no <rss> element".to_string()));
    }
    Ok(posts)
}

/// Applies the optional case-insensitive search, then the limit.
pub fn filter_posts(posts: Vec<BlogPost>, query: &PostQuery) -> Vec<BlogPost> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    posts
        .into_iter()
        .filter(|post| match &needle {
            Some(needle) => {
                post.title.to_lowercase().contains(needle)
                    || post.description.to_lowercase().contains(needle)
            }
            None => true,
        })
        .take(query.limit.unwrap_or(DEFAULT_LIMIT))
        .collect()
}

#[derive(Debug, Clone)]
pub struct BlogConfig {
    pub feed_url: String,
    pub default_author: String,
    pub timeout: Duration,
}

pub struct BlogClient {
    http: Client,
    config: BlogConfig,
}

impl BlogClient {
    pub fn new(config: BlogConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub async fn posts(&self, query: &PostQuery) -> Result<Vec<BlogPost>, BlogError> {
        let response = self
            .http
            .get(&self.config.feed_url)
            .timeout(self.config.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BlogError::Status(response.status()));
        }

        let xml = response.text().await?;
        let posts = parse_feed(&xml, &self.config.default_author)?;
        Ok(filter_posts(posts, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Stories by Dinmay on Medium</title>
    <link>https://medium.com/@dinmaybrahma</link>
    <item>
      <title><![CDATA[FlowRL: Matching Reward Distributions]]></title>
      <link>https://medium.com/p/flowrl</link>
      <guid isPermaLink="false">https://medium.com/p/1a2b</guid>
      <category><![CDATA[reinforcement-learning]]></category>
      <category><![CDATA[llm]]></category>
      <dc:creator><![CDATA[Dinmay Brahma]]></dc:creator>
      <pubDate>Mon, 22 Sep 2025 10:00:00 GMT</pubDate>
      <description><![CDATA[<p>Policy <b>optimization</b> for language models.</p>]]></description>
    </item>
    <item>
      <title>Agent Payments &amp; Protocols</title>
      <link>https://medium.com/p/ap2</link>
      <description>&lt;p&gt;How agents pay.&lt;/p&gt;</description>
    </item>
    <item>
      <link>https://medium.com/p/empty</link>
    </item>
  </channel>
</rss>"#;

    fn parsed() -> Vec<BlogPost> {
        parse_feed(FEED, "Dinmay Kumar Brahma").unwrap()
    }

    #[test]
    fn parses_items_with_cdata_and_entities() {
        let posts = parsed();
        assert_eq!(posts.len(), 3);

        assert_eq!(posts[0].title, "FlowRL: Matching Reward Distributions");
        assert_eq!(posts[0].description, "Policy optimization for language models....");
        assert_eq!(posts[0].author.as_deref(), Some("Dinmay Brahma"));
        assert_eq!(posts[0].guid.as_deref(), Some("https://medium.com/p/1a2b"));
        assert_eq!(posts[0].pub_date, "Mon, 22 Sep 2025 10:00:00 GMT");
        assert_eq!(posts[0].tags, vec!["reinforcement-learning", "llm"]);

        assert_eq!(posts[1].title, "Agent Payments & Protocols");
        assert_eq!(posts[1].description, "How agents pay....");
        assert_eq!(posts[1].author.as_deref(), Some("Dinmay Kumar Brahma"));
        assert_eq!(posts[1].guid.as_deref(), Some("https://medium.com/p/ap2"));
    }

    #[test]
    fn missing_fields_get_defaults() {
        let post = &parsed()[2];
        assert_eq!(post.title, "Untitled");
        assert_eq!(post.pub_date, "");
        assert_eq!(post.description, "No description available");
    }

    #[test]
    fn long_descriptions_are_truncated_by_characters() {
        let html = format!("<p>{}</p>", "é".repeat(300));
        let summary = summarize(&html);
        assert_eq!(summary.chars().count(), DESCRIPTION_CHARS + 3);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn serializes_pub_date_in_camel_case() {
        let value = serde_json::to_value(&parsed()[1]).unwrap();
        assert_eq!(value["pubDate"], "");
        assert!(value.get("tags").is_none());
    }

    #[test]
    fn search_and_limit_are_applied_in_order() {
        let query = PostQuery {
            search: Some("AGENT".to_string()),
            limit: None,
        };
        let posts = filter_posts(parsed(), &query);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].link, "https://medium.com/p/ap2");

        let query = PostQuery {
            search: Some("  ".to_string()),
            limit: Some(2),
        };
        assert_eq!(filter_posts(parsed(), &query).len(), 2);
    }

    #[test]
    fn non_rss_documents_are_rejected() {
        assert!(matches!(
            parse_feed("<html><body>oops</body></html>", "x"),
            Err(BlogError::Parse(_))
        ));
        assert!(matches!(
            parse_feed("<rss><channel><item></channel></rss>", "x"),
            Err(BlogError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn client_fetches_and_filters_the_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed/@someone"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(FEED, "application/rss+xml"))
            .mount(&server)
            .await;

        let client = BlogClient::new(BlogConfig {
            feed_url: format!("{}/feed/@someone", server.uri()),
            default_author: "Someone".to_string(),
            timeout: DEFAULT_TIMEOUT,
        });
        let posts = client
            .posts(&PostQuery {
                search: None,
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].link, "https://medium.com/p/flowrl");
    }

    #[tokio::test]
    async fn upstream_status_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = BlogClient::new(BlogConfig {
            feed_url: server.uri(),
            default_author: "Someone".to_string(),
            timeout: DEFAULT_TIMEOUT,
        });
        assert!(matches!(
            client.posts(&PostQuery::default()).await,
            Err(BlogError::Status(StatusCode::SERVICE_UNAVAILABLE))
        ));
    }

    #[tokio::test]
    async fn stalled_feed_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(FEED, "application/rss+xml")
                    .set_delay(Duration::from_secs(3600)),
            )
            .mount(&server)
            .await;

        let client = BlogClient::new(BlogConfig {
            feed_url: server.uri(),
            default_author: "Someone".to_string(),
            timeout: Duration::from_millis(100),
        });
        match client.posts(&PostQuery::default()).await {
            Err(BlogError::Fetch(err)) => assert!(err.is_timeout()),
            other => panic!("expected a timeout, got {other:?}"),
        }
    }
}
