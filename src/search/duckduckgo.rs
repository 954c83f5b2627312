use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{SearchError, SearchProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.duckduckgo.com/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Result {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL", default)]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics", default)]
        topics: Vec<RelatedTopic>,
    },
}

impl RelatedTopic {
    fn flatten<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        match self {
            RelatedTopic::Result { text, first_url } => out.push((text.as_str(), first_url.as_str())),
            RelatedTopic::Group { topics } => {
                for topic in topics {
                    topic.flatten(out);
                }
            }
        }
    }
}

/// DuckDuckGo Instant Answer API.
pub struct DuckDuckGo {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
            max_results: 3,
        }
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGo {
    fn name(&self) -> &'static str {
        "DuckDuckGo"
    }

    async fn search(&self, query: &str) -> Result<String, SearchError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )
        .map_err(|err| SearchError::InvalidUrl(err.to_string()))?;

        let answer: InstantAnswer = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let results = format_answer(&answer, self.max_results);
        if results.is_empty() {
            return Err(SearchError::Empty);
        }
        Ok(results)
    }
}

fn format_answer(answer: &InstantAnswer, max_results: usize) -> String {
    let mut sections = Vec::new();

    if !answer.abstract_text.is_empty() {
        let mut summary = if answer.heading.is_empty() {
            answer.abstract_text.clone()
        } else {
            format!("{}: {}", answer.heading, answer.abstract_text)
        };
        if !answer.abstract_url.is_empty() {
            summary.push_str(&format!(" ({})", answer.abstract_url));
        }
        sections.push(summary);
    }

    let mut topics = Vec::new();
    for topic in &answer.related_topics {
        topic.flatten(&mut topics);
    }

    let remaining = max_results.saturating_sub(sections.len());
    sections.extend(
        topics
            .into_iter()
            .filter(|(text, _)| !text.is_empty())
            .take(remaining)
            .map(|(text, url)| {
                if url.is_empty() {
                    format!("- {}", text)
                } else {
                    format!("- {} ({})", text, url)
                }
            }),
    );

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn formats_abstract_and_related_topics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "flowrl research"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Heading": "FlowRL",
                "AbstractText": "A reinforcement learning method.",
                "AbstractURL": "https://example.com/flowrl",
                "RelatedTopics": [
                    {"Text": "Policy gradients", "FirstURL": "https://example.com/pg"},
                    {"Name": "Nested", "Topics": [
                        {"Text": "Reward models", "FirstURL": "https://example.com/rm"},
                        {"Text": "Dropped", "FirstURL": "https://example.com/x"}
                    ]}
                ]
            })))
            .mount(&server)
            .await;

        let provider = DuckDuckGo::with_base_url(&format!("{}/", server.uri()));
        let results = provider.search("flowrl research").await.unwrap();

        assert_eq!(
            results,
            "FlowRL: A reinforcement learning method. (https://example.com/flowrl)\n\
             - Policy gradients (https://example.com/pg)\n\
             - Reward models (https://example.com/rm)"
        );
    }

    #[tokio::test]
    async fn empty_answer_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AbstractText": "",
                "RelatedTopics": []
            })))
            .mount(&server)
            .await;

        let provider = DuckDuckGo::with_base_url(&server.uri());
        assert!(matches!(
            provider.search("nothing").await,
            Err(SearchError::Empty)
        ));
    }

    #[tokio::test]
    async fn rate_limit_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = DuckDuckGo::with_base_url(&server.uri());
        assert!(matches!(
            provider.search("anything").await,
            Err(SearchError::Http(_))
        ));
    }
}
