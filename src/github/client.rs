use super::*;
use crate::config::Config;
use anyhow::{bail, Context};
use regex::Regex;
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use tracing::debug;

const PER_PAGE: &str = "100";
const MEDIA_TYPE: &str = "application/vnd.github.v3+json";

static PAGE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]page=(\d+)").expect("valid page regex"));

/// GitHub REST v3 client.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct SearchBody {
    total_count: u64,
    #[serde(default)]
    items: Vec<Issue>,
}

impl RestClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("pullstats/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.is_empty()) {
            let proxy = reqwest::Proxy::all(proxy)
                .with_context(|| format!("Invalid proxy url {}", proxy))?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.get(&url).header(ACCEPT, MEDIA_TYPE).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        debug!("GET {} {:?}", url, query);
        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("GitHub API returned {} for {}: {}", status, url, body.trim());
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path, &[]).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to decode response of {}", path))
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        mut query: Vec<(&str, String)>,
        page: u32,
    ) -> Result<Page<T>> {
        query.push(("per_page", PER_PAGE.to_string()));
        query.push(("page", page.to_string()));

        let response = self.get(path, &query).await?;
        let next_page = next_page(response.headers());
        let items = response
            .json()
            .await
            .with_context(|| format!("Failed to decode page {} of {}", page, path))?;

        Ok(Page { items, next_page })
    }
}

#[async_trait]
impl GitHubApi for RestClient {
    async fn list_commits(
        &self,
        repo: &RepoRef,
        author: &str,
        until: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<RepoCommit>> {
        let mut query = vec![("author", author.to_string())];
        if let Some(until) = until {
            query.push(("until", until.to_rfc3339()));
        }
        let path = format!("/repos/{}/{}/commits", repo.owner, repo.name);
        self.get_page(&path, query, page).await
    }

    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        state: PullState,
        sort: PullSort,
        page: u32,
    ) -> Result<Page<PullRequest>> {
        let query = vec![
            ("state", state.as_str().to_string()),
            ("sort", sort.as_str().to_string()),
            ("direction", "desc".to_string()),
        ];
        let path = format!("/repos/{}/{}/pulls", repo.owner, repo.name);
        self.get_page(&path, query, page).await
    }

    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest> {
        self.get_json(&format!("/repos/{}/{}/pulls/{}", repo.owner, repo.name, number))
            .await
    }

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<Issue> {
        self.get_json(&format!("/repos/{}/{}/issues/{}", repo.owner, repo.name, number))
            .await
    }

    async fn list_issue_events(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<IssueEvent>> {
        let path = format!("/repos/{}/{}/issues/{}/events", repo.owner, repo.name, number);
        self.get_page(&path, Vec::new(), page).await
    }

    async fn search_issues(&self, query: &str) -> Result<SearchResults> {
        // A commit sha never matches a hundred pull requests, one page is enough.
        let params = [
            ("q", query.to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("page", "1".to_string()),
        ];
        let response = self.get("/search/issues", &params).await?;
        let rate = rate_limit(response.headers());
        let body: SearchBody = response
            .json()
            .await
            .with_context(|| format!("Failed to decode search results for '{}'", query))?;

        Ok(SearchResults {
            total_count: body.total_count,
            items: body.items,
            rate,
        })
    }

    async fn list_repositories(&self, owner: &str, page: u32) -> Result<Page<Repository>> {
        self.get_page(&format!("/users/{}/repos", owner), Vec::new(), page)
            .await
    }
}

/// Page number of the `rel="next"` entry of a `Link` header.
fn next_page(headers: &HeaderMap) -> Option<u32> {
    let link = headers.get(LINK)?.to_str().ok()?;

    link.split(',')
        .find(|part| part.contains(r#"rel="next""#))
        .and_then(|part| PAGE_PARAM.captures(part))
        .and_then(|captures| captures.get(1))
        .and_then(|page| page.as_str().parse().ok())
}

fn rate_limit(headers: &HeaderMap) -> Option<RateLimit> {
    let number = |name: &str| -> Option<i64> { headers.get(name)?.to_str().ok()?.parse().ok() };

    let reset = DateTime::from_timestamp(number("x-ratelimit-reset")?, 0)?;
    Some(RateLimit {
        limit: number("x-ratelimit-limit")?.try_into().ok()?,
        remaining: number("x-ratelimit-remaining")?.try_into().ok()?,
        reset,
    })
}
