//! HTTP feed client for Reddit's public JSON listings
//!
//! Pages through `/r/{source}/top.json` using the listing's `after` cursor,
//! `PAGE_SIZE` entries per request. No authentication and no retry: a
//! failed page ends the listing for that source.

use super::{EntryIter, FeedClient};
use crate::error::{FeedError, FeedResult};
use crate::types::{RawEntry, DELETED_AUTHOR};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Default listing host
pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

/// Default User-Agent (Reddit throttles generic agents)
pub const DEFAULT_USER_AGENT: &str =
    concat!("submission-harvest/", env!("CARGO_PKG_VERSION"));

/// Maximum entries Reddit returns per listing page
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    after: Option<String>,
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    author: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    upvote_ratio: f64,
    created_utc: f64,
    #[serde(default)]
    url: String,
}

impl From<PostData> for RawEntry {
    fn from(post: PostData) -> Self {
        // Deleted accounts come back as a literal "[deleted]" or not at all
        let author = post.author.filter(|a| a != DELETED_AUTHOR && !a.is_empty());

        Self {
            id: post.id,
            author,
            title: post.title,
            score: post.score,
            upvote_ratio: post.upvote_ratio,
            created_utc: post.created_utc as i64,
            url: post.url,
        }
    }
}

/// Decode one listing page into entries and the next-page cursor
fn decode_page(source: &str, body: &str) -> FeedResult<(Vec<RawEntry>, Option<String>)> {
    let listing: Listing = serde_json::from_str(body).map_err(|e| FeedError::Decode {
        source_name: source.to_string(),
        reason: e.to_string(),
    })?;

    let entries = listing
        .data
        .children
        .into_iter()
        .map(|child| RawEntry::from(child.data))
        .collect();

    Ok((entries, listing.data.after))
}

/// Blocking HTTP client for top listings
pub struct RedditClient {
    client: Client,
    base_url: String,
}

impl RedditClient {
    /// Create a client against `base_url` (no trailing slash needed)
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> FeedResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one page of the top listing
    fn fetch_page(
        &self,
        source: &str,
        count: usize,
        after: Option<&str>,
    ) -> FeedResult<(Vec<RawEntry>, Option<String>)> {
        let url = format!("{}/r/{}/top.json", self.base_url, source);
        let count = count.to_string();

        let mut query = vec![("limit", count.as_str()), ("t", "all"), ("raw_json", "1")];
        if let Some(after) = after {
            query.push(("after", after));
        }

        debug!(source = source, after = ?after, "Fetching listing page");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .map_err(|e| FeedError::Request {
                source_name: source.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                source_name: source.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|e| FeedError::Request {
            source_name: source.to_string(),
            reason: e.to_string(),
        })?;

        decode_page(source, &body)
    }
}

impl FeedClient for RedditClient {
    fn top(&self, source: &str, limit: Option<usize>) -> EntryIter<'_> {
        Box::new(TopListing {
            client: self,
            source: source.to_string(),
            remaining: limit,
            after: None,
            buffered: VecDeque::new(),
            exhausted: false,
        })
    }
}

/// Lazy cursor over the pages of one top listing
struct TopListing<'a> {
    client: &'a RedditClient,
    source: String,
    remaining: Option<usize>,
    after: Option<String>,
    buffered: VecDeque<RawEntry>,
    exhausted: bool,
}

impl TopListing<'_> {
    fn take_buffered(&mut self) -> Option<RawEntry> {
        let entry = self.buffered.pop_front()?;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(entry)
    }
}

impl Iterator for TopListing<'_> {
    type Item = FeedResult<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }

        if let Some(entry) = self.take_buffered() {
            return Some(Ok(entry));
        }

        if self.exhausted {
            return None;
        }

        let count = self.remaining.map_or(PAGE_SIZE, |r| r.min(PAGE_SIZE));
        match self
            .client
            .fetch_page(&self.source, count, self.after.as_deref())
        {
            Ok((entries, after)) => {
                debug!(
                    source = %self.source,
                    entries = entries.len(),
                    more = after.is_some(),
                    "Listing page received"
                );
                self.exhausted = after.is_none() || entries.is_empty();
                self.after = after;
                self.buffered.extend(entries);
                self.take_buffered().map(Ok)
            }
            Err(e) => {
                self.exhausted = true;
                self.buffered.clear();
                Some(Err(e))
            }
        }
    }
}
