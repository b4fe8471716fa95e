//! Wire types for the Reddit OAuth and listing endpoints.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
pub(crate) struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData<T> {
    #[serde(default = "Vec::new")]
    pub children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Thing<T> {
    pub data: T,
}

/// A `t3` submission.
#[derive(Debug, Deserialize)]
pub(crate) struct Submission {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
}

impl Submission {
    pub fn render(&self) -> String {
        format!("Title: {}\nBody: {}", self.title, self.selftext)
    }
}

/// A `t1` comment.
#[derive(Debug, Deserialize)]
pub(crate) struct Comment {
    #[serde(default)]
    pub body: String,
}

impl<T> Listing<T> {
    pub fn into_items(self) -> impl Iterator<Item = T> {
        self.data.children.into_iter().map(|thing| thing.data)
    }
}
