//! In-memory collaborators for stage and workflow tests.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use personakit_shared::{
    ContentSource, PersistenceSink, PersonaKitError, Result, SubjectId, Summarizer, UserContent,
};

pub(crate) struct FakeSource {
    result: std::result::Result<UserContent, String>,
    pub(crate) calls: Mutex<Vec<(String, u32)>>,
}

impl FakeSource {
    pub(crate) fn returning(posts: &[&str], comments: &[&str]) -> Self {
        Self {
            result: Ok(UserContent {
                posts: posts.iter().map(|s| s.to_string()).collect(),
                comments: comments.iter().map(|s| s.to_string()).collect(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn fetch(&self, subject: &SubjectId, limit: u32) -> Result<UserContent> {
        self.calls.lock().unwrap().push((subject.to_string(), limit));
        self.result.clone().map_err(PersonaKitError::Source)
    }
}

pub(crate) struct FakeSummarizer {
    reply: std::result::Result<String, String>,
    pub(crate) prompts: Mutex<Vec<String>>,
}

impl FakeSummarizer {
    pub(crate) fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(PersonaKitError::Summarize)
    }
}

pub(crate) struct FakeSink {
    fail: Option<String>,
    pub(crate) saved: Mutex<Vec<(String, String)>>,
}

impl FakeSink {
    pub(crate) fn accepting() -> Self {
        Self {
            fail: None,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            fail: Some(message.to_string()),
            saved: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PersistenceSink for FakeSink {
    async fn save(&self, subject: &SubjectId, text: &str) -> Result<PathBuf> {
        if let Some(message) = &self.fail {
            let path = PathBuf::from(format!("memory/{subject}_persona.txt"));
            return Err(PersonaKitError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, message.clone()),
            ));
        }
        self.saved
            .lock()
            .unwrap()
            .push((subject.to_string(), text.to_string()));
        Ok(PathBuf::from(format!("memory/{subject}_persona.txt")))
    }
}
