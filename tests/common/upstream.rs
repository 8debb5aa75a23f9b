//! Scripted upstream client
//!
//! Replays queued replies first, then falls back to a default behaviour.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use upstream_gateway::core::batch::{analysis_label, item_label};
use upstream_gateway::{UpstreamClient, UpstreamError};

/// What to answer once the script runs out
#[derive(Debug, Clone)]
pub enum DefaultReply {
    /// One `ITEM_n_ANALYSIS` block per labelled item, or `ok` for plain prompts
    Echo,
    /// Always fail with this error
    Fail(UpstreamError),
}

#[derive(Debug)]
pub struct ScriptedUpstream {
    script: Mutex<VecDeque<Result<String, UpstreamError>>>,
    prompts: Mutex<Vec<String>>,
    default: DefaultReply,
}

impl ScriptedUpstream {
    pub fn echo() -> Self {
        Self::with_default(DefaultReply::Echo)
    }

    pub fn failing(error: UpstreamError) -> Self {
        Self::with_default(DefaultReply::Fail(error))
    }

    fn with_default(default: DefaultReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            default,
        }
    }

    /// Queue one reply ahead of the default behaviour
    pub fn then(self, reply: Result<String, UpstreamError>) -> Self {
        self.script.lock().push_back(reply);
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Upstream result for one prompt, also usable from closures
    pub fn respond(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.prompts.lock().push(prompt.to_string());

        if let Some(reply) = self.script.lock().pop_front() {
            return reply;
        }

        match &self.default {
            DefaultReply::Fail(err) => Err(err.clone()),
            DefaultReply::Echo => Ok(echo(prompt)),
        }
    }
}

/// Number of `ITEM_n: ` labels in a combined prompt
pub fn labelled_items(prompt: &str) -> usize {
    (1..)
        .take_while(|i| prompt.contains(&format!("{}: ", item_label(*i))))
        .count()
}

fn echo(prompt: &str) -> String {
    let n = labelled_items(prompt);
    if n == 0 {
        return "ok".to_string();
    }

    (1..=n)
        .map(|p| {
            format!(
                "{}\n```json\n{{\"risk_level\": \"Low\", \"analysis\": \"item {} reviewed\"}}\n```\n",
                analysis_label(p),
                p
            )
        })
        .collect()
}

#[async_trait]
impl UpstreamClient for ScriptedUpstream {
    async fn call(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.respond(prompt)
    }
}
