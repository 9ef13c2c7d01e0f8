//! Payload formatting, cache-key derivation, and the response cache.

use std::collections::HashMap;

use crate::error::ModelError;
use crate::inbox::Email;

/// Cache key used for any whole-mailbox request.
pub const MAILBOX_CACHE_KEY: &str = "full_mailbox";

/// The text-completion seam. Production uses [`super::GeminiClient`];
/// tests substitute a stub that counts outbound calls.
#[allow(async_fn_in_trait)]
pub trait Completion {
    async fn complete(&self, payload: &str) -> Result<String, ModelError>;
}

/// What a request is about: one email, or the entire mailbox in order.
#[derive(Debug, Clone, Copy)]
pub enum PromptContext<'a> {
    Single(&'a Email),
    Mailbox(&'a [Email]),
}

/// Derive the cache key for a context.
///
/// The key encodes only the context, never the template or question, so
/// asking something new about an already-queried context is a cache hit
/// that returns the previous answer. Deliberately preserved; see
/// DESIGN.md before changing.
pub fn cache_key(ctx: &PromptContext<'_>) -> String {
    match ctx {
        PromptContext::Single(email) => format!("email_{}", email.id),
        PromptContext::Mailbox(_) => MAILBOX_CACHE_KEY.to_string(),
    }
}

/// Render the template plus context into the single text payload sent to
/// the model.
pub fn format_payload(template: &str, ctx: &PromptContext<'_>) -> String {
    match ctx {
        PromptContext::Single(email) => format!(
            "{}\n\nEmail:\nSubject: {}\nFrom: {}\nBody: {}",
            template, email.subject, email.from_addr, email.body
        ),
        PromptContext::Mailbox(emails) => {
            let inbox_text = emails
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    format!(
                        "Email #{}\nSubject: {}\nFrom: {}\nBody: {}",
                        i + 1,
                        e.subject,
                        e.from_addr,
                        e.body
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            format!("{}\n\nHere is the entire mailbox:\n{}", template, inbox_text)
        }
    }
}

/// Deduplicating front door to the model. One instance per session; the
/// cache has no per-key single-flight guard, which is fine for the
/// single-user, one-operation-at-a-time UI model. A concurrent deployment
/// needs one gateway per session plus such a guard.
pub struct Gateway<C> {
    client: C,
    cache: HashMap<String, String>,
}

impl<C: Completion> Gateway<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            cache: HashMap::new(),
        }
    }

    /// Answer from the cache when the context was seen before; otherwise
    /// call the model and remember the response. Failures are not cached,
    /// so the next attempt goes back out to the model.
    pub async fn ask(
        &mut self,
        template: &str,
        ctx: &PromptContext<'_>,
    ) -> Result<String, ModelError> {
        let key = cache_key(ctx);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "response cache hit");
            return Ok(hit.clone());
        }

        let payload = format_payload(template, ctx);
        tracing::debug!(%key, payload_len = payload.len(), "calling model");
        let response = self.client.complete(&payload).await?;
        self.cache.insert(key, response.clone());
        Ok(response)
    }

    #[cfg(test)]
    pub(crate) fn cached(&self, key: &str) -> Option<&str> {
        self.cache.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn client(&self) -> &C {
        &self.client
    }
}

#[cfg(test)]
mod stub {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::Completion;
    use crate::error::ModelError;

    type ReplyFn = Box<dyn Fn(&str) -> Result<String, ModelError> + Send + Sync>;

    /// Test double for the completion seam; counts outbound calls so
    /// tests can assert cache behavior.
    pub(crate) struct StubClient {
        reply: ReplyFn,
        calls: AtomicUsize,
    }

    impl StubClient {
        pub(crate) fn new(
            reply: impl Fn(&str) -> Result<String, ModelError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                reply: Box::new(reply),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn fixed(text: &str) -> Self {
            let text = text.to_string();
            Self::new(move |_| Ok(text.clone()))
        }

        pub(crate) fn failing(message: &str) -> Self {
            let message = message.to_string();
            Self::new(move |_| {
                Err(ModelError::Api {
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    message: message.clone(),
                })
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Completion for StubClient {
        async fn complete(&self, payload: &str) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)(payload)
        }
    }
}

#[cfg(test)]
pub(crate) use stub::StubClient;
