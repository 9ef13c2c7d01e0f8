//! Per-session state: derived results, drafts, and the agent transcript.
//!
//! One `Session` per user session. All mutation goes through the named
//! operations below, and every model failure is converted into displayable
//! `"Error: <details>"` text at this layer, so an operation always leaves
//! something to show and never aborts the session.

use std::collections::HashMap;

use crate::ai::{Completion, Gateway, PromptContext};
use crate::error::ModelError;
use crate::inbox::Inbox;
use crate::prompts::PromptSet;

/// Model-derived results for one email. Never deleted within a session.
#[derive(Debug, Clone, Default)]
pub struct DerivedState {
    pub category: Option<String>,
    pub actions: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the append-only agent chat transcript.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: Role,
    pub message: String,
}

/// Context scope for an agent question.
#[derive(Debug, Clone)]
pub enum AgentScope {
    /// One selected email, by id.
    Email(String),
    /// Every loaded email, in inbox order.
    Mailbox,
}

pub struct Session<C> {
    inbox: Inbox,
    prompts: PromptSet,
    gateway: Gateway<C>,
    derived: HashMap<String, DerivedState>,
    replies: HashMap<String, String>,
    drafts: HashMap<String, String>,
    transcript: Vec<ChatTurn>,
}

impl<C: Completion> Session<C> {
    pub fn new(inbox: Inbox, prompts: PromptSet, client: C) -> Self {
        let derived = inbox
            .emails()
            .iter()
            .map(|e| (e.id.clone(), DerivedState::default()))
            .collect();
        Self {
            inbox,
            prompts,
            gateway: Gateway::new(client),
            derived,
            replies: HashMap::new(),
            drafts: HashMap::new(),
            transcript: Vec::new(),
        }
    }

    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    /// Replace the in-memory prompt set after an edit. Persistence is the
    /// prompt store's job; edits apply even when the save fails.
    pub fn set_prompts(&mut self, prompts: PromptSet) {
        self.prompts = prompts;
    }

    pub fn derived(&self, id: &str) -> Option<&DerivedState> {
        self.derived.get(id)
    }

    pub fn reply_in_progress(&self, id: &str) -> Option<&str> {
        self.replies.get(id).map(String::as_str)
    }

    pub fn draft(&self, id: &str) -> Option<&str> {
        self.drafts.get(id).map(String::as_str)
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Categorize one email. Returns `None` for an unknown id.
    pub async fn categorize(&mut self, id: &str) -> Option<String> {
        let email = self.inbox.get(id)?;
        let result = self
            .gateway
            .ask(&self.prompts.categorize_prompt, &PromptContext::Single(email))
            .await;
        let text = display_text("categorize", result);
        self.derived.entry(id.to_string()).or_default().category = Some(text.clone());
        Some(text)
    }

    /// Extract action items from one email. Returns `None` for an unknown id.
    pub async fn extract_actions(&mut self, id: &str) -> Option<String> {
        let email = self.inbox.get(id)?;
        let result = self
            .gateway
            .ask(&self.prompts.action_prompt, &PromptContext::Single(email))
            .await;
        let text = display_text("extract actions", result);
        self.derived.entry(id.to_string()).or_default().actions = Some(text.clone());
        Some(text)
    }

    /// Generate a reply draft, overwriting any unsaved reply-in-progress
    /// for that email. Returns `None` for an unknown id.
    pub async fn generate_reply(&mut self, id: &str) -> Option<String> {
        let email = self.inbox.get(id)?;
        let result = self
            .gateway
            .ask(&self.prompts.reply_prompt, &PromptContext::Single(email))
            .await;
        let text = display_text("generate reply", result);
        self.replies.insert(id.to_string(), text.clone());
        Some(text)
    }

    /// Commit the (possibly user-edited) reply text as the saved draft.
    /// Returns `None` for an unknown id.
    pub fn save_draft(&mut self, id: &str, text: String) -> Option<()> {
        self.inbox.get(id)?;
        self.replies.insert(id.to_string(), text.clone());
        self.drafts.insert(id.to_string(), text);
        Some(())
    }

    /// Ask the agent a question about one email or the whole mailbox.
    /// Always appends exactly two transcript turns: the question, then the
    /// answer (or the error text when the model call fails).
    pub async fn ask_agent(&mut self, question: &str, scope: &AgentScope) -> String {
        self.transcript.push(ChatTurn {
            role: Role::User,
            message: question.to_string(),
        });

        let answer = match scope {
            AgentScope::Email(id) => match self.inbox.get(id) {
                Some(email) => {
                    let template =
                        format!("{}\n\nUser question: {}", self.prompts.agent_prompt, question);
                    let result = self
                        .gateway
                        .ask(&template, &PromptContext::Single(email))
                        .await;
                    display_text("agent", result)
                }
                None => format!("Error: no email with id {id}"),
            },
            AgentScope::Mailbox => {
                let template = format!(
                    "{}\n\nUser question (mailbox): {}",
                    self.prompts.agent_prompt, question
                );
                let result = self
                    .gateway
                    .ask(&template, &PromptContext::Mailbox(self.inbox.emails()))
                    .await;
                display_text("agent", result)
            }
        };

        self.transcript.push(ChatTurn {
            role: Role::Assistant,
            message: answer.clone(),
        });
        answer
    }

    #[cfg(test)]
    pub(crate) fn gateway(&self) -> &Gateway<C> {
        &self.gateway
    }
}

/// Convert a gateway result into display text. Failures become
/// `"Error: <details>"` so the UI always has something to render.
fn display_text(op: &str, result: Result<String, ModelError>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(op, error = %e, "model call failed");
            format!("Error: {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::StubClient;
    use crate::inbox::{Email, Inbox};

    fn sample_email() -> Email {
        Email {
            id: "1".into(),
            subject: "Hi".into(),
            from_addr: "a@b.com".into(),
            timestamp: "t".into(),
            body: "Please send the report by Friday.".into(),
        }
    }

    fn sample_prompts() -> PromptSet {
        PromptSet {
            categorize_prompt: "Classify this email".into(),
            action_prompt: "List the action items".into(),
            reply_prompt: "Draft a polite reply".into(),
            agent_prompt: "You are an email assistant".into(),
        }
    }

    fn one_email_session(client: StubClient) -> Session<StubClient> {
        let inbox = Inbox::from_emails(vec![sample_email()]);
        Session::new(inbox, sample_prompts(), client)
    }

    #[tokio::test]
    async fn categorize_stores_gateway_text_under_email_key() {
        let client = StubClient::new(|payload: &str| {
            assert!(payload.contains("Classify this email"));
            assert!(payload.contains("Please send the report by Friday."));
            Ok("Request".to_string())
        });
        let mut session = one_email_session(client);

        assert!(session.derived("1").unwrap().category.is_none());
        let result = session.categorize("1").await;
        assert_eq!(result.as_deref(), Some("Request"));
        assert_eq!(
            session.derived("1").unwrap().category.as_deref(),
            Some("Request")
        );
        assert_eq!(session.gateway().cached("email_1"), Some("Request"));
    }

    #[tokio::test]
    async fn categorize_twice_makes_one_outbound_call() {
        let mut session = one_email_session(StubClient::fixed("Request"));

        let first = session.categorize("1").await.unwrap();
        let second = session.categorize("1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(session.gateway().client().calls(), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_a_no_op() {
        let mut session = one_email_session(StubClient::fixed("x"));

        assert!(session.categorize("99").await.is_none());
        assert!(session.extract_actions("99").await.is_none());
        assert!(session.generate_reply("99").await.is_none());
        assert!(session.save_draft("99", "text".into()).is_none());
        assert_eq!(session.gateway().client().calls(), 0);
    }

    #[tokio::test]
    async fn extract_actions_fills_the_other_derived_field() {
        let mut session = one_email_session(StubClient::fixed("- send report"));

        session.extract_actions("1").await.unwrap();
        let state = session.derived("1").unwrap();
        assert_eq!(state.actions.as_deref(), Some("- send report"));
        assert!(state.category.is_none());
    }

    #[tokio::test]
    async fn generate_then_edit_then_save_draft() {
        let mut session = one_email_session(StubClient::fixed("Dear sender, ..."));

        let generated = session.generate_reply("1").await.unwrap();
        assert_eq!(session.reply_in_progress("1"), Some(generated.as_str()));
        assert!(session.draft("1").is_none());

        session.save_draft("1", "Dear sender, edited.".into()).unwrap();
        assert_eq!(session.draft("1"), Some("Dear sender, edited."));
        assert_eq!(session.reply_in_progress("1"), Some("Dear sender, edited."));
    }

    #[tokio::test]
    async fn ask_agent_appends_two_turns_in_order() {
        let mut session = one_email_session(StubClient::fixed("It asks for a report."));

        let answer = session
            .ask_agent("What does this email want?", &AgentScope::Email("1".into()))
            .await;

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[0].message, "What does this email want?");
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].message, answer);
    }

    #[tokio::test]
    async fn failed_agent_call_still_appends_error_turn() {
        let mut session = one_email_session(StubClient::failing("quota exceeded"));

        session
            .ask_agent("Anything urgent?", &AgentScope::Email("1".into()))
            .await;

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert!(transcript[1].message.starts_with("Error: "), "got: {}", transcript[1].message);
        assert!(transcript[1].message.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn mailbox_scope_uses_the_sentinel_cache_key() {
        let client = StubClient::new(|payload: &str| {
            assert!(payload.contains("Here is the entire mailbox:"));
            assert!(payload.contains("User question (mailbox): Any deadlines?"));
            Ok("Friday.".to_string())
        });
        let mut session = one_email_session(client);

        let answer = session.ask_agent("Any deadlines?", &AgentScope::Mailbox).await;
        assert_eq!(answer, "Friday.");
        assert_eq!(session.gateway().cached("full_mailbox"), Some("Friday."));
    }

    #[tokio::test]
    async fn failed_categorize_stores_error_text_as_category() {
        let mut session = one_email_session(StubClient::failing("down"));

        let result = session.categorize("1").await.unwrap();
        assert!(result.starts_with("Error: "));
        assert_eq!(
            session.derived("1").unwrap().category.as_deref(),
            Some(result.as_str())
        );
        // The failure was not cached; a retry calls the model again.
        assert_eq!(session.gateway().cached("email_1"), None);
    }
}
