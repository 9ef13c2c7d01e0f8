//! Line-oriented command surface over the session core.
//!
//! Presentation glue only: every operation here is a thin call into
//! `Session` or `PromptStore`, and the core stays fully driveable
//! without this module.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use crate::ai::Completion;
use crate::prompts::PromptStore;
use crate::session::{AgentScope, Role, Session};

/// Parsed command from user input. Email arguments are 1-based positions
/// in inbox order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    List,
    Show(usize),
    Categorize(usize),
    Actions(usize),
    Reply(usize),
    Draft(usize, String),
    Scope(Option<usize>),
    Ask(String),
    History,
    Prompts,
    SetPrompt(PromptField, String),
    SavePrompts,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptField {
    Categorize,
    Actions,
    Reply,
    Agent,
}

/// Parse a command line into a ReplCommand
pub fn parse_command(input: &str) -> Option<ReplCommand> {
    let trimmed = input.trim();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (trimmed, ""),
    };

    let index = || rest.parse::<usize>().ok().filter(|n| *n >= 1);

    match word {
        "list" | "ls" => Some(ReplCommand::List),
        "show" => index().map(ReplCommand::Show),
        "categorize" | "cat" => index().map(ReplCommand::Categorize),
        "actions" => index().map(ReplCommand::Actions),
        "reply" => index().map(ReplCommand::Reply),
        "draft" => {
            let (n, text) = rest.split_once(char::is_whitespace)?;
            let n = n.parse::<usize>().ok().filter(|n| *n >= 1)?;
            Some(ReplCommand::Draft(n, text.trim().to_string()))
        }
        "scope" => match rest {
            "mailbox" => Some(ReplCommand::Scope(None)),
            _ => index().map(|n| ReplCommand::Scope(Some(n))),
        },
        "ask" if !rest.is_empty() => Some(ReplCommand::Ask(rest.to_string())),
        "history" => Some(ReplCommand::History),
        "prompts" => Some(ReplCommand::Prompts),
        "set" => {
            let (field, text) = rest.split_once(char::is_whitespace)?;
            let field = match field {
                "categorize" => PromptField::Categorize,
                "actions" => PromptField::Actions,
                "reply" => PromptField::Reply,
                "agent" => PromptField::Agent,
                _ => return None,
            };
            Some(ReplCommand::SetPrompt(field, text.trim().to_string()))
        }
        "save" => Some(ReplCommand::SavePrompts),
        "help" | "h" | "?" => Some(ReplCommand::Help),
        "q" | "quit" | "exit" => Some(ReplCommand::Quit),
        _ => None,
    }
}

const HELP: &str = "\
Commands (N is a 1-based inbox position):
    list                 List inbox emails
    show N               Show one email
    categorize N         Categorize an email
    actions N            Extract action items
    reply N              Generate a reply draft
    draft N <text>       Save <text> as the draft for email N
    scope N | mailbox    Set the agent context
    ask <question>       Ask the agent in the current scope
    history              Show the chat transcript
    prompts              Show the prompt templates
    set <role> <text>    Edit a template (categorize/actions/reply/agent)
    save                 Persist the prompt templates
    quit                 Exit";

/// Run the interactive loop until EOF or `quit`.
pub async fn run<C: Completion>(mut session: Session<C>, store: PromptStore) -> Result<()> {
    let mut scope = AgentScope::Mailbox;
    println!("mailsift — {} emails loaded. Type 'help' for commands.", session.inbox().len());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let Some(command) = parse_command(&line) else {
            println!("Unknown command. Type 'help' for the command list.");
            continue;
        };

        match command {
            ReplCommand::List => {
                for (i, email) in session.inbox().emails().iter().enumerate() {
                    println!("{:>3}  {}  {}  {}", i + 1, email.timestamp, email.from_addr, email.subject);
                }
            }
            ReplCommand::Show(n) => match email_id(&session, n) {
                Some(id) => {
                    let email = session.inbox().get(&id).unwrap().clone();
                    println!("Subject: {}", email.subject);
                    println!("From: {}", email.from_addr);
                    println!("Timestamp: {}", email.timestamp);
                    println!("\n{}", email.body);
                    if let Some(state) = session.derived(&id) {
                        if let Some(category) = &state.category {
                            println!("\nCategory: {category}");
                        }
                        if let Some(actions) = &state.actions {
                            println!("\nActions:\n{actions}");
                        }
                    }
                    if let Some(draft) = session.draft(&id) {
                        println!("\nSaved draft:\n{draft}");
                    }
                }
                None => println!("No email #{n}"),
            },
            ReplCommand::Categorize(n) => match email_id(&session, n) {
                Some(id) => {
                    let category = session.categorize(&id).await.unwrap_or_default();
                    println!("Category: {category}");
                }
                None => println!("No email #{n}"),
            },
            ReplCommand::Actions(n) => match email_id(&session, n) {
                Some(id) => {
                    let actions = session.extract_actions(&id).await.unwrap_or_default();
                    println!("Actions:\n{actions}");
                }
                None => println!("No email #{n}"),
            },
            ReplCommand::Reply(n) => match email_id(&session, n) {
                Some(id) => {
                    let reply = session.generate_reply(&id).await.unwrap_or_default();
                    println!("Reply draft:\n{reply}");
                    println!("(edit and commit with: draft {n} <text>)");
                }
                None => println!("No email #{n}"),
            },
            ReplCommand::Draft(n, text) => match email_id(&session, n) {
                Some(id) => {
                    if session.save_draft(&id, text).is_some() {
                        println!("Draft saved.");
                    }
                }
                None => println!("No email #{n}"),
            },
            ReplCommand::Scope(Some(n)) => match email_id(&session, n) {
                Some(id) => {
                    println!("Agent scope: email #{n}");
                    scope = AgentScope::Email(id);
                }
                None => println!("No email #{n}"),
            },
            ReplCommand::Scope(None) => {
                println!("Agent scope: entire mailbox ({} emails)", session.inbox().len());
                scope = AgentScope::Mailbox;
            }
            ReplCommand::Ask(question) => {
                let answer = session.ask_agent(&question, &scope).await;
                println!("{answer}");
            }
            ReplCommand::History => {
                for turn in session.transcript() {
                    let who = match turn.role {
                        Role::User => "you",
                        Role::Assistant => "agent",
                    };
                    println!("[{who}] {}", turn.message);
                }
            }
            ReplCommand::Prompts => {
                let prompts = session.prompts();
                println!("categorize: {}", prompts.categorize_prompt);
                println!("actions:    {}", prompts.action_prompt);
                println!("reply:      {}", prompts.reply_prompt);
                println!("agent:      {}", prompts.agent_prompt);
            }
            ReplCommand::SetPrompt(field, text) => {
                let mut prompts = session.prompts().clone();
                match field {
                    PromptField::Categorize => prompts.categorize_prompt = text,
                    PromptField::Actions => prompts.action_prompt = text,
                    PromptField::Reply => prompts.reply_prompt = text,
                    PromptField::Agent => prompts.agent_prompt = text,
                }
                session.set_prompts(prompts);
                println!("Template updated (persist with 'save').");
            }
            ReplCommand::SavePrompts => match store.save(session.prompts()) {
                Ok(()) => println!("Prompts saved."),
                // The in-memory edit survives; the user can retry.
                Err(e) => println!("Save failed: {e}"),
            },
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => break,
        }
    }

    Ok(())
}

fn email_id<C>(session: &Session<C>, n: usize) -> Option<String>
where
    C: Completion,
{
    session.inbox().emails().get(n - 1).map(|e| e.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_commands() {
        assert_eq!(parse_command("list"), Some(ReplCommand::List));
        assert_eq!(parse_command("  quit  "), Some(ReplCommand::Quit));
        assert_eq!(parse_command("?"), Some(ReplCommand::Help));
        assert_eq!(parse_command("bogus"), None);
    }

    #[test]
    fn parses_indexed_commands() {
        assert_eq!(parse_command("categorize 2"), Some(ReplCommand::Categorize(2)));
        assert_eq!(parse_command("cat 2"), Some(ReplCommand::Categorize(2)));
        assert_eq!(parse_command("show 0"), None);
        assert_eq!(parse_command("reply"), None);
    }

    #[test]
    fn parses_text_commands() {
        assert_eq!(
            parse_command("ask what is urgent?"),
            Some(ReplCommand::Ask("what is urgent?".into()))
        );
        assert_eq!(
            parse_command("draft 1 Thanks, will do."),
            Some(ReplCommand::Draft(1, "Thanks, will do.".into()))
        );
        assert_eq!(
            parse_command("set agent You are terse."),
            Some(ReplCommand::SetPrompt(PromptField::Agent, "You are terse.".into()))
        );
        assert_eq!(parse_command("set bogus text"), None);
    }

    #[test]
    fn parses_scope() {
        assert_eq!(parse_command("scope mailbox"), Some(ReplCommand::Scope(None)));
        assert_eq!(parse_command("scope 3"), Some(ReplCommand::Scope(Some(3))));
        assert_eq!(parse_command("scope"), None);
    }
}
