//! `minijira chat` — Interactive or single-message chat mode.

use std::io::Write;

use minijira_agent::Dispatcher;
use minijira_core::message::Conversation;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let dispatcher = super::build_dispatcher(&config).await?;

    if let Some(msg) = message {
        // Single message mode
        let outcome = dispatcher.run_turn(Conversation::new(), &msg).await?;
        println!("{}", outcome.reply);
        return Ok(());
    }

    println!();
    println!("  Mini-Jira Admin Agent — Interactive Mode");
    println!();
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!("  Database:  {}", config.store.path.display());
    println!();
    println!("  Type 'exit' or 'quit' to leave.");
    println!();

    let input = BufReader::new(tokio::io::stdin());
    repl(&dispatcher, input, &mut std::io::stdout()).await?;

    Ok(())
}

/// Read lines until `exit`, `quit` or EOF, running one turn per line.
///
/// The conversation lives here and is threaded through every turn. A failed
/// turn is reported and leaves the conversation as it was.
pub async fn repl<R, W>(
    dispatcher: &Dispatcher,
    input: R,
    out: &mut W,
) -> std::io::Result<Conversation>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut history = Conversation::new();

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        match dispatcher.run_turn(history.clone(), text).await {
            Ok(outcome) => {
                writeln!(out, "Bot: {}", outcome.reply)?;
                history = outcome.history;
            }
            Err(e) => {
                tracing::error!(error = %e, "Turn failed");
                writeln!(out, "Bot: [error] {e}")?;
            }
        }
    }

    writeln!(out, "Goodbye!")?;
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijira_agent::IntentClassifier;
    use minijira_agent::testing::{ScriptedProvider, Step};
    use minijira_core::error::ProviderError;
    use minijira_core::store::TicketStore;
    use minijira_store::SqliteStore;
    use std::sync::Arc;

    async fn dispatcher(steps: Vec<Step>) -> (Dispatcher, Arc<ScriptedProvider>) {
        let store: Arc<dyn TicketStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
        let tools = Arc::new(minijira_tools::default_registry(store));
        let provider = Arc::new(ScriptedProvider::new(steps));
        let classifier = IntentClassifier::new(provider.clone(), "scripted");
        (Dispatcher::new(classifier, tools), provider)
    }

    #[tokio::test]
    async fn repl_threads_history_and_stops_at_exit() {
        let (dispatcher, provider) = dispatcher(vec![
            Step::Reply(r#"{"intent":"add_user","args":{"user_id":1,"name":"Alice"}}"#.into()),
            Step::Reply(r#"{"intent":"show_users","args":{}}"#.into()),
        ])
        .await;

        let mut out = Vec::new();
        let history = repl(
            &dispatcher,
            &b"add user 1 Alice\n\nshow users\nexit\nnever read\n"[..],
            &mut out,
        )
        .await
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Bot: The user is added."));
        assert!(text.contains("Bot: Users:\n1: Alice"));
        assert!(text.ends_with("Goodbye!\n"));
        assert_eq!(history.len(), 4);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn repl_reports_errors_and_continues() {
        let (dispatcher, _) = dispatcher(vec![
            Step::Fail(ProviderError::Network("connection refused".into())),
            Step::Reply(r#"{"intent":"unsupported","args":{}}"#.into()),
        ])
        .await;

        let mut out = Vec::new();
        let history = repl(&dispatcher, &b"show users\nwhat's the weather\n"[..], &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Bot: [error] Model unavailable"));
        assert!(text.contains("Goodbye!"));
        // Only the successful turn is kept.
        assert_eq!(history.len(), 2);
    }
}
