use std::sync::Arc;

use coinq_pipeline::Pipeline;

/// Run the interactive chat REPL: read a line, send it as a turn,
/// print the answer. Supports slash-commands for session control.
pub async fn chat(pipeline: Arc<Pipeline>, mut session_key: String) -> anyhow::Result<()> {
    let history_path = dirs::home_dir().unwrap_or_default().join(".coinq").join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    eprintln!("coinq interactive chat");
    eprintln!("Session: {session_key}  |  Type /help for commands, Ctrl+D to exit");
    eprintln!();

    loop {
        let readline = rl.readline("you> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    if handle_slash_command(trimmed, &mut session_key) {
                        break;
                    }
                    continue;
                }

                let outcome = pipeline.ask(&session_key, trimmed).await;
                println!("{}", outcome.answer);
                if !outcome.errors.is_empty() {
                    eprintln!("\x1B[2m[path: {}, {} error(s)]\x1B[0m", outcome.path, outcome.errors.len());
                } else {
                    eprintln!("\x1B[2m[path: {}]\x1B[0m", outcome.path);
                }
                println!();
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

/// Returns `true` if the REPL should exit.
fn handle_slash_command(input: &str, session_key: &mut String) -> bool {
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim());

    match cmd {
        "/exit" | "/quit" => return true,
        "/session" => {
            if let Some(name) = arg.filter(|s| !s.is_empty()) {
                *session_key = name.to_string();
                eprintln!("Session switched to: {session_key}");
            } else {
                eprintln!("Current session: {session_key}");
                eprintln!("Usage: /session <name>");
            }
        }
        "/reset" => {
            let ts = chrono::Utc::now().timestamp();
            *session_key = format!("{session_key}:{ts}");
            eprintln!("Session reset. New session key: {session_key}");
        }
        "/clear" => {
            eprint!("\x1B[2J\x1B[1;1H");
        }
        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /session <name>  Switch to a named session");
            eprintln!("  /clear           Clear the screen");
            eprintln!("  /reset           Start a fresh session (new key)");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }
        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }
    false
}
