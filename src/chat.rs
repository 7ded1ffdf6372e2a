//! `ask` and `chat` commands.
//!
//! `ask` runs a single turn and prints the reply. `chat` is a line-based
//! REPL over stdin: plain lines are questions, lines starting with `/` are
//! commands (see [`ReplCommand`]). Ctrl-C while waiting for a reply abandons
//! that turn; the question stays in the history, as it does when the
//! endpoint fails. Ctrl-C at the prompt exits.

use anyhow::{bail, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

use intellibot_core::session::{ChatModel, Session};

use crate::config::Config;
use crate::export::{self, ExportFormat};
use crate::extract;
use crate::llm::HttpChatModel;

const HELP: &str = "\
Commands:
  /load <path>               load a PDF or text document
  /unload                    forget the loaded document
  /status                    show the document and conversation state
  /history                   print the conversation so far
  /export <txt|pdf> <path>   save the conversation
  /clear                     start a new conversation (keeps the document)
  /help                      show this help
  /quit                      exit
Anything else is sent as a question.";

/// One parsed line of REPL input.
#[derive(Debug, PartialEq)]
pub enum ReplCommand {
    Ask(String),
    Load(PathBuf),
    Unload,
    Status,
    History,
    Export { format: ExportFormat, path: PathBuf },
    Clear,
    Help,
    Quit,
    Empty,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(ReplCommand::Empty);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(ReplCommand::Ask(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        Ok(match name {
            "load" => {
                if arg.is_empty() {
                    bail!("usage: /load <path>");
                }
                ReplCommand::Load(PathBuf::from(arg))
            }
            "unload" => ReplCommand::Unload,
            "status" => ReplCommand::Status,
            "history" => ReplCommand::History,
            "export" => {
                let Some((format, path)) = arg.split_once(char::is_whitespace) else {
                    bail!("usage: /export <txt|pdf> <path>");
                };
                ReplCommand::Export {
                    format: format.parse()?,
                    path: PathBuf::from(path.trim()),
                }
            }
            "clear" => ReplCommand::Clear,
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            other => bail!("unknown command /{} (try /help)", other),
        })
    }
}

/// Build a session from configuration, optionally with a document loaded.
fn open_session(config: &Config, document: Option<&Path>, top_k: Option<usize>) -> Result<Session> {
    let mut options = config.session_options()?;
    options.top_k = config.top_k(top_k)?;

    let mut session = Session::new(options);
    if let Some(path) = document {
        let doc = extract::load_document(path)?;
        session.load_document(&doc);
    }
    Ok(session)
}

/// Answer one question and print the reply.
pub async fn run_ask(
    config: &Config,
    question: &str,
    document: Option<&Path>,
    top_k: Option<usize>,
) -> Result<()> {
    let model = HttpChatModel::new(&config.model)?;
    let mut session = open_session(config, document, top_k)?;

    let reply = session.ask(&model, question).await?;
    println!("{}", reply);
    Ok(())
}

/// Run the interactive chat loop until `/quit`, EOF or Ctrl-C.
pub async fn run_chat(config: &Config, document: Option<&Path>) -> Result<()> {
    let model = HttpChatModel::new(&config.model)?;
    let mut session = open_session(config, document, None)?;
    let interactive = atty::is(atty::Stream::Stdin);

    if interactive {
        println!("intellibot: chatting with {}", model.name());
        if let Some(doc) = session.document() {
            println!("Loaded {} ({} chunks).", doc.document_name, doc.len());
        }
        println!("Type /help for commands.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = match ReplCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("Error: {}", e);
                continue;
            }
        };

        match command {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Ask(question) => ask_in_repl(&mut session, &model, &question).await,
            ReplCommand::Load(path) => match extract::load_document(&path) {
                Ok(doc) => {
                    let collection = session.load_document(&doc);
                    println!(
                        "Loaded {} ({} chunks).",
                        collection.document_name,
                        collection.len()
                    );
                }
                Err(e) => eprintln!("Error: {} (previous document kept)", e),
            },
            ReplCommand::Unload => match session.unload_document() {
                Some(collection) => println!("Unloaded {}.", collection.document_name),
                None => println!("No document loaded."),
            },
            ReplCommand::Status => print_status(&session, &model),
            ReplCommand::History => {
                for message in session.history() {
                    println!("{}: {}", message.role.label(), message.content);
                    println!();
                }
            }
            ReplCommand::Export { format, path } => {
                match export::write_export(session.history(), format, &path) {
                    Ok(()) => println!("Exported to {}.", path.display()),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            ReplCommand::Clear => {
                session = session.restart();
                println!("Started a new conversation.");
            }
            ReplCommand::Help => println!("{}", HELP),
        }
    }

    Ok(())
}

async fn ask_in_repl(session: &mut Session, model: &dyn ChatModel, question: &str) {
    let result = tokio::select! {
        result = session.ask(model, question) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match result {
        Some(Ok(reply)) => {
            println!("{}", reply);
            println!();
        }
        Some(Err(e)) if e.is_endpoint() => {
            eprintln!("Error: {}", e);
            eprintln!("Your question is kept in the history; ask again to retry.");
        }
        Some(Err(e)) => eprintln!("Error: {}", e),
        None => {
            tracing::info!("turn cancelled");
            eprintln!("(cancelled)");
        }
    }
}

fn print_status(session: &Session, model: &HttpChatModel) {
    println!("model:     {}", model.name());
    println!("endpoint:  {}", model.endpoint());
    match session.document() {
        Some(doc) => {
            println!("document:  {}", doc.document_name);
            println!("sha256:    {}", doc.short_hash());
            println!("chunks:    {}", doc.len());
        }
        None => println!("document:  (none)"),
    }
    println!("messages:  {}", session.history().len());
    println!("top_k:     {}", session.options().top_k);
}
