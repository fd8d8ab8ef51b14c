//! Interactive, line-driven list/detail session
//!
//! Loads run on spawned tasks and report back over a channel while stdin is
//! read on its own thread, so typing never waits on the network and a slow
//! response cannot overwrite a newer one.

use anyhow::Result;
use async_trait::async_trait;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::controller::ResourceListController;
use crate::models::Resource;
use crate::notify::Notifier;
use crate::output;
use crate::screens::{Confirm, DetailScreen, ListIntent, ListScreen, Navigator, Route, Screen, ScreenAction};

const LIST_HELP: &str = "\
Commands:
  n | next            next page
  p | prev            previous page
  first | last        jump to the first or last page
  g N | page N        go to page N
  r | refresh         reload from the server
  o ID | open ID      open an item
  new                 create an item
  d ID | delete ID    delete an item
  q | quit            leave";

const DETAIL_HELP: &str = "\
Commands:
  KEY=VALUE | set KEY=VALUE   change a field
  show                        print the form
  save                        validate and save
  b | back                    return to the list
  q | quit                    leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    List(ListIntent),
    Set(String, String),
    Show,
    Save,
    Back,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Interpret one input line; `in_detail` selects the detail command set
pub fn parse_command(line: &str, in_detail: bool) -> BrowseCommand {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match (head.to_lowercase().as_str(), rest) {
        ("", _) => BrowseCommand::Empty,
        ("q" | "quit" | "exit", _) => BrowseCommand::Quit,
        ("help" | "?", _) => BrowseCommand::Help,
        _ if in_detail => parse_detail_command(head, rest, line),
        ("n" | "next", _) => BrowseCommand::List(ListIntent::NextPage),
        ("p" | "prev", _) => BrowseCommand::List(ListIntent::PreviousPage),
        ("first", _) => BrowseCommand::List(ListIntent::FirstPage),
        ("last", _) => BrowseCommand::List(ListIntent::LastPage),
        ("r" | "refresh", _) => BrowseCommand::List(ListIntent::Refresh),
        ("new", _) => BrowseCommand::List(ListIntent::New),
        ("g" | "page", n) => match n.parse() {
            Ok(page) => BrowseCommand::List(ListIntent::GoToPage(page)),
            Err(_) => BrowseCommand::Unknown(line.to_string()),
        },
        ("o" | "open", id) if !id.is_empty() => BrowseCommand::List(ListIntent::Open(id.to_string())),
        ("d" | "delete", id) if !id.is_empty() => BrowseCommand::List(ListIntent::Delete(id.to_string())),
        _ => BrowseCommand::Unknown(line.to_string()),
    }
}

fn parse_detail_command(head: &str, rest: &str, line: &str) -> BrowseCommand {
    match head.to_lowercase().as_str() {
        "show" => BrowseCommand::Show,
        "save" => BrowseCommand::Save,
        "b" | "back" => BrowseCommand::Back,
        "set" => assignment(rest).unwrap_or_else(|| BrowseCommand::Unknown(line.to_string())),
        _ => assignment(line).unwrap_or_else(|| BrowseCommand::Unknown(line.to_string())),
    }
}

fn assignment(text: &str) -> Option<BrowseCommand> {
    let (key, value) = text.split_once('=')?;
    let key = key.trim();
    (!key.is_empty()).then(|| BrowseCommand::Set(key.to_string(), value.trim().to_string()))
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí")
}

/// Forward stdin lines from a plain thread; a blocked read never holds up shutdown
fn spawn_stdin_reader() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Print `label` and read one line from stdin
pub async fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await??;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Confirmation answered on stdin, for one-shot commands
pub struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&mut self, title: &str, message: &str) -> bool {
        match prompt(&format!("{}: {} [y/N] ", title, message)).await {
            Ok(answer) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

/// Confirmation answered by the next line of the browse session
struct LineConfirm<'a> {
    lines: &'a mut UnboundedReceiver<String>,
}

#[async_trait]
impl Confirm for LineConfirm<'_> {
    async fn confirm(&mut self, title: &str, message: &str) -> bool {
        println!("{}: {} [y/N]", title, message);
        match self.lines.recv().await {
            Some(answer) => is_yes(&answer),
            None => false,
        }
    }
}

fn report(action: &ScreenAction, notifier: &mut Notifier) {
    let shown: Vec<String> = notifier
        .drain()
        .into_iter()
        .map(|notice| {
            println!("{}", notice);
            notice.message
        })
        .collect();

    match action {
        ScreenAction::SetStatus(status) if !shown.contains(status) => println!("{}", status),
        ScreenAction::SetError(error) if !shown.contains(error) => eprintln!("Error: {}", error),
        _ => {}
    }
}

pub async fn run_browse(client: ApiClient, resource: Resource, page_size: usize) -> Result<()> {
    info!("Browsing {}", resource);
    let api = Arc::new(client);
    let (load_tx, mut load_rx) = mpsc::unbounded_channel();
    let mut list = ListScreen::new(ResourceListController::new(api, resource, page_size), load_tx);
    let mut navigator = Navigator::new(Route::List(resource));
    let mut detail: Option<DetailScreen> = None;
    let mut notifier = Notifier::new();
    let mut lines = spawn_stdin_reader();

    println!("{} (type 'help' for commands)", list.title());
    list.on_focus().await;

    loop {
        let action = tokio::select! {
            Some(message) = load_rx.recv() => {
                let action = list.apply_loaded(message, &mut notifier);
                if detail.is_none() && action != ScreenAction::None {
                    println!("{}", output::format_page(list.controller()));
                }
                action
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("stdin closed");
                    break;
                };
                match parse_command(&line, detail.is_some()) {
                    BrowseCommand::Empty => ScreenAction::None,
                    BrowseCommand::Quit => ScreenAction::Quit,
                    BrowseCommand::Help => {
                        println!("{}", if detail.is_some() { DETAIL_HELP } else { LIST_HELP });
                        ScreenAction::None
                    }
                    BrowseCommand::Unknown(text) => {
                        ScreenAction::SetError(format!("Unknown command '{}', type 'help'", text))
                    }
                    BrowseCommand::List(intent) => {
                        let paging = !matches!(
                            intent,
                            ListIntent::Open(_) | ListIntent::New | ListIntent::Refresh
                        );
                        let mut confirm = LineConfirm { lines: &mut lines };
                        let action = list.handle(intent, &mut notifier, &mut confirm).await;
                        if paging {
                            println!("{}", output::format_page(list.controller()));
                        }
                        action
                    }
                    BrowseCommand::Set(key, value) => match detail.as_mut() {
                        Some(screen) => screen.set(&key, &value),
                        None => ScreenAction::None,
                    },
                    BrowseCommand::Show => {
                        if let Some(screen) = &detail {
                            println!("{}", output::format_form(screen.form()));
                        }
                        ScreenAction::None
                    }
                    BrowseCommand::Save => match detail.as_mut() {
                        Some(screen) => {
                            let action = screen.save(list.controller_mut(), &mut notifier).await;
                            if matches!(action, ScreenAction::SetError(_)) {
                                println!("{}", output::format_form(screen.form()));
                            }
                            action
                        }
                        None => ScreenAction::None,
                    },
                    BrowseCommand::Back => ScreenAction::NavigateBack,
                }
            }
        };

        report(&action, &mut notifier);
        match action {
            ScreenAction::Quit => break,
            ScreenAction::NavigateTo(route) => {
                if let Route::Detail { item, .. } = &route {
                    match DetailScreen::new(list.controller().schema(), item.clone()) {
                        Ok(screen) => {
                            list.on_blur();
                            navigator.push(route.clone());
                            println!("{}", output::format_form(screen.form()));
                            detail = Some(screen);
                        }
                        Err(e) => eprintln!("Error: {}", e.user_message()),
                    }
                }
            }
            ScreenAction::NavigateBack => {
                detail = None;
                if let Some(Route::List(_)) = navigator.back() {
                    println!("Back to {}", list.title());
                    list.on_focus().await;
                }
            }
            _ => {}
        }
    }

    info!("Leaving browse session for {}", resource);
    Ok(())
}
