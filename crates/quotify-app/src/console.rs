//! Text front end for the session guard: one-shot commands and the
//! interactive console share the same rendering.

use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use quotify_core::config::AppConfig;
use quotify_core::content::{Friend, Mood, Theme};
use quotify_core::interfaces::{Navigator, Surface};
use quotify_guard::{DuressTrigger, KeyEvent, LoginError, SessionGuard, SessionView};

use crate::quotes;

/// Writes the decorative surfaces to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSurface;

impl Surface for ConsoleSurface {
    fn show_quote(&self, quote: &str) {
        println!("\"{quote}\"");
    }

    fn show_friends(&self, friends: &[Friend]) {
        if friends.is_empty() {
            println!("No friends yet");
            return;
        }
        for f in friends {
            println!("  [{}] {} ({}, {})", f.id, f.username, f.mood, f.last_seen);
        }
    }
}

impl Navigator for ConsoleSurface {
    fn navigate_to_entry(&self) {
        println!("— Quotify —");
        self.show_quote(quotes::random_quote());
    }
}

// ── Rendering ────────────────────────────────────────────────────────

pub fn render_login(result: &Result<SessionView, LoginError>) -> String {
    match result {
        Ok(view) => format!("Welcome, {}", view.username.as_deref().unwrap_or("friend")),
        Err(e) => e.to_string(),
    }
}

pub fn render_status(guard: &SessionGuard) -> String {
    let view = guard.current_session();
    if let Some(username) = view.username {
        return format!("Logged in as {username}");
    }
    match guard.lockout_remaining_secs(guard.now()) {
        Some(secs) => format!("Logged out (locked for {secs}s)"),
        None => "Logged out".to_string(),
    }
}

/// Apply the configured pacing delay, then attempt the login.
pub async fn paced_login(
    guard: &mut SessionGuard,
    username: &str,
    passphrase: &str,
    delay_ms: u64,
) -> Result<SessionView, LoginError> {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
    guard.attempt_login(username, passphrase)
}

/// Parse `ctrl+alt+q` style input into a key event.
pub fn parse_key_event(input: &str) -> Option<KeyEvent> {
    let mut parts: Vec<&str> = input.split('+').map(str::trim).collect();
    let key = parts.pop().filter(|k| !k.is_empty())?;
    let mut event = KeyEvent::new(key);
    for part in parts {
        event = match part.to_lowercase().as_str() {
            "ctrl" | "control" => event.ctrl(),
            "alt" | "option" => event.alt(),
            "shift" => event.shift(),
            "meta" | "cmd" | "super" => event.meta(),
            _ => return None,
        };
    }
    Some(event)
}

// ── Interactive console ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Login { username: String, passphrase: String },
    Logout,
    Status,
    Quote,
    Friends,
    AddFriend(String),
    RemoveFriend(u64),
    Notifications,
    Seen(u64),
    Ping { mood: Mood, message: String },
    /// `None` flips the current theme.
    Theme(Option<Theme>),
    Font(i32),
    Key(String),
    Type(String),
    Help,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_lowercase().as_str() {
            "login" => {
                let mut args = rest.split_whitespace();
                match (args.next(), args.next(), args.next()) {
                    (Some(username), Some(passphrase), None) => Ok(Self::Login {
                        username: username.to_string(),
                        passphrase: passphrase.to_string(),
                    }),
                    _ => Err("usage: login <username> <passphrase>".into()),
                }
            }
            "logout" => Ok(Self::Logout),
            "status" => Ok(Self::Status),
            "quote" => Ok(Self::Quote),
            "friends" => Ok(Self::Friends),
            "add" if !rest.is_empty() => Ok(Self::AddFriend(rest.to_string())),
            "add" => Err("usage: add <name>".into()),
            "remove" => rest
                .parse()
                .map(Self::RemoveFriend)
                .map_err(|_| "usage: remove <id>".to_string()),
            "notifications" => Ok(Self::Notifications),
            "seen" => rest
                .parse()
                .map(Self::Seen)
                .map_err(|_| "usage: seen <id>".to_string()),
            "ping" => {
                let (mood, message) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let mood = mood.parse::<Mood>()?;
                Ok(Self::Ping {
                    mood,
                    message: message.trim().to_string(),
                })
            }
            "theme" if rest.is_empty() => Ok(Self::Theme(None)),
            "theme" => rest.parse::<Theme>().map(|t| Self::Theme(Some(t))),
            "font" => match rest {
                "+" | "up" => Ok(Self::Font(FONT_STEP)),
                "-" | "down" => Ok(Self::Font(-FONT_STEP)),
                _ => Err("usage: font <+|->".into()),
            },
            "key" if !rest.is_empty() => Ok(Self::Key(rest.to_string())),
            "type" if !rest.is_empty() => Ok(Self::Type(rest.to_string())),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            "" => Err(String::new()),
            other => Err(format!("unknown command: {other} (try `help`)")),
        }
    }
}

const FONT_STEP: i32 = 2;

const HELP: &str = "\
commands:
  login <username> <passphrase>   sign in
  logout                          sign out
  status                          show session state
  quote                           show a quote
  friends | notifications         show your feed
  add <name> | remove <id>        add or remove a friend
  seen <id>                       mark a notification as seen
  ping <green|yellow|red> [msg]   send a ping
  theme [dark|light]              change theme, or flip it
  font <+|->                      grow or shrink the text
  key <chord>                     press a key chord, e.g. ctrl+alt+q
  type <text>                     type free text
  quit";

/// Run the interactive console until stdin closes or `quit`.
pub async fn run(
    guard: &mut SessionGuard,
    trigger: &mut DuressTrigger,
    surface: &ConsoleSurface,
    config: &AppConfig,
) -> Result<()> {
    surface.navigate_to_entry();
    println!("{}", render_status(guard));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = guard.now();
                guard.tick(now);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                // Everything typed is visible to the canary phrase.
                if trigger.handle_text(guard, &line) {
                    continue;
                }
                match ConsoleCommand::parse(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(cmd) => execute(cmd, guard, trigger, surface, config).await,
                    Err(msg) if msg.is_empty() => {}
                    Err(msg) => println!("{msg}"),
                }
            }
        }
    }
    Ok(())
}

async fn execute(
    cmd: ConsoleCommand,
    guard: &mut SessionGuard,
    trigger: &mut DuressTrigger,
    surface: &ConsoleSurface,
    config: &AppConfig,
) {
    match cmd {
        ConsoleCommand::Login {
            username,
            passphrase,
        } => {
            let result =
                paced_login(guard, &username, &passphrase, config.auth.login_delay_ms).await;
            println!("{}", render_login(&result));
            if !guard.is_authenticated() {
                return;
            }
            surface.show_quote(quotes::random_quote());
        }
        ConsoleCommand::Logout => {
            guard.logout();
            surface.navigate_to_entry();
        }
        ConsoleCommand::Status => println!("{}", render_status(guard)),
        ConsoleCommand::Quote => surface.show_quote(quotes::random_quote()),
        ConsoleCommand::Friends => {
            if guard.is_authenticated() {
                surface.show_friends(guard.friends());
            } else {
                println!("Sign in to see friends");
            }
        }
        ConsoleCommand::AddFriend(name) => match guard.add_friend(&name) {
            Ok(friend) => println!("Added {} [{}]", friend.username, friend.id),
            Err(e) => println!("{e}"),
        },
        ConsoleCommand::RemoveFriend(id) => match guard.remove_friend(id) {
            Ok(true) => println!("Removed friend {id}"),
            Ok(false) => println!("No friend {id}"),
            Err(e) => println!("{e}"),
        },
        ConsoleCommand::Notifications => {
            if guard.is_authenticated() {
                println!("{} unseen", guard.unseen_count());
            }
            for n in guard.notifications() {
                let marker = if n.seen { " " } else { "*" };
                println!(
                    "{marker} [{}] {} {}: {} ({})",
                    n.id, n.timestamp, n.from, n.message, n.mood
                );
            }
        }
        ConsoleCommand::Seen(id) => {
            if !guard.mark_seen(id) {
                println!("No notification {id}");
            }
        }
        ConsoleCommand::Ping { mood, message } => match guard.send_ping(mood, &message) {
            Ok(ping) => println!("{} ping sent: {}", mood.label(), ping.message),
            Err(e) => println!("{e}"),
        },
        ConsoleCommand::Theme(theme) => {
            let mut settings = guard.settings();
            let current = settings.theme;
            settings.theme = theme.unwrap_or_else(|| current.toggled());
            match guard.update_settings(settings) {
                Ok(()) => println!("Theme set to {}", settings.theme.as_str()),
                Err(e) => println!("{e}"),
            }
        }
        ConsoleCommand::Font(delta) => match guard.adjust_font_size(delta) {
            Ok(size) => println!("Font size {size}px"),
            Err(e) => println!("{e}"),
        },
        ConsoleCommand::Key(chord) => match parse_key_event(&chord) {
            Some(mut event) => {
                trigger.handle_key(guard, &mut event);
            }
            None => println!("Unrecognized key: {chord}"),
        },
        // Already seen by the canary detector in `run`.
        ConsoleCommand::Type(_) => {}
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
}
