mod cli;
mod console;
mod quotes;

use anyhow::{Context, Result};
use clap::Parser;

use quotify_core::config::AppConfig;
use quotify_core::interfaces::{Navigator, Surface};
use quotify_core::lifecycle;
use quotify_guard::clock::SystemClock;
use quotify_guard::store::open_store;
use quotify_guard::{DuressTrigger, SessionGuard};

use cli::{Cli, Commands};
use console::ConsoleSurface;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    lifecycle::init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref());
    tracing::debug!(
        "Storage mode {}, duress chord {}",
        config.storage.mode,
        config.duress.chord
    );

    let store = open_store(&config.storage).context("Failed to open session store")?;
    let mut guard = SessionGuard::new(store, Box::new(SystemClock), &config);
    let surface = ConsoleSurface;
    let mut trigger = DuressTrigger::from_config(&config.duress, Box::new(surface))
        .context("Invalid [duress] configuration")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            lifecycle::log_startup();
            console::run(&mut guard, &mut trigger, &surface, &config).await?;
            lifecycle::log_shutdown();
        }

        Commands::Status => {
            println!("{}", console::render_status(&guard));
        }

        Commands::Login {
            username,
            passphrase,
        } => {
            let result = console::paced_login(
                &mut guard,
                &username,
                &passphrase,
                config.auth.login_delay_ms,
            )
            .await;
            println!("{}", console::render_login(&result));
        }

        Commands::Logout => {
            guard.logout();
            surface.navigate_to_entry();
        }

        Commands::Panic => {
            let chord = trigger.chord().to_string();
            let mut event = console::parse_key_event(&chord)
                .with_context(|| format!("Chord {chord} has no key event form"))?;
            trigger.handle_key(&mut guard, &mut event);
        }

        Commands::Quote => {
            surface.show_quote(quotes::random_quote());
        }

        Commands::Friends => {
            if guard.is_authenticated() {
                surface.show_friends(guard.friends());
            } else {
                println!("Sign in to see friends");
            }
        }
    }

    Ok(())
}
