use std::io::Write;
use std::time::Duration;

use clap::{Parser, Subcommand};
use elitemobs_cli::{CliContext, commands, logging, readline};
use elitemobs_core::Tier;

/// How often the background ticker runs a host frame
const FRAME_PERIOD: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<(), String> {
    logging::init();
    let ctx = CliContext::load();
    ctx.start_ticker(FRAME_PERIOD).await;

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    ctx.stop_ticker().await;
    Ok(())
}

#[derive(Parser)]
#[command(version, about = "elite mob admin console")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn plain mobs next to the player
    SpawnMob {
        #[arg(long, default_value_t = 100.0)]
        hp: f32,
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Promote the nearest mob, rolling affixes
    Promote { tier: Tier },
    /// Promote the nearest mob with an exact affix list
    Debug { tier: Tier, affixes: Option<String> },
    /// Show the nearest elite
    Info,
    Count,
    /// Drop records for actors that no longer exist
    Clear,
    /// Demote every tracked elite
    Purge,
    /// Demote the nearest elite
    Demote,
    Nearby,
    Affixes,
    Toggles,
    /// Trade one blow with the nearest mob
    Hit {
        /// Mark the mob as in combat first
        #[arg(long)]
        combat: bool,
    },
    /// Kill the nearest mob
    Kill,
    /// Run host frames immediately
    Tick {
        #[arg(default_value_t = 1)]
        frames: u32,
    },
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "elitemobs".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::SpawnMob { hp, count }) => commands::spawn_mob(ctx, *hp, *count).await,
        Some(Commands::Promote { tier }) => commands::promote(ctx, *tier).await,
        Some(Commands::Debug { tier, affixes }) => {
            commands::debug_promote(ctx, *tier, affixes.as_deref()).await
        }
        Some(Commands::Info) => commands::info(ctx).await,
        Some(Commands::Count) => commands::count(ctx).await,
        Some(Commands::Clear) => commands::clear(ctx).await,
        Some(Commands::Purge) => commands::purge(ctx).await,
        Some(Commands::Demote) => commands::demote(ctx).await,
        Some(Commands::Nearby) => commands::nearby(ctx).await,
        Some(Commands::Affixes) => commands::list_affixes(),
        Some(Commands::Toggles) => commands::show_toggles(ctx).await,
        Some(Commands::Hit { combat }) => commands::hit(ctx, *combat).await,
        Some(Commands::Kill) => commands::kill(ctx).await,
        Some(Commands::Tick { frames }) => commands::tick(ctx, *frames).await,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
