//! Dolby EQ command-line front end
//!
//! Works on the same preference file a UI would use, with an in-process
//! software effect standing in for the vendor effect.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use dolby_core::{
    software_slot, BandMode, BassCurve, DolbyConfig, DolbyRepository, JsonPreferenceStore, Profile,
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "dolby", version, about = "Dolby equalizer settings and presets")]
struct Cli {
    /// Preference file (overrides the config file)
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Profile to work on, by name or id (defaults to the current profile)
    #[arg(short, long, global = true, value_parser = parse_profile)]
    profile: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List built-in and user presets
    Presets {
        /// Band mode to list gains in (10, 15 or 20; defaults to the active mode)
        #[arg(short, long, value_parser = parse_mode)]
        mode: Option<BandMode>,
    },
    /// Print every setting of the profile as JSON
    Show,
    /// Make a profile the current one
    Switch {
        #[arg(value_parser = parse_profile, value_name = "PROFILE")]
        target: Profile,
    },
    /// Set the band mode used for sliders and new presets
    Mode {
        #[arg(value_parser = parse_mode)]
        mode: BandMode,
    },
    /// Convert a comma-separated gain list between band modes
    Convert {
        #[arg(allow_hyphen_values = true)]
        gains: String,
        #[arg(long, value_parser = parse_mode)]
        from: BandMode,
        #[arg(long, value_parser = parse_mode)]
        to: BandMode,
    },
    /// Name the preset matching a 20-slot gain list, or the profile's EQ
    Identify {
        #[arg(allow_hyphen_values = true)]
        gains: Option<String>,
    },
    /// Set the profile's sliders from a comma-separated list in the active mode
    SetGains {
        #[arg(allow_hyphen_values = true)]
        gains: String,
    },
    /// Load a preset into the profile
    Apply { name: String },
    /// Save the profile's EQ as a user preset
    Save { name: String },
    /// Delete a user preset
    Delete { name: String },
    /// Write a preset, or all user presets, to a .ldp file
    Export {
        #[arg(required_unless_present = "all")]
        name: Option<String>,
        /// Export every user preset as one batch
        #[arg(long, conflicts_with = "name")]
        all: bool,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Import presets from a .ldp file
    Import { file: PathBuf },
    /// Configure the bass boost
    Bass {
        #[arg(long, allow_negative_numbers = true)]
        level: Option<i32>,
        #[arg(long, value_parser = parse_curve)]
        curve: Option<BassCurve>,
        #[arg(long, conflicts_with = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },
    /// Configure the treble boost
    Treble {
        #[arg(long, allow_negative_numbers = true)]
        level: Option<i32>,
        #[arg(long, conflicts_with = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },
    /// Reset the profile to defaults
    Reset {
        /// Reset every profile instead
        #[arg(long)]
        all: bool,
        /// Only flatten the EQ, keeping bass/treble boosts
        #[arg(long, conflicts_with = "all")]
        eq: bool,
    },
}

fn parse_profile(text: &str) -> Result<Profile, String> {
    Profile::parse(text).ok_or_else(|| format!("unknown profile {text:?}"))
}

fn parse_mode(text: &str) -> Result<BandMode, String> {
    text.trim_end_matches("-band")
        .parse::<usize>()
        .ok()
        .and_then(BandMode::from_band_count)
        .ok_or_else(|| format!("band mode must be 10, 15 or 20, got {text:?}"))
}

fn parse_curve(text: &str) -> Result<BassCurve, String> {
    BassCurve::ALL
        .into_iter()
        .find(|c| c.name().eq_ignore_ascii_case(text) || c.id().to_string() == text)
        .ok_or_else(|| format!("unknown bass curve {text:?}"))
}

/// `--on` / `--off` as a tri-state
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dolby=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DolbyConfig::load_from(path),
        None => DolbyConfig::load(),
    };
    if cli.store.is_some() {
        config.store_path = cli.store.clone();
    }

    let store_path = config.resolved_store_path();
    debug!("Using preferences at {:?}", store_path);
    let mut repo = DolbyRepository::new(JsonPreferenceStore::open(store_path), software_slot(), config);
    if let Err(e) = repo.sync_effect() {
        warn!("Effect not synced: {}", e);
    }

    let profile = cli.profile.unwrap_or_else(|| repo.current_profile());

    match cli.command {
        Commands::Presets { mode } => {
            let mode = mode.unwrap_or_else(|| repo.band_mode());
            commands::list_presets(&repo, mode)
        }
        Commands::Show => commands::show(&repo, profile),
        Commands::Switch { target } => commands::switch_profile(&mut repo, target),
        Commands::Mode { mode } => commands::set_mode(&mut repo, mode),
        Commands::Convert { gains, from, to } => commands::convert_gains(&gains, from, to),
        Commands::Identify { gains } => commands::identify(&repo, profile, gains.as_deref()),
        Commands::SetGains { gains } => commands::set_gains(&mut repo, profile, &gains),
        Commands::Apply { name } => commands::apply_preset(&mut repo, profile, &name),
        Commands::Save { name } => commands::save_preset(&mut repo, profile, &name),
        Commands::Delete { name } => commands::delete_preset(&mut repo, &name),
        Commands::Export { name, all, output } => {
            commands::export(&repo, name.as_deref(), all, &output)
        }
        Commands::Import { file } => commands::import(&mut repo, &file),
        Commands::Bass {
            level,
            curve,
            on,
            off,
        } => commands::bass(&mut repo, profile, level, curve, switch(on, off)),
        Commands::Treble { level, on, off } => {
            commands::treble(&mut repo, profile, level, switch(on, off))
        }
        Commands::Reset { eq: true, .. } => commands::reset_eq(&mut repo, profile),
        Commands::Reset { all, .. } => commands::reset(&mut repo, profile, all),
    }
}
