use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use dolby_core::{
    write_preset_file, BandGain, BandMode, BassCurve, DolbyRepository, PreferenceStore, Profile,
};
use dolby_eq::{canonical_from_slice, convert, format_gain_list, parse_gain_list, GAIN_SLOTS};

/// Pair a comma-separated gain list with the frequencies of `mode`
fn parse_bands(text: &str, mode: BandMode) -> Result<Vec<BandGain>> {
    let values = parse_gain_list(text);
    if values.len() != mode.band_count() {
        bail!("Expected {} gains for {}, got {}", mode.band_count(), mode, values.len());
    }
    Ok(mode
        .frequencies()
        .iter()
        .zip(values)
        .map(|(&frequency, gain)| BandGain::new(frequency, gain))
        .collect())
}

/// List built-in and user presets in one band mode
pub fn list_presets<S: PreferenceStore>(repo: &DolbyRepository<S>, mode: BandMode) -> Result<()> {
    let presets = repo.all_presets(mode);
    println!("{} presets ({})", presets.len(), mode);
    for preset in presets {
        let kind = if preset.is_user_defined { "user" } else { "built-in" };
        println!("  {:<14} {:<9} {}", preset.name, kind, format_gain_list(&preset.gains()));
    }
    Ok(())
}

pub fn show<S: PreferenceStore>(repo: &DolbyRepository<S>, profile: Profile) -> Result<()> {
    let report = serde_json::json!({
        "current_profile": repo.current_profile(),
        "band_mode": repo.band_mode().band_count(),
        "effect_enabled": repo.effect_enabled(),
        "preset": repo.current_preset(profile),
        "settings": repo.settings(profile),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn switch_profile<S: PreferenceStore>(repo: &mut DolbyRepository<S>, profile: Profile) -> Result<()> {
    repo.set_current_profile(profile)
        .context("Failed to switch profile")?;
    println!("Current profile: {}", profile);
    Ok(())
}

pub fn set_mode<S: PreferenceStore>(repo: &mut DolbyRepository<S>, mode: BandMode) -> Result<()> {
    repo.set_band_mode(mode).context("Failed to set band mode")?;
    println!("Band mode: {}", mode);
    Ok(())
}

/// Resample a gain list from one band mode to another
pub fn convert_gains(text: &str, from: BandMode, to: BandMode) -> Result<()> {
    let bands = parse_bands(text, from)?;
    for band in convert(&bands, to) {
        println!("{:>6} Hz  {:+5.1} dB", band.frequency, band.gain_db());
    }
    Ok(())
}

pub fn identify<S: PreferenceStore>(
    repo: &DolbyRepository<S>,
    profile: Profile,
    gains: Option<&str>,
) -> Result<()> {
    let matched = match gains {
        Some(text) => {
            let values = parse_gain_list(text);
            if values.len() != GAIN_SLOTS {
                bail!("Expected {} gains, got {}", GAIN_SLOTS, values.len());
            }
            dolby_eq::identify(&canonical_from_slice(&values), &repo.user_presets())
        }
        None => repo.current_preset(profile),
    };
    println!("{}", matched.label());
    Ok(())
}

pub fn set_gains<S: PreferenceStore>(
    repo: &mut DolbyRepository<S>,
    profile: Profile,
    text: &str,
) -> Result<()> {
    let mode = repo.band_mode();
    let bands = parse_bands(text, mode)?;
    repo.set_band_gains(profile, &bands, mode)
        .context("Failed to set band gains")?;
    println!("{}: {}", profile, format_gain_list(&repo.gains(profile)));
    Ok(())
}

pub fn apply_preset<S: PreferenceStore>(
    repo: &mut DolbyRepository<S>,
    profile: Profile,
    name: &str,
) -> Result<()> {
    repo.apply_preset_by_name(profile, name)?;
    println!("Applied {:?} to {}", name, profile);
    Ok(())
}

pub fn save_preset<S: PreferenceStore>(
    repo: &mut DolbyRepository<S>,
    profile: Profile,
    name: &str,
) -> Result<()> {
    let preset = repo.save_current_as_preset(profile, name)?;
    println!("Saved {:?} ({})", preset.name, preset.band_mode);
    Ok(())
}

pub fn delete_preset<S: PreferenceStore>(repo: &mut DolbyRepository<S>, name: &str) -> Result<()> {
    repo.delete_user_preset(name)?;
    println!("Deleted {:?}", name);
    Ok(())
}

pub fn export<S: PreferenceStore>(
    repo: &DolbyRepository<S>,
    name: Option<&str>,
    all: bool,
    output: &Path,
) -> Result<()> {
    let bytes = match (name, all) {
        (_, true) => repo.export_user_presets()?,
        (Some(name), false) => repo.export_preset(name)?,
        (None, false) => bail!("Nothing to export: give a preset name or --all"),
    };
    write_preset_file(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Exported to {}", output.display());
    Ok(())
}

pub fn import<S: PreferenceStore>(repo: &mut DolbyRepository<S>, file: &Path) -> Result<()> {
    let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let names = repo
        .import_presets(&bytes)
        .with_context(|| format!("Failed to import {}", file.display()))?;
    println!("Imported {} preset(s): {}", names.len(), names.join(", "));
    Ok(())
}

pub fn bass<S: PreferenceStore>(
    repo: &mut DolbyRepository<S>,
    profile: Profile,
    level: Option<i32>,
    curve: Option<BassCurve>,
    enabled: Option<bool>,
) -> Result<()> {
    if let Some(curve) = curve {
        repo.set_bass_curve(profile, curve)?;
    }
    if let Some(level) = level {
        repo.set_bass_level(profile, level)?;
    }
    if let Some(enabled) = enabled {
        repo.set_bass_enabled(profile, enabled)?;
    }

    println!(
        "Bass {}: level {}, curve {}",
        if repo.bass_enabled(profile) { "on" } else { "off" },
        repo.bass_level(profile),
        repo.bass_curve(profile).name()
    );
    Ok(())
}

pub fn treble<S: PreferenceStore>(
    repo: &mut DolbyRepository<S>,
    profile: Profile,
    level: Option<i32>,
    enabled: Option<bool>,
) -> Result<()> {
    if let Some(level) = level {
        repo.set_treble_level(profile, level)?;
    }
    if let Some(enabled) = enabled {
        repo.set_treble_enabled(profile, enabled)?;
    }

    println!(
        "Treble {}: level {}",
        if repo.treble_enabled(profile) { "on" } else { "off" },
        repo.treble_level(profile)
    );
    Ok(())
}

pub fn reset<S: PreferenceStore>(repo: &mut DolbyRepository<S>, profile: Profile, all: bool) -> Result<()> {
    if all {
        repo.reset_all_profiles()?;
        println!("Reset all profiles");
    } else {
        repo.reset_profile(profile)?;
        println!("Reset {}", profile);
    }
    Ok(())
}

/// Flatten the profile's EQ; bass/treble boosts stay on
pub fn reset_eq<S: PreferenceStore>(repo: &mut DolbyRepository<S>, profile: Profile) -> Result<()> {
    repo.reset_eq(profile).context("Failed to reset EQ")?;
    println!("Flattened EQ of {}", profile);
    Ok(())
}
