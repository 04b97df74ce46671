//! Dolby Repository
//!
//! Translates get/set calls into preference writes and effect parameters.
//! Preferences are the source of truth: every write is persisted first and
//! then pushed to the effect. A failed push is logged, not returned, and the
//! next [`DolbyRepository::sync_effect`] brings the effect back in line. A
//! push that lands on a freshly acquired handle replays the stored state first.
//!
//! The stored gain array is the live one sent to the effect, so it already
//! carries any enabled bass/treble contribution. Sliders and presets work on
//! the base array with those contributions taken out.

use tracing::{debug, error, info, warn};

use dolby_eq::{
    apply_bass_curve, apply_treble, builtin_presets_for, canonical_from_slice, clamp_gain,
    deserialize, format_gain_list, identify, parse_gain_list, replace_bass_curve, replace_treble,
    serialize, validate_level, BandGain, BandMode, BassCurve, CanonicalGains, Direction, EqError,
    EqualizerPreset, PresetMatch, GAIN_SLOTS, MAX_LEVEL,
};
use dolby_effect::{EffectParam, EffectSlot, Profile};

use crate::config::DolbyConfig;
use crate::error::{CoreError, CoreResult};
use crate::preset_file::{self, PresetFileError};
use crate::profile::{
    keys, profile_namespace, Amount, IeqPreset, ProfileSettings, Toggle, GLOBAL_NS, PRESETS_NS,
    PROFILE_NS_PREFIX,
};
use crate::store::PreferenceStore;

/// Boosts superimposed on the gain array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shelf {
    Bass,
    Treble,
}

impl Shelf {
    fn enabled_key(self) -> &'static str {
        match self {
            Shelf::Bass => keys::BASS_ENABLED,
            Shelf::Treble => keys::TREBLE_ENABLED,
        }
    }

    fn level_key(self) -> &'static str {
        match self {
            Shelf::Bass => keys::BASS_LEVEL,
            Shelf::Treble => keys::TREBLE_LEVEL,
        }
    }
}

/// Parse a stored gain string
///
/// Normally 20 values; a mode-sized list with a matching mode suffix is
/// expanded through that mode. Anything else is zero-filled.
fn decode_gains(encoded: &str) -> CanonicalGains {
    let (list, code) = match encoded.rsplit_once('|') {
        Some((list, code)) => (list, code.trim().parse::<u8>().ok()),
        None => (encoded, None),
    };
    let values = parse_gain_list(list);

    if values.len() != GAIN_SLOTS {
        let mode = code
            .and_then(|c| BandMode::from_code(c).ok())
            .filter(|m| m.band_count() == values.len());
        if let Some(mode) = mode {
            let bands: Vec<BandGain> = mode
                .frequencies()
                .iter()
                .zip(&values)
                .map(|(&f, &g)| BandGain::new(f, g))
                .collect();
            return serialize(&bands, mode);
        }
    }

    canonical_from_slice(&values)
}

pub struct DolbyRepository<S: PreferenceStore> {
    store: S,
    effect: EffectSlot,
    config: DolbyConfig,
}

impl<S: PreferenceStore> DolbyRepository<S> {
    pub fn new(store: S, effect: EffectSlot, config: DolbyConfig) -> Self {
        Self {
            store,
            effect,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn effect(&self) -> &EffectSlot {
        &self.effect
    }

    pub fn config(&self) -> &DolbyConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Effect plumbing
    // ------------------------------------------------------------------

    fn push(&self, param: EffectParam, value: &[i32], profile: Profile) {
        let seen = self.effect.acquisitions();
        if let Err(e) = self.effect.with_handle(|h| h.set(param, value, profile)) {
            error!("Failed to set {:?} for {}: {}", param, profile, e);
            return;
        }
        self.restore_if_reacquired(seen);
    }

    /// Replay stored state onto a handle acquired since `seen`
    fn restore_if_reacquired(&self, seen: u64) {
        if self.effect.acquisitions() == seen {
            return;
        }

        info!("Effect handle replaced, restoring stored settings");
        if let Err(e) = self.sync_effect() {
            error!("Failed to restore effect: {}", e);
            return;
        }
        let current = self.current_profile();
        for profile in self.stored_profiles() {
            if profile != current {
                self.sync_profile(profile);
            }
        }
    }

    /// Profiles that have anything stored
    fn stored_profiles(&self) -> Vec<Profile> {
        self.store
            .namespaces()
            .iter()
            .filter_map(|ns| ns.strip_prefix(PROFILE_NS_PREFIX)?.parse::<u8>().ok())
            .map(Profile)
            .collect()
    }

    /// Write every stored setting of `profile` to the effect
    pub fn apply_to_effect(&self, profile: Profile) -> CoreResult<()> {
        let settings = self.settings(profile);
        self.effect.with_handle(|h| {
            h.set(EffectParam::GeqBandGains, &settings.gains, profile)?;
            h.set(EffectParam::BassEnhancerEnable, &[settings.bass_enabled as i32], profile)?;
            for toggle in Toggle::ALL {
                h.set(toggle.param(), &[settings.toggle(toggle) as i32], profile)?;
            }
            for amount in Amount::ALL {
                h.set(amount.param(), &[settings.amount(amount)], profile)?;
            }
            h.set(EffectParam::IeqPreset, &[settings.ieq_preset.id()], profile)
        })?;
        debug!("Applied settings of {} to effect", profile);
        Ok(())
    }

    /// Bring the effect in line with the stored state (startup, re-acquire)
    pub fn sync_effect(&self) -> CoreResult<()> {
        let profile = self.current_profile();
        let enabled = self.effect_enabled();
        self.effect.with_handle(|h| {
            h.set_enabled(enabled)?;
            h.set(EffectParam::ProfileSelect, &[profile.id() as i32], profile)
        })?;
        self.apply_to_effect(profile)
    }

    fn sync_profile(&self, profile: Profile) {
        if let Err(e) = self.apply_to_effect(profile) {
            error!("Failed to apply {} to effect: {}", profile, e);
        }
    }

    // ------------------------------------------------------------------
    // Global settings
    // ------------------------------------------------------------------

    pub fn current_profile(&self) -> Profile {
        let fallback = self.config.default_profile.id() as i32;
        let id = self.store.get_i32(GLOBAL_NS, keys::CURRENT_PROFILE, fallback);
        u8::try_from(id).map(Profile).unwrap_or(self.config.default_profile)
    }

    pub fn set_current_profile(&mut self, profile: Profile) -> CoreResult<()> {
        self.store
            .put_i32(GLOBAL_NS, keys::CURRENT_PROFILE, profile.id() as i32);
        self.store.flush()?;

        self.push(EffectParam::ProfileSelect, &[profile.id() as i32], profile);
        self.sync_profile(profile);
        info!("Switched to profile {}", profile);
        Ok(())
    }

    pub fn band_mode(&self) -> BandMode {
        let fallback = self.config.default_band_mode;
        let code = self.store.get_i32(GLOBAL_NS, keys::BAND_MODE, fallback.code() as i32);
        u8::try_from(code)
            .ok()
            .and_then(|c| BandMode::from_code(c).ok())
            .unwrap_or(fallback)
    }

    pub fn set_band_mode(&mut self, mode: BandMode) -> CoreResult<()> {
        self.store.put_i32(GLOBAL_NS, keys::BAND_MODE, mode.code() as i32);
        self.store.flush()?;
        info!("Band mode set to {}", mode);
        Ok(())
    }

    pub fn effect_enabled(&self) -> bool {
        self.store.get_bool(GLOBAL_NS, keys::EFFECT_ENABLED, true)
    }

    pub fn set_effect_enabled(&mut self, enabled: bool) -> CoreResult<()> {
        self.store.put_bool(GLOBAL_NS, keys::EFFECT_ENABLED, enabled);
        self.store.flush()?;

        let seen = self.effect.acquisitions();
        match self.effect.with_handle(|h| h.set_enabled(enabled)) {
            Ok(()) => self.restore_if_reacquired(seen),
            Err(e) => {
                error!("Failed to {} effect: {}", if enabled { "enable" } else { "disable" }, e)
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Graphic EQ
    // ------------------------------------------------------------------

    /// Live 20-slot gain array of a profile (flat if never written)
    pub fn gains(&self, profile: Profile) -> CanonicalGains {
        self.store
            .get(&profile_namespace(profile), keys::GEQ_GAINS)
            .map(|encoded| decode_gains(&encoded))
            .unwrap_or([0; GAIN_SLOTS])
    }

    fn store_gains(&mut self, profile: Profile, gains: &CanonicalGains) {
        let encoded = format!("{}|{}", format_gain_list(gains), self.band_mode().code());
        self.store
            .put(&profile_namespace(profile), keys::GEQ_GAINS, encoded);
    }

    fn commit_gains(&mut self, profile: Profile, gains: &CanonicalGains) -> CoreResult<()> {
        self.store_gains(profile, gains);
        self.store.flush()?;
        self.push(EffectParam::GeqBandGains, gains, profile);
        Ok(())
    }

    /// Sliders for `mode`, read from the base array (no bass/treble boosts)
    pub fn band_gains(&self, profile: Profile, mode: BandMode) -> Vec<BandGain> {
        deserialize(&self.base_gains(profile), mode)
    }

    /// Replace the base EQ from a mode-sized band list
    ///
    /// Enabled bass/treble boosts are laid back on top, as for
    /// [`Self::apply_preset`].
    pub fn set_band_gains(
        &mut self,
        profile: Profile,
        band_gains: &[BandGain],
        mode: BandMode,
    ) -> CoreResult<()> {
        let mut gains = serialize(band_gains, mode);
        self.add_enabled_shelves(profile, &mut gains);
        self.commit_gains(profile, &gains)
    }

    /// Change one slider of the active band mode
    pub fn set_band_gain(&mut self, profile: Profile, index: usize, gain: i32) -> CoreResult<()> {
        let mode = self.band_mode();
        let mut bands = self.band_gains(profile, mode);
        let band = bands.get_mut(index).ok_or(EqError::InvalidBandIndex {
            index,
            bands: mode.band_count(),
        })?;
        band.gain = clamp_gain(gain);
        self.set_band_gains(profile, &bands, mode)
    }

    /// Live gains with enabled bass/treble contributions taken back out
    pub fn base_gains(&self, profile: Profile) -> CanonicalGains {
        let mut gains = self.gains(profile);
        for shelf in [Shelf::Bass, Shelf::Treble] {
            if self.shelf_enabled(profile, shelf) {
                let level = self.shelf_level(profile, shelf);
                self.apply_shelf(profile, shelf, &mut gains, level, Direction::Remove);
            }
        }
        gains
    }

    fn add_enabled_shelves(&self, profile: Profile, gains: &mut CanonicalGains) {
        for shelf in [Shelf::Bass, Shelf::Treble] {
            if self.shelf_enabled(profile, shelf) {
                let level = self.shelf_level(profile, shelf);
                self.apply_shelf(profile, shelf, gains, level, Direction::Add);
            }
        }
    }

    /// Load a preset into a profile
    ///
    /// The preset is resampled to the active band mode and enabled bass/treble
    /// boosts are laid back on top.
    pub fn apply_preset(&mut self, profile: Profile, preset: &EqualizerPreset) -> CoreResult<()> {
        let mode = self.band_mode();
        let converted = preset.for_mode(mode);

        let mut gains = serialize(&converted.band_gains, mode);
        self.add_enabled_shelves(profile, &mut gains);

        self.commit_gains(profile, &gains)?;
        info!("Applied preset {:?} to {}", preset.name, profile);
        Ok(())
    }

    pub fn apply_preset_by_name(&mut self, profile: Profile, name: &str) -> CoreResult<()> {
        let preset = self
            .find_preset(name)
            .ok_or_else(|| CoreError::PresetNotFound(name.to_string()))?;
        self.apply_preset(profile, &preset)
    }

    /// Flatten the EQ, keeping bass/treble boosts
    pub fn reset_eq(&mut self, profile: Profile) -> CoreResult<()> {
        let mut gains = [0; GAIN_SLOTS];
        self.add_enabled_shelves(profile, &mut gains);
        self.commit_gains(profile, &gains)
    }

    /// Name of the preset the profile's EQ currently matches
    pub fn current_preset(&self, profile: Profile) -> PresetMatch {
        identify(&self.base_gains(profile), &self.user_presets())
    }

    // ------------------------------------------------------------------
    // Bass and treble
    // ------------------------------------------------------------------

    fn shelf_enabled(&self, profile: Profile, shelf: Shelf) -> bool {
        self.store
            .get_bool(&profile_namespace(profile), shelf.enabled_key(), false)
    }

    fn shelf_level(&self, profile: Profile, shelf: Shelf) -> u8 {
        self.store
            .get_i32(&profile_namespace(profile), shelf.level_key(), 0)
            .clamp(0, MAX_LEVEL as i32) as u8
    }

    fn apply_shelf(
        &self,
        profile: Profile,
        shelf: Shelf,
        gains: &mut CanonicalGains,
        level: u8,
        direction: Direction,
    ) {
        match shelf {
            Shelf::Bass => apply_bass_curve(gains, level, self.bass_curve(profile), direction),
            Shelf::Treble => apply_treble(gains, level, direction),
        }
    }

    fn set_shelf_enabled(&mut self, profile: Profile, shelf: Shelf, enabled: bool) -> CoreResult<()> {
        if self.shelf_enabled(profile, shelf) == enabled {
            return Ok(());
        }

        let level = self.shelf_level(profile, shelf);
        let direction = if enabled { Direction::Add } else { Direction::Remove };
        let mut gains = self.gains(profile);
        self.apply_shelf(profile, shelf, &mut gains, level, direction);

        self.store
            .put_bool(&profile_namespace(profile), shelf.enabled_key(), enabled);
        self.commit_gains(profile, &gains)?;
        debug!("{:?} {} for {}", shelf, if enabled { "on" } else { "off" }, profile);
        Ok(())
    }

    fn set_shelf_level(&mut self, profile: Profile, shelf: Shelf, level: i32) -> CoreResult<()> {
        let ns = profile_namespace(profile);
        let old = self.shelf_level(profile, shelf);
        let enabled = self.shelf_enabled(profile, shelf);
        let mut gains = self.gains(profile);

        // Out of range: level goes back to 0 and its contribution comes out
        let new = match validate_level(level) {
            Ok(new) => new,
            Err(e) => {
                warn!("Rejected {:?} level {} for {}, resetting to 0", shelf, level, profile);
                self.store.put_i32(&ns, shelf.level_key(), 0);
                if enabled {
                    self.apply_shelf(profile, shelf, &mut gains, old, Direction::Remove);
                    self.commit_gains(profile, &gains)?;
                } else {
                    self.store.flush()?;
                }
                return Err(e.into());
            }
        };

        self.store.put_i32(&ns, shelf.level_key(), new as i32);
        if enabled && new != old {
            match shelf {
                Shelf::Bass => {
                    let curve = self.bass_curve(profile);
                    replace_bass_curve(&mut gains, (old, curve), (new, curve));
                }
                Shelf::Treble => replace_treble(&mut gains, old, new),
            }
            self.commit_gains(profile, &gains)
        } else {
            self.store.flush()
        }
    }

    pub fn bass_enabled(&self, profile: Profile) -> bool {
        self.shelf_enabled(profile, Shelf::Bass)
    }

    pub fn bass_level(&self, profile: Profile) -> u8 {
        self.shelf_level(profile, Shelf::Bass)
    }

    pub fn bass_curve(&self, profile: Profile) -> BassCurve {
        BassCurve::from_id(self.store.get_i32(&profile_namespace(profile), keys::BASS_CURVE, 0))
    }

    pub fn set_bass_enabled(&mut self, profile: Profile, enabled: bool) -> CoreResult<()> {
        self.set_shelf_enabled(profile, Shelf::Bass, enabled)?;
        self.push(EffectParam::BassEnhancerEnable, &[enabled as i32], profile);
        Ok(())
    }

    /// Set the bass boost level (0-100)
    ///
    /// An out-of-range level fails and leaves the stored level at 0.
    pub fn set_bass_level(&mut self, profile: Profile, level: i32) -> CoreResult<()> {
        self.set_shelf_level(profile, Shelf::Bass, level)
    }

    pub fn set_bass_curve(&mut self, profile: Profile, curve: BassCurve) -> CoreResult<()> {
        let old = self.bass_curve(profile);
        if old == curve {
            return Ok(());
        }

        let ns = profile_namespace(profile);
        if self.bass_enabled(profile) {
            let level = self.bass_level(profile);
            let mut gains = self.gains(profile);
            replace_bass_curve(&mut gains, (level, old), (level, curve));
            self.store.put_i32(&ns, keys::BASS_CURVE, curve.id());
            self.commit_gains(profile, &gains)
        } else {
            self.store.put_i32(&ns, keys::BASS_CURVE, curve.id());
            self.store.flush()
        }
    }

    pub fn treble_enabled(&self, profile: Profile) -> bool {
        self.shelf_enabled(profile, Shelf::Treble)
    }

    pub fn treble_level(&self, profile: Profile) -> u8 {
        self.shelf_level(profile, Shelf::Treble)
    }

    pub fn set_treble_enabled(&mut self, profile: Profile, enabled: bool) -> CoreResult<()> {
        self.set_shelf_enabled(profile, Shelf::Treble, enabled)
    }

    /// Set the treble boost level (0-100)
    ///
    /// An out-of-range level fails and leaves the stored level at 0.
    pub fn set_treble_level(&mut self, profile: Profile, level: i32) -> CoreResult<()> {
        self.set_shelf_level(profile, Shelf::Treble, level)
    }

    // ------------------------------------------------------------------
    // Other effect features
    // ------------------------------------------------------------------

    pub fn toggle(&self, profile: Profile, toggle: Toggle) -> bool {
        self.store
            .get_bool(&profile_namespace(profile), toggle.key(), toggle.default_value())
    }

    pub fn set_toggle(&mut self, profile: Profile, toggle: Toggle, enabled: bool) -> CoreResult<()> {
        self.store
            .put_bool(&profile_namespace(profile), toggle.key(), enabled);
        self.store.flush()?;
        self.push(toggle.param(), &[enabled as i32], profile);
        Ok(())
    }

    pub fn amount(&self, profile: Profile, amount: Amount) -> i32 {
        let (min, max) = amount.range();
        self.store
            .get_i32(&profile_namespace(profile), amount.key(), amount.default_value())
            .clamp(min, max)
    }

    pub fn set_amount(&mut self, profile: Profile, amount: Amount, value: i32) -> CoreResult<()> {
        let (min, max) = amount.range();
        if !(min..=max).contains(&value) {
            return Err(CoreError::OutOfRange {
                setting: amount.label(),
                value,
                min,
                max,
            });
        }

        self.store
            .put_i32(&profile_namespace(profile), amount.key(), value);
        self.store.flush()?;
        self.push(amount.param(), &[value], profile);
        Ok(())
    }

    pub fn ieq_preset(&self, profile: Profile) -> IeqPreset {
        IeqPreset::from_id(self.store.get_i32(&profile_namespace(profile), keys::IEQ_PRESET, 0))
    }

    pub fn set_ieq_preset(&mut self, profile: Profile, preset: IeqPreset) -> CoreResult<()> {
        self.store
            .put_i32(&profile_namespace(profile), keys::IEQ_PRESET, preset.id());
        self.store.flush()?;
        self.push(EffectParam::IeqPreset, &[preset.id()], profile);
        Ok(())
    }

    /// Everything stored for a profile, defaults filled in
    pub fn settings(&self, profile: Profile) -> ProfileSettings {
        ProfileSettings {
            profile,
            gains: self.gains(profile),
            geq_enabled: self.toggle(profile, Toggle::Geq),
            bass_enabled: self.bass_enabled(profile),
            bass_level: self.bass_level(profile),
            bass_curve: self.bass_curve(profile),
            treble_enabled: self.treble_enabled(profile),
            treble_level: self.treble_level(profile),
            dialogue_enhancer_enabled: self.toggle(profile, Toggle::DialogueEnhancer),
            dialogue_enhancer_amount: self.amount(profile, Amount::DialogueEnhancer),
            headphone_virtualizer_enabled: self.toggle(profile, Toggle::HeadphoneVirtualizer),
            speaker_virtualizer_enabled: self.toggle(profile, Toggle::SpeakerVirtualizer),
            stereo_widening: self.amount(profile, Amount::StereoWidening),
            volume_leveler_enabled: self.toggle(profile, Toggle::VolumeLeveler),
            ieq_preset: self.ieq_preset(profile),
        }
    }

    // ------------------------------------------------------------------
    // Profile reset
    // ------------------------------------------------------------------

    /// Forget everything stored for a profile
    pub fn reset_profile(&mut self, profile: Profile) -> CoreResult<()> {
        self.store.clear(&profile_namespace(profile));
        self.store.flush()?;
        self.sync_profile(profile);
        info!("Reset profile {}", profile);
        Ok(())
    }

    /// Forget every profile's settings; global settings and presets stay
    pub fn reset_all_profiles(&mut self) -> CoreResult<()> {
        let namespaces: Vec<String> = self
            .store
            .namespaces()
            .into_iter()
            .filter(|ns| ns.starts_with(PROFILE_NS_PREFIX))
            .collect();
        for ns in &namespaces {
            self.store.clear(ns);
        }
        self.store.flush()?;

        self.sync_profile(self.current_profile());
        info!("Reset {} profile(s)", namespaces.len());
        Ok(())
    }

    // ------------------------------------------------------------------
    // User presets
    // ------------------------------------------------------------------

    /// Saved user presets, ordered by name
    pub fn user_presets(&self) -> Vec<EqualizerPreset> {
        self.store
            .keys(PRESETS_NS)
            .into_iter()
            .filter_map(|name| {
                let encoded = self.store.get(PRESETS_NS, &name)?;
                Some(EqualizerPreset::decode(name, &encoded))
            })
            .collect()
    }

    /// Built-in presets then user presets, all expressed in `mode`
    pub fn all_presets(&self, mode: BandMode) -> Vec<EqualizerPreset> {
        let mut presets = builtin_presets_for(mode);
        presets.extend(self.user_presets().iter().map(|p| p.for_mode(mode)));
        presets
    }

    /// Find a preset by name, ignoring ASCII case
    ///
    /// Built-ins win and come back in the active band mode. Among user presets
    /// differing only in case, the exact spelling wins.
    pub fn find_preset(&self, name: &str) -> Option<EqualizerPreset> {
        if let Some(preset) = builtin_presets_for(self.band_mode())
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
        {
            return Some(preset);
        }

        let mut candidates: Vec<EqualizerPreset> = self
            .user_presets()
            .into_iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name))
            .collect();
        match candidates.iter().position(|p| p.name == name) {
            Some(exact) => Some(candidates.swap_remove(exact)),
            None => candidates.into_iter().next(),
        }
    }

    fn check_preset_name(name: &str) -> CoreResult<()> {
        if name.trim().is_empty() || name.trim() != name {
            return Err(CoreError::InvalidPresetName(name.to_string()));
        }
        Ok(())
    }

    /// Store a user preset, replacing any with the same name
    pub fn save_user_preset(&mut self, preset: &EqualizerPreset) -> CoreResult<()> {
        Self::check_preset_name(&preset.name)?;
        self.store.put(PRESETS_NS, &preset.name, preset.encode());
        self.store.flush()?;
        info!("Saved preset {:?} ({})", preset.name, preset.band_mode);
        Ok(())
    }

    /// Save the profile's EQ (without bass/treble boosts) as a user preset
    pub fn save_current_as_preset(&mut self, profile: Profile, name: &str) -> CoreResult<EqualizerPreset> {
        let mode = self.band_mode();
        let bands = deserialize(&self.base_gains(profile), mode);
        let preset = EqualizerPreset::user(name, bands, mode);
        self.save_user_preset(&preset)?;
        Ok(preset)
    }

    pub fn delete_user_preset(&mut self, name: &str) -> CoreResult<()> {
        self.store
            .remove(PRESETS_NS, name)
            .ok_or_else(|| CoreError::PresetNotFound(name.to_string()))?;
        self.store.flush()?;
        info!("Deleted preset {:?}", name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Preset files
    // ------------------------------------------------------------------

    /// Import a single or batch `.ldp` file
    ///
    /// The file is decoded and every name checked before anything is stored.
    pub fn import_presets(&mut self, bytes: &[u8]) -> CoreResult<Vec<String>> {
        let presets = preset_file::decode(bytes, self.band_mode())?;
        for preset in &presets {
            Self::check_preset_name(&preset.name)?;
        }

        for preset in &presets {
            self.store.put(PRESETS_NS, &preset.name, preset.encode());
        }
        self.store.flush()?;

        let names: Vec<String> = presets.into_iter().map(|p| p.name).collect();
        info!("Imported {} preset(s)", names.len());
        Ok(names)
    }

    /// Encode one preset (built-in or user) as a `.ldp` file
    pub fn export_preset(&self, name: &str) -> CoreResult<Vec<u8>> {
        let preset = self
            .find_preset(name)
            .ok_or_else(|| CoreError::PresetNotFound(name.to_string()))?;
        Ok(preset_file::encode_preset(&preset, &self.config.export_author)?)
    }

    /// Encode all user presets as one batch `.ldp` file
    pub fn export_user_presets(&self) -> CoreResult<Vec<u8>> {
        let presets = self.user_presets();
        if presets.is_empty() {
            return Err(PresetFileError::Empty.into());
        }
        Ok(preset_file::encode_batch(&presets, &self.config.export_author)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::store::MemoryPreferenceStore;
    use dolby_effect::{software_slot, ControlToken, EffectHandle, SoftwareEffect};

    fn repo() -> DolbyRepository<MemoryPreferenceStore> {
        DolbyRepository::new(MemoryPreferenceStore::new(), software_slot(), DolbyConfig::default())
    }

    fn effect_value(
        repo: &DolbyRepository<MemoryPreferenceStore>,
        param: EffectParam,
        profile: Profile,
    ) -> Vec<i32> {
        repo.effect().with_handle(|h| h.get(param, profile)).unwrap()
    }

    #[test]
    fn test_fresh_profile_is_flat() {
        let repo = repo();
        assert_eq!(repo.gains(Profile::MUSIC), [0; GAIN_SLOTS]);
        assert_eq!(repo.settings(Profile::MUSIC), ProfileSettings::defaults(Profile::MUSIC));
        assert_eq!(repo.current_preset(Profile::MUSIC), PresetMatch::BuiltIn("Flat".into()));
        // Reading does not create the namespace
        assert!(repo.store().namespaces().is_empty());
    }

    #[test]
    fn test_set_band_gains_persists_and_pushes() {
        let mut repo = repo();
        let bands = [BandGain::new(32, 50), BandGain::new(64, -50)];
        repo.set_band_gains(Profile::MOVIE, &bands, BandMode::Ten).unwrap();

        let gains = repo.gains(Profile::MOVIE);
        assert_eq!(&gains[..3], &[50, 0, -50]);
        assert_eq!(effect_value(&repo, EffectParam::GeqBandGains, Profile::MOVIE), gains.to_vec());
        // Other profiles untouched
        assert_eq!(repo.gains(Profile::MUSIC), [0; GAIN_SLOTS]);
    }

    #[test]
    fn test_set_band_gains_clamps() {
        let mut repo = repo();
        let bands = [BandGain::new(32, 400)];
        repo.set_band_gains(Profile::MUSIC, &bands, BandMode::Ten).unwrap();
        assert_eq!(repo.gains(Profile::MUSIC)[0], 150);
    }

    #[test]
    fn test_extreme_band_gains_clamped() {
        let mut repo = repo();
        let p = Profile::MUSIC;
        let top: Vec<BandGain> = BandMode::Ten
            .frequencies()
            .iter()
            .map(|&f| BandGain::new(f, i32::MAX))
            .collect();
        repo.set_band_gains(p, &top, BandMode::Ten).unwrap();
        assert_eq!(repo.gains(p), [150; GAIN_SLOTS]);
        assert_eq!(repo.current_preset(p), PresetMatch::Custom);

        repo.set_band_gain(p, 1, i32::MIN).unwrap();
        assert_eq!(&repo.gains(p)[..5], &[150, 0, -150, 0, 150]);
    }

    #[test]
    fn test_imported_extreme_gains_clamped() {
        let mut repo = repo();
        let mut bands = BandMode::Ten.flat();
        bands[0].gain = i32::MAX;
        bands[9].gain = i32::MIN;
        let loud = EqualizerPreset::user("Loud", bands, BandMode::Ten);
        let bytes = preset_file::encode_preset(&loud, "tester").unwrap();

        repo.import_presets(&bytes).unwrap();
        let stored = repo.find_preset("Loud").unwrap();
        assert_eq!(stored.band_gains[0].gain, 150);
        assert_eq!(stored.band_gains[9].gain, -150);

        repo.apply_preset_by_name(Profile::GAME, "Loud").unwrap();
        assert_eq!(repo.gains(Profile::GAME)[0], 150);
        assert_eq!(repo.current_preset(Profile::GAME), PresetMatch::User("Loud".into()));
    }

    #[test]
    fn test_set_band_gain_uses_active_mode() {
        let mut repo = repo();
        repo.set_band_mode(BandMode::Twenty).unwrap();
        repo.set_band_gain(Profile::MUSIC, 19, 80).unwrap();
        assert_eq!(repo.gains(Profile::MUSIC)[19], 80);

        let err = repo.set_band_gain(Profile::MUSIC, 20, 0).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Eq(EqError::InvalidBandIndex { index: 20, bands: 20 })
        ));
    }

    #[test]
    fn test_bass_level_superposition() {
        let mut repo = repo();
        let p = Profile::MUSIC;
        repo.set_bass_enabled(p, true).unwrap();
        repo.set_bass_level(p, 50).unwrap();
        assert_eq!(repo.gains(p)[0], 70);

        repo.set_bass_level(p, 20).unwrap();
        assert_eq!(repo.gains(p)[0], 28);

        repo.set_bass_enabled(p, false).unwrap();
        assert_eq!(repo.gains(p), [0; GAIN_SLOTS]);
        assert_eq!(effect_value(&repo, EffectParam::BassEnhancerEnable, p), vec![0]);
    }

    #[test]
    fn test_bass_level_while_disabled_only_stores() {
        let mut repo = repo();
        let p = Profile::GAME;
        repo.set_bass_level(p, 60).unwrap();
        assert_eq!(repo.bass_level(p), 60);
        assert_eq!(repo.gains(p), [0; GAIN_SLOTS]);

        repo.set_bass_enabled(p, true).unwrap();
        assert_eq!(repo.gains(p)[0], 84);
    }

    #[test]
    fn test_invalid_bass_level_rolls_back() {
        let mut repo = repo();
        let p = Profile::MOVIE;
        repo.set_bass_enabled(p, true).unwrap();
        repo.set_bass_level(p, 40).unwrap();
        assert_eq!(repo.gains(p)[0], 56);

        let err = repo.set_bass_level(p, 101).unwrap_err();
        assert!(matches!(err, CoreError::Eq(EqError::LevelOutOfRange(101))));
        assert_eq!(repo.bass_level(p), 0);
        assert_eq!(repo.gains(p), [0; GAIN_SLOTS]);
    }

    #[test]
    fn test_invalid_treble_level_rolls_back() {
        let mut repo = repo();
        let p = Profile::DYNAMIC;
        repo.set_treble_level(p, 30).unwrap();
        assert!(repo.set_treble_level(p, -5).is_err());
        assert_eq!(repo.treble_level(p), 0);
    }

    #[test]
    fn test_bass_curve_switch() {
        let mut repo = repo();
        let p = Profile::MUSIC;
        repo.set_bass_enabled(p, true).unwrap();
        repo.set_bass_level(p, 50).unwrap();
        repo.set_bass_curve(p, BassCurve::Warm).unwrap();

        let mut expected = [0; GAIN_SLOTS];
        apply_bass_curve(&mut expected, 50, BassCurve::Warm, Direction::Add);
        assert_eq!(repo.gains(p), expected);
        assert_eq!(repo.bass_curve(p), BassCurve::Warm);
    }

    #[test]
    fn test_treble_toggle() {
        let mut repo = repo();
        let p = Profile::MUSIC;
        repo.set_treble_level(p, 50).unwrap();
        repo.set_treble_enabled(p, true).unwrap();
        assert_eq!(repo.gains(p)[19], 60);
        assert_eq!(repo.gains(p)[13], 0);

        // Enabling twice does not stack
        repo.set_treble_enabled(p, true).unwrap();
        assert_eq!(repo.gains(p)[19], 60);
    }

    #[test]
    fn test_slider_edit_under_treble_leaves_no_residue() {
        let mut repo = repo();
        let p = Profile::MUSIC;
        repo.set_treble_level(p, 100).unwrap();
        repo.set_treble_enabled(p, true).unwrap();
        assert_eq!(repo.gains(p)[13], 0);
        assert_eq!(repo.gains(p)[14], 120);

        repo.set_band_gain(p, 0, 0).unwrap();
        assert_eq!(repo.gains(p)[13], 0);
        assert!(repo.band_gains(p, BandMode::Ten).iter().all(|b| b.gain == 0));

        repo.set_treble_enabled(p, false).unwrap();
        assert_eq!(repo.gains(p), [0; GAIN_SLOTS]);
    }

    #[test]
    fn test_slider_edit_under_bass_leaves_no_residue() {
        let mut repo = repo();
        let p = Profile::MOVIE;
        repo.set_bass_level(p, 100).unwrap();
        repo.set_bass_enabled(p, true).unwrap();
        let boosted = repo.gains(p);
        assert_eq!(boosted[0], 140);

        repo.set_band_gain(p, 3, 20).unwrap();
        assert_eq!(repo.band_gains(p, BandMode::Ten)[0].gain, 0);
        assert_eq!(repo.band_gains(p, BandMode::Ten)[3].gain, 20);
        // Bass slots are the boost alone
        assert_eq!(repo.gains(p)[0], boosted[0]);
        assert_eq!(repo.gains(p)[1], boosted[1]);

        repo.set_bass_enabled(p, false).unwrap();
        let mut expected = [0; GAIN_SLOTS];
        expected[5] = 10;
        expected[6] = 20;
        expected[7] = 10;
        assert_eq!(repo.gains(p), expected);
    }

    #[test]
    fn test_reset_eq_keeps_boosts() {
        let mut repo = repo();
        let p = Profile::MUSIC;
        repo.set_bass_level(p, 50).unwrap();
        repo.set_bass_enabled(p, true).unwrap();
        repo.apply_preset_by_name(p, "Rock").unwrap();

        repo.reset_eq(p).unwrap();
        let mut expected = [0; GAIN_SLOTS];
        apply_bass_curve(&mut expected, 50, repo.bass_curve(p), Direction::Add);
        assert_eq!(repo.gains(p), expected);
        assert_eq!(repo.current_preset(p), PresetMatch::BuiltIn("Flat".into()));
        assert_eq!(effect_value(&repo, EffectParam::GeqBandGains, p), expected.to_vec());
    }

    #[test]
    fn test_apply_preset_keeps_boosts() {
        let mut repo = repo();
        let p = Profile::MUSIC;
        repo.set_bass_level(p, 10).unwrap();
        repo.set_bass_enabled(p, true).unwrap();

        repo.apply_preset_by_name(p, "Rock").unwrap();
        assert_eq!(repo.gains(p)[0], 50 + 14);
        assert_eq!(repo.current_preset(p), PresetMatch::BuiltIn("Rock".into()));
    }

    #[test]
    fn test_apply_preset_across_modes() {
        let mut repo = repo();
        repo.set_band_mode(BandMode::Fifteen).unwrap();
        let twenty = find_twenty_slope();
        repo.apply_preset(Profile::CUSTOM, &twenty).unwrap();

        let bands = repo.band_gains(Profile::CUSTOM, BandMode::Fifteen);
        assert_eq!(bands.len(), 15);
        // Shared frequencies keep their gains
        assert_eq!(bands[0].gain, twenty.band_gains[0].gain);
        assert_eq!(bands[14].gain, twenty.band_gains[19].gain);
    }

    fn find_twenty_slope() -> EqualizerPreset {
        let bands = BandMode::Twenty
            .frequencies()
            .iter()
            .enumerate()
            .map(|(i, &f)| BandGain::new(f, 95 - i as i32 * 10))
            .collect();
        EqualizerPreset::user("Slope", bands, BandMode::Twenty)
    }

    #[test]
    fn test_unknown_preset() {
        let mut repo = repo();
        let err = repo.apply_preset_by_name(Profile::MUSIC, "Nope").unwrap_err();
        assert!(matches!(err, CoreError::PresetNotFound(_)));
    }

    #[test]
    fn test_user_preset_lifecycle() {
        let mut repo = repo();
        let p = Profile::MUSIC;
        repo.set_band_gain(p, 0, 33).unwrap();
        let saved = repo.save_current_as_preset(p, "Mine").unwrap();
        assert_eq!(saved.band_mode, BandMode::Ten);

        assert_eq!(repo.user_presets(), vec![saved]);
        assert_eq!(repo.current_preset(p), PresetMatch::User("Mine".into()));

        repo.delete_user_preset("Mine").unwrap();
        assert!(repo.user_presets().is_empty());
        assert_eq!(repo.current_preset(p), PresetMatch::Custom);
        assert!(matches!(
            repo.delete_user_preset("Mine"),
            Err(CoreError::PresetNotFound(_))
        ));
    }

    #[test]
    fn test_find_preset_ignores_case() {
        let mut repo = repo();
        let mine = EqualizerPreset::user("Mine", BandMode::Ten.flat(), BandMode::Ten);
        repo.save_user_preset(&mine).unwrap();

        assert_eq!(repo.find_preset("rock").map(|p| p.name), Some("Rock".into()));
        assert_eq!(repo.find_preset("mine").map(|p| p.name), Some("Mine".into()));
        assert!(repo.apply_preset_by_name(Profile::MUSIC, "MINE").is_ok());

        // Exact spelling wins over a case-only twin
        let twin = EqualizerPreset::user("mine", BandMode::Ten.flat(), BandMode::Ten);
        repo.save_user_preset(&twin).unwrap();
        assert_eq!(repo.find_preset("mine").map(|p| p.name), Some("mine".into()));
        assert_eq!(repo.find_preset("Mine").map(|p| p.name), Some("Mine".into()));
    }

    #[test]
    fn test_all_presets_order() {
        let mut repo = repo();
        let preset = EqualizerPreset::user("Zed", BandMode::Ten.flat(), BandMode::Ten);
        repo.save_user_preset(&preset).unwrap();

        let all = repo.all_presets(BandMode::Twenty);
        assert_eq!(all.first().map(|p| p.name.as_str()), Some("Flat"));
        assert_eq!(all.last().map(|p| p.name.as_str()), Some("Zed"));
        assert!(all.iter().all(|p| p.band_gains.len() == 20));
    }

    #[test]
    fn test_invalid_preset_name() {
        let mut repo = repo();
        for name in ["", "   ", " padded"] {
            let preset = EqualizerPreset::user(name, BandMode::Ten.flat(), BandMode::Ten);
            assert!(matches!(
                repo.save_user_preset(&preset),
                Err(CoreError::InvalidPresetName(_))
            ));
        }
    }

    #[test]
    fn test_toggles_and_amounts() {
        let mut repo = repo();
        let p = Profile::MOVIE;
        repo.set_toggle(p, Toggle::DialogueEnhancer, true).unwrap();
        repo.set_amount(p, Amount::DialogueEnhancer, 9).unwrap();
        repo.set_ieq_preset(p, IeqPreset::Rich).unwrap();

        let settings = repo.settings(p);
        assert!(settings.dialogue_enhancer_enabled);
        assert_eq!(settings.dialogue_enhancer_amount, 9);
        assert_eq!(settings.ieq_preset, IeqPreset::Rich);
        assert_eq!(effect_value(&repo, EffectParam::DialogueEnhancerAmount, p), vec![9]);
        assert_eq!(effect_value(&repo, EffectParam::IeqPreset, p), vec![2]);

        let err = repo.set_amount(p, Amount::StereoWidening, 2).unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { min: 4, max: 64, .. }));
        assert_eq!(repo.amount(p, Amount::StereoWidening), 32);
    }

    #[test]
    fn test_reset_profile() {
        let mut repo = repo();
        repo.set_bass_enabled(Profile::MUSIC, true).unwrap();
        repo.set_bass_level(Profile::MUSIC, 80).unwrap();
        repo.set_treble_level(Profile::MOVIE, 10).unwrap();

        repo.reset_profile(Profile::MUSIC).unwrap();
        assert_eq!(repo.settings(Profile::MUSIC), ProfileSettings::defaults(Profile::MUSIC));
        assert_eq!(effect_value(&repo, EffectParam::GeqBandGains, Profile::MUSIC), vec![0; 20]);
        assert_eq!(repo.treble_level(Profile::MOVIE), 10);

        repo.reset_all_profiles().unwrap();
        assert_eq!(repo.treble_level(Profile::MOVIE), 0);
    }

    #[test]
    fn test_reset_keeps_presets_and_globals() {
        let mut repo = repo();
        repo.set_band_mode(BandMode::Fifteen).unwrap();
        repo.save_user_preset(&EqualizerPreset::user("Keep", BandMode::Ten.flat(), BandMode::Ten))
            .unwrap();
        repo.set_band_gain(Profile::GAME, 0, 10).unwrap();

        repo.reset_all_profiles().unwrap();
        assert_eq!(repo.band_mode(), BandMode::Fifteen);
        assert_eq!(repo.user_presets().len(), 1);
    }

    #[test]
    fn test_current_profile() {
        let mut repo = repo();
        assert_eq!(repo.current_profile(), Profile::DYNAMIC);
        repo.set_current_profile(Profile::GAME).unwrap();
        assert_eq!(repo.current_profile(), Profile::GAME);
        assert_eq!(effect_value(&repo, EffectParam::ProfileSelect, Profile::DYNAMIC), vec![4]);
    }

    #[test]
    fn test_config_defaults_used() {
        let config = DolbyConfig {
            default_profile: Profile::MUSIC,
            default_band_mode: BandMode::Twenty,
            ..Default::default()
        };
        let repo = DolbyRepository::new(MemoryPreferenceStore::new(), software_slot(), config);
        assert_eq!(repo.current_profile(), Profile::MUSIC);
        assert_eq!(repo.band_mode(), BandMode::Twenty);
    }

    #[test]
    fn test_malformed_gains_zero_fill() {
        let mut store = MemoryPreferenceStore::new();
        store.put("profile_1", keys::GEQ_GAINS, "10,x,30".into());
        let repo = DolbyRepository::new(store, software_slot(), DolbyConfig::default());
        let gains = repo.gains(Profile::MOVIE);
        assert_eq!(&gains[..4], &[10, 0, 30, 0]);
    }

    #[test]
    fn test_out_of_range_stored_gains_clamped() {
        let mut store = MemoryPreferenceStore::new();
        store.put("profile_1", keys::GEQ_GAINS, "2147483647,-2147483648,400".into());
        let repo = DolbyRepository::new(store, software_slot(), DolbyConfig::default());
        assert_eq!(&repo.gains(Profile::MOVIE)[..3], &[150, -150, 150]);
        assert_eq!(repo.current_preset(Profile::MOVIE), PresetMatch::Custom);
    }

    #[test]
    fn test_mode_sized_gain_string() {
        let mut store = MemoryPreferenceStore::new();
        store.put("profile_1", keys::GEQ_GAINS, "50,-50,0,0,0,0,0,0,0,0|0".into());
        let repo = DolbyRepository::new(store, software_slot(), DolbyConfig::default());
        assert_eq!(&repo.gains(Profile::MOVIE)[..3], &[50, 0, -50]);
    }

    #[test]
    fn test_effect_reacquired_after_loss() {
        let tokens = Arc::new(Mutex::new(Vec::<ControlToken>::new()));
        let t = Arc::clone(&tokens);
        let slot = EffectSlot::new(move || {
            let effect = SoftwareEffect::new();
            t.lock().unwrap().push(effect.control_token());
            Ok(Box::new(effect) as Box<dyn EffectHandle>)
        });
        let mut repo = DolbyRepository::new(MemoryPreferenceStore::new(), slot, DolbyConfig::default());

        repo.set_band_gain(Profile::MUSIC, 0, 20).unwrap();
        tokens.lock().unwrap()[0].revoke();

        repo.sync_effect().unwrap();
        assert_eq!(tokens.lock().unwrap().len(), 2);
        repo.set_current_profile(Profile::MUSIC).unwrap();
        assert_eq!(effect_value(&repo, EffectParam::GeqBandGains, Profile::MUSIC)[0], 20);
    }

    #[test]
    fn test_new_handle_gets_stored_state() {
        let tokens = Arc::new(Mutex::new(Vec::<ControlToken>::new()));
        let t = Arc::clone(&tokens);
        let slot = EffectSlot::new(move || {
            let effect = SoftwareEffect::new();
            t.lock().unwrap().push(effect.control_token());
            Ok(Box::new(effect) as Box<dyn EffectHandle>)
        });
        let mut repo = DolbyRepository::new(MemoryPreferenceStore::new(), slot, DolbyConfig::default());

        repo.set_band_gain(Profile::MUSIC, 0, 20).unwrap();
        repo.set_ieq_preset(Profile::MUSIC, IeqPreset::Rich).unwrap();
        repo.set_effect_enabled(false).unwrap();
        tokens.lock().unwrap()[0].revoke();

        // One unrelated write lands on a new handle
        repo.set_toggle(Profile::MOVIE, Toggle::VolumeLeveler, true).unwrap();
        assert_eq!(tokens.lock().unwrap().len(), 2);

        assert_eq!(effect_value(&repo, EffectParam::GeqBandGains, Profile::MUSIC)[0], 20);
        assert_eq!(effect_value(&repo, EffectParam::IeqPreset, Profile::MUSIC), vec![2]);
        assert_eq!(
            effect_value(&repo, Toggle::VolumeLeveler.param(), Profile::MOVIE),
            vec![1]
        );
        let current = repo.current_profile();
        assert_eq!(
            effect_value(&repo, EffectParam::ProfileSelect, current),
            vec![current.id() as i32]
        );
        assert!(!repo.effect().with_handle(|h| h.is_enabled()).unwrap());
    }

    #[test]
    fn test_effect_enabled() {
        let mut repo = repo();
        assert!(repo.effect_enabled());
        repo.set_effect_enabled(false).unwrap();
        assert!(!repo.effect_enabled());
        assert!(!repo.effect().with_handle(|h| h.is_enabled()).unwrap());
    }
}
