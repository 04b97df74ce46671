//! Per-Profile Settings
//!
//! Key names, value ranges and the snapshot type for one profile's settings.

use serde::{Deserialize, Serialize};

use dolby_eq::{BassCurve, CanonicalGains};
use dolby_effect::{EffectParam, Profile};

pub(crate) const GLOBAL_NS: &str = "global";
pub(crate) const PRESETS_NS: &str = "presets";
pub(crate) const PROFILE_NS_PREFIX: &str = "profile_";

pub(crate) mod keys {
    pub const CURRENT_PROFILE: &str = "profile";
    pub const BAND_MODE: &str = "band_mode";
    pub const EFFECT_ENABLED: &str = "effect_enabled";

    pub const GEQ_GAINS: &str = "geq_gains";
    pub const BASS_ENABLED: &str = "bass_enabled";
    pub const BASS_LEVEL: &str = "bass_level";
    pub const BASS_CURVE: &str = "bass_curve";
    pub const TREBLE_ENABLED: &str = "treble_enabled";
    pub const TREBLE_LEVEL: &str = "treble_level";
    pub const IEQ_PRESET: &str = "ieq_preset";
}

/// Preference namespace for a profile
pub(crate) fn profile_namespace(profile: Profile) -> String {
    format!("{PROFILE_NS_PREFIX}{}", profile.id())
}

/// Intelligent Equalizer preset (opaque to this crate, forwarded to the effect)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IeqPreset {
    #[default]
    Off,
    Open,
    Rich,
    Focused,
}

impl IeqPreset {
    pub const ALL: [IeqPreset; 4] = [IeqPreset::Off, IeqPreset::Open, IeqPreset::Rich, IeqPreset::Focused];

    pub fn id(self) -> i32 {
        match self {
            IeqPreset::Off => 0,
            IeqPreset::Open => 1,
            IeqPreset::Rich => 2,
            IeqPreset::Focused => 3,
        }
    }

    /// Unknown ids read as `Off`
    pub fn from_id(id: i32) -> Self {
        match id {
            1 => IeqPreset::Open,
            2 => IeqPreset::Rich,
            3 => IeqPreset::Focused,
            _ => IeqPreset::Off,
        }
    }
}

/// On/off effect features stored per profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Toggle {
    Geq,
    DialogueEnhancer,
    HeadphoneVirtualizer,
    SpeakerVirtualizer,
    VolumeLeveler,
}

impl Toggle {
    pub const ALL: [Toggle; 5] = [
        Toggle::Geq,
        Toggle::DialogueEnhancer,
        Toggle::HeadphoneVirtualizer,
        Toggle::SpeakerVirtualizer,
        Toggle::VolumeLeveler,
    ];

    pub(crate) fn key(self) -> &'static str {
        match self {
            Toggle::Geq => "geq_enabled",
            Toggle::DialogueEnhancer => "dialogue_enabled",
            Toggle::HeadphoneVirtualizer => "hp_virtualizer_enabled",
            Toggle::SpeakerVirtualizer => "spk_virtualizer_enabled",
            Toggle::VolumeLeveler => "volume_leveler_enabled",
        }
    }

    pub fn param(self) -> EffectParam {
        match self {
            Toggle::Geq => EffectParam::GeqEnable,
            Toggle::DialogueEnhancer => EffectParam::DialogueEnhancerEnable,
            Toggle::HeadphoneVirtualizer => EffectParam::HeadphoneVirtualizerEnable,
            Toggle::SpeakerVirtualizer => EffectParam::SpeakerVirtualizerEnable,
            Toggle::VolumeLeveler => EffectParam::VolumeLevelerEnable,
        }
    }

    pub fn default_value(self) -> bool {
        matches!(self, Toggle::Geq)
    }
}

/// Numeric effect settings stored per profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    DialogueEnhancer,
    StereoWidening,
}

impl Amount {
    pub const ALL: [Amount; 2] = [Amount::DialogueEnhancer, Amount::StereoWidening];

    pub(crate) fn key(self) -> &'static str {
        match self {
            Amount::DialogueEnhancer => "dialogue_amount",
            Amount::StereoWidening => "stereo_widening",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Amount::DialogueEnhancer => "Dialogue enhancer amount",
            Amount::StereoWidening => "Stereo widening",
        }
    }

    pub fn param(self) -> EffectParam {
        match self {
            Amount::DialogueEnhancer => EffectParam::DialogueEnhancerAmount,
            Amount::StereoWidening => EffectParam::StereoWideningAmount,
        }
    }

    pub fn range(self) -> (i32, i32) {
        match self {
            Amount::DialogueEnhancer => (0, 12),
            Amount::StereoWidening => (4, 64),
        }
    }

    pub fn default_value(self) -> i32 {
        match self {
            Amount::DialogueEnhancer => 6,
            Amount::StereoWidening => 32,
        }
    }
}

/// Snapshot of everything stored for one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub profile: Profile,
    /// Live gain array, bass/treble contributions included
    pub gains: CanonicalGains,
    pub geq_enabled: bool,
    pub bass_enabled: bool,
    pub bass_level: u8,
    pub bass_curve: BassCurve,
    pub treble_enabled: bool,
    pub treble_level: u8,
    pub dialogue_enhancer_enabled: bool,
    pub dialogue_enhancer_amount: i32,
    pub headphone_virtualizer_enabled: bool,
    pub speaker_virtualizer_enabled: bool,
    pub stereo_widening: i32,
    pub volume_leveler_enabled: bool,
    pub ieq_preset: IeqPreset,
}

impl ProfileSettings {
    /// Settings a profile has before anything is written
    pub fn defaults(profile: Profile) -> Self {
        Self {
            profile,
            gains: [0; dolby_eq::GAIN_SLOTS],
            geq_enabled: Toggle::Geq.default_value(),
            bass_enabled: false,
            bass_level: 0,
            bass_curve: BassCurve::default(),
            treble_enabled: false,
            treble_level: 0,
            dialogue_enhancer_enabled: Toggle::DialogueEnhancer.default_value(),
            dialogue_enhancer_amount: Amount::DialogueEnhancer.default_value(),
            headphone_virtualizer_enabled: Toggle::HeadphoneVirtualizer.default_value(),
            speaker_virtualizer_enabled: Toggle::SpeakerVirtualizer.default_value(),
            stereo_widening: Amount::StereoWidening.default_value(),
            volume_leveler_enabled: Toggle::VolumeLeveler.default_value(),
            ieq_preset: IeqPreset::default(),
        }
    }

    pub fn toggle(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Geq => self.geq_enabled,
            Toggle::DialogueEnhancer => self.dialogue_enhancer_enabled,
            Toggle::HeadphoneVirtualizer => self.headphone_virtualizer_enabled,
            Toggle::SpeakerVirtualizer => self.speaker_virtualizer_enabled,
            Toggle::VolumeLeveler => self.volume_leveler_enabled,
        }
    }

    pub fn amount(&self, amount: Amount) -> i32 {
        match amount {
            Amount::DialogueEnhancer => self.dialogue_enhancer_amount,
            Amount::StereoWidening => self.stereo_widening,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_namespace() {
        assert_eq!(profile_namespace(Profile::DYNAMIC), "profile_0");
        assert_eq!(profile_namespace(Profile::GAME), "profile_4");
    }

    #[test]
    fn test_defaults_in_range() {
        for amount in Amount::ALL {
            let (min, max) = amount.range();
            assert!((min..=max).contains(&amount.default_value()), "{:?}", amount);
        }
    }

    #[test]
    fn test_toggle_keys_unique() {
        let mut keys: Vec<_> = Toggle::ALL.iter().map(|t| t.key()).collect();
        keys.extend(Amount::ALL.iter().map(|a| a.key()));
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_ieq_ids() {
        for preset in IeqPreset::ALL {
            assert_eq!(IeqPreset::from_id(preset.id()), preset);
        }
        assert_eq!(IeqPreset::from_id(9), IeqPreset::Off);
    }

    #[test]
    fn test_default_snapshot() {
        let settings = ProfileSettings::defaults(Profile::MUSIC);
        assert!(settings.toggle(Toggle::Geq));
        assert!(!settings.toggle(Toggle::VolumeLeveler));
        assert_eq!(settings.amount(Amount::StereoWidening), 32);
        assert_eq!(settings.gains, [0; 20]);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = ProfileSettings::defaults(Profile::GAME);
        let json = serde_json::to_string(&settings).unwrap();
        let restored: ProfileSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settings);
    }
}
