//! Effect Handle Traits
//!
//! Defines the interface an audio effect binding must provide. The vendor
//! effect is a parameter sink: integer arrays keyed by parameter and profile.

use serde::{Deserialize, Serialize};

use crate::error::EffectError;

/// Listening profile id
///
/// Each profile keeps independent effect settings. Ids outside the named
/// constants are valid; the effect decides what they mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(pub u8);

impl Profile {
    /// Adaptive profile, switches content type automatically
    pub const DYNAMIC: Profile = Profile(0);
    pub const MOVIE: Profile = Profile(1);
    pub const MUSIC: Profile = Profile(2);
    pub const CUSTOM: Profile = Profile(3);
    pub const GAME: Profile = Profile(4);

    pub const NAMED: [Profile; 5] = [
        Profile::DYNAMIC,
        Profile::MOVIE,
        Profile::MUSIC,
        Profile::CUSTOM,
        Profile::GAME,
    ];

    pub fn id(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "Dynamic",
            1 => "Movie",
            2 => "Music",
            3 => "Custom",
            4 => "Game",
            _ => "Unknown",
        }
    }

    /// Look up a named profile (case-insensitive) or a numeric id
    pub fn parse(text: &str) -> Option<Profile> {
        if let Ok(id) = text.trim().parse::<u8>() {
            return Some(Profile(id));
        }
        Self::NAMED
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(text.trim()))
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// Parameters understood by the effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectParam {
    /// Active profile (global)
    ProfileSelect,
    /// 20-slot graphic EQ gain array
    GeqBandGains,
    GeqEnable,
    BassEnhancerEnable,
    DialogueEnhancerEnable,
    DialogueEnhancerAmount,
    HeadphoneVirtualizerEnable,
    SpeakerVirtualizerEnable,
    StereoWideningAmount,
    VolumeLevelerEnable,
    IeqPreset,
}

impl EffectParam {
    pub const ALL: [EffectParam; 11] = [
        EffectParam::ProfileSelect,
        EffectParam::GeqBandGains,
        EffectParam::GeqEnable,
        EffectParam::BassEnhancerEnable,
        EffectParam::DialogueEnhancerEnable,
        EffectParam::DialogueEnhancerAmount,
        EffectParam::HeadphoneVirtualizerEnable,
        EffectParam::SpeakerVirtualizerEnable,
        EffectParam::StereoWideningAmount,
        EffectParam::VolumeLevelerEnable,
        EffectParam::IeqPreset,
    ];

    /// Vendor parameter id
    pub fn id(self) -> u32 {
        match self {
            EffectParam::ProfileSelect => 0,
            EffectParam::GeqBandGains => 110,
            EffectParam::GeqEnable => 111,
            EffectParam::BassEnhancerEnable => 120,
            EffectParam::DialogueEnhancerEnable => 130,
            EffectParam::DialogueEnhancerAmount => 131,
            EffectParam::HeadphoneVirtualizerEnable => 140,
            EffectParam::SpeakerVirtualizerEnable => 141,
            EffectParam::StereoWideningAmount => 142,
            EffectParam::VolumeLevelerEnable => 150,
            EffectParam::IeqPreset => 160,
        }
    }

    /// Number of integers the parameter carries
    pub fn value_len(self) -> usize {
        match self {
            EffectParam::GeqBandGains => 20,
            _ => 1,
        }
    }

    /// Whether the value is shared across profiles
    pub fn is_global(self) -> bool {
        matches!(self, EffectParam::ProfileSelect)
    }
}

/// Handle to an audio effect instance
///
/// A handle can lose control when another session claims the effect. Callers
/// check [`EffectHandle::has_control`] and re-acquire rather than reuse a
/// stale handle; see `EffectSlot`.
pub trait EffectHandle: Send {
    /// Name of this backend (for logs)
    fn name(&self) -> &'static str;

    /// Whether this handle still controls the effect
    fn has_control(&self) -> bool;

    /// Whether the effect as a whole is enabled
    fn is_enabled(&self) -> Result<bool, EffectError>;

    /// Enable or disable the effect as a whole
    fn set_enabled(&mut self, enabled: bool) -> Result<(), EffectError>;

    /// Read a parameter for a profile
    fn get(&self, param: EffectParam, profile: Profile) -> Result<Vec<i32>, EffectError>;

    /// Write a parameter for a profile
    fn set(&mut self, param: EffectParam, value: &[i32], profile: Profile) -> Result<(), EffectError>;

    /// Give up the effect; the handle is unusable afterwards
    fn release(&mut self);
}
