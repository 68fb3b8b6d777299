//! Container versions, per-game presets and root-motion policy.

use crate::Error;

/// GMT container version. Ordering follows the raw value, so version-gated
/// behavior can compare (`version > GmtVersion::Kenzan`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GmtVersion {
    /// Kenzan (0x10001). First-generation value encodings.
    Kenzan,
    /// Yakuza 3, 4 and Dead Souls (0x20000).
    Yakuza3,
    /// Yakuza 5 (0x20001).
    Yakuza5,
    /// Ishin onwards, both engine generations (0x20002).
    Ishin,
}

impl GmtVersion {
    pub fn raw(self) -> u32 {
        match self {
            GmtVersion::Kenzan => 0x10001,
            GmtVersion::Yakuza3 => 0x20000,
            GmtVersion::Yakuza5 => 0x20001,
            GmtVersion::Ishin => 0x20002,
        }
    }

    pub fn from_raw(raw: u32) -> Result<Self, Error> {
        match raw {
            0x10001 => Ok(GmtVersion::Kenzan),
            0x20000 => Ok(GmtVersion::Yakuza3),
            0x20001 => Ok(GmtVersion::Yakuza5),
            0x20002 => Ok(GmtVersion::Ishin),
            _ => Err(Error::UnsupportedVersion { version: raw }),
        }
    }
}

/// CMT (camera) container version.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CmtVersion {
    /// Kenzan (0x10001).
    Kenzan,
    /// Yakuza 3 era (0x20000).
    Yakuza3,
    /// Yakuza 5 onwards (0x40000).
    Yakuza5,
}

impl CmtVersion {
    pub fn raw(self) -> u32 {
        match self {
            CmtVersion::Kenzan => 0x10001,
            CmtVersion::Yakuza3 => 0x20000,
            CmtVersion::Yakuza5 => 0x40000,
        }
    }

    pub fn from_raw(raw: u32) -> Result<Self, Error> {
        match raw {
            0x10001 => Ok(CmtVersion::Kenzan),
            0x20000 => Ok(CmtVersion::Yakuza3),
            0x40000 => Ok(CmtVersion::Yakuza5),
            _ => Err(Error::UnsupportedVersion { version: raw }),
        }
    }
}

/// How root motion is distributed between `center_c_n` and `vector_c_n`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VectorVersion {
    /// Pre-Ishin skeletons: no vector bone, center carries everything.
    NoVector,
    /// Ishin-generation skeletons: vector carries the horizontal motion.
    OldVector,
    /// Dragon-engine skeletons: vector carries all root motion.
    DragonVector,
}

/// What the animation is authored for. Hact (cutscene) files keep their
/// root motion authored on specific bones instead of being re-split.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Context {
    Motion,
    Hact,
}

impl Context {
    pub fn is_auth(self) -> bool {
        self == Context::Hact
    }
}

/// Target game, carrying everything the writer and bridge need to know:
/// container version, whether the skeleton generation has the extra
/// (vector/scale) bones, and whether it is a dragon-engine title.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GamePreset {
    Kenzan,
    Yakuza3,
    Yakuza4,
    DeadSouls,
    Yakuza5,
    Ishin,
    Yakuza0,
    YakuzaKiwami,
    FistOfTheNorthStar,
    Yakuza6,
    YakuzaKiwami2,
    Judgment,
    Yakuza7,
}

impl GamePreset {
    pub fn version(self) -> GmtVersion {
        match self {
            GamePreset::Kenzan => GmtVersion::Kenzan,
            GamePreset::Yakuza3 | GamePreset::Yakuza4 | GamePreset::DeadSouls => {
                GmtVersion::Yakuza3
            }
            GamePreset::Yakuza5 => GmtVersion::Yakuza5,
            _ => GmtVersion::Ishin,
        }
    }

    /// Ishin introduced the extra skeleton bones (vector, scale, sync).
    pub fn new_bones(self) -> bool {
        self.version() >= GmtVersion::Ishin
    }

    pub fn is_dragon_engine(self) -> bool {
        matches!(
            self,
            GamePreset::Yakuza6
                | GamePreset::YakuzaKiwami2
                | GamePreset::Judgment
                | GamePreset::Yakuza7
        )
    }

    pub fn vector_version(self) -> VectorVersion {
        if self.is_dragon_engine() {
            VectorVersion::DragonVector
        } else if self.new_bones() {
            VectorVersion::OldVector
        } else {
            VectorVersion::NoVector
        }
    }
}
