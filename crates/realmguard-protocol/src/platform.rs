//! The closed set of client platforms a player can report.
//!
//! The game reports a numeric "build platform" code in every roster
//! entry. Several codes collapse onto the same platform (three flavours
//! of Windows, for instance) and the table has grown over time, so raw
//! codes are converted exactly once, at the boundary, through
//! [`Platform::from_code`]. Anything we don't recognize becomes
//! [`Platform::Unknown`] instead of leaking an arbitrary integer into
//! moderation decisions.

use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// A client platform.
///
/// On the wire this is the numeric build-platform code. Decoding is
/// lenient: a numeric string or a platform name is accepted too, and any
/// other value becomes [`Platform::Unknown`] rather than failing the
/// whole roster frame. In configuration and notifications it is the
/// display name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i32")]
pub enum Platform {
    #[default]
    Unknown,
    Android,
    Ios,
    Osx,
    FireOs,
    GearVr,
    HoloLens,
    Windows,
    Dedicated,
    PlayStation,
    NintendoSwitch,
    Xbox,
}

/// Code → platform lookup. Codes 7, 8 and 13 are all Windows builds.
const CODE_TABLE: [(i32, Platform); 14] = [
    (0, Platform::Unknown),
    (1, Platform::Android),
    (2, Platform::Ios),
    (3, Platform::Osx),
    (4, Platform::FireOs),
    (5, Platform::GearVr),
    (6, Platform::HoloLens),
    (7, Platform::Windows),
    (8, Platform::Windows),
    (9, Platform::Dedicated),
    (10, Platform::PlayStation),
    (11, Platform::NintendoSwitch),
    (12, Platform::Xbox),
    (13, Platform::Windows),
];

impl Platform {
    /// Every variant, in code order.
    pub const ALL: [Platform; 12] = [
        Platform::Unknown,
        Platform::Android,
        Platform::Ios,
        Platform::Osx,
        Platform::FireOs,
        Platform::GearVr,
        Platform::HoloLens,
        Platform::Windows,
        Platform::Dedicated,
        Platform::PlayStation,
        Platform::NintendoSwitch,
        Platform::Xbox,
    ];

    /// Maps a build-platform code to a platform. Unlisted codes are
    /// [`Platform::Unknown`].
    pub fn from_code(code: i32) -> Self {
        CODE_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, p)| *p)
            .unwrap_or(Platform::Unknown)
    }

    /// The canonical (first listed) code for this platform.
    pub fn code(self) -> i32 {
        CODE_TABLE
            .iter()
            .find(|(_, p)| *p == self)
            .map(|(c, _)| *c)
            .unwrap_or(0)
    }

    /// Human-readable name, as shown in notifications and accepted in
    /// configuration.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Android => "Android",
            Self::Ios => "iOS",
            Self::Osx => "OSX",
            Self::FireOs => "FireOS",
            Self::GearVr => "GearVR",
            Self::HoloLens => "HoloLens",
            Self::Windows => "Windows",
            Self::Dedicated => "Dedicated",
            Self::PlayStation => "PlayStation",
            Self::NintendoSwitch => "NintendoSwitch",
            Self::Xbox => "Xbox",
        }
    }

    /// Parses a platform name case-insensitively.
    ///
    /// Accepts the display name plus the spellings admins and presence
    /// services tend to use (`PS4`, `Switch`, `Win10`, …). Returns `None`
    /// for anything else, including `"Unknown"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let platform = match lower.as_str() {
            "android" => Self::Android,
            "ios" | "iphone" | "ipad" => Self::Ios,
            "osx" | "macos" | "mac" => Self::Osx,
            "fireos" | "fire" | "amazon" => Self::FireOs,
            "gearvr" => Self::GearVr,
            "hololens" => Self::HoloLens,
            "windows" | "win10" | "win32" | "windowsphone" | "windowsonecore" => {
                Self::Windows
            }
            "dedicated" => Self::Dedicated,
            "playstation" | "ps4" | "ps5" => Self::PlayStation,
            "nintendoswitch" | "nintendo switch" | "switch" | "nintendo" => {
                Self::NintendoSwitch
            }
            "xbox" | "xboxone" | "scarlett" | "durango" => Self::Xbox,
            _ => return None,
        };
        Some(platform)
    }

    /// Returns `true` if `name` refers to this platform.
    pub fn matches_name(self, name: &str) -> bool {
        Self::from_name(name) == Some(self)
    }
}

impl From<i32> for Platform {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl From<Platform> for i32 {
    fn from(platform: Platform) -> Self {
        platform.code()
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PlatformVisitor)
    }
}

struct PlatformVisitor;

impl<'de> Visitor<'de> for PlatformVisitor {
    type Value = Platform;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a build-platform code or platform name")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Platform, E> {
        Ok(i32::try_from(v).map_or(Platform::Unknown, Platform::from_code))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Platform, E> {
        Ok(i32::try_from(v).map_or(Platform::Unknown, Platform::from_code))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Platform, E> {
        Ok(Platform::Unknown)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Platform, E> {
        Ok(match v.trim().parse::<i32>() {
            Ok(code) => Platform::from_code(code),
            Err(_) => Platform::from_name(v).unwrap_or(Platform::Unknown),
        })
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Platform, E> {
        Ok(Platform::Unknown)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Platform, E> {
        Ok(Platform::Unknown)
    }

    fn visit_none<E: de::Error>(self) -> Result<Platform, E> {
        Ok(Platform::Unknown)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Platform, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Platform, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Platform::Unknown)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Platform, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Platform::Unknown)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
