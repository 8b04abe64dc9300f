//! Typed client capabilities.
//!
//! Grids and figure size variants may require or forbid capabilities such as
//! `canvas` or `no-flash`. The strings are parsed once into bitsets, so
//! checks at pagination time are plain set operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("Unknown capability: '{0}'")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Canvas,
    LocalStorage,
    Video,
    ApplicationCache,
    FontFace,
    Treesaver,
    Flash,
    Orientation,
    Legacy,
    Mobile,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::Canvas,
        Capability::LocalStorage,
        Capability::Video,
        Capability::ApplicationCache,
        Capability::FontFace,
        Capability::Treesaver,
        Capability::Flash,
        Capability::Orientation,
        Capability::Legacy,
        Capability::Mobile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Canvas => "canvas",
            Capability::LocalStorage => "localstorage",
            Capability::Video => "video",
            Capability::ApplicationCache => "applicationcache",
            Capability::FontFace => "fontface",
            Capability::Treesaver => "treesaver",
            Capability::Flash => "flash",
            Capability::Orientation => "orientation",
            Capability::Legacy => "legacy",
            Capability::Mobile => "mobile",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl FromStr for Capability {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| CapabilityError::Unknown(s.to_string()))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of capabilities stored as a bitset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self(0)
    }

    /// The capabilities of a typical modern reading surface.
    pub fn modern() -> Self {
        [
            Capability::Canvas,
            Capability::LocalStorage,
            Capability::Video,
            Capability::ApplicationCache,
            Capability::FontFace,
            Capability::Treesaver,
        ]
        .into_iter()
        .collect()
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub fn remove(&mut self, cap: Capability) {
        self.0 &= !cap.bit();
    }

    pub fn contains(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_superset(&self, other: &CapabilitySet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(&self, other: &CapabilitySet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

impl TryFrom<Vec<String>> for CapabilitySet {
    type Error = CapabilityError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names.iter().map(|n| n.parse::<Capability>()).collect()
    }
}

impl From<CapabilitySet> for Vec<String> {
    fn from(set: CapabilitySet) -> Self {
        set.iter().map(|c| c.as_str().to_string()).collect()
    }
}

/// Capabilities that must be present, and ones that must be absent
/// (written with a `no-` prefix).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RequirementList", into = "Vec<String>")]
pub struct Requirements {
    pub required: CapabilitySet,
    pub forbidden: CapabilitySet,
}

impl Requirements {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.forbidden.is_empty()
    }

    pub fn satisfied_by(&self, caps: &CapabilitySet) -> bool {
        caps.is_superset(&self.required) && !caps.intersects(&self.forbidden)
    }
}

impl FromStr for Requirements {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reqs = Requirements::none();
        for token in s.split_whitespace() {
            match token.strip_prefix("no-") {
                Some(name) => reqs.forbidden.insert(name.parse()?),
                None => reqs.required.insert(token.parse()?),
            }
        }
        Ok(reqs)
    }
}

/// Requirements are accepted either as one space-separated string or as a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum RequirementList {
    Joined(String),
    List(Vec<String>),
}

impl TryFrom<RequirementList> for Requirements {
    type Error = CapabilityError;

    fn try_from(list: RequirementList) -> Result<Self, Self::Error> {
        match list {
            RequirementList::Joined(s) => s.parse(),
            RequirementList::List(items) => items.join(" ").parse(),
        }
    }
}

impl From<Requirements> for Vec<String> {
    fn from(reqs: Requirements) -> Self {
        reqs.required
            .iter()
            .map(|c| c.as_str().to_string())
            .chain(reqs.forbidden.iter().map(|c| format!("no-{}", c.as_str())))
            .collect()
    }
}
