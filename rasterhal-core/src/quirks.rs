//! Driver quirk table
//!
//! Records of known driver defects, matched against the identity of a live
//! device. Records are produced by an external parser and fed in as JSON;
//! field names follow the keys of the quirk files (`Company`, `UpToVersion`,
//! `Bug_RGBA`, `Os`, ...).

use crate::pixel::PixelFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Operating systems a quirk can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsKind {
    #[serde(rename = "VXOS_WIN31")]
    Win31,
    #[serde(rename = "VXOS_WIN95")]
    Win95,
    #[serde(rename = "VXOS_WIN98")]
    Win98,
    #[serde(rename = "VXOS_WINME")]
    WinMe,
    #[serde(rename = "VXOS_WINNT4")]
    WinNt4,
    #[serde(rename = "VXOS_WIN2K")]
    Win2k,
    #[serde(rename = "VXOS_WINXP")]
    WinXp,
    #[serde(rename = "VXOS_WINVISTA")]
    WinVista,
    #[serde(rename = "VXOS_WIN7")]
    Win7,
    #[serde(rename = "VXOS_MACOS9")]
    MacOs9,
    #[serde(rename = "VXOS_MACOSX")]
    MacOsX,
    #[serde(rename = "VXOS_LINUXX86")]
    LinuxX86,
    #[serde(rename = "VXOS_XBOX")]
    Xbox,
}

impl OsKind {
    const NAMES: [(OsKind, &'static str); 13] = [
        (OsKind::Win31, "VXOS_WIN31"),
        (OsKind::Win95, "VXOS_WIN95"),
        (OsKind::Win98, "VXOS_WIN98"),
        (OsKind::WinMe, "VXOS_WINME"),
        (OsKind::WinNt4, "VXOS_WINNT4"),
        (OsKind::Win2k, "VXOS_WIN2K"),
        (OsKind::WinXp, "VXOS_WINXP"),
        (OsKind::WinVista, "VXOS_WINVISTA"),
        (OsKind::Win7, "VXOS_WIN7"),
        (OsKind::MacOs9, "VXOS_MACOS9"),
        (OsKind::MacOsX, "VXOS_MACOSX"),
        (OsKind::LinuxX86, "VXOS_LINUXX86"),
        (OsKind::Xbox, "VXOS_XBOX"),
    ];

    /// Host operating system.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsKind::WinXp
        } else if cfg!(target_os = "macos") {
            OsKind::MacOsX
        } else {
            OsKind::LinuxX86
        }
    }

    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(os, _)| *os == self)
            .map_or("VXOS_UNKNOWN", |(_, name)| name)
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OsKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(os, _)| *os)
            .ok_or_else(|| anyhow::anyhow!("unknown operating system '{}'", s))
    }
}

/// How a record's version is compared against the live driver version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionRule {
    /// String equality.
    Exact,
    /// Every version up to and including the record's.
    #[default]
    UpTo,
}

/// One known driver defect.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "RawProblem")]
pub struct DriverProblem {
    pub vendor: String,
    pub renderer: String,
    pub device_desc: String,
    pub version: String,
    pub version_rule: VersionRule,
    /// Clamp-to-edge addressing is broken.
    pub clamp_to_edge_bug: bool,
    pub only_in_16: bool,
    pub only_in_32: bool,
    /// Texture width cap imposed by the defect, 0 for none.
    pub max_texture_width: u32,
    pub max_texture_height: u32,
    /// Texture formats that must not be used.
    pub affected_formats: Vec<PixelFormat>,
    pub os: Vec<OsKind>,
}

/// Record layout as found in quirk files.
#[derive(Deserialize)]
struct RawProblem {
    #[serde(rename = "Company", default)]
    company: String,
    #[serde(rename = "Renderer", default)]
    renderer: String,
    #[serde(rename = "DeviceDesc", default)]
    device_desc: String,
    #[serde(rename = "ExactVersion", default)]
    exact_version: Option<String>,
    #[serde(rename = "UpToVersion", default)]
    up_to_version: Option<String>,
    #[serde(rename = "Bug_ClampEdge", default)]
    clamp_edge: bool,
    #[serde(rename = "OnlyIn16Bpp", default)]
    only_in_16: bool,
    #[serde(rename = "OnlyIn32Bpp", default)]
    only_in_32: bool,
    #[serde(rename = "MaxTextureWidth", default)]
    max_texture_width: u32,
    #[serde(rename = "MaxTextureHeight", default)]
    max_texture_height: u32,
    #[serde(rename = "Bug_RGBA", default)]
    formats: Vec<PixelFormat>,
    #[serde(rename = "Os", default)]
    os: Vec<OsKind>,
}

impl From<RawProblem> for DriverProblem {
    fn from(raw: RawProblem) -> Self {
        let (version, version_rule) = match (raw.up_to_version, raw.exact_version) {
            (Some(version), _) => (version, VersionRule::UpTo),
            (None, Some(version)) => (version, VersionRule::Exact),
            (None, None) => (String::new(), VersionRule::UpTo),
        };
        Self {
            vendor: raw.company,
            renderer: raw.renderer,
            device_desc: raw.device_desc,
            version,
            version_rule,
            clamp_to_edge_bug: raw.clamp_edge,
            only_in_16: raw.only_in_16,
            only_in_32: raw.only_in_32,
            max_texture_width: raw.max_texture_width,
            max_texture_height: raw.max_texture_height,
            affected_formats: raw.formats,
            os: raw.os,
        }
    }
}

/// Identity of a live device.
#[derive(Debug, Clone, Copy)]
pub struct DeviceQuery<'a> {
    pub vendor: &'a str,
    pub renderer: &'a str,
    pub version: &'a str,
    pub device_desc: &'a str,
    pub bpp: u32,
    pub os: OsKind,
}

impl DriverProblem {
    /// Whether this record applies to `device`.
    pub fn matches(&self, device: &DeviceQuery<'_>) -> bool {
        let identity = if !device.vendor.is_empty() && device.vendor == self.vendor {
            self.renderer.is_empty() || self.renderer == device.renderer
        } else {
            self.device_desc == device.device_desc
        };
        if !identity {
            return false;
        }

        if !self.version.is_empty() && !device.version.is_empty() {
            let affected = match self.version_rule {
                VersionRule::Exact => self.version == device.version,
                VersionRule::UpTo => parse_version(device.version) <= parse_version(&self.version),
            };
            if !affected {
                return false;
            }
        }

        if self.only_in_16 && device.bpp != 16 {
            return false;
        }
        if self.only_in_32 && device.bpp != 32 {
            return false;
        }

        self.os.contains(&device.os)
    }
}

/// `major.minor.patch` from the leading integers of each component.
///
/// Missing or malformed components count as 0.
pub fn parse_version(version: &str) -> (u32, u32, u32) {
    let mut parts = version.trim().split('.').map(|part| {
        let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
        digits.parse::<u32>().unwrap_or(0)
    });
    let mut next = || parts.next().unwrap_or(0);
    (next(), next(), next())
}

/// Ordered list of driver problems; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct DriverQuirkTable {
    problems: Vec<DriverProblem>,
}

impl DriverQuirkTable {
    pub fn new(problems: Vec<DriverProblem>) -> Self {
        Self { problems }
    }

    /// Parse a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self> {
        let problems: Vec<DriverProblem> =
            serde_json::from_str(json).context("Failed to parse driver quirk records")?;
        Ok(Self::new(problems))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read quirk file {}", path.display()))?;
        let table = Self::from_json(&content)?;
        log::info!("Loaded {} driver quirk records from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn push(&mut self, problem: DriverProblem) {
        self.problems.push(problem);
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DriverProblem> {
        self.problems.iter()
    }

    /// First record applying to `device`.
    pub fn find(&self, device: &DeviceQuery<'_>) -> Option<&DriverProblem> {
        let found = self.problems.iter().find(|p| p.matches(device));
        if let Some(problem) = found {
            log::debug!(
                "Driver problem matched for {} {} {}",
                device.vendor,
                device.renderer,
                device.version
            );
            log::trace!("{:?}", problem);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NVIDIA: &str = r#"[{
        "Company": "NVIDIA",
        "UpToVersion": "6.14.10",
        "Bug_ClampEdge": true,
        "Bug_RGBA": ["_16_ARGB1555"],
        "Os": ["VXOS_WINXP"]
    }]"#;

    fn device<'a>(version: &'a str, os: OsKind) -> DeviceQuery<'a> {
        DeviceQuery {
            vendor: "NVIDIA",
            renderer: "GeForce X",
            version,
            device_desc: "",
            bpp: 32,
            os,
        }
    }

    #[test]
    fn record_keys_deserialize() {
        let table = DriverQuirkTable::from_json(NVIDIA).unwrap();
        let problem = table.iter().next().unwrap();
        assert_eq!(problem.vendor, "NVIDIA");
        assert_eq!(problem.version_rule, VersionRule::UpTo);
        assert!(problem.clamp_to_edge_bug);
        assert_eq!(problem.affected_formats, vec![PixelFormat::Argb1555]);
        assert_eq!(problem.os, vec![OsKind::WinXp]);
    }

    #[test]
    fn up_to_version_matches_older_drivers() {
        let table = DriverQuirkTable::from_json(NVIDIA).unwrap();
        assert!(table.find(&device("6.14.9", OsKind::WinXp)).is_some());
        assert!(table.find(&device("6.14.10", OsKind::WinXp)).is_some());
        assert!(table.find(&device("6.14.11", OsKind::WinXp)).is_none());
        assert!(table.find(&device("6.14.9", OsKind::LinuxX86)).is_none());
    }

    #[test]
    fn up_to_wins_over_exact() {
        let json = r#"[{"ExactVersion": "1.0", "UpToVersion": "2.0"}]"#;
        let table = DriverQuirkTable::from_json(json).unwrap();
        let problem = table.iter().next().unwrap();
        assert_eq!(problem.version, "2.0");
        assert_eq!(problem.version_rule, VersionRule::UpTo);
    }

    #[test]
    fn exact_version_and_renderer() {
        let problem = DriverProblem {
            vendor: "ATI".into(),
            renderer: "Rage".into(),
            version: "4.1".into(),
            version_rule: VersionRule::Exact,
            os: vec![OsKind::Win98],
            ..Default::default()
        };
        let mut query = DeviceQuery {
            vendor: "ATI",
            renderer: "Rage",
            version: "4.1",
            device_desc: "",
            bpp: 16,
            os: OsKind::Win98,
        };
        assert!(problem.matches(&query));
        query.version = "4.10";
        assert!(!problem.matches(&query));
        query.version = "";
        assert!(problem.matches(&query));
        query.renderer = "Radeon";
        assert!(!problem.matches(&query));
    }

    #[test]
    fn falls_back_to_device_description() {
        let problem = DriverProblem {
            vendor: "Matrox".into(),
            device_desc: "G400 DualHead".into(),
            only_in_16: true,
            os: vec![OsKind::Win2k],
            ..Default::default()
        };
        let query = DeviceQuery {
            vendor: "",
            renderer: "",
            version: "",
            device_desc: "G400 DualHead",
            bpp: 16,
            os: OsKind::Win2k,
        };
        assert!(problem.matches(&query));
        assert!(!problem.matches(&DeviceQuery { bpp: 32, ..query }));
    }

    #[test]
    fn first_match_wins() {
        let first = DriverProblem {
            vendor: "S3".into(),
            max_texture_width: 256,
            os: vec![OsKind::WinMe],
            ..Default::default()
        };
        let second = DriverProblem {
            max_texture_width: 512,
            ..first.clone()
        };
        let table = DriverQuirkTable::new(vec![first, second]);
        let query = DeviceQuery {
            vendor: "S3",
            renderer: "Savage",
            version: "1.0",
            device_desc: "",
            bpp: 32,
            os: OsKind::WinMe,
        };
        assert_eq!(table.find(&query).map(|p| p.max_texture_width), Some(256));
    }

    #[test]
    fn version_parsing_is_lenient() {
        assert_eq!(parse_version("6.14.10"), (6, 14, 10));
        assert_eq!(parse_version("6.14"), (6, 14, 0));
        assert_eq!(parse_version("7.x.3beta"), (7, 0, 3));
        assert_eq!(parse_version(""), (0, 0, 0));
    }

    #[test]
    fn os_names_round_trip_through_serde() {
        for (os, name) in OsKind::NAMES {
            assert_eq!(name.parse::<OsKind>().unwrap(), os);
            let json = serde_json::to_string(&os).unwrap();
            assert_eq!(json, format!("\"{}\"", name));
        }
    }
}
