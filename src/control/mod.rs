//! Control-file records.
//!
//! A control file is UTF-8 text with one record per line. Each non-empty
//! line holds exactly ten `|`-separated fields:
//!
//! ```text
//! os|kind|r1|r2|r3|r4|r5|r6|r7|r8
//! ```
//!
//! Only `os` and `kind` are interpreted. The eight trailing fields are
//! reserved and carried through untouched.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Line delimiter of the control-file format. Not auto-detected.
pub const CONTROL_LINE_DELIMITER: char = '\n';

/// Field separator within a record.
pub const CONTROL_FIELD_SEPARATOR: char = '|';

/// Number of fields every record must carry.
pub const CONTROL_FIELD_COUNT: usize = 10;

/// Number of trailing fields not interpreted by the merge stage.
pub const RESERVED_FIELD_COUNT: usize = CONTROL_FIELD_COUNT - 2;

/// Supported target platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OsFamily {
    Linux,
    Windows,
}

impl OsFamily {
    /// All families, in canonical order.
    pub const ALL: [OsFamily; 2] = [OsFamily::Linux, OsFamily::Windows];

    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Linux => "LINUX",
            OsFamily::Windows => "WINDOWS",
        }
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LINUX" => Ok(OsFamily::Linux),
            "WINDOWS" => Ok(OsFamily::Windows),
            other => Err(other.to_string()),
        }
    }
}

/// Kind of override a directive requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DirectiveKind {
    /// Replace the `logs` section.
    Log,
    /// Inject process metrics into `metrics.metrics_collected`.
    Process,
}

impl DirectiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveKind::Log => "LOG",
            DirectiveKind::Process => "PROCESS",
        }
    }
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOG" => Ok(DirectiveKind::Log),
            "PROCESS" => Ok(DirectiveKind::Process),
            other => Err(other.to_string()),
        }
    }
}

/// One parsed control-file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringDirective {
    pub os: OsFamily,
    pub kind: DirectiveKind,
    /// Trailing fields, verbatim. Always `RESERVED_FIELD_COUNT` long.
    pub reserved: Vec<String>,
}

impl MonitoringDirective {
    /// Parse a single record. `line` is 1-based and only used for errors.
    pub fn parse_record(record: &str, line: usize) -> Result<Self, ParseError> {
        let fields: Vec<&str> = record.split(CONTROL_FIELD_SEPARATOR).collect();
        if fields.len() != CONTROL_FIELD_COUNT {
            return Err(ParseError::MalformedRecord {
                line,
                expected: CONTROL_FIELD_COUNT,
                found: fields.len(),
            });
        }

        let os = fields[0]
            .parse::<OsFamily>()
            .map_err(|value| ParseError::UnknownEnumValue {
                line,
                field: "os",
                value,
            })?;
        let kind = fields[1]
            .parse::<DirectiveKind>()
            .map_err(|value| ParseError::UnknownEnumValue {
                line,
                field: "kind",
                value,
            })?;

        Ok(Self {
            os,
            kind,
            reserved: fields[2..].iter().map(|f| f.to_string()).collect(),
        })
    }
}

/// Parse control-file text into directives, in file order.
///
/// Empty lines are skipped. The first bad line aborts the whole parse.
pub fn parse_control_text(text: &str) -> Result<Vec<MonitoringDirective>, ParseError> {
    text.split(CONTROL_LINE_DELIMITER)
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(idx, line)| MonitoringDirective::parse_record(line, idx + 1))
        .collect()
}
