//! Structural validation of rendered configs
//!
//! Mirrors the checks Ignition v2.2 runs before applying a config. Errors
//! are fatal and abort a build; warnings are kept in the report for
//! diagnostics but do not block it.

use std::collections::HashSet;
use std::fmt;

use crate::types::{Config, Directory, Dropin, File, Unit, IGNITION_SCHEMA_VERSION};

/// URL schemes Ignition v2.2 can fetch
pub const SUPPORTED_URL_SCHEMES: &[&str] = &["http", "https", "s3", "tftp", "data"];

/// Suffixes systemd recognises for unit names
pub const UNIT_SUFFIXES: &[&str] = &[
    ".service",
    ".socket",
    ".device",
    ".mount",
    ".automount",
    ".swap",
    ".target",
    ".path",
    ".timer",
    ".snapshot",
    ".slice",
    ".scope",
];

const MAX_MODE: u32 = 0o7777;
const SPECIAL_MODE_BITS: u32 = 0o7000;

/// Severity of a finding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Fatal: the config would be rejected
    Error,
    /// Suspicious but applied
    Warning,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Error => f.write_str("error"),
            EntryKind::Warning => f.write_str("warning"),
        }
    }
}

/// A single finding
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Severity
    pub kind: EntryKind,
    /// What is wrong
    pub message: String,
    /// JSON path of the offending value (e.g., "$.storage.files.0.path")
    pub context: String,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.context, self.message)
    }
}

/// Findings of one validation pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Findings in document order
    pub entries: Vec<Entry>,
}

impl Report {
    /// Whether any finding is fatal
    pub fn is_fatal(&self) -> bool {
        self.entries.iter().any(|e| e.kind == EntryKind::Error)
    }

    /// Whether nothing was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fatal findings only
    pub fn errors(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Error)
    }

    /// Non-fatal findings only
    pub fn warnings(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Warning)
    }

    fn error(&mut self, context: impl Into<String>, message: impl Into<String>) {
        self.entries.push(Entry {
            kind: EntryKind::Error,
            message: message.into(),
            context: context.into(),
        });
    }

    fn warning(&mut self, context: impl Into<String>, message: impl Into<String>) {
        self.entries.push(Entry {
            kind: EntryKind::Warning,
            message: message.into(),
            context: context.into(),
        });
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// Validate a config without fetching any referenced sources
pub fn validate_config(config: &Config) -> Report {
    let mut report = Report::default();

    if config.ignition.version != IGNITION_SCHEMA_VERSION {
        report.error(
            "$.ignition.version",
            format!(
                "unsupported config version {:?}, expected {}",
                config.ignition.version, IGNITION_SCHEMA_VERSION
            ),
        );
    }

    for (i, reference) in config.ignition.config.append.iter().enumerate() {
        validate_url(
            &mut report,
            format!("$.ignition.config.append.{i}.source"),
            &reference.source,
        );
    }
    if let Some(reference) = &config.ignition.config.replace {
        validate_url(&mut report, "$.ignition.config.replace.source", &reference.source);
    }

    let mut paths = HashSet::new();
    for (i, directory) in config.storage.directories.iter().enumerate() {
        validate_directory(&mut report, i, directory, &mut paths);
    }
    for (i, file) in config.storage.files.iter().enumerate() {
        validate_file(&mut report, i, file, &mut paths);
    }

    let mut names = HashSet::new();
    for (i, unit) in config.systemd.units.iter().enumerate() {
        validate_unit(&mut report, i, unit, &mut names);
    }

    report
}

fn validate_url(report: &mut Report, context: impl Into<String>, source: &str) {
    let scheme = source.split_once(':').map(|(scheme, _)| scheme);
    match scheme {
        Some(scheme) if SUPPORTED_URL_SCHEMES.contains(&scheme) => {}
        _ => report.error(context, format!("invalid url scheme in {:?}", source)),
    }
}

fn validate_node_path<'a>(
    report: &mut Report,
    context: &str,
    filesystem: &str,
    path: &'a str,
    seen: &mut HashSet<&'a str>,
) {
    if filesystem.is_empty() {
        report.error(format!("{context}.filesystem"), "filesystem is required");
    }
    if !path.starts_with('/') {
        report.error(format!("{context}.path"), "path not absolute");
    }
    if !seen.insert(path) {
        report.error(
            format!("{context}.path"),
            format!("duplicate entry for path {:?}", path),
        );
    }
}

fn validate_mode(report: &mut Report, context: &str, mode: Option<u32>) {
    let Some(mode) = mode else {
        return;
    };
    if mode > MAX_MODE {
        report.error(format!("{context}.mode"), format!("illegal file mode {:o}", mode));
    } else if mode & SPECIAL_MODE_BITS != 0 {
        report.warning(
            format!("{context}.mode"),
            format!("mode {:o} sets setuid/setgid/sticky bits", mode),
        );
    }
}

fn validate_directory<'a>(
    report: &mut Report,
    index: usize,
    directory: &'a Directory,
    seen: &mut HashSet<&'a str>,
) {
    let context = format!("$.storage.directories.{index}");
    validate_node_path(report, &context, &directory.filesystem, &directory.path, seen);
    validate_mode(report, &context, directory.mode);
}

fn validate_file<'a>(report: &mut Report, index: usize, file: &'a File, seen: &mut HashSet<&'a str>) {
    let context = format!("$.storage.files.{index}");
    validate_node_path(report, &context, &file.filesystem, &file.path, seen);
    validate_mode(report, &context, file.mode);
    if let Some(contents) = &file.contents {
        validate_url(report, format!("{context}.contents.source"), &contents.source);
        if let Some(compression) = contents.compression.as_deref() {
            if compression != "gzip" {
                report.error(
                    format!("{context}.contents.compression"),
                    format!("unsupported compression {:?}", compression),
                );
            }
        }
    }
}

fn validate_unit<'a>(report: &mut Report, index: usize, unit: &'a Unit, seen: &mut HashSet<&'a str>) {
    let context = format!("$.systemd.units.{index}");

    if !UNIT_SUFFIXES.iter().any(|suffix| unit.name.ends_with(suffix)) {
        report.error(
            format!("{context}.name"),
            format!("invalid systemd unit extension in {:?}", unit.name),
        );
    }
    if !seen.insert(unit.name.as_str()) {
        report.error(
            format!("{context}.name"),
            format!("duplicate unit {:?}", unit.name),
        );
    }

    let sections = match unit.contents.as_deref() {
        Some(contents) => match unit_sections(contents) {
            Ok(sections) => sections,
            Err(message) => {
                report.error(
                    format!("{context}.contents"),
                    format!("invalid unit content: {}", message),
                );
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    if unit.enabled == Some(true) && unit.contents.is_some() && !sections.iter().any(|s| s == "Install") {
        report.warning(
            format!("{context}.enabled"),
            format!(
                "unit {:?} is enabled, but has no install section so enable does nothing",
                unit.name
            ),
        );
    }
    if unit.enabled == Some(true) && unit.mask == Some(true) {
        report.warning(
            format!("{context}.mask"),
            format!("unit {:?} is both enabled and masked", unit.name),
        );
    }

    for (i, dropin) in unit.dropins.iter().enumerate() {
        validate_dropin(report, &format!("{context}.dropins.{i}"), dropin);
    }
}

fn validate_dropin(report: &mut Report, context: &str, dropin: &Dropin) {
    if !dropin.name.ends_with(".conf") {
        report.error(
            format!("{context}.name"),
            format!("invalid systemd unit drop-in extension in {:?}", dropin.name),
        );
    }
    if let Some(contents) = dropin.contents.as_deref() {
        if let Err(message) = unit_sections(contents) {
            report.error(
                format!("{context}.contents"),
                format!("invalid unit content: {}", message),
            );
        }
    }
}

/// Parse a unit file just far enough to list its section names
fn unit_sections(contents: &str) -> Result<Vec<String>, String> {
    let mut sections = Vec::new();
    let mut lines = contents.lines().enumerate();

    while let Some((index, raw)) = lines.next() {
        let raw = raw.trim();
        // Comments never continue onto the next line
        if raw.is_empty() || raw.starts_with('#') || raw.starts_with(';') {
            continue;
        }

        let mut line = raw.to_string();
        while line.ends_with('\\') {
            line.pop();
            match lines.next() {
                Some((_, next)) => line.push_str(next.trim()),
                None => break,
            }
        }

        if let Some(header) = line.strip_prefix('[') {
            match header.strip_suffix(']') {
                Some(name) if !name.is_empty() => sections.push(name.to_string()),
                _ => return Err(format!("line {}: malformed section header", index + 1)),
            }
            continue;
        }

        if sections.is_empty() {
            return Err(format!("line {}: assignment outside of a section", index + 1));
        }
        match line.split_once('=') {
            Some((key, _)) if !key.trim().is_empty() => {}
            _ => return Err(format!("line {}: expected key=value", index + 1)),
        }
    }

    Ok(sections)
}
