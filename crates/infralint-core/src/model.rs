//! Parsed, position-tagged models for every supported format.
//!
//! All `line` fields are 1-based indices into the original file. Elements
//! built from joined continuation lines report their first physical line.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::file_type::FileType;

/// The structural representation of one file, tagged by format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParsedModel {
    /// A parsed Dockerfile.
    Dockerfile(Dockerfile),
    /// A parsed Makefile.
    Makefile(Makefile),
    /// A parsed `.env` file.
    Env(EnvFile),
    /// A parsed crontab.
    Crontab(Crontab),
    /// A parsed systemd unit.
    #[serde(rename = "systemd")]
    SystemdUnit(SystemdUnit),
}

impl ParsedModel {
    /// The file type this model was parsed as.
    #[must_use]
    pub fn file_type(&self) -> FileType {
        match self {
            Self::Dockerfile(_) => FileType::Dockerfile,
            Self::Makefile(_) => FileType::Makefile,
            Self::Env(_) => FileType::Env,
            Self::Crontab(_) => FileType::Crontab,
            Self::SystemdUnit(_) => FileType::SystemdUnit,
        }
    }
}

// ---------------------------------------------------------------------------
// Dockerfile
// ---------------------------------------------------------------------------

/// Ordered Dockerfile instructions (comments and `ARG` excluded).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dockerfile {
    /// Instructions in source order.
    pub instructions: Vec<Instruction>,
}

impl Dockerfile {
    /// True if the file holds no instructions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instructions with the given (upper-case) keyword.
    pub fn instructions_named<'a>(
        &'a self,
        keyword: &'a str,
    ) -> impl Iterator<Item = &'a Instruction> + 'a {
        self.instructions.iter().filter(move |i| i.keyword == keyword)
    }

    /// True if any instruction uses `keyword`.
    #[must_use]
    pub fn has(&self, keyword: &str) -> bool {
        self.instructions_named(keyword).next().is_some()
    }

    /// The last `FROM` instruction, which starts the final build stage.
    #[must_use]
    pub fn last_from(&self) -> Option<&Instruction> {
        self.instructions_named("FROM").last()
    }
}

/// One Dockerfile instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Upper-cased keyword (`FROM`, `RUN`, ...).
    pub keyword: String,
    /// Everything after the keyword, continuations joined.
    pub arguments: String,
    /// First physical line of the instruction.
    pub line: usize,
    /// Column of the keyword (1-based).
    pub column: usize,
}

impl Instruction {
    /// Decodes the image reference of a `FROM` instruction.
    #[must_use]
    pub fn image(&self) -> Option<ImageRef> {
        if self.keyword == "FROM" {
            ImageRef::parse_from_arguments(&self.arguments)
        } else {
            None
        }
    }
}

/// An image reference as written in `FROM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image name including any registry prefix.
    pub name: String,
    /// Explicit tag, if any.
    pub tag: Option<String>,
    /// Digest after `@`, if any.
    pub digest: Option<String>,
    /// Stage alias from `AS name`, if any.
    pub alias: Option<String>,
}

impl ImageRef {
    /// Parses `FROM` arguments: `[--platform=x] image[:tag][@digest] [AS alias]`.
    #[must_use]
    pub fn parse_from_arguments(arguments: &str) -> Option<Self> {
        let mut tokens = arguments.split_whitespace().peekable();

        while tokens.peek().is_some_and(|t| t.starts_with("--")) {
            let flag = tokens.next()?;
            if flag == "--platform" {
                tokens.next();
            }
        }

        let reference = tokens.next()?;
        let alias = match (tokens.next(), tokens.next()) {
            (Some(kw), Some(name)) if kw.eq_ignore_ascii_case("as") => Some(name.to_string()),
            _ => None,
        };

        let mut image = Self::parse(reference);
        image.alias = alias;
        Some(image)
    }

    /// Parses `image[:tag][@digest]`.
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        let (without_digest, digest) = match reference.split_once('@') {
            Some((image, digest)) => (image, Some(digest.to_string())),
            None => (reference, None),
        };

        // A colon in the last path segment is a tag; earlier ones are registry ports.
        let last_segment_start = without_digest.rfind('/').map_or(0, |p| p + 1);
        let (name, tag) = match without_digest[last_segment_start..].rfind(':') {
            Some(pos) => {
                let split = last_segment_start + pos;
                (
                    without_digest[..split].to_string(),
                    Some(without_digest[split + 1..].to_string()),
                )
            }
            None => (without_digest.to_string(), None),
        };

        Self {
            name,
            tag,
            digest,
            alias: None,
        }
    }

    /// True if the reference contains a build argument or variable.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.name.contains('$') || self.tag.as_deref().is_some_and(|t| t.contains('$'))
    }
}

// ---------------------------------------------------------------------------
// Makefile
// ---------------------------------------------------------------------------

/// Targets, phony declarations and recipe variable references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Makefile {
    /// Targets in source order; repeated names are separate entries.
    /// `.PHONY` lines only feed [`Makefile::phony`].
    pub targets: Vec<Target>,
    /// Names listed in any `.PHONY` prerequisite list.
    pub phony: BTreeSet<String>,
    /// `$(NAME)` / `${NAME}` references inside recipe lines.
    pub variable_refs: Vec<VariableRef>,
}

/// A single target definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Target name.
    pub name: String,
    /// Prerequisites (order-only ones included).
    pub prerequisites: Vec<String>,
    /// Recipe lines belonging to this definition.
    pub recipe_lines: Vec<RecipeLine>,
    /// Line of the rule header.
    pub line: usize,
    /// Declared with `::`.
    pub double_colon: bool,
}

impl Target {
    /// Special built-in targets such as `.DEFAULT` or `.SUFFIXES`.
    #[must_use]
    pub fn is_special(&self) -> bool {
        is_special_target(&self.name)
    }
}

/// True for make's special targets (`.PHONY`, `.SUFFIXES`, ...).
#[must_use]
pub fn is_special_target(name: &str) -> bool {
    name.len() > 1
        && name.starts_with('.')
        && name[1..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '_')
}

/// One recipe line with the leading tab removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLine {
    /// Command text.
    pub text: String,
    /// Physical line number.
    pub line: usize,
}

/// A variable reference inside a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRef {
    /// Referenced variable name.
    pub name: String,
    /// Whether the reference sits inside single or double quotes.
    pub quoted: bool,
    /// Physical line number.
    pub line: usize,
    /// Column of the `$` (1-based, counted in the original line).
    pub column: usize,
}

// ---------------------------------------------------------------------------
// Env
// ---------------------------------------------------------------------------

/// Ordered assignments of a `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvFile {
    /// Assignments in source order.
    pub assignments: Vec<Assignment>,
}

/// Quote style of an env value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quote {
    /// `'value'`
    Single,
    /// `"value"`
    Double,
}

/// `KEY=VALUE` with the raw text preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Trimmed key.
    pub key: String,
    /// Key text exactly as written before `=` (after any `export`).
    pub raw_key: String,
    /// Value text exactly as written after `=`.
    pub raw_value: String,
    /// Inner value with quotes stripped and trailing comment removed.
    pub value: String,
    /// Quote style, if the value was quoted.
    pub quoted: Option<Quote>,
    /// Physical line number.
    pub line: usize,
    /// Column of the key (1-based).
    pub column: usize,
    /// Prefixed with `export`.
    pub exported: bool,
}

impl Assignment {
    /// True if the value is a bare `${VAR}` / `$VAR` reference.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        let v = self.value.trim();
        (v.starts_with("${") && v.ends_with('}') && !v[2..v.len() - 1].contains('}'))
            || (v.starts_with('$')
                && v.len() > 1
                && v[1..].chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    }
}

// ---------------------------------------------------------------------------
// Crontab
// ---------------------------------------------------------------------------

/// Entries and environment lines of a crontab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crontab {
    /// Schedule entries in source order.
    pub entries: Vec<CronEntry>,
    /// `NAME=value` lines.
    pub environment: Vec<CronEnv>,
}

/// Which schedule column a field is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CronField {
    /// Minute, 0-59.
    Minute,
    /// Hour, 0-23.
    Hour,
    /// Day of month, 1-31.
    DayOfMonth,
    /// Month, 1-12.
    Month,
    /// Day of week, 0-7 (0 and 7 are Sunday).
    DayOfWeek,
}

impl CronField {
    /// Inclusive value range.
    #[must_use]
    pub fn range(self) -> (u32, u32) {
        match self {
            Self::Minute => (0, 59),
            Self::Hour => (0, 23),
            Self::DayOfMonth => (1, 31),
            Self::Month => (1, 12),
            Self::DayOfWeek => (0, 7),
        }
    }

    /// Human-readable column name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::DayOfMonth => "day-of-month",
            Self::Month => "month",
            Self::DayOfWeek => "day-of-week",
        }
    }
}

/// One scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronEntry {
    /// Minute field.
    pub minute: String,
    /// Hour field.
    pub hour: String,
    /// Day-of-month field.
    pub day_of_month: String,
    /// Month field.
    pub month: String,
    /// Day-of-week field.
    pub day_of_week: String,
    /// Command to run.
    pub command: String,
    /// User column of system crontabs.
    pub run_as_user: Option<String>,
    /// `@nickname` the schedule was written as.
    pub nickname: Option<String>,
    /// Physical line number.
    pub line: usize,
}

impl CronEntry {
    /// `@reboot` entries have no time schedule.
    #[must_use]
    pub fn is_reboot(&self) -> bool {
        self.nickname.as_deref() == Some("@reboot")
    }

    /// The five schedule fields with their column.
    #[must_use]
    pub fn fields(&self) -> [(CronField, &str); 5] {
        [
            (CronField::Minute, self.minute.as_str()),
            (CronField::Hour, self.hour.as_str()),
            (CronField::DayOfMonth, self.day_of_month.as_str()),
            (CronField::Month, self.month.as_str()),
            (CronField::DayOfWeek, self.day_of_week.as_str()),
        ]
    }
}

/// An environment line inside a crontab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronEnv {
    /// Variable name.
    pub key: String,
    /// Value as written.
    pub value: String,
    /// Physical line number.
    pub line: usize,
}

// ---------------------------------------------------------------------------
// systemd
// ---------------------------------------------------------------------------

/// Sections of a systemd unit file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemdUnit {
    /// Sections in source order; a repeated header opens a new entry.
    pub sections: Vec<Section>,
}

impl SystemdUnit {
    /// Sections with the given name.
    pub fn sections_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Section> + 'a {
        self.sections.iter().filter(move |s| s.name == name)
    }

    /// Last value of `key` across all sections called `section`.
    #[must_use]
    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .filter(|s| s.name == section)
            .flat_map(|s| s.directives.iter())
            .filter(|d| d.key == key)
            .last()
            .map(|d| d.value.as_str())
    }
}

/// A `[Name]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Name between the brackets.
    pub name: String,
    /// Line of the header.
    pub line: usize,
    /// `Key=Value` directives in source order.
    pub directives: Vec<Directive>,
}

/// A `Key=Value` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// Directive key.
    pub key: String,
    /// Value, continuations joined.
    pub value: String,
    /// First physical line.
    pub line: usize,
}
