//! Loop metadata carried by tags and file names
//!
//! A track may declare its loop length in a `LOOPLENGTH` tag, or in a file
//! name option such as `theme__l441000.ogg`. A declared length of zero means
//! the track loops end-to-end and needs no analysis.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Tag holding a declared loop length in samples
pub const LOOP_LENGTH_TAG: &str = "LOOPLENGTH";

/// Name of the file name option holding a loop length
pub const LOOP_LENGTH_OPTION: char = 'l';

static FILE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^([0-9A-Za-z-]+(?:_[0-9A-Za-z]+)*)",
        r"(?:__((?:[A-Za-z]-?[0-9]*)+))?",
        r"(\.[0-9A-Za-z]+)?$"
    ))
    .expect("file name pattern is valid")
});

static OPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z])(-?[0-9]*)").expect("option pattern is valid")
});

/// A declared loop length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredLoop {
    /// Nothing usable was declared
    Absent,
    /// Declared as zero: the whole track loops
    EndToEnd,
    /// Declared loop length in samples
    Length(u64),
}

impl DeclaredLoop {
    /// Interpret a declared integer value
    pub fn from_value(value: i64) -> Self {
        match value {
            0 => DeclaredLoop::EndToEnd,
            v if v > 0 => DeclaredLoop::Length(v as u64),
            _ => DeclaredLoop::Absent,
        }
    }

    /// Loop length usable as a search hint
    pub fn hint(self) -> Option<u64> {
        match self {
            DeclaredLoop::Length(n) => Some(n),
            _ => None,
        }
    }
}

/// Interpret the value of a `LOOPLENGTH` tag
///
/// Unparsable values count as absent.
pub fn parse_loop_length_tag(value: Option<&str>) -> DeclaredLoop {
    match value.map(|v| v.trim().parse::<u64>()) {
        Some(Ok(0)) => DeclaredLoop::EndToEnd,
        Some(Ok(n)) => DeclaredLoop::Length(n),
        Some(Err(_)) | None => DeclaredLoop::Absent,
    }
}

/// A file name split into base name, options and extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName {
    /// Base name without options or extension
    pub name: String,
    /// Extension including the leading dot, or empty
    pub extension: String,
    /// Single-letter options with integer values
    pub options: HashMap<char, i64>,
}

impl FileName {
    /// Declared loop length from the `l` option
    pub fn declared_loop(&self) -> DeclaredLoop {
        self.options
            .get(&LOOP_LENGTH_OPTION)
            .map_or(DeclaredLoop::Absent, |&v| DeclaredLoop::from_value(v))
    }

    /// Extension without the leading dot
    pub fn extension_bare(&self) -> &str {
        self.extension.trim_start_matches('.')
    }
}

/// Split a file name like `name__l441000s12.ogg` into its parts
///
/// Names that do not follow the option pattern keep their stem and extension
/// and carry no options. Options without a number are ignored.
pub fn parse_file_name(file_name: &str) -> FileName {
    let Some(parts) = FILE_NAME_PATTERN.captures(file_name) else {
        let path = Path::new(file_name);
        return FileName {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.to_string()),
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
            options: HashMap::new(),
        };
    };

    let name = parts.get(1).map_or("", |m| m.as_str()).to_string();
    let extension = parts.get(3).map_or("", |m| m.as_str()).to_string();
    let mut options = HashMap::new();

    if let Some(opts) = parts.get(2) {
        for option in OPTION_PATTERN.captures_iter(opts.as_str()) {
            let (Some(key), Some(value)) = (option.get(1), option.get(2)) else {
                continue;
            };
            let Ok(value) = value.as_str().parse::<i64>() else {
                continue;
            };
            if let Some(key) = key.as_str().chars().next() {
                options.insert(key, value);
            }
        }
    }

    FileName {
        name,
        extension,
        options,
    }
}
