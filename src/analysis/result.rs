//! Analysis result types

use serde::{Deserialize, Serialize};

/// A loop point in forward playback time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopPoint {
    /// Sample at which the loop starts
    pub loop_start: u64,

    /// Loop length in samples; playback jumps back by this much at `loop_start + loop_length`
    pub loop_length: u64,
}

impl LoopPoint {
    /// Sample at which playback jumps back to `loop_start`
    pub fn loop_end(&self) -> u64 {
        self.loop_start + self.loop_length
    }

    /// Filename option suffix, e.g. `s1024l88200`
    ///
    /// # Example
    ///
    /// ```
    /// use seamless_loop::LoopPoint;
    ///
    /// let point = LoopPoint { loop_start: 1024, loop_length: 88200 };
    /// assert_eq!(point.file_suffix(), "s1024l88200");
    /// ```
    pub fn file_suffix(&self) -> String {
        format!("s{}l{}", self.loop_start, self.loop_length)
    }
}

/// Result for one analyzed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopReport {
    /// Path of the analyzed file as given
    pub file: String,

    /// Base name without options or extension
    pub name: String,

    /// Detected loop point
    #[serde(flatten)]
    pub loop_point: LoopPoint,

    /// Positive `LOOPLENGTH` tag value found in the file, for comparison
    pub previous_loop_length: Option<u64>,
}

impl LoopReport {
    /// Result line: `<name>__s<start>l<length>`, plus `  (<old>)` if the file carried a loop length
    pub fn line(&self) -> String {
        let base = format!("{}__{}", self.name, self.loop_point.file_suffix());
        match self.previous_loop_length {
            Some(old) => format!("{}  ({})", base, old),
            None => base,
        }
    }

    /// Single-line JSON form
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl std::fmt::Display for LoopReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(previous: Option<u64>) -> LoopReport {
        LoopReport {
            file: "music/theme.ogg".to_string(),
            name: "theme".to_string(),
            loop_point: LoopPoint {
                loop_start: 12345,
                loop_length: 441000,
            },
            previous_loop_length: previous,
        }
    }

    #[test]
    fn test_line_without_previous() {
        assert_eq!(report(None).line(), "theme__s12345l441000");
    }

    #[test]
    fn test_line_with_previous() {
        assert_eq!(report(Some(440999)).to_string(), "theme__s12345l441000  (440999)");
    }

    #[test]
    fn test_json_is_flat() {
        let json = report(None).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["loop_start"], 12345);
        assert_eq!(value["loop_length"], 441000);
        assert_eq!(value["name"], "theme");
        assert!(value["previous_loop_length"].is_null());
    }

    #[test]
    fn test_loop_end() {
        let p = LoopPoint {
            loop_start: 10,
            loop_length: 90,
        };
        assert_eq!(p.loop_end(), 100);
    }
}
