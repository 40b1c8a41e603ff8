use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use serde::{Deserialize, Serialize};
use log::{warn, debug};

// @module: Time-coded segment model and subtitle file handling

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2})[,.](\d{3}) --> (\d{2}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

/// Degenerate spans are clamped to this duration (seconds)
pub const MIN_SEGMENT_DURATION: f64 = 0.001;

// @struct: Timestamp of a single transcribed word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

// @struct: Single time-coded subtitle cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    // @field: 1-based position, reassigned on every restructure
    #[serde(default)]
    pub index: usize,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Source-language text
    #[serde(alias = "text")]
    pub original: String,

    // @field: Target-language text, empty until translated
    #[serde(default)]
    pub translation: String,

    // @field: Start offset of the review batch that last wrote this segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_in_batch: Option<usize>,

    // @field: Word-level timestamps from the transcriber
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordTiming>>,
}

/// How a segment is projected into displayed cue text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CueTextMode {
    /// Source text only
    Original,
    /// Translation, or the source text when no translation exists
    #[default]
    Translation,
    /// Translation above the source text
    Dual,
}

impl Segment {
    /// Creates a new segment, clamping a non-positive span to the minimum duration
    pub fn new(index: usize, start: f64, end: f64, original: impl Into<String>) -> Self {
        let (start, end) = Self::clamped_span(start, end);

        Segment {
            index,
            start,
            end,
            original: original.into(),
            translation: String::new(),
            reviewed_in_batch: None,
            words: None,
        }
    }

    /// Builder-style helper used by callers that already hold a translation
    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = translation.into();
        self
    }

    /// Re-apply the span floor after the timing fields were set directly
    pub fn clamp_span(&mut self) {
        (self.start, self.end) = Self::clamped_span(self.start, self.end);
    }

    fn clamped_span(start: f64, end: f64) -> (f64, f64) {
        let start = if start.is_finite() { start.max(0.0) } else { 0.0 };
        let end = if end.is_finite() && end > start { end } else { start + MIN_SEGMENT_DURATION };
        (start, end)
    }

    /// Attach word timings
    pub fn with_words(mut self, words: Vec<WordTiming>) -> Self {
        self.words = Some(words);
        self
    }

    /// Duration in seconds, never below the minimum floor
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(MIN_SEGMENT_DURATION)
    }

    /// Whether the Translate Stage has produced text for this segment
    pub fn has_translation(&self) -> bool {
        !self.translation.trim().is_empty()
    }

    /// Project the segment into displayed cue text
    pub fn cue_text(&self, mode: CueTextMode) -> String {
        let translated = if self.has_translation() {
            self.translation.trim()
        } else {
            self.original.trim()
        };

        match mode {
            CueTextMode::Original => self.original.trim().to_string(),
            CueTextMode::Translation => translated.to_string(),
            CueTextMode::Dual => {
                if self.has_translation() && self.translation.trim() != self.original.trim() {
                    format!("{}\n{}", self.translation.trim(), self.original.trim())
                } else {
                    self.original.trim().to_string()
                }
            }
        }
    }

    /// Format a time in seconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(seconds: f64) -> String {
        let ms = (seconds.max(0.0) * 1000.0).round() as u64;
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let secs = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }

    /// Parse an SRT timestamp to seconds
    pub fn parse_timestamp(timestamp: &str) -> Result<f64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        let total_ms = hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis;
        Ok(total_ms as f64 / 1000.0)
    }

    /// Render this segment as an SRT block with the given projection
    pub fn to_srt_block(&self, mode: CueTextMode) -> String {
        format!(
            "{}\n{} --> {}\n{}\n\n",
            self.index,
            Self::format_timestamp(self.start),
            Self::format_timestamp(self.end),
            self.cue_text(mode)
        )
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_srt_block(CueTextMode::Translation))
    }
}

/// Reassign 1-based contiguous indices in sequence order
pub fn reindex(segments: &mut [Segment]) {
    for (position, segment) in segments.iter_mut().enumerate() {
        segment.index = position + 1;
    }
}

/// Collection of segments with the file it was loaded from
#[derive(Debug)]
pub struct SegmentCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// Ordered segments
    pub segments: Vec<Segment>,
}

impl SegmentCollection {
    /// Create a collection from already parsed segments
    pub fn new(source_file: PathBuf, segments: Vec<Segment>) -> Self {
        SegmentCollection { source_file, segments }
    }

    /// Load segments from an `.srt` file or a JSON array of segments
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read transcript: {}", path.display()))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let mut segments = if is_json {
            Self::parse_json_string(&content)?
        } else {
            Self::parse_srt_string(&content)?
        };

        if segments.is_empty() {
            return Err(anyhow!("No segments found in {}", path.display()));
        }

        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        reindex(&mut segments);
        debug!("Loaded {} segments from {}", segments.len(), path.display());

        Ok(Self::new(path.to_path_buf(), segments))
    }

    /// Parse a JSON array of segments, validating timing on the way in
    pub fn parse_json_string(content: &str) -> Result<Vec<Segment>> {
        let raw: Vec<Segment> = serde_json::from_str(content)
            .context("Failed to parse segment JSON")?;

        Ok(raw
            .into_iter()
            .map(|segment| {
                let mut clamped = Segment::new(segment.index, segment.start, segment.end, segment.original);
                clamped.translation = segment.translation;
                clamped.words = segment.words;
                clamped
            })
            .collect())
    }

    /// Parse SRT format string into segments
    pub fn parse_srt_string(content: &str) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();

        let mut current_index: Option<usize> = None;
        let mut current_span: Option<(f64, f64)> = None;
        let mut current_text = String::new();

        let mut flush = |index: Option<usize>, span: Option<(f64, f64)>, text: &mut String| {
            if let (Some(index), Some((start, end))) = (index, span) {
                if text.trim().is_empty() {
                    warn!("Skipping empty subtitle entry {}", index);
                } else {
                    segments.push(Segment::new(index, start, end, text.trim()));
                }
            }
            text.clear();
        };

        for line in content.lines() {
            let trimmed = line.trim().trim_start_matches('\u{feff}');

            if trimmed.is_empty() {
                if current_span.is_some() && !current_text.is_empty() {
                    flush(current_index.take(), current_span.take(), &mut current_text);
                }
                continue;
            }

            if current_index.is_none() && current_text.is_empty() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_index = Some(num);
                    continue;
                }
            }

            if current_index.is_some() && current_span.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    let start = format!("{}:{}:{},{}", &caps[1], &caps[2], &caps[3], &caps[4]);
                    let end = format!("{}:{}:{},{}", &caps[5], &caps[6], &caps[7], &caps[8]);
                    current_span = Some((Segment::parse_timestamp(&start)?, Segment::parse_timestamp(&end)?));
                    continue;
                }
            }

            if current_span.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            }
        }

        flush(current_index, current_span, &mut current_text);

        Ok(segments)
    }

    /// Render all segments as SRT
    pub fn to_srt_string(&self, mode: CueTextMode) -> String {
        self.segments.iter().map(|segment| segment.to_srt_block(mode)).collect()
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P, mode: CueTextMode) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path, self.to_srt_string(mode))
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))
    }

    /// Write segments as pretty JSON
    pub fn write_to_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.segments)
            .context("Failed to serialize segments")?;

        fs::write(path, json)
            .with_context(|| format!("Failed to write segments: {}", path.display()))
    }
}
