use serde::{Deserialize, Serialize};

use crate::{ElementId, MediaId, Sec};

/// Default length for freshly dropped text elements, in seconds.
pub const DEFAULT_TEXT_DURATION: Sec = 5.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl Default for TextAlign {
    fn default() -> Self {
        Self::Center
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Normal,
    Bold,
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::Normal
    }
}

/// Font, color and 2D placement of a text element. `x`/`y` are relative
/// to the canvas center; `rotation` is in degrees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub font_family: String,
    pub color: String,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub weight: FontWeight,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_opacity() -> f32 {
    1.0
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 48.0,
            font_family: "Arial".to_string(),
            color: "#ffffff".to_string(),
            background_color: None,
            align: TextAlign::Center,
            weight: FontWeight::Normal,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Media {
        media_id: MediaId,
    },
    Text {
        content: String,
        #[serde(flatten)]
        style: TextStyle,
    },
}

impl ElementKind {
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Media { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// A placed element on a track. The *effective interval*
/// `[start_time, start_time + duration - trim_start - trim_end)` is the
/// range it occupies on the timeline after trimming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineElement {
    pub id: ElementId,
    pub name: String,
    pub start_time: Sec,
    pub duration: Sec,
    #[serde(default)]
    pub trim_start: Sec,
    #[serde(default)]
    pub trim_end: Sec,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub muted: bool,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl TimelineElement {
    pub fn effective_duration(&self) -> Sec {
        self.duration - self.trim_start - self.trim_end
    }

    pub fn effective_end(&self) -> Sec {
        self.start_time + self.effective_duration()
    }

    pub fn effective_interval(&self) -> (Sec, Sec) {
        (self.start_time, self.effective_end())
    }

    /// Whether the effective interval contains `time` (half-open).
    pub fn is_active_at(&self, time: Sec) -> bool {
        time >= self.start_time && time < self.effective_end()
    }

    /// Media-local time corresponding to timeline `time`, i.e. where the
    /// underlying source should be positioned.
    pub fn local_time(&self, time: Sec) -> Sec {
        (time - self.start_time + self.trim_start)
            .clamp(self.trim_start, self.duration - self.trim_end)
    }

    pub fn media_id(&self) -> Option<MediaId> {
        match &self.kind {
            ElementKind::Media { media_id } => Some(*media_id),
            ElementKind::Text { .. } => None,
        }
    }
}

/// Everything needed to create an element; the engine assigns the id and
/// starts with zero trims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementSpec {
    pub name: String,
    pub start_time: Sec,
    pub duration: Sec,
    pub kind: ElementKind,
}

impl ElementSpec {
    pub fn media(name: impl Into<String>, media_id: MediaId, start_time: Sec, duration: Sec) -> Self {
        Self {
            name: name.into(),
            start_time,
            duration,
            kind: ElementKind::Media { media_id },
        }
    }

    pub fn text(name: impl Into<String>, content: impl Into<String>, start_time: Sec) -> Self {
        Self {
            name: name.into(),
            start_time,
            duration: DEFAULT_TEXT_DURATION,
            kind: ElementKind::Text {
                content: content.into(),
                style: TextStyle::default(),
            },
        }
    }

    pub(crate) fn into_element(self, id: ElementId) -> TimelineElement {
        TimelineElement {
            id,
            name: self.name,
            start_time: self.start_time,
            duration: self.duration,
            trim_start: 0.0,
            trim_end: 0.0,
            hidden: false,
            muted: false,
            kind: self.kind,
        }
    }
}

const NAME_SUFFIXES: [&str; 4] = [" (left)", " (right)", " (audio)", " (copy)"];

/// Re-suffix an element name, stripping any suffix a previous edit left
/// behind so they do not accumulate.
pub fn name_with_suffix(original: &str, suffix: &str) -> String {
    let mut base = original;
    loop {
        let mut stripped = false;
        for s in NAME_SUFFIXES {
            if let Some(rest) = base.strip_suffix(s) {
                base = rest;
                stripped = true;
            }
        }
        if !stripped {
            break;
        }
    }
    format!("{base} ({suffix})")
}
