use serde::Serialize;
use serde_json::{Map, Value};

/// One output format entry of an AddMedia / ProcessMedia / UpdateMedia query.
///
/// Only `output` is always present. Any setting left unset falls back to the
/// service default, so nothing else is emitted unless asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Format {
    fields: Map<String, Value>,
}

impl Format {
    /// A format producing the given output (e.g. `"mp4"`, `"flv"`, or a preset name).
    pub fn new(output: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("output".into(), Value::String(output.into()));
        Self { fields }
    }

    /// Thumbnail preset.
    ///
    /// The destination must point at a `.jpg` if an image is wanted.
    pub fn thumbnail(destination: impl Into<String>) -> Self {
        Self::new("thumbnail")
            .destination(destination)
            .set("file_extension", "jpg")
            .keep_aspect_ratio(true)
    }

    pub fn destination(self, url: impl Into<String>) -> Self {
        self.set("destination", url.into())
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.set("video_codec", codec.into())
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.set("audio_codec", codec.into())
    }

    /// Video bitrate, e.g. `"1024k"`.
    pub fn bitrate(self, bitrate: impl Into<String>) -> Self {
        self.set("bitrate", bitrate.into())
    }

    /// Frame size as `WIDTHxHEIGHT`.
    pub fn size(self, size: impl Into<String>) -> Self {
        self.set("size", size.into())
    }

    /// Seconds into the source, or a percentage such as `"5%"`.
    pub fn time(self, time: impl Into<String>) -> Self {
        self.set("time", time.into())
    }

    pub fn width(self, width: impl Into<String>) -> Self {
        self.set("width", width.into())
    }

    /// One of `def`, `0`, `90`, `270`.
    pub fn rotate(self, rotate: impl Into<String>) -> Self {
        self.set("rotate", rotate.into())
    }

    pub fn keep_aspect_ratio(self, keep: bool) -> Self {
        self.set("keep_aspect_ratio", yes_no(keep))
    }

    /// Set any other format setting by its vendor name.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn output(&self) -> &str {
        self.fields
            .get("output")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }
}

pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
