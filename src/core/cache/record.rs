//! Typed per-photo analysis record.

use crate::core::neighbors::{LinkDirection, NeighborResult};
use crate::core::sharpness::{SharpnessMethod, SharpnessScore, METHOD_VERSION};
use crate::error::CacheError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Current record schema
pub const SCHEMA_VERSION: &str = "2.0";

/// Version of the scanner that wrote the record
pub const SCANNER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyzer name of the sharpness results
pub const BLUR: &str = "blur";

/// Analyzer name of the neighbor results
pub const BURST: &str = "burst";

/// Everything known about one photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRecord {
    pub version: String,
    pub photo: PhotoSnapshot,
    pub scan_info: ScanInfo,
    pub analyses: Analyses,
}

/// The photo file as it was when the record was written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoSnapshot {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    #[serde(with = "timestamp::option")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl PhotoSnapshot {
    /// Snapshot of the file on disk; a missing file gives size 0 and no mtime
    pub fn of(photo: &Path) -> Self {
        let metadata = fs::metadata(photo).ok();
        Self {
            path: photo.to_path_buf(),
            name: photo
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size_bytes: metadata.as_ref().map_or(0, |m| m.len()),
            modified_at: metadata
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanInfo {
    /// Set once the photo has been analyzed; `None` means never scanned
    #[serde(with = "timestamp::option")]
    pub scanned_at: Option<DateTime<Utc>>,
    /// Refreshed on every save
    #[serde(with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    pub scanner_version: String,
}

impl Default for ScanInfo {
    fn default() -> Self {
        Self {
            scanned_at: None,
            updated_at: None,
            scanner_version: SCANNER_VERSION.to_string(),
        }
    }
}

/// Analyzer outputs by analyzer name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analyses {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<BlurAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst: Option<BurstAnalysis>,
    /// Outputs of analyzers this version does not know, kept verbatim
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// Sharpness results, one entry per method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlurAnalysis {
    #[serde(flatten)]
    pub methods: BTreeMap<String, MethodScore>,
    #[serde(default, with = "timestamp::option")]
    pub computed_at: Option<DateTime<Utc>>,
}

impl BlurAnalysis {
    /// Stored score of one method, if it succeeded
    pub fn score(&self, method: SharpnessMethod) -> Option<SharpnessScore> {
        self.methods
            .get(method.name())
            .and_then(|entry| entry.score)
            .map(|value| SharpnessScore::new(value, method))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodScore {
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_version: Option<String>,
    #[serde(with = "timestamp::option")]
    pub computed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MethodScore {
    pub fn ok(score: f64) -> Self {
        Self {
            score: Some(score),
            method_version: Some(METHOD_VERSION.to_string()),
            computed_at: Some(Utc::now()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            score: None,
            method_version: None,
            computed_at: Some(Utc::now()),
            error: Some(error.into()),
        }
    }
}

/// Neighbor results of one photo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstAnalysis {
    pub burst_neighbors: Vec<NeighborLinkRecord>,
    pub is_burst_candidate: bool,
    pub burst_group_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "timestamp::option")]
    pub computed_at: Option<DateTime<Utc>>,
}

impl From<&NeighborResult> for BurstAnalysis {
    fn from(result: &NeighborResult) -> Self {
        Self {
            burst_neighbors: result
                .neighbors
                .iter()
                .map(|link| NeighborLinkRecord {
                    path: link.to.clone(),
                    time_diff: link.time_diff_seconds,
                    similarity: link.similarity,
                    direction: link.direction,
                })
                .collect(),
            is_burst_candidate: result.is_burst_candidate,
            burst_group_size: result.group_size,
            error: result.error.clone(),
            computed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborLinkRecord {
    pub path: PathBuf,
    pub time_diff: f64,
    pub similarity: f64,
    pub direction: LinkDirection,
}

impl Default for AnalysisRecord {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            photo: PhotoSnapshot::default(),
            scan_info: ScanInfo::default(),
            analyses: Analyses::default(),
        }
    }
}

impl AnalysisRecord {
    /// Empty record for a photo that has never been scanned
    pub fn new(photo: &Path) -> Self {
        Self {
            photo: PhotoSnapshot::of(photo),
            ..Self::default()
        }
    }

    /// Record that the photo was just analyzed in its current state
    pub fn mark_scanned(&mut self, photo: &Path) {
        self.photo = PhotoSnapshot::of(photo);
        self.scan_info.scanned_at = Some(Utc::now());
        self.scan_info.scanner_version = SCANNER_VERSION.to_string();
    }

    /// Replace the sharpness results
    pub fn set_blur(&mut self, mut blur: BlurAnalysis) {
        blur.computed_at = Some(Utc::now());
        self.analyses.blur = Some(blur);
    }

    /// Replace the neighbor results
    pub fn set_burst(&mut self, mut burst: BurstAnalysis) {
        burst.computed_at = Some(Utc::now());
        self.analyses.burst = Some(burst);
    }

    /// Replace one analyzer's output wholesale and stamp `computed_at`.
    ///
    /// Known analyzers must match their typed shape.
    pub fn update_analysis<T: Serialize>(&mut self, name: &str, output: &T) -> Result<(), CacheError> {
        let mut fields = match serde_json::to_value(output).map_err(|e| self.serialize_error(e))? {
            Value::Object(fields) => fields,
            // Bare values are wrapped under `value`
            other => {
                let mut fields = Map::new();
                fields.insert("value".to_string(), other);
                fields
            }
        };
        fields.insert(
            "computed_at".to_string(),
            Value::String(timestamp::format(&Utc::now())),
        );
        let value = Value::Object(fields);

        match name {
            BLUR => {
                self.analyses.blur =
                    Some(serde_json::from_value(value).map_err(|e| self.serialize_error(e))?);
            }
            BURST => {
                self.analyses.burst =
                    Some(serde_json::from_value(value).map_err(|e| self.serialize_error(e))?);
            }
            _ => {
                self.analyses.other.insert(name.to_string(), value);
            }
        }
        Ok(())
    }

    /// Read a nested field by dotted path, e.g. `analyses.blur.laplacian.score`
    pub fn get(&self, dotted: &str) -> Option<Value> {
        let mut current = serde_json::to_value(self).ok()?;
        for key in dotted.split('.') {
            current = match current {
                Value::Object(mut fields) => fields.remove(key)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Like [`AnalysisRecord::get`] with a fallback
    pub fn get_or(&self, dotted: &str, default: Value) -> Value {
        self.get(dotted).unwrap_or(default)
    }

    /// Write a nested field by dotted path, creating missing objects.
    ///
    /// The result must still be a valid record.
    pub fn set(&mut self, dotted: &str, value: Value) -> Result<(), CacheError> {
        let invalid = || CacheError::InvalidPath {
            path: dotted.to_string(),
        };

        let keys: Vec<&str> = dotted.split('.').collect();
        if keys.iter().any(|k| k.is_empty()) {
            return Err(invalid());
        }

        let mut root = serde_json::to_value(&*self).map_err(|e| self.serialize_error(e))?;
        let mut current = &mut root;
        for key in &keys[..keys.len() - 1] {
            let fields = current.as_object_mut().ok_or_else(invalid)?;
            current = fields
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        current
            .as_object_mut()
            .ok_or_else(invalid)?
            .insert(keys[keys.len() - 1].to_string(), value);

        *self = serde_json::from_value(root).map_err(|_| invalid())?;
        Ok(())
    }

    /// Whether the photo changed since it was scanned
    pub fn is_stale_for(&self, photo: &Path) -> bool {
        let Some(scanned_at) = self.scan_info.scanned_at else {
            return true;
        };
        match fs::metadata(photo).and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified) > scanned_at,
            Err(_) => true,
        }
    }

    /// Stored sharpness score, unless the photo changed since it was scanned
    pub fn current_score(&self, photo: &Path, method: SharpnessMethod) -> Option<SharpnessScore> {
        if self.is_stale_for(photo) {
            return None;
        }
        self.analyses.blur.as_ref()?.score(method)
    }

    /// Bring a record read from disk up to the current schema
    pub fn migrate(mut self, photo: &Path) -> Self {
        if self.version != SCHEMA_VERSION {
            self.version = SCHEMA_VERSION.to_string();
        }
        if self.photo.path.as_os_str().is_empty() {
            self.photo = PhotoSnapshot::of(photo);
        }
        self
    }

    fn serialize_error(&self, e: serde_json::Error) -> CacheError {
        CacheError::Serialize {
            path: self.photo.path.clone(),
            reason: e.to_string(),
        }
    }
}

/// Timestamps are written as RFC 3339. Zone-less ISO timestamps from older
/// records are read as local time.
pub(crate) mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Some(parsed.with_timezone(&Utc));
        }
        let naive = value.parse::<NaiveDateTime>().ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }

    pub mod option {
        use super::{format, parse};
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_str(&format(value)),
                None => serializer.serialize_none(),
            }
        }

        /// Unreadable timestamps become `None`
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            Ok(raw.as_deref().and_then(parse))
        }
    }
}
