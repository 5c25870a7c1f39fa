//! JSON bodies returned by the mining server's `/api` endpoints.
//!
//! Every known field is optional and kept as a raw JSON value because the
//! server is not consistent about numbers vs. strings. Unknown fields are
//! carried through untouched in `extra`.

use {super::*, serde_with::{DefaultOnNull, serde_as}};

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_difficulty: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers_count: Option<Value>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub workers: Vec<WorkerRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_difficulty: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_rate: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkerRecord {
    /// Workers without a name are called `worker_{index}`.
    pub fn display_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("worker_{index}"),
        }
    }

    /// Raw hash rate in H/s, zero when missing or unparsable.
    pub fn raw_hash_rate(&self) -> HashRate {
        HashRate(
            self.hash_rate
                .as_ref()
                .and_then(units::numeric)
                .unwrap_or_default(),
        )
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        match self.extra.get("lastSeen")? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|time| time.with_timezone(&Utc)),
            Value::Number(n) => {
                let millis = n.as_i64()?;
                DateTime::from_timestamp_millis(millis)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networkhashps: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pooledtx: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NetworkRecord {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_none()
            && self.difficulty.is_none()
            && self.networkhashps.is_none()
            && self.pooledtx.is_none()
            && self.extra.is_empty()
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoRecord {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub high_scores: Vec<HighScore>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InfoRecord {
    pub fn is_empty(&self) -> bool {
        self.high_scores.is_empty() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_difficulty: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
