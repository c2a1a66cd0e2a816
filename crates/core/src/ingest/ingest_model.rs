use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::constants::BIBCODE_FIELD;
use crate::deletion::DeletionReport;
use crate::errors::ValidationError;
use crate::records::FragmentKind;

/// Raw change notification as received on the wire.
///
/// List kinds (`nonbib_records`, `metrics_records`) carry their items in
/// `records`, each an object with its own `bibcode`. Every other kind names a
/// single record through `bibcode` and `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub status: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bibcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<Value>,
}

impl InboundMessage {
    /// Keys named by the message, in order.
    pub fn keys(&self) -> Vec<String> {
        if self.records.is_empty() {
            return self.bibcode.iter().cloned().collect();
        }
        self.records
            .iter()
            .filter_map(|r| r.get(BIBCODE_FIELD).and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    pub fn status(&self) -> Result<NotificationStatus, ValidationError> {
        self.status.parse()
    }

    /// Resolves the message into its typed form.
    pub fn parse(&self) -> Result<Notification, ValidationError> {
        let kind: FragmentKind = self.kind.parse()?;
        match kind {
            FragmentKind::BibData => Ok(Notification::Metadata(self.single_item()?)),
            FragmentKind::NonbibData => Ok(Notification::NonbibRecords(self.list_items()?)),
            FragmentKind::Metrics => Ok(Notification::MetricsRecords(self.list_items()?)),
            FragmentKind::Augments => Ok(Notification::Augment(self.single_item()?)),
            kind => Ok(Notification::Single {
                kind,
                item: self.single_item()?,
            }),
        }
    }

    fn single_item(&self) -> Result<KeyedPayload, ValidationError> {
        let bibcode = self
            .bibcode
            .clone()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| ValidationError::MissingField(BIBCODE_FIELD.to_string()))?;
        Ok(KeyedPayload {
            bibcode,
            payload: self.payload.clone(),
        })
    }

    fn list_items(&self) -> Result<Vec<KeyedPayload>, ValidationError> {
        if self.records.is_empty() {
            return self.single_item().map(|item| vec![item]);
        }
        self.records
            .iter()
            .map(|item| {
                let bibcode = item
                    .get(BIBCODE_FIELD)
                    .and_then(Value::as_str)
                    .filter(|b| !b.is_empty())
                    .ok_or_else(|| ValidationError::MissingField(BIBCODE_FIELD.to_string()))?;
                Ok(KeyedPayload {
                    bibcode: bibcode.to_string(),
                    payload: Some(item.clone()),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Active,
    Deleted,
}

impl FromStr for NotificationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(NotificationStatus::Active),
            "deleted" => Ok(NotificationStatus::Deleted),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyedPayload {
    pub bibcode: String,
    pub payload: Option<Value>,
}

/// Closed set of notification shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Metadata(KeyedPayload),
    NonbibRecords(Vec<KeyedPayload>),
    MetricsRecords(Vec<KeyedPayload>),
    Augment(KeyedPayload),
    /// Any other single-record fragment kind.
    Single {
        kind: FragmentKind,
        item: KeyedPayload,
    },
}

impl Notification {
    /// Fragment the notification writes to.
    pub fn fragment_kind(&self) -> FragmentKind {
        match self {
            Notification::Metadata(_) => FragmentKind::BibData,
            Notification::NonbibRecords(_) => FragmentKind::NonbibData,
            Notification::MetricsRecords(_) => FragmentKind::Metrics,
            Notification::Augment(_) => FragmentKind::Augments,
            Notification::Single { kind, .. } => *kind,
        }
    }

    pub fn items(&self) -> Vec<&KeyedPayload> {
        match self {
            Notification::Metadata(item)
            | Notification::Augment(item)
            | Notification::Single { item, .. } => vec![item],
            Notification::NonbibRecords(items) | Notification::MetricsRecords(items) => {
                items.iter().collect()
            }
        }
    }
}

/// What a notification did to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    pub kind: Option<FragmentKind>,
    /// Keys whose fragment was written or cleared.
    pub touched: Vec<String>,
    pub deletion: Option<DeletionReport>,
    pub augmentation_requested: Vec<String>,
    /// Set when the notification was dropped unprocessed.
    pub dropped: Option<String>,
}

impl UpdateReport {
    pub fn dropped(reason: impl Into<String>) -> Self {
        Self {
            dropped: Some(reason.into()),
            ..Default::default()
        }
    }
}
