use serde::de::{DeserializeOwned, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Treat an explicit JSON `null` the same as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Like `null_as_default`, for nested structs that must arrive as JSON objects.
///
/// Derived struct visitors also take arrays positionally; this does not.
pub(crate) fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(T::default()),
        value => from_object(value),
    }
}

/// A list of objects; `null` or a missing list is empty.
pub(crate) fn object_list_or_default<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Option::<Vec<Value>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(from_object)
        .collect()
}

fn from_object<T, E>(value: Value) -> Result<T, E>
where
    T: DeserializeOwned,
    E: serde::de::Error,
{
    if value.is_object() {
        return T::deserialize(value).map_err(E::custom);
    }

    let unexpected = match &value {
        Value::Object(_) => Unexpected::Map,
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
    };

    Err(E::invalid_type(unexpected, &"a JSON object"))
}

/// Notification received from a Matrix homeserver
///
/// Serializing yields the copy embedded in every outbound message, which
/// never includes the device list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundNotification {
    /// Event that triggered the notification
    #[serde(deserialize_with = "null_as_default")]
    pub event_id: String,
    /// Identifier used by earlier push gateway schemas
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub room_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub room_alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    /// Matrix event type, e.g. `m.room.message`
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub event_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sender_display_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_is_target: bool,
    pub prio: Priority,
    #[serde(deserialize_with = "object_or_default")]
    pub content: Content,
    #[serde(deserialize_with = "object_or_default")]
    pub counts: Counts,
    /// Push targets, in the order deliveries are attempted
    #[serde(deserialize_with = "object_list_or_default", skip_serializing)]
    pub devices: Vec<Device>,
}

/// Event content carried by the notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(deserialize_with = "null_as_default")]
    pub format: String,
    #[serde(deserialize_with = "null_as_default")]
    pub formatted_body: String,
    #[serde(deserialize_with = "null_as_default")]
    pub msgtype: String,
    #[serde(deserialize_with = "null_as_default")]
    pub membership: String,
    /// Remaining content keys, passed through to the device untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Badge counters for the recipient
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counts {
    #[serde(deserialize_with = "null_as_default")]
    pub unread: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub missed_calls: i64,
}

/// One registered pusher that should receive the notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    #[serde(deserialize_with = "null_as_default")]
    pub app_id: String,
    /// Routing token handed out by the Ubuntu Touch push service
    #[serde(deserialize_with = "null_as_default")]
    pub pushkey: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pushkey_ts: i64,
    #[serde(deserialize_with = "object_or_default")]
    pub data: DeviceData,
    #[serde(deserialize_with = "object_or_default")]
    pub tweaks: Tweaks,
}

/// Pusher data the homeserver stored for the device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-device notification tweaks from the push rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tweaks {
    #[serde(deserialize_with = "null_as_default")]
    pub highlight: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub sound: String,
}

/// Delivery priority requested by the homeserver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum Priority {
    #[default]
    High,
    Low,
}

impl From<Option<String>> for Priority {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some(p) if p.eq_ignore_ascii_case("low") => Priority::Low,
            _ => Priority::High,
        }
    }
}
