use serde::{
    Deserialize,
    Serialize,
};
use strum::{
    Display,
    EnumIter,
    EnumString,
};

/// What the refresh loop does when a cycle after warm-up fails.
#[derive(Debug, Default, Clone, Copy, Display, EnumIter, EnumString, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop refreshing and surface the error, terminating the exporter.
    #[default]
    Exit,
    /// Log the error and keep serving the last successful snapshot.
    KeepLastGood,
}
