use derive_more::{
    Deref,
    Display,
    From,
};
use serde::{
    Deserialize,
    Serialize,
};
use strum::EnumIter;

/// Name of a tracked account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Deref, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

pub const IDENTITY_LABEL: &str = "username";
pub const ITEM_LABEL: &str = "media_id";

/// Static metadata of one exported metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub label_names: &'static [&'static str],
}

const MEDIA: MetricDescriptor = MetricDescriptor {
    name: "media_total",
    help: "Total media count by username",
    label_names: &[IDENTITY_LABEL],
};

const FOLLOWER: MetricDescriptor = MetricDescriptor {
    name: "follower_total",
    help: "Total followers count by username",
    label_names: &[IDENTITY_LABEL],
};

const FOLLOWING: MetricDescriptor = MetricDescriptor {
    name: "following_total",
    help: "Total following count by username",
    label_names: &[IDENTITY_LABEL],
};

const MEDIA_LIKE: MetricDescriptor = MetricDescriptor {
    name: "media_like_total",
    help: "Total likes count by [username, media_id]",
    label_names: &[IDENTITY_LABEL, ITEM_LABEL],
};

const MEDIA_COMMENT: MetricDescriptor = MetricDescriptor {
    name: "media_comment_total",
    help: "Total comments count by [username, media_id]",
    label_names: &[IDENTITY_LABEL, ITEM_LABEL],
};

/// The five families the exporter publishes. Declaration order is the
/// order families are described in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum MetricKind {
    Media,
    Follower,
    Following,
    MediaLike,
    MediaComment,
}

impl MetricKind {
    pub const fn descriptor(self) -> &'static MetricDescriptor {
        match self {
            MetricKind::Media => &MEDIA,
            MetricKind::Follower => &FOLLOWER,
            MetricKind::Following => &FOLLOWING,
            MetricKind::MediaLike => &MEDIA_LIKE,
            MetricKind::MediaComment => &MEDIA_COMMENT,
        }
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("{kind:?} expects {expected} label values, got {actual}")]
pub struct LabelArityError {
    pub kind: MetricKind,
    pub expected: usize,
    pub actual: usize,
}

/// One labeled observation. The label values always match the arity of the
/// kind's descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    kind: MetricKind,
    labels: Vec<String>,
    value: f64,
}

impl Measurement {
    pub fn new(kind: MetricKind, labels: Vec<String>, value: f64) -> Result<Self, LabelArityError> {
        let expected = kind.descriptor().label_names.len();
        if labels.len() != expected {
            return Err(LabelArityError {
                kind,
                expected,
                actual: labels.len(),
            });
        }
        Ok(Self { kind, labels, value })
    }

    fn profile(kind: MetricKind, identity: &Identity, count: u64) -> Self {
        Self {
            kind,
            labels: vec![identity.to_string()],
            value: count as f64,
        }
    }

    fn item(kind: MetricKind, identity: &Identity, item_id: &str, count: u64) -> Self {
        Self {
            kind,
            labels: vec![identity.to_string(), item_id.to_string()],
            value: count as f64,
        }
    }

    pub fn media(identity: &Identity, count: u64) -> Self {
        Self::profile(MetricKind::Media, identity, count)
    }

    pub fn followers(identity: &Identity, count: u64) -> Self {
        Self::profile(MetricKind::Follower, identity, count)
    }

    pub fn following(identity: &Identity, count: u64) -> Self {
        Self::profile(MetricKind::Following, identity, count)
    }

    pub fn likes(identity: &Identity, item_id: &str, count: u64) -> Self {
        Self::item(MetricKind::MediaLike, identity, item_id, count)
    }

    pub fn comments(identity: &Identity, item_id: &str, count: u64) -> Self {
        Self::item(MetricKind::MediaComment, identity, item_id, count)
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn descriptor(&self) -> &'static MetricDescriptor {
        self.kind.descriptor()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator as _;

    #[test]
    fn constructors_match_descriptor_arity() {
        let identity = Identity::from("alice");
        let all = [
            Measurement::media(&identity, 1),
            Measurement::followers(&identity, 2),
            Measurement::following(&identity, 3),
            Measurement::likes(&identity, "x", 4),
            Measurement::comments(&identity, "x", 5),
        ];
        for measurement in &all {
            assert_eq!(measurement.labels().len(), measurement.descriptor().label_names.len());
        }
        assert_eq!(all[3].labels(), ["alice".to_string(), "x".to_string()]);
        assert_eq!(all[4].value(), 5.0);
    }

    #[test]
    fn checked_constructor_rejects_wrong_arity() {
        let err = Measurement::new(MetricKind::MediaLike, vec!["alice".to_string()], 1.0).unwrap_err();
        assert_eq!(
            err,
            LabelArityError {
                kind: MetricKind::MediaLike,
                expected: 2,
                actual: 1,
            }
        );
        assert!(Measurement::new(MetricKind::Media, vec!["alice".to_string()], 1.0).is_ok());
    }

    #[test]
    fn descriptor_names_are_unique() {
        let mut names = MetricKind::iter().map(|kind| kind.descriptor().name).collect::<Vec<_>>();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }
}
