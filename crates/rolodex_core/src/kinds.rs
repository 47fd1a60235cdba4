//! Enumerations stored in ledger columns.

use rolodex_error::ValidationError;
use serde::{Deserialize, Serialize};

/// Type of media content.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Image content (JPEG, PNG, WebP, GIF)
    #[display("image")]
    Image,
    /// Video content (MP4, WebM, MOV)
    #[display("video")]
    Video,
}

impl MediaType {
    /// Convert to string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    /// Classify a MIME type. Anything that is not `video/*` is treated as an image.
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.to_ascii_lowercase().starts_with("video/") {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            _ => Err(ValidationError::new(
                "media_type",
                format!("Unknown media type: {}", s),
            )),
        }
    }
}

/// Physical backend holding an artifact's bytes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Plain local disk (the legacy upload directory)
    #[display("local-disk")]
    LocalDisk,
    /// Fast local volume (SSD mount)
    #[display("fast-volume")]
    FastVolume,
    /// Remote object store (S3-compatible)
    #[display("object-store")]
    ObjectStore,
}

impl ProviderKind {
    /// Convert to string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::LocalDisk => "local-disk",
            ProviderKind::FastVolume => "fast-volume",
            ProviderKind::ObjectStore => "object-store",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local-disk" | "local" => Ok(ProviderKind::LocalDisk),
            "fast-volume" | "ssd" => Ok(ProviderKind::FastVolume),
            "object-store" | "s3" => Ok(ProviderKind::ObjectStore),
            _ => Err(ValidationError::new(
                "storage_provider",
                format!("Unknown storage provider: {}", s),
            )),
        }
    }
}

/// Where an artifact came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum MediaSource {
    /// Uploaded by the user
    #[display("manual-upload")]
    ManualUpload,
    /// Captured by a scheduled poller
    #[display("scheduled-capture")]
    ScheduledCapture,
    /// Snapshot taken when a follow was recorded
    #[display("follow-snapshot")]
    FollowSnapshot,
    /// Pulled from a third-party API
    #[display("third-party-api")]
    ThirdPartyApi,
    /// Linked from some other external location
    #[display("external")]
    External,
    /// Registered by a legacy import job
    #[display("imported")]
    Imported,
    /// Profile picture
    #[display("profile")]
    Profile,
}

impl MediaSource {
    /// Convert to string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaSource::ManualUpload => "manual-upload",
            MediaSource::ScheduledCapture => "scheduled-capture",
            MediaSource::FollowSnapshot => "follow-snapshot",
            MediaSource::ThirdPartyApi => "third-party-api",
            MediaSource::External => "external",
            MediaSource::Imported => "imported",
            MediaSource::Profile => "profile",
        }
    }
}

impl std::str::FromStr for MediaSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual-upload" => Ok(MediaSource::ManualUpload),
            "scheduled-capture" => Ok(MediaSource::ScheduledCapture),
            "follow-snapshot" => Ok(MediaSource::FollowSnapshot),
            "third-party-api" => Ok(MediaSource::ThirdPartyApi),
            "external" => Ok(MediaSource::External),
            "imported" => Ok(MediaSource::Imported),
            "profile" => Ok(MediaSource::Profile),
            _ => Err(ValidationError::new(
                "source",
                format!("Unknown media source: {}", s),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_string_forms_match_database_values() {
        for kind in ProviderKind::iter() {
            assert_eq!(kind.to_string(), kind.as_str());
            assert_eq!(ProviderKind::from_str(kind.as_str()).unwrap(), kind);
        }
        for source in MediaSource::iter() {
            assert_eq!(source.to_string(), source.as_str());
            assert_eq!(MediaSource::from_str(source.as_str()).unwrap(), source);
        }
    }

    #[test]
    fn test_provider_aliases() {
        assert_eq!(ProviderKind::from_str("s3").unwrap(), ProviderKind::ObjectStore);
        assert_eq!(ProviderKind::from_str("ssd").unwrap(), ProviderKind::FastVolume);
        assert!(ProviderKind::from_str("floppy").is_err());
    }

    #[test]
    fn test_media_type_from_mime() {
        assert_eq!(MediaType::from_mime("video/mp4"), MediaType::Video);
        assert_eq!(MediaType::from_mime("VIDEO/webm"), MediaType::Video);
        assert_eq!(MediaType::from_mime("image/jpeg"), MediaType::Image);
        assert_eq!(MediaType::from_mime("application/octet-stream"), MediaType::Image);
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&ProviderKind::ObjectStore).unwrap();
        assert_eq!(json, "\"object-store\"");
        let source: MediaSource = serde_json::from_str("\"third-party-api\"").unwrap();
        assert_eq!(source, MediaSource::ThirdPartyApi);
    }
}
