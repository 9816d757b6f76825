//! Photo extension allow-list and stored photo references.
//!
//! A photo is stored in the blob store under a name derived from the owning
//! record: `{id}.{ext}`. The record keeps the relative path
//! `uploads/{id}.{ext}` as its photo reference.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::PersonId;

/// Directory prefix of every stored photo reference.
pub const UPLOADS_PREFIX: &str = "uploads";

/// Errors that can occur when handling photo names.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    /// The file extension is not in the allow-list.
    #[error("unsupported photo type: {0:?}")]
    UnsupportedExtension(String),
    /// The filename has no extension at all.
    #[error("photo filename has no extension")]
    MissingExtension,
    /// A stored reference does not have the `uploads/{id}.{ext}` shape.
    #[error("malformed photo reference: {0:?}")]
    MalformedRef(String),
}

/// Allowed photo file extensions.
///
/// Parsing is case-insensitive; the canonical form is lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoExtension {
    Png,
    Jpg,
    Jpeg,
    Gif,
}

impl PhotoExtension {
    /// Every accepted extension.
    pub const ALL: [Self; 4] = [Self::Png, Self::Jpg, Self::Jpeg, Self::Gif];

    /// Returns the lower-case extension without a leading dot.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
        }
    }

    /// Determine the extension of an uploaded file from its client filename.
    ///
    /// Only the segment after the last `.` is considered.
    ///
    /// # Errors
    ///
    /// Returns `MissingExtension` when the name has no `.`-separated suffix,
    /// or `UnsupportedExtension` when the suffix is outside the allow-list.
    ///
    /// ```
    /// use registry_core::PhotoExtension;
    ///
    /// assert_eq!(PhotoExtension::from_filename("me.JPG"), Ok(PhotoExtension::Jpg));
    /// assert!(PhotoExtension::from_filename("setup.exe").is_err());
    /// ```
    pub fn from_filename(filename: &str) -> Result<Self, PhotoError> {
        let (_, ext) = filename
            .rsplit_once('.')
            .ok_or(PhotoError::MissingExtension)?;
        if ext.is_empty() {
            return Err(PhotoError::MissingExtension);
        }
        ext.parse()
    }
}

impl FromStr for PhotoExtension {
    type Err = PhotoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ext| ext.as_str() == lower)
            .ok_or_else(|| PhotoError::UnsupportedExtension(lower))
    }
}

impl fmt::Display for PhotoExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative path linking a person record to its photo in the blob store.
///
/// Always of the form `uploads/{id}.{ext}`. A record without a photo holds
/// no `PhotoRef` at all rather than an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhotoRef {
    person_id: PersonId,
    extension: PhotoExtension,
}

impl PhotoRef {
    /// Build the reference for a person's photo.
    #[must_use]
    pub const fn for_person(person_id: PersonId, extension: PhotoExtension) -> Self {
        Self {
            person_id,
            extension,
        }
    }

    /// Parse a stored reference.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRef` unless the value is exactly
    /// `uploads/{id}.{ext}` with a numeric id and an allowed extension.
    pub fn parse(s: &str) -> Result<Self, PhotoError> {
        let malformed = || PhotoError::MalformedRef(s.to_owned());

        let blob_name = s
            .strip_prefix(UPLOADS_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(malformed)?;
        Self::from_blob_name(blob_name).ok_or_else(malformed)
    }

    /// Interpret a blob-store file name (`{id}.{ext}`).
    ///
    /// Returns `None` for names the registry would never have written.
    #[must_use]
    pub fn from_blob_name(name: &str) -> Option<Self> {
        let (id, ext) = name.split_once('.')?;
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let person_id = PersonId::new(id.parse().ok()?);
        // Stored names are always lower-case.
        let extension = PhotoExtension::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == ext)?;
        Some(Self::for_person(person_id, extension))
    }

    /// The owning record.
    #[must_use]
    pub const fn person_id(&self) -> PersonId {
        self.person_id
    }

    /// The stored extension.
    #[must_use]
    pub const fn extension(&self) -> PhotoExtension {
        self.extension
    }

    /// File name inside the blob store: `{id}.{ext}`.
    #[must_use]
    pub fn blob_name(&self) -> String {
        format!("{}.{}", self.person_id, self.extension)
    }
}

impl fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{UPLOADS_PREFIX}/{}.{}", self.person_id, self.extension)
    }
}

impl From<PhotoRef> for String {
    fn from(photo: PhotoRef) -> Self {
        photo.to_string()
    }
}

impl TryFrom<String> for PhotoRef {
    type Error = PhotoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(
            PhotoExtension::from_filename("portrait.PnG").unwrap(),
            PhotoExtension::Png
        );
        assert_eq!(
            PhotoExtension::from_filename("a.b.JPEG").unwrap(),
            PhotoExtension::Jpeg
        );
    }

    #[test]
    fn test_extension_rejected() {
        assert_eq!(
            PhotoExtension::from_filename("x.exe"),
            Err(PhotoError::UnsupportedExtension("exe".to_owned()))
        );
        assert_eq!(
            PhotoExtension::from_filename("archive.tar.gz"),
            Err(PhotoError::UnsupportedExtension("gz".to_owned()))
        );
    }

    #[test]
    fn test_extension_missing() {
        assert_eq!(
            PhotoExtension::from_filename("photo"),
            Err(PhotoError::MissingExtension)
        );
        assert_eq!(
            PhotoExtension::from_filename("photo."),
            Err(PhotoError::MissingExtension)
        );
    }

    #[test]
    fn test_photo_ref_paths() {
        let photo = PhotoRef::for_person(PersonId::new(12), PhotoExtension::Gif);
        assert_eq!(photo.to_string(), "uploads/12.gif");
        assert_eq!(photo.blob_name(), "12.gif");
    }

    #[test]
    fn test_photo_ref_parse() {
        let photo = PhotoRef::parse("uploads/5.jpeg").unwrap();
        assert_eq!(photo.person_id(), PersonId::new(5));
        assert_eq!(photo.extension(), PhotoExtension::Jpeg);
    }

    #[test]
    fn test_photo_ref_parse_rejects_foreign_values() {
        for value in [
            "",
            "5.png",
            "uploads/",
            "uploads/abc.png",
            "uploads/5.exe",
            "uploads/5.PNG",
            "uploads/../5.png",
            "static/uploads/5.png",
        ] {
            assert!(PhotoRef::parse(value).is_err(), "accepted {value:?}");
        }
    }

    #[test]
    fn test_from_blob_name() {
        assert_eq!(
            PhotoRef::from_blob_name("9.png"),
            Some(PhotoRef::for_person(PersonId::new(9), PhotoExtension::Png))
        );
        assert_eq!(PhotoRef::from_blob_name("notes.txt"), None);
        assert_eq!(PhotoRef::from_blob_name(".png"), None);
    }

    #[test]
    fn test_serde_as_path() {
        let photo = PhotoRef::for_person(PersonId::new(1), PhotoExtension::Png);
        let json = serde_json::to_string(&photo).unwrap();
        assert_eq!(json, "\"uploads/1.png\"");

        let parsed: PhotoRef = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, photo);
    }
}
