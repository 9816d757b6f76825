//! Person record fields.

/// Errors that can occur when validating [`PersonDetails`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PersonDetailsError {
    /// The name is empty after trimming.
    #[error("name is required")]
    MissingName,
    /// The birth date is empty after trimming.
    #[error("birth date is required")]
    MissingBirthDate,
}

/// The user-editable fields of a person record.
///
/// ## Constraints
///
/// - `name` is non-empty after trimming surrounding whitespace
/// - `birth_date` is non-empty after trimming; its format is not checked
///
/// ## Examples
///
/// ```
/// use registry_core::PersonDetails;
///
/// let details = PersonDetails::parse("  Ada Lovelace ", "1815-12-10").unwrap();
/// assert_eq!(details.name(), "Ada Lovelace");
///
/// assert!(PersonDetails::parse("   ", "1815-12-10").is_err());
/// assert!(PersonDetails::parse("Ada", "").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonDetails {
    name: String,
    birth_date: String,
}

impl PersonDetails {
    /// Trim and validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns `MissingName` or `MissingBirthDate` when the corresponding
    /// field is blank. The name is checked first.
    pub fn parse(name: &str, birth_date: &str) -> Result<Self, PersonDetailsError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PersonDetailsError::MissingName);
        }

        let birth_date = birth_date.trim();
        if birth_date.is_empty() {
            return Err(PersonDetailsError::MissingBirthDate);
        }

        Ok(Self {
            name: name.to_owned(),
            birth_date: birth_date.to_owned(),
        })
    }

    /// Returns the trimmed name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the trimmed birth date, stored as opaque text.
    #[must_use]
    pub fn birth_date(&self) -> &str {
        &self.birth_date
    }

    /// Consumes the details and returns `(name, birth_date)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.name, self.birth_date)
    }
}
