//! User aggregate and identity types
//!
//! This module contains the core user struct and related functionality.
//!
//! A user is keyed by the stable id assigned by the external identity
//! provider and carries a profile plus an ordered collection of child
//! records. The aggregate is stored and replaced as one unit; the core user
//! struct is defined as follows:
//!
//! | Field            | Type           | Description                                        |
//! | ---------------- | -------------- | -------------------------------------------------- |
//! | `subject`        | `SubjectId`    | Stable external identity, primary key.             |
//! | `email`          | `String`       | Provider-sourced email.                            |
//! | `display_name`   | `String`       | Provider-sourced display name.                     |
//! | `avatar_url`     | `String`       | Provider-sourced avatar URL.                       |
//! | `nickname`       | `String`       | User-chosen nickname.                              |
//! | `monthly_budget` | `u64`          | Non-negative monthly budget, defaults to 0.        |
//! | `children`       | `Vec<Child>`   | Ordered child records, unique by name.             |
//! | `version`        | `u64`          | Write counter used for optimistic concurrency.     |
//! | `created_at`     | `DateTime`     | The timestamp when the user was created.           |
//! | `updated_at`     | `DateTime`     | The timestamp when the user was last updated.      |

use crate::{Error, error::ValidationError, validation::validate_email};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a subject: the user id assigned by the
/// external identity provider.
/// This value should be treated as opaque; it never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: &str) -> Self {
        SubjectId(id.to_string())
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SubjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// A dependent child record. Exists only inside a [`User`]; unique by `name`
/// within its parent (exact, case-sensitive match).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub name: String,
    pub gender: Gender,
    pub birthdate: NaiveDate,
}

/// Patch for a child record. `name` is the lookup key and is not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChildPatch {
    pub gender: Option<Gender>,
    pub birthdate: Option<NaiveDate>,
}

impl Child {
    /// Merge the provided fields into this record; unset fields are retained.
    pub fn apply(&mut self, patch: ChildPatch) {
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(birthdate) = patch.birthdate {
            self.birthdate = birthdate;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable external identity, primary key. Never changes post-creation.
    pub subject: SubjectId,

    pub email: String,

    pub display_name: String,

    pub avatar_url: String,

    pub nickname: String,

    pub monthly_budget: u64,

    /// Ordered child records, unique by name.
    #[serde(default)]
    pub children: Vec<Child>,

    /// Incremented on every persisted write; writes are conditioned on the
    /// version observed at read time.
    pub version: u64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn builder() -> UserBuilder {
        UserBuilder::default()
    }

    pub fn child(&self, name: &str) -> Option<&Child> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Merge a profile patch. Only the enumerated fields are reachable;
    /// `subject`, `children` and `version` cannot be overwritten this way.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(display_name) = patch.display_name {
            self.display_name = display_name;
        }
        if let Some(avatar_url) = patch.avatar_url {
            self.avatar_url = avatar_url;
        }
        if let Some(nickname) = patch.nickname {
            self.nickname = nickname;
        }
        if let Some(monthly_budget) = patch.monthly_budget {
            self.monthly_budget = monthly_budget;
        }
    }
}

/// Closed set of patchable profile fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub nickname: Option<String>,
    pub monthly_budget: Option<u64>,
}

#[derive(Default)]
pub struct UserBuilder {
    subject: Option<SubjectId>,
    email: Option<String>,
    display_name: Option<String>,
    avatar_url: Option<String>,
    nickname: Option<String>,
    monthly_budget: Option<u64>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl UserBuilder {
    pub fn subject(mut self, subject: SubjectId) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn display_name(mut self, display_name: String) -> Self {
        self.display_name = Some(display_name);
        self
    }

    pub fn avatar_url(mut self, avatar_url: String) -> Self {
        self.avatar_url = Some(avatar_url);
        self
    }

    pub fn nickname(mut self, nickname: Option<String>) -> Self {
        self.nickname = nickname;
        self
    }

    pub fn monthly_budget(mut self, monthly_budget: Option<u64>) -> Self {
        self.monthly_budget = monthly_budget;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    pub fn build(self) -> Result<User, Error> {
        let now = Utc::now();
        let subject = self.subject.ok_or(ValidationError::MissingField(
            "Subject is required".to_string(),
        ))?;
        let display_name = self.display_name.unwrap_or_default();
        Ok(User {
            subject,
            email: self.email.ok_or(ValidationError::MissingField(
                "Email is required".to_string(),
            ))?,
            avatar_url: self.avatar_url.unwrap_or_default(),
            // New accounts fall back to the provider display name.
            nickname: self.nickname.unwrap_or_else(|| display_name.clone()),
            display_name,
            monthly_budget: self.monthly_budget.unwrap_or(0),
            children: Vec::new(),
            version: 0,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
        })
    }
}

/// Identity assertion produced by the upstream OAuth collaborator.
///
/// The core trusts this value completely; signature verification of the
/// provider response is the upstream layer's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub subject: SubjectId,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl VerifiedIdentity {
    pub fn validate(&self) -> Result<(), Error> {
        if self.subject.is_empty() {
            return Err(ValidationError::MissingField(
                "Subject is required".to_string(),
            )
            .into());
        }
        validate_email(&self.email)?;
        Ok(())
    }
}

/// Caller-supplied profile fields collected at registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationInfo {
    pub nickname: Option<String>,
    pub monthly_budget: Option<u64>,
}
