//! Domain entities for the Messaging domain
//!
//! Messages are stored rows with denormalized sender/receiver/property summaries
//! attached at read time. Conversations are never stored; they are derived from
//! the message list by the aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campusnest_common::{Error, Result};

/// Placeholder used in place of a property id for general inquiries
pub const NO_PROPERTY_KEY: &str = "no-property";

/// Separator between the property part and the counterpart part of a key
pub const KEY_SEPARATOR: char = '_';

/// Maximum message content length in characters
const MAX_CONTENT_LENGTH: usize = 5000;

/// Maximum phone number length
const MAX_PHONE_LENGTH: usize = 32;

/// Public profile of a marketplace user (`profiles` row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: String,
    pub profile_image_url: Option<String>,
}

impl UserSummary {
    /// Full name, else the local part of the email, else "Unknown User"
    pub fn display_name(&self) -> String {
        if let Some(name) = self.full_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        match self.email.split('@').next() {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => "Unknown User".to_string(),
        }
    }

    /// Single uppercase letter shown when there is no avatar
    pub fn initial(&self) -> char {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// Listing summary joined onto messages (`properties` row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub property_images: Vec<String>,
}

impl PropertySummary {
    pub fn thumbnail(&self) -> Option<&str> {
        self.property_images.first().map(String::as_str)
    }
}

/// Message entity. Immutable once created except for `read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub property_id: Option<Uuid>,
    pub read: bool,
    pub phone_number: Option<String>,
    pub property: Option<PropertySummary>,
    pub sender: Option<UserSummary>,
    pub receiver: Option<UserSummary>,
}

impl Message {
    /// Whether the viewing user sent this message
    pub fn is_outgoing(&self, viewer_id: Uuid) -> bool {
        self.sender_id == viewer_id
    }

    /// The other participant relative to the viewer, if its summary was resolved
    pub fn counterpart(&self, viewer_id: Uuid) -> Option<&UserSummary> {
        if self.is_outgoing(viewer_id) {
            self.receiver.as_ref()
        } else {
            self.sender.as_ref()
        }
    }

    /// Unread and addressed to the viewer
    pub fn is_unread_for(&self, viewer_id: Uuid) -> bool {
        !self.read && self.receiver_id == viewer_id
    }
}

/// Validated insert payload for the message store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub property_id: Option<Uuid>,
    pub content: String,
    pub phone_number: Option<String>,
}

impl NewMessage {
    /// Create a new outbound message. Content is trimmed; a blank phone number is dropped.
    pub fn new(
        sender_id: Uuid,
        receiver_id: Uuid,
        property_id: Option<Uuid>,
        content: &str,
        phone_number: Option<&str>,
    ) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation(
                "Message content cannot be empty or whitespace-only".to_string(),
            ));
        }
        if content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(Error::Validation(format!(
                "Message content must be at most {} characters",
                MAX_CONTENT_LENGTH
            )));
        }

        let phone_number = phone_number
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        if let Some(ref phone) = phone_number {
            if phone.chars().count() > MAX_PHONE_LENGTH {
                return Err(Error::Validation(format!(
                    "Phone number must be at most {} characters",
                    MAX_PHONE_LENGTH
                )));
            }
        }

        if sender_id == receiver_id {
            return Err(Error::Validation(
                "Cannot send a message to yourself".to_string(),
            ));
        }

        Ok(NewMessage {
            sender_id,
            receiver_id,
            property_id,
            content: content.to_string(),
            phone_number,
        })
    }
}

/// Derived conversation identity: `${propertyIdOrSentinel}_${counterpartUserId}`.
///
/// Stable within a session so that UI selection survives a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationKey {
    property_id: Option<Uuid>,
    counterpart_id: Uuid,
}

impl ConversationKey {
    pub fn new(property_id: Option<Uuid>, counterpart_id: Uuid) -> Self {
        Self {
            property_id,
            counterpart_id,
        }
    }

    pub fn property_id(&self) -> Option<Uuid> {
        self.property_id
    }

    pub fn counterpart_id(&self) -> Uuid {
        self.counterpart_id
    }

    /// Parse the string form back into its parts
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid conversation key: {}", raw));

        let (property, counterpart) = raw.split_once(KEY_SEPARATOR).ok_or_else(invalid)?;
        let property_id = if property == NO_PROPERTY_KEY {
            None
        } else {
            Some(Uuid::parse_str(property).map_err(|_| invalid())?)
        };
        let counterpart_id = Uuid::parse_str(counterpart).map_err(|_| invalid())?;

        Ok(Self::new(property_id, counterpart_id))
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.property_id {
            Some(id) => write!(f, "{}{}{}", id, KEY_SEPARATOR, self.counterpart_id),
            None => write!(f, "{}{}{}", NO_PROPERTY_KEY, KEY_SEPARATOR, self.counterpart_id),
        }
    }
}

impl std::str::FromStr for ConversationKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ConversationKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ConversationKey> for String {
    fn from(key: ConversationKey) -> Self {
        key.to_string()
    }
}

/// Conversation (derived, never persisted)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    #[serde(rename = "id")]
    pub key: ConversationKey,
    pub property: Option<PropertySummary>,
    pub counterpart: UserSummary,
    /// Ascending by creation time
    pub messages: Vec<Message>,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: usize,
}

impl Conversation {
    /// Most recent message, used as the list preview
    pub fn latest_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Property title, or "General Inquiry" without a listing
    pub fn title(&self) -> &str {
        self.property
            .as_ref()
            .map(|p| p.title.as_str())
            .unwrap_or("General Inquiry")
    }

    #[mutants::skip] // Delegates to Vec::len
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}
