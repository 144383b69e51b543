use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

// ============================================================================
// Enumerations (serialized as their numeric vault codes)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CipherType {
    #[default]
    Login = 1,
    SecureNote = 2,
    Card = 3,
    Identity = 4,
}

impl From<CipherType> for u8 {
    fn from(value: CipherType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for CipherType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CipherType::Login),
            2 => Ok(CipherType::SecureNote),
            3 => Ok(CipherType::Card),
            4 => Ok(CipherType::Identity),
            other => Err(format!("unknown cipher type {}", other)),
        }
    }
}

/// How strictly a stored URI must match a page URL for the cipher to be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum UriMatchType {
    Domain = 0,
    Host = 1,
    StartsWith = 2,
    Exact = 3,
    RegularExpression = 4,
    Never = 5,
}

impl From<UriMatchType> for u8 {
    fn from(value: UriMatchType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for UriMatchType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UriMatchType::Domain),
            1 => Ok(UriMatchType::Host),
            2 => Ok(UriMatchType::StartsWith),
            3 => Ok(UriMatchType::Exact),
            4 => Ok(UriMatchType::RegularExpression),
            5 => Ok(UriMatchType::Never),
            other => Err(format!("unknown uri match type {}", other)),
        }
    }
}

// ============================================================================
// Item templates (vault CLI JSON shape, camelCase)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUriTemplate {
    #[serde(rename = "match")]
    pub match_type: UriMatchType,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoginItemTemplate {
    pub uris: Vec<LoginUriTemplate>,
    pub username: String,
    pub password: String,
    pub totp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardItemTemplate {
    pub cardholder_name: String,
    pub brand: String,
    pub number: String,
    pub exp_month: String,
    pub exp_year: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityItemTemplate {
    pub title: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub ssn: String,
    pub username: String,
    pub passport_number: String,
    pub license_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderTemplate {
    pub name: String,
}

/// Custom field attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherFieldTemplate {
    /// Field selector name on the page, not the field's name in the vault
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTemplate {
    pub organization_id: Option<String>,
    pub collection_ids: Option<Vec<String>>,
    pub folder_id: Option<String>,
    #[serde(rename = "type")]
    pub cipher_type: CipherType,
    pub name: String,
    pub notes: String,
    pub favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<CipherFieldTemplate>>,
    pub login: Option<LoginItemTemplate>,
    /// Always null; secure notes are not seeded.
    pub secure_note: Option<()>,
    pub card: Option<CardItemTemplate>,
    pub identity: Option<IdentityItemTemplate>,
    pub reprompt: u8,
}

/// Type-specific payload of an item; exactly one per item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemPayload {
    Login(LoginItemTemplate),
    Card(CardItemTemplate),
    Identity(IdentityItemTemplate),
}

impl ItemTemplate {
    /// Build an item whose `type` always agrees with its payload.
    pub fn new(name: impl Into<String>, payload: ItemPayload) -> Self {
        let mut item = ItemTemplate {
            organization_id: None,
            collection_ids: None,
            folder_id: None,
            cipher_type: CipherType::Login,
            name: name.into(),
            notes: String::new(),
            favorite: false,
            fields: None,
            login: None,
            secure_note: None,
            card: None,
            identity: None,
            reprompt: 0,
        };
        match payload {
            ItemPayload::Login(login) => item.login = Some(login),
            ItemPayload::Card(card) => {
                item.cipher_type = CipherType::Card;
                item.card = Some(card);
            }
            ItemPayload::Identity(identity) => {
                item.cipher_type = CipherType::Identity;
                item.identity = Some(identity);
            }
        }
        item
    }

    pub fn in_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    /// Check the one-payload invariant and the reprompt range.
    pub fn validate(&self) -> Result<(), HarnessError> {
        let set = [
            self.login.is_some(),
            self.card.is_some(),
            self.identity.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count();

        if set != 1 {
            return Err(HarnessError::Configuration(format!(
                "item '{}' must carry exactly one of login/card/identity (found {})",
                self.name, set
            )));
        }

        let matches_type = match self.cipher_type {
            CipherType::Login => self.login.is_some(),
            CipherType::Card => self.card.is_some(),
            CipherType::Identity => self.identity.is_some(),
            CipherType::SecureNote => false,
        };
        if !matches_type {
            return Err(HarnessError::Configuration(format!(
                "item '{}' payload does not match type {:?}",
                self.name, self.cipher_type
            )));
        }

        if self.reprompt > 1 {
            return Err(HarnessError::Configuration(format!(
                "item '{}' reprompt must be 0 or 1",
                self.name
            )));
        }
        Ok(())
    }
}
