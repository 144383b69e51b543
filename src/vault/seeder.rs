use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::spec::spec_model::{FieldKey, PageTest};
use crate::vault::templates::{
    CardItemTemplate, CipherFieldTemplate, CipherType, FolderTemplate, IdentityItemTemplate,
    ItemPayload, ItemTemplate, LoginItemTemplate, LoginUriTemplate, UriMatchType,
};

/// The cipher a page needs in the vault for autofill to have a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCipher {
    pub cipher_type: CipherType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_match_type: Option<UriMatchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totp_secret: Option<String>,
    #[serde(default)]
    pub fields: IndexMap<FieldKey, CipherFieldTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_login_urls: Vec<String>,
}

impl PageCipher {
    /// Derive the stored cipher from a descriptor. Fields the extension must
    /// never fill (honeypots, search boxes) are not stored.
    pub fn from_page(page: &PageTest) -> Self {
        let fields = page
            .inputs
            .iter()
            .filter(|(_, props)| !props.should_not_autofill)
            .map(|(key, props)| {
                let field = CipherFieldTemplate {
                    name: None,
                    value: props.expected_value().to_string(),
                    field_type: None,
                };
                (*key, field)
            })
            .collect();

        Self {
            cipher_type: page.cipher_type,
            url: page.url.clone(),
            uri_match_type: page.uri_match_type,
            totp_secret: None,
            fields,
            additional_login_urls: Vec::new(),
        }
    }

    fn value(&self, key: FieldKey) -> String {
        self.fields
            .get(&key)
            .map(|f| f.value.clone())
            .unwrap_or_default()
    }

    fn optional(&self, key: FieldKey) -> Option<String> {
        self.fields.get(&key).map(|f| f.value.clone())
    }
}

impl ItemTemplate {
    /// Build the vault item for `cipher`, named after its URL.
    pub fn from_page_cipher(cipher: &PageCipher) -> HarnessResult<Self> {
        let payload = match cipher.cipher_type {
            CipherType::Login => {
                let match_type = cipher.uri_match_type.unwrap_or(UriMatchType::StartsWith);
                let uris = std::iter::once(&cipher.url)
                    .chain(cipher.additional_login_urls.iter())
                    .map(|uri| LoginUriTemplate {
                        match_type,
                        uri: uri.clone(),
                    })
                    .collect();
                let username = cipher
                    .optional(FieldKey::Username)
                    .or_else(|| cipher.optional(FieldKey::Email))
                    .unwrap_or_default();
                ItemPayload::Login(LoginItemTemplate {
                    uris,
                    username,
                    password: cipher.value(FieldKey::Password),
                    totp: cipher
                        .totp_secret
                        .clone()
                        .unwrap_or_else(|| cipher.value(FieldKey::Totp)),
                })
            }
            CipherType::Card => ItemPayload::Card(CardItemTemplate {
                cardholder_name: cipher.value(FieldKey::CardholderName),
                brand: cipher.value(FieldKey::Brand),
                number: cipher.value(FieldKey::Number),
                exp_month: cipher.value(FieldKey::ExpMonth),
                exp_year: cipher.value(FieldKey::ExpYear),
                code: cipher.value(FieldKey::Code),
            }),
            CipherType::Identity => ItemPayload::Identity(IdentityItemTemplate {
                title: cipher.value(FieldKey::Title),
                first_name: cipher.value(FieldKey::FirstName),
                middle_name: cipher.value(FieldKey::MiddleName),
                last_name: cipher.value(FieldKey::LastName),
                address1: cipher.value(FieldKey::Address1),
                address2: cipher.optional(FieldKey::Address2),
                address3: cipher.optional(FieldKey::Address3),
                city: cipher.value(FieldKey::City),
                state: cipher.value(FieldKey::State),
                postal_code: cipher.value(FieldKey::PostalCode),
                country: cipher.value(FieldKey::Country),
                company: cipher.value(FieldKey::Company),
                email: cipher.value(FieldKey::Email),
                phone: cipher.value(FieldKey::Phone),
                ssn: cipher.value(FieldKey::Ssn),
                username: cipher.value(FieldKey::Username),
                passport_number: cipher.value(FieldKey::PassportNumber),
                license_number: cipher.value(FieldKey::LicenseNumber),
            }),
            CipherType::SecureNote => {
                return Err(HarnessError::UnsupportedPage {
                    url: cipher.url.clone(),
                    reason: "secure notes are not seeded".into(),
                });
            }
        };

        let item = ItemTemplate::new(cipher.url.clone(), payload);
        item.validate()?;
        Ok(item)
    }
}

/// Folder plus items to import before a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPlan {
    pub folder: FolderTemplate,
    pub items: Vec<ItemTemplate>,
}

/// One item per distinct page URL that has something to store.
pub fn build_seed_plan(pages: &[PageTest], folder_name: &str) -> HarnessResult<SeedPlan> {
    let mut items: Vec<ItemTemplate> = Vec::new();
    for page in pages {
        let cipher = PageCipher::from_page(page);
        if cipher.fields.is_empty() {
            debug!(url = %page.url, "nothing to store, not seeding");
            continue;
        }
        if items.iter().any(|item| item.name == cipher.url) {
            continue;
        }
        items.push(ItemTemplate::from_page_cipher(&cipher)?);
    }

    Ok(SeedPlan {
        folder: FolderTemplate {
            name: folder_name.to_string(),
        },
        items,
    })
}
