//! Address record and partial updates.
//!
//! An [`Address`] is a flat record of optional postal and invoicing fields
//! owned by a domain and, optionally, a user. Updates are expressed as an
//! [`AddressPatch`] and applied with [`Address::merge`], which overwrites
//! only the fields the patch actually carries.

use serde::{Deserialize, Deserializer, Serialize};

use super::id::{AddressId, DomainCode, UserId};

/// Every field persisted for an address, in storage column order.
///
/// Writes are restricted to this set; anything else in a payload is
/// never stored.
pub const ADDRESS_FIELDS: [&str; 16] = [
    "id",
    "domain",
    "id_user",
    "type",
    "name",
    "address",
    "nr",
    "zip",
    "city",
    "state",
    "country",
    "company_name",
    "fiscal_code",
    "vat_number",
    "sdi",
    "pec",
];

/// Fields carrying a secondary (non-unique) index in the collection.
///
/// `id` is indexed separately with a unique index.
pub const INDEXED_FIELDS: [&str; 7] = ["domain", "id_user", "type", "zip", "city", "state", "country"];

/// A stored address.
///
/// `type` is one of `personal`, `company` or `invoice` by convention but is
/// kept as a free string. Invoicing fields (`company_name` through `pec`)
/// are expected only on `invoice` addresses; nothing enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Unique, immutable address ID.
    pub id: AddressId,
    /// Domain the address belongs to, fixed at creation.
    pub domain: DomainCode,
    /// Owning user, if the address is user-level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_user: Option<UserId>,
    /// Address classification (`personal`, `company`, `invoice`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Street number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State or province.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_number: Option<String>,
    /// SDI recipient code for electronic invoicing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdi: Option<String>,
    /// Certified e-mail (PEC) for invoicing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pec: Option<String>,
}

impl Address {
    /// Create a record with only its identity fields set.
    ///
    /// This is the base a brand-new address is merged onto; it is not
    /// persisted until written through the collection.
    #[must_use]
    pub const fn blank(id: AddressId, domain: DomainCode, id_user: Option<UserId>) -> Self {
        Self {
            id,
            domain,
            id_user,
            kind: None,
            name: None,
            address: None,
            nr: None,
            zip: None,
            city: None,
            state: None,
            country: None,
            company_name: None,
            fiscal_code: None,
            vat_number: None,
            sdi: None,
            pec: None,
        }
    }

    /// Shallow-merge a patch into this record.
    ///
    /// Every field the patch carries replaces the current value; fields the
    /// patch leaves out are kept. `id` and `domain` are never touched.
    pub fn merge(&mut self, patch: AddressPatch) {
        let AddressPatch {
            id_user,
            kind,
            name,
            address,
            nr,
            zip,
            city,
            state,
            country,
            company_name,
            fiscal_code,
            vat_number,
            sdi,
            pec,
        } = patch;

        overlay(&mut self.id_user, id_user);
        overlay(&mut self.kind, kind);
        overlay(&mut self.name, name);
        overlay(&mut self.address, address);
        overlay(&mut self.nr, nr);
        overlay(&mut self.zip, zip);
        overlay(&mut self.city, city);
        overlay(&mut self.state, state);
        overlay(&mut self.country, country);
        overlay(&mut self.company_name, company_name);
        overlay(&mut self.fiscal_code, fiscal_code);
        overlay(&mut self.vat_number, vat_number);
        overlay(&mut self.sdi, sdi);
        overlay(&mut self.pec, pec);
    }

    /// Return this record with `patch` merged in.
    #[must_use]
    pub fn merged(mut self, patch: AddressPatch) -> Self {
        self.merge(patch);
        self
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// A partial update to an [`Address`].
///
/// Only the editable fields are present: `id` and `domain` cannot be
/// changed through a patch. Unknown keys are rejected when deserializing,
/// so a patch can never smuggle arbitrary data into the collection.
/// A `null` value is treated the same as an absent key, and numbers are
/// accepted for text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_user: Option<UserId>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub nr: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub zip: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub city: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub state: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub country: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub company_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub fiscal_code: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub vat_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdi: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub pec: Option<String>,
}

impl AddressPatch {
    /// Whether the patch would leave any record unchanged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Numeric JSON value accepted where text is expected.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Int(i64),
    Uint(u64),
    Float(f64),
}

/// Deserialize an optional text field that may arrive as a number.
///
/// Clients commonly send street numbers and postal codes as JSON numbers;
/// they are stored in their decimal form.
///
/// # Errors
///
/// Fails for values that are neither text, a number, nor `null`.
pub fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<TextOrNumber> = Option::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Int(n) => n.to_string(),
        TextOrNumber::Uint(n) => n.to_string(),
        TextOrNumber::Float(n) => n.to_string(),
    }))
}
