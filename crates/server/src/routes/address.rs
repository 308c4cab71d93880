//! Address endpoints.
//!
//! Admin endpoints (`/address/admin/*`) require the `address.add`
//! permission and operate on any record. Self-service endpoints only see
//! the caller's own addresses.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use addressbook_core::{Address, AddressId, AddressPatch, Page, UserId, text_or_number};

use super::fields::{Fields, RequestFields, Validated, is_blank, missing};
use crate::db::AddressFilter;
use crate::error::{AppError, Result};
use crate::middleware::{AddressAdmin, RequireAuth, RequirePermission};
use crate::services::Caller;
use crate::state::AppState;

/// `rows` when the request leaves it out: no limit.
const DEFAULT_ROWS: i64 = -1;

// =============================================================================
// Payloads
// =============================================================================

/// Editable address fields as they arrive on the wire.
///
/// Keys outside this set are ignored. Text fields also accept numbers.
#[derive(Debug, Default, Deserialize)]
pub struct AddressFields {
    pub id_user: Option<UserId>,
    #[serde(rename = "type", default, deserialize_with = "text_or_number")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub nr: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub zip: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub fiscal_code: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub vat_number: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub sdi: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub pec: Option<String>,
}

impl From<AddressFields> for AddressPatch {
    fn from(fields: AddressFields) -> Self {
        Self {
            id_user: fields.id_user,
            kind: fields.kind,
            name: fields.name,
            address: fields.address,
            nr: fields.nr,
            zip: fields.zip,
            city: fields.city,
            state: fields.state,
            country: fields.country,
            company_name: fields.company_name,
            fiscal_code: fields.fiscal_code,
            vat_number: fields.vat_number,
            sdi: fields.sdi,
            pec: fields.pec,
        }
    }
}

/// Blank optional IDs are treated as absent.
fn present(id: Option<AddressId>) -> Option<AddressId> {
    id.filter(|id| !is_blank(id.as_str()))
}

fn required_id(id: Option<AddressId>) -> Validated<AddressId> {
    present(id).ok_or_else(|| vec!["id"])
}

/// `POST /address/admin/add`
///
/// `address`, `nr` and `type` are required.
#[derive(Debug)]
pub struct AddRequest {
    pub fields: AddressFields,
}

impl RequestFields for AddRequest {
    type Raw = AddressFields;

    fn validate(fields: AddressFields) -> Validated<Self> {
        let missing = missing(&[
            ("address", fields.address.as_deref()),
            ("nr", fields.nr.as_deref()),
            ("type", fields.kind.as_deref()),
        ]);
        if missing.is_empty() {
            Ok(Self { fields })
        } else {
            Err(missing)
        }
    }
}

/// Raw `PATCH /address/admin/update` payload.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub id: Option<AddressId>,
    #[serde(flatten)]
    pub fields: AddressFields,
}

/// `PATCH /address/admin/update`
#[derive(Debug)]
pub struct UpdateRequest {
    pub id: AddressId,
    pub fields: AddressFields,
}

impl RequestFields for UpdateRequest {
    type Raw = UpdateForm;

    fn validate(raw: UpdateForm) -> Validated<Self> {
        Ok(Self {
            id: required_id(raw.id)?,
            fields: raw.fields,
        })
    }
}

/// Raw `PATCH /address/admin/fields` payload.
///
/// `data` only accepts known editable fields; anything else is a bad
/// request.
#[derive(Debug, Deserialize)]
pub struct FieldsForm {
    pub id: Option<AddressId>,
    pub data: Option<AddressPatch>,
}

/// `PATCH /address/admin/fields`
#[derive(Debug)]
pub struct FieldsRequest {
    pub id: AddressId,
    pub data: AddressPatch,
}

impl RequestFields for FieldsRequest {
    type Raw = FieldsForm;

    fn validate(raw: FieldsForm) -> Validated<Self> {
        match (present(raw.id), raw.data) {
            (Some(id), Some(data)) => Ok(Self { id, data }),
            (id, data) => {
                let mut names = Vec::new();
                if id.is_none() {
                    names.push("id");
                }
                if data.is_none() {
                    names.push("data");
                }
                Err(names)
            }
        }
    }
}

/// `GET /address/admin/list`
#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub id_user: Option<UserId>,
    pub rows: Option<i64>,
    pub skip: Option<i64>,
}

impl RequestFields for AdminListQuery {
    type Raw = Self;

    fn validate(raw: Self) -> Validated<Self> {
        Ok(raw)
    }
}

/// Raw `DELETE /address/admin/del` payload.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub id: Option<AddressId>,
}

/// `DELETE /address/admin/del`
#[derive(Debug)]
pub struct DeleteRequest {
    pub id: AddressId,
}

impl RequestFields for DeleteRequest {
    type Raw = DeleteForm;

    fn validate(raw: DeleteForm) -> Validated<Self> {
        Ok(Self {
            id: required_id(raw.id)?,
        })
    }
}

/// `GET /address/details`
#[derive(Debug, Deserialize)]
pub struct DetailsQuery {
    pub id: Option<AddressId>,
}

impl RequestFields for DetailsQuery {
    type Raw = Self;

    fn validate(raw: Self) -> Validated<Self> {
        Ok(raw)
    }
}

/// `GET /address/list`
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub rows: Option<i64>,
    pub skip: Option<i64>,
}

impl RequestFields for ListQuery {
    type Raw = Self;

    fn validate(raw: Self) -> Validated<Self> {
        Ok(raw)
    }
}

fn page(rows: Option<i64>, skip: Option<i64>) -> Result<Page> {
    Page::from_rows_skip(rows.unwrap_or(DEFAULT_ROWS), skip.unwrap_or(0))
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

// =============================================================================
// Responses
// =============================================================================

/// `{ "ok": true, "addr": ... }`
#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub ok: bool,
    pub addr: Address,
}

impl AddressResponse {
    fn new(addr: Address) -> Json<Self> {
        Json(Self { ok: true, addr })
    }
}

/// `{ "ok": true, "addrs": [...] }`
#[derive(Debug, Serialize)]
pub struct AddressListResponse {
    pub ok: bool,
    pub addrs: Vec<Address>,
}

impl AddressListResponse {
    fn new(addrs: Vec<Address>) -> Json<Self> {
        Json(Self { ok: true, addrs })
    }
}

/// `{ "ok": true, "id": ... }`
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub ok: bool,
    pub id: AddressId,
}

// =============================================================================
// Admin handlers
// =============================================================================

/// Create an address. The caller's domain is assigned to it.
///
/// POST /address/admin/add
pub async fn admin_add(
    State(state): State<AppState>,
    RequirePermission(user, _): RequirePermission<AddressAdmin>,
    Fields(req): Fields<AddRequest>,
) -> Result<Json<AddressResponse>> {
    let caller = Caller::from(&user);
    let addr = state.addresses().add(&caller, req.fields.into()).await?;
    Ok(AddressResponse::new(addr))
}

/// Merge the supplied fields into an existing address.
///
/// PATCH /address/admin/update
pub async fn admin_update(
    State(state): State<AppState>,
    RequirePermission(user, _): RequirePermission<AddressAdmin>,
    Fields(req): Fields<UpdateRequest>,
) -> Result<Json<AddressResponse>> {
    let addr = state
        .addresses()
        .update(&Caller::from(&user), &req.id, req.fields.into())
        .await?;
    Ok(AddressResponse::new(addr))
}

/// Merge a validated field map into an existing address.
///
/// PATCH /address/admin/fields
pub async fn admin_fields(
    State(state): State<AppState>,
    RequirePermission(user, _): RequirePermission<AddressAdmin>,
    Fields(req): Fields<FieldsRequest>,
) -> Result<Json<AddressResponse>> {
    let addr = state
        .addresses()
        .update(&Caller::from(&user), &req.id, req.data)
        .await?;
    Ok(AddressResponse::new(addr))
}

/// List every address, optionally for one user.
///
/// GET /address/admin/list
pub async fn admin_list(
    State(state): State<AppState>,
    RequirePermission(_user, _): RequirePermission<AddressAdmin>,
    Fields(query): Fields<AdminListQuery>,
) -> Result<Json<AddressListResponse>> {
    let page = page(query.rows, query.skip)?;
    let filter = AddressFilter {
        id_user: query.id_user.filter(|u| !is_blank(u.as_str())),
        ..AddressFilter::default()
    };
    let addrs = state.addresses().list(&filter, page).await?;
    Ok(AddressListResponse::new(addrs))
}

/// Delete an address. Unknown IDs succeed.
///
/// DELETE /address/admin/del
pub async fn admin_delete(
    State(state): State<AppState>,
    RequirePermission(_user, _): RequirePermission<AddressAdmin>,
    Fields(req): Fields<DeleteRequest>,
) -> Result<Json<DeletedResponse>> {
    let id = state.addresses().delete(&req.id).await?;
    Ok(Json(DeletedResponse { ok: true, id }))
}

// =============================================================================
// Self-service handlers
// =============================================================================

/// One of the caller's addresses: `id` if given, else their first one.
///
/// GET /address/details
pub async fn details(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Fields(query): Fields<DetailsQuery>,
) -> Result<Json<AddressResponse>> {
    let id = present(query.id);
    let addr = state
        .addresses()
        .details(&Caller::from(&user), id.as_ref())
        .await?;
    Ok(AddressResponse::new(addr))
}

/// The caller's own addresses.
///
/// GET /address/list
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Fields(query): Fields<ListQuery>,
) -> Result<Json<AddressListResponse>> {
    let page = page(query.rows, query.skip)?;
    let addrs = state
        .addresses()
        .list_own(&Caller::from(&user), page)
        .await?;
    Ok(AddressListResponse::new(addrs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn validate<T: RequestFields>(value: serde_json::Value) -> Validated<T> {
        T::validate(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_add_request_reports_every_missing_field() {
        let err = validate::<AddRequest>(json!({ "name": "Home" })).unwrap_err();
        assert_eq!(err, vec!["address", "nr", "type"]);

        let err = validate::<AddRequest>(json!({ "address": "Via Roma", "nr": " ", "type": "personal" }))
            .unwrap_err();
        assert_eq!(err, vec!["nr"]);
    }

    #[test]
    fn test_add_request_ignores_unknown_keys() {
        let req = validate::<AddRequest>(json!({
            "address": "Via Roma",
            "nr": "1",
            "type": "invoice",
            "sdi": "ABC1234",
            "visible": true
        }))
        .unwrap();

        let patch = AddressPatch::from(req.fields);
        assert_eq!(patch.sdi.as_deref(), Some("ABC1234"));
        assert_eq!(patch.kind.as_deref(), Some("invoice"));
    }

    #[test]
    fn test_add_request_accepts_numeric_street_number() {
        let req = validate::<AddRequest>(json!({
            "address": "Via Roma",
            "nr": 12,
            "zip": 20121,
            "type": "personal"
        }))
        .unwrap();
        assert_eq!(req.fields.nr.as_deref(), Some("12"));
        assert_eq!(req.fields.zip.as_deref(), Some("20121"));
    }

    #[test]
    fn test_update_request_requires_non_blank_id() {
        assert_eq!(
            validate::<UpdateRequest>(json!({ "id": "  ", "city": "Rome" })).unwrap_err(),
            vec!["id"]
        );

        let req = validate::<UpdateRequest>(json!({ "id": "addr-1", "city": "Rome" })).unwrap();
        assert_eq!(req.id, AddressId::new("addr-1"));
        assert_eq!(req.fields.city.as_deref(), Some("Rome"));
    }

    #[test]
    fn test_fields_request_rejects_unknown_data_keys() {
        assert!(
            serde_json::from_value::<FieldsForm>(json!({ "id": "addr-1", "data": { "colour": "red" } }))
                .is_err()
        );

        assert_eq!(
            validate::<FieldsRequest>(json!({ "id": "addr-1" })).unwrap_err(),
            vec!["data"]
        );
        assert_eq!(
            validate::<FieldsRequest>(json!({})).unwrap_err(),
            vec!["id", "data"]
        );
    }

    #[test]
    fn test_delete_request_requires_id() {
        assert_eq!(validate::<DeleteRequest>(json!({})).unwrap_err(), vec!["id"]);
        assert_eq!(
            validate::<DeleteRequest>(json!({ "id": "addr-1" })).unwrap().id,
            AddressId::new("addr-1")
        );
    }

    #[test]
    fn test_page_defaults_to_everything() {
        assert_eq!(page(None, None).unwrap(), Page::ALL);
        assert!(matches!(page(Some(5), Some(-1)), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_present_drops_blank_ids() {
        assert_eq!(present(Some(AddressId::new(" "))), None);
        assert_eq!(
            present(Some(AddressId::new("addr-1"))),
            Some(AddressId::new("addr-1"))
        );
    }
}
