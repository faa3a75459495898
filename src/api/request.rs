//! API request types
//!
//! One JSON object per request, dispatched on `op`.

use serde::Deserialize;
use serde_json::Value;

use crate::merge::PartialUpdate;
use crate::record::{json_type_name, FlatRecord};

use super::errors::{ApiError, ApiResult};
use super::service::{SortKey, SortOrder};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub id: String,
    pub record: FlatRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub id: String,
    pub changes: PartialUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortRequest {
    pub by: SortKey,
    pub order: SortOrder,
}

/// Unified request envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Create(CreateRequest),
    Get(String),
    List,
    Sort(SortRequest),
    Update(UpdateRequest),
    Delete(String),
    Status,
}

/// Raw request for parsing
#[derive(Debug, Deserialize)]
struct RawRequest {
    op: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    record: Option<Value>,
    #[serde(default)]
    changes: Option<Value>,
    #[serde(default)]
    by: Option<String>,
    #[serde(default)]
    order: Option<String>,
}

impl RawRequest {
    fn id(&mut self) -> ApiResult<String> {
        self.id
            .take()
            .ok_or_else(|| ApiError::invalid_request("Missing id"))
    }
}

impl Request {
    /// Parse a request from a JSON string
    pub fn parse(json: &str) -> ApiResult<Self> {
        let mut raw: RawRequest = serde_json::from_str(json)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON: {}", e)))?;

        match raw.op.as_str() {
            "create" => {
                let id = raw.id()?;
                let record = match raw.record {
                    Some(Value::Object(map)) => map,
                    Some(other) => {
                        return Err(ApiError::invalid_request(format!(
                            "record must be an object, got {}",
                            json_type_name(&other)
                        )))
                    }
                    None => return Err(ApiError::invalid_request("Missing record")),
                };
                Ok(Request::Create(CreateRequest { id, record }))
            }
            "get" => Ok(Request::Get(raw.id()?)),
            "list" => Ok(Request::List),
            "sort" => {
                let by = raw
                    .by
                    .as_deref()
                    .ok_or_else(|| ApiError::invalid_request("Missing by"))?;
                let by = SortKey::parse(by).ok_or_else(|| {
                    ApiError::invalid_request(format!(
                        "Cannot sort by '{}', expected height, weight or bmi",
                        by
                    ))
                })?;
                let order = match raw.order.as_deref() {
                    None => SortOrder::default(),
                    Some(o) => SortOrder::parse(o).ok_or_else(|| {
                        ApiError::invalid_request(format!(
                            "Unknown order '{}', expected asc or desc",
                            o
                        ))
                    })?,
                };
                Ok(Request::Sort(SortRequest { by, order }))
            }
            "update" => {
                let id = raw.id()?;
                let changes = raw
                    .changes
                    .as_ref()
                    .ok_or_else(|| ApiError::invalid_request("Missing changes"))?;
                let changes = PartialUpdate::from_json(changes)
                    .map_err(|v| ApiError::invalid_request(v.to_string()))?;
                Ok(Request::Update(UpdateRequest { id, changes }))
            }
            "delete" => Ok(Request::Delete(raw.id()?)),
            "status" => Ok(Request::Status),
            other => Err(ApiError::unknown_operation(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::errors::Status;
    use crate::merge::Patch;
    use serde_json::json;

    #[test]
    fn test_parse_create() {
        let req = Request::parse(r#"{"op":"create","id":"P001","record":{"age":30}}"#).unwrap();
        match req {
            Request::Create(c) => {
                assert_eq!(c.id, "P001");
                assert_eq!(c.record["age"], json!(30));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_null_clears() {
        let req =
            Request::parse(r#"{"op":"update","id":"P001","changes":{"email":null,"weight":90}}"#)
                .unwrap();
        match req {
            Request::Update(u) => {
                assert_eq!(u.changes.get("email"), Some(&Patch::Clear));
                assert_eq!(u.changes.get("weight"), Some(&Patch::Set(json!(90))));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_sort_defaults_to_ascending() {
        let req = Request::parse(r#"{"op":"sort","by":"bmi"}"#).unwrap();
        assert_eq!(
            req,
            Request::Sort(SortRequest {
                by: SortKey::Bmi,
                order: SortOrder::Asc
            })
        );
    }

    #[test]
    fn test_parse_sort_rejects_unknown_key_and_order() {
        for json in [
            r#"{"op":"sort","by":"age"}"#,
            r#"{"op":"sort","by":"height","order":"up"}"#,
            r#"{"op":"sort"}"#,
        ] {
            let err = Request::parse(json).unwrap_err();
            assert_eq!(err.status(), Status::InvalidRequest, "{}", json);
        }
    }

    #[test]
    fn test_parse_simple_ops() {
        assert_eq!(Request::parse(r#"{"op":"list"}"#).unwrap(), Request::List);
        assert_eq!(Request::parse(r#"{"op":"status"}"#).unwrap(), Request::Status);
        assert_eq!(
            Request::parse(r#"{"op":"delete","id":"P9"}"#).unwrap(),
            Request::Delete("P9".into())
        );
    }

    #[test]
    fn test_parse_errors() {
        let err = Request::parse("not json").unwrap_err();
        assert_eq!(err.code(), "VITALS_INVALID_REQUEST");

        let err = Request::parse(r#"{"op":"get"}"#).unwrap_err();
        assert!(err.message().contains("Missing id"));

        let err = Request::parse(r#"{"op":"create","id":"P1","record":[1]}"#).unwrap_err();
        assert!(err.message().contains("array"));

        let err = Request::parse(r#"{"op":"update","id":"P1","changes":5}"#).unwrap_err();
        assert_eq!(err.status(), Status::InvalidRequest);

        let err = Request::parse(r#"{"op":"upsert"}"#).unwrap_err();
        assert_eq!(err.code(), "VITALS_UNKNOWN_OPERATION");
    }
}
