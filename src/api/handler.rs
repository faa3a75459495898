//! API handler for vitalsdb
//!
//! Runs every request against the record service behind one mutex, so
//! each read/merge/write sequence completes before the next starts.

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::record::Record;
use crate::store::RecordStore;

use super::errors::ApiResult;
use super::request::{CreateRequest, Request, SortRequest, UpdateRequest};
use super::response::Response;
use super::service::RecordService;

pub const SERVICE_NAME: &str = "vitalsdb";

/// API handler with global execution lock
pub struct ApiHandler<S: RecordStore> {
    service: Mutex<RecordService<S>>,
}

impl<S: RecordStore> ApiHandler<S> {
    pub fn new(service: RecordService<S>) -> Self {
        Self {
            service: Mutex::new(service),
        }
    }

    /// Handle a raw JSON request string
    pub fn handle(&self, json_request: &str) -> Response {
        // Requests never leave the service half-written, so a poisoned guard is usable
        let mut service = match self.service.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let request = match Request::parse(json_request) {
            Ok(r) => r,
            Err(e) => return Response::error(&e),
        };

        let result = match request {
            Request::Create(r) => Self::handle_create(&mut service, r).map(Response::created),
            Request::Get(id) => Self::handle_get(&service, &id).map(Response::ok),
            Request::List => Self::handle_list(&service).map(Response::ok),
            Request::Sort(r) => Self::handle_sort(&service, r).map(Response::ok),
            Request::Update(r) => Self::handle_update(&mut service, r).map(Response::ok),
            Request::Delete(id) => Self::handle_delete(&mut service, &id).map(Response::ok),
            Request::Status => Self::handle_status(&service).map(Response::ok),
        };

        match result {
            Ok(response) => response,
            Err(e) => Response::error(&e),
        }
    }

    /// Consumes the handler, returning the service.
    pub fn into_service(self) -> RecordService<S> {
        match self.service.into_inner() {
            Ok(service) => service,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn handle_create(service: &mut RecordService<S>, req: CreateRequest) -> ApiResult<Value> {
        let record = service.create(&req.id, &req.record)?;
        Ok(Value::Object(record.to_flat()))
    }

    fn handle_get(service: &RecordService<S>, id: &str) -> ApiResult<Value> {
        Ok(Value::Object(service.get(id)?.to_flat()))
    }

    fn handle_list(service: &RecordService<S>) -> ApiResult<Value> {
        Ok(to_array(&service.list()?))
    }

    fn handle_sort(service: &RecordService<S>, req: SortRequest) -> ApiResult<Value> {
        Ok(to_array(&service.sorted(req.by, req.order)?))
    }

    fn handle_update(service: &mut RecordService<S>, req: UpdateRequest) -> ApiResult<Value> {
        let record = service.update(&req.id, &req.changes)?;
        Ok(Value::Object(record.to_flat()))
    }

    fn handle_delete(service: &mut RecordService<S>, id: &str) -> ApiResult<Value> {
        service.delete(id)?;
        Ok(json!({ "id": id, "deleted": true }))
    }

    fn handle_status(service: &RecordService<S>) -> ApiResult<Value> {
        let count = service.count()?;
        Ok(json!({ "service": SERVICE_NAME, "records": count }))
    }
}

fn to_array(records: &[Record]) -> Value {
    Value::Array(
        records
            .iter()
            .map(|r| Value::Object(r.to_flat()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::errors::Status;
    use crate::record::RecordValidator;
    use crate::store::MemoryStore;

    fn handler() -> ApiHandler<MemoryStore> {
        ApiHandler::new(RecordService::new(
            MemoryStore::new(),
            RecordValidator::default(),
        ))
    }

    const CREATE_P001: &str = r#"{"op":"create","id":"P001","record":{"name":"asha","city":"delhi","age":30,"gender":"female","height":170,"weight":70}}"#;

    #[test]
    fn test_create_returns_created_with_derived_fields() {
        let h = handler();
        let resp = h.handle(CREATE_P001);
        assert_eq!(resp.status(), Status::Created);

        let value = resp.to_value();
        assert_eq!(value["data"]["id"], "P001");
        assert_eq!(value["data"]["name"], "ASHA");
        assert_eq!(value["data"]["bmi"], json!(24.22));
        assert_eq!(value["data"]["verdict"], "normal");
    }

    #[test]
    fn test_status_taxonomy() {
        let h = handler();
        assert_eq!(h.handle(CREATE_P001).status(), Status::Created);
        assert_eq!(h.handle(CREATE_P001).status(), Status::Conflict);
        assert_eq!(
            h.handle(r#"{"op":"get","id":"P001"}"#).status(),
            Status::Ok
        );
        assert_eq!(
            h.handle(r#"{"op":"get","id":"P404"}"#).status(),
            Status::NotFound
        );
        assert_eq!(
            h.handle(r#"{"op":"update","id":"P001","changes":{"age":-1}}"#)
                .status(),
            Status::ValidationFailed
        );
        assert_eq!(h.handle("{").status(), Status::InvalidRequest);
    }

    #[test]
    fn test_update_then_list_sorted() {
        let h = handler();
        h.handle(CREATE_P001);
        h.handle(r#"{"op":"create","id":"P002","record":{"name":"ravi","city":"pune","age":45,"gender":"male","height":160,"weight":50}}"#);

        let resp = h.handle(r#"{"op":"update","id":"P002","changes":{"weight":90}}"#);
        assert_eq!(resp.to_value()["data"]["verdict"], "obese");

        let value = h
            .handle(r#"{"op":"sort","by":"bmi","order":"desc"}"#)
            .to_value();
        assert_eq!(value["data"][0]["id"], "P002");
        assert_eq!(value["data"][1]["id"], "P001");

        let value = h.handle(r#"{"op":"list"}"#).to_value();
        assert_eq!(value["data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_and_status() {
        let h = handler();
        h.handle(CREATE_P001);
        let value = h.handle(r#"{"op":"status"}"#).to_value();
        assert_eq!(value["data"], json!({"service": "vitalsdb", "records": 1}));

        let resp = h.handle(r#"{"op":"delete","id":"P001"}"#);
        assert_eq!(resp.to_value()["data"], json!({"id": "P001", "deleted": true}));
        assert_eq!(
            h.handle(r#"{"op":"delete","id":"P001"}"#).status(),
            Status::NotFound
        );
        assert_eq!(h.into_service().count().unwrap(), 0);
    }

    #[test]
    fn test_every_violation_reported() {
        let h = handler();
        let resp = h.handle(
            r#"{"op":"create","id":"P003","record":{"name":"","city":"x","age":130,"gender":"robot","height":170,"weight":0}}"#,
        );
        let value = resp.to_value();
        assert_eq!(value["status"], "validation_failed");
        let fields: Vec<&str> = value["violations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["field"].as_str().unwrap())
            .collect();
        for field in ["name", "age", "gender", "weight"] {
            assert!(fields.contains(&field), "missing {}", field);
        }
    }
}
