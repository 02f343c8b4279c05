use beacon_store::protocol::*;
use beacon_store::record::RecordStore;
use beacon_store::{service, StateService};
use serde_json::json;

fn service() -> StateService {
    StateService::new(RecordStore::in_memory())
}

fn save(svc: &mut StateService, body: serde_json::Value) -> Response {
    svc.handle(&Request::save(body))
}

#[test]
fn test_save_stores_row() {
    let mut svc = service();
    let resp = save(&mut svc, json!({"layer": 0, "type": "weight", "data": [0.1, 0.2]}));
    assert_eq!(resp.status, STATUS_OK);
    assert_eq!(resp.message_text(), Some(MSG_SAVED));
    assert_eq!(svc.store().len(), 1);
}

#[test]
fn test_save_missing_field_is_invalid_input() {
    let mut svc = service();
    for body in [
        json!({"type": "weight", "data": [0.1]}),
        json!({"layer": 0, "data": [0.1]}),
        json!({"layer": 0, "type": "weight"}),
        json!({"layer": 0, "type": "weight", "data": null}),
        json!({"layer": "hidden", "type": "weight", "data": [0.1]}),
    ] {
        let resp = save(&mut svc, body);
        assert_eq!(resp.status, STATUS_BAD_REQUEST);
        assert_eq!(resp.message_text(), Some(MSG_INVALID_INPUT));
    }

    let no_body = Request {
        method: Method::Post,
        path: SAVE_PATH.to_string(),
        body: None,
    };
    assert_eq!(svc.handle(&no_body).status, STATUS_BAD_REQUEST);
    assert!(svc.store().is_empty());
}

#[test]
fn test_wrong_method_is_rejected() {
    let mut svc = service();
    let get_save = Request {
        method: Method::Get,
        path: SAVE_PATH.to_string(),
        body: None,
    };
    let post_load = Request {
        method: Method::Post,
        path: LOAD_PATH.to_string(),
        body: Some(json!({})),
    };
    for req in [get_save, post_load] {
        let resp = svc.handle(&req);
        assert_eq!(resp.status, STATUS_METHOD_NOT_ALLOWED);
        assert_eq!(resp.message_text(), Some(MSG_METHOD_NOT_ALLOWED));
    }
}

#[test]
fn test_unknown_path_is_not_found() {
    let mut svc = service();
    let req = Request {
        method: Method::Get,
        path: "/reset".to_string(),
        body: None,
    };
    let resp = svc.handle(&req);
    assert_eq!(resp.status, STATUS_NOT_FOUND);
    assert_eq!(resp.message_text(), Some(MSG_UNKNOWN_PATH));
}

#[test]
fn test_load_empty_store_is_not_found() {
    let mut svc = service();
    let resp = svc.handle(&Request::load());
    assert_eq!(resp.status, STATUS_NOT_FOUND);
    assert_eq!(resp.message_text(), Some(MSG_NO_STATE));
}

#[test]
fn test_load_groups_latest_rows() {
    let mut svc = service();
    save(&mut svc, json!({"layer": 0, "type": "weight", "data": [1.0]}));
    save(&mut svc, json!({"layer": 0, "type": "bias", "data": [0.5]}));
    save(&mut svc, json!({"layer": 1, "type": "weight", "data": [2.0]}));
    save(&mut svc, json!({"layer": 0, "type": "weight", "data": [3.0]}));
    save(&mut svc, json!({"layer": "metadata", "type": "epsilon", "data": 0.3}));
    save(&mut svc, json!({"layer": "metadata", "type": "exploredAreas", "data": [[1, 2]]}));

    let resp = svc.handle(&Request::load());
    assert!(resp.is_ok());
    let state: LoadResponse = serde_json::from_value(resp.body).unwrap();

    assert_eq!(state.weights["0"], json!([3.0]));
    assert_eq!(state.weights["1"], json!([2.0]));
    assert_eq!(state.biases["0"], json!([0.5]));
    assert!(!state.biases.contains_key("1"));
    assert_eq!(state.metadata["epsilon"], json!(0.3));
    assert_eq!(state.metadata["exploredAreas"], json!([[1, 2]]));
}

#[test]
fn test_load_ignores_unknown_row_types_on_layers() {
    let mut svc = service();
    save(&mut svc, json!({"layer": 0, "type": "gradient", "data": [1.0]}));
    let state: LoadResponse = serde_json::from_value(svc.handle(&Request::load()).body).unwrap();
    assert!(state.weights.is_empty());
    assert!(state.biases.is_empty());
    assert!(state.metadata.is_empty());
}

#[tokio::test]
async fn test_spawned_service_answers_calls() {
    let handle = service::spawn(service());
    let resp = handle
        .call(Request::save(json!({"layer": 0, "type": "bias", "data": [0.0]})))
        .await
        .unwrap();
    assert!(resp.is_ok());

    let clone = handle.clone();
    let loaded = clone.call(Request::load()).await.unwrap();
    assert_eq!(loaded.status, STATUS_OK);
    assert_eq!(loaded.body["biases"]["0"], json!([0.0]));
}
