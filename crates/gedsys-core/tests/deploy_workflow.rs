use gedsys_core::domain::record::ArtifactStatus;
use gedsys_core::store::fakes::MemoryStore;
use gedsys_core::{ArtifactKind, CepConfig, EventHandler, GedsysConfig, GeographicEvent};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_event(conditions: serde_json::Value) -> GeographicEvent {
    let definition = serde_json::json!({
        "name": "heat wave over santander",
        "update frequency": 5000,
        "properties": {
            "spatial": {
                "extent": ["POLYGON ((-4 42, -3.8 43.5, 1 44, 1 42.5, -4 42))"],
                "granularity": {"distance": 100, "units": "meters"},
                "topology": "within"
            },
            "temporal": {
                "type": "interval",
                "time": "2018-01-01T00:00:00Z/2018-12-31T00:00:00Z",
                "validity": "2018-12-31T10:00:00Z"
            },
            "attributive": {"conditions": conditions}
        }
    });
    GeographicEvent::from_value(&definition).expect("valid definition")
}

fn test_cep_config() -> CepConfig {
    let json = serde_json::json!({
        "geosmart.sys": {
            "cep": {
                "hostname": "cep.example.org",
                "port": 22,
                "username": "geosmartsys",
                "passphrase": "secret",
                "private key": "/keys/id_rsa",
                "root url": "http://cep.example.org:9763/endpoints",
                "home directory": "/cep",
                "stream subdir": "/streams",
                "receiver subdir": "/receivers",
                "plan subdir": "/plans",
                "publisher subdir": "/publishers",
                "http username": "admin",
                "http password": "ENCRYPTED"
            },
            "handler": {"logs": "/tmp/gedsys.log"}
        }
    });
    let config: GedsysConfig = serde_json::from_value(json).expect("parse config");
    config.system.cep
}

const TARGET: &str = "http://10.0.0.5:9090";

// ---------------------------------------------------------------------------
// Deploy walk
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deploy_uploads_artifacts_in_category_order() {
    let event = test_event(serde_json::json!({"c1": ["Temperature", ">", 20]}));
    let id = event.id().to_string();
    let mut handler = EventHandler::new(event, test_cep_config());
    let store = MemoryStore::new();

    let report = handler.deploy(TARGET, &store).await.expect("deploy");

    assert!(report.fully_succeeded());
    let expected = vec![
        format!("/cep/streams/stream-{id}-0.json"),
        format!("/cep/streams/stream-{id}-1.json"),
        format!("/cep/receivers/receiver-{id}_2.xml"),
        format!("/cep/plans/plan-{id}-3.siddhiql"),
        format!("/cep/publishers/pub-{id}-4.xml"),
    ];
    assert_eq!(store.upload_order(), expected);

    let record = handler.record();
    assert!(record.deployed);
    assert_eq!(record.paths(ArtifactKind::Stream).len(), 2);
    assert_eq!(record.paths(ArtifactKind::Receiver).len(), 1);
    assert_eq!(record.paths(ArtifactKind::Plan).len(), 1);
    assert_eq!(record.paths(ArtifactKind::Publisher).len(), 1);
    assert_eq!(record.counter, 5);
}

#[tokio::test]
async fn deploy_serializes_streams_as_engine_json() {
    let event = test_event(serde_json::json!({"c1": ["Temperature", ">", 20]}));
    let id = event.id().to_string();
    let mut handler = EventHandler::new(event, test_cep_config());
    let store = MemoryStore::new();

    handler.deploy(TARGET, &store).await.expect("deploy");

    let body = store
        .read(&format!("/cep/streams/stream-{id}-0.json"))
        .expect("input stream uploaded");
    let parsed: serde_json::Value = serde_json::from_str(&body).expect("stream is JSON");
    assert_eq!(parsed["name"], format!("geosmart.stream.in.{id}_1"));
    assert_eq!(parsed["version"], "1.0.0");
    assert_eq!(parsed["payloadData"][0]["name"], "Temperature");
    assert_eq!(parsed["payloadData"][0]["type"], "DOUBLE");
}

#[tokio::test]
async fn deploy_pairs_plans_with_conditions_by_phenomenon_name() {
    let event = test_event(serde_json::json!({
        "c1": ["Temperature", ">", 20],
        "c2": ["Luminosity", "<", 300]
    }));
    let id = event.id().to_string();
    let mut handler = EventHandler::new(event, test_cep_config());
    let store = MemoryStore::new();

    handler.deploy(TARGET, &store).await.expect("deploy");

    let plan_1 = store
        .read(&format!("/cep/plans/plan-{id}-6.siddhiql"))
        .expect("first plan uploaded");
    assert!(plan_1.ends_with("from input_1 [Temperature > 20] select * insert into output_1"));

    let plan_2 = store
        .read(&format!("/cep/plans/plan-{id}-7.siddhiql"))
        .expect("second plan uploaded");
    assert!(plan_2.ends_with("from input_1 [Luminosity < 300] select * insert into output_1"));
}

#[tokio::test]
async fn deploy_rejects_empty_publisher_target() {
    let event = test_event(serde_json::json!({"c1": ["Temperature", ">", 20]}));
    let mut handler = EventHandler::new(event, test_cep_config());
    let store = MemoryStore::new();

    let err = handler.deploy("", &store).await.unwrap_err();
    assert!(matches!(
        err,
        gedsys_core::GedsysError::MissingPublisherTarget
    ));
    assert!(store.is_empty());
}

#[tokio::test]
async fn partial_upload_failure_is_reported_not_swallowed() {
    let event = test_event(serde_json::json!({"c1": ["Temperature", ">", 20]}));
    let mut handler = EventHandler::new(event, test_cep_config());
    let store = MemoryStore::failing_uploads_on(vec!["plan-".to_string()]);

    let report = handler.deploy(TARGET, &store).await.expect("deploy walks on");

    assert!(!report.fully_succeeded());
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].kind, ArtifactKind::Plan);
    assert!(matches!(
        report.failures()[0].status,
        ArtifactStatus::Failed { .. }
    ));
    // the walk continued past the failed plan
    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(report.succeeded_count(), 4);

    let record = handler.record();
    assert!(!record.deployed);
    assert!(record.paths(ArtifactKind::Plan).is_empty());
    assert_eq!(record.paths(ArtifactKind::Publisher).len(), 1);
}

// ---------------------------------------------------------------------------
// Undeploy walk
// ---------------------------------------------------------------------------

#[tokio::test]
async fn undeploy_removes_everything_and_resets_record() {
    let event = test_event(serde_json::json!({"c1": ["Temperature", ">", 20]}));
    let mut handler = EventHandler::new(event, test_cep_config());
    let store = MemoryStore::new();

    handler.deploy(TARGET, &store).await.expect("deploy");
    assert_eq!(store.len(), 5);

    let report = handler.undeploy(&store).await;
    assert!(report.fully_succeeded());
    assert_eq!(report.outcomes.len(), 5);
    assert!(store.is_empty());

    let record = handler.record();
    assert!(record.is_empty());
    assert!(!record.deployed);
    assert_eq!(record.counter, 0);
}

#[tokio::test]
async fn undeploy_retains_paths_that_failed_to_be_removed() {
    let event = test_event(serde_json::json!({"c1": ["Temperature", ">", 20]}));
    let mut handler = EventHandler::new(event, test_cep_config());
    let store = MemoryStore::failing_removals_on(vec!["receiver-".to_string()]);

    handler.deploy(TARGET, &store).await.expect("deploy");
    let report = handler.undeploy(&store).await;

    assert!(!report.fully_succeeded());
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].kind, ArtifactKind::Receiver);

    let record = handler.record();
    assert_eq!(record.paths(ArtifactKind::Receiver).len(), 1);
    assert!(record.paths(ArtifactKind::Stream).is_empty());
    assert!(record.paths(ArtifactKind::Plan).is_empty());
    assert!(record.paths(ArtifactKind::Publisher).is_empty());
    // a dirty teardown keeps the deployed flag as-is for a later retry
    assert!(record.deployed);
}

#[tokio::test]
async fn record_survives_persistence_between_deploy_and_undeploy() {
    let event = test_event(serde_json::json!({"c1": ["Temperature", ">", 20]}));
    let config = test_cep_config();
    let store = MemoryStore::new();

    let mut handler = EventHandler::new(event.clone(), config.clone());
    handler.deploy(TARGET, &store).await.expect("deploy");

    // round-trip the record the way the CLI does between invocations
    let json = serde_json::to_string(handler.record()).expect("serialize record");
    let record = serde_json::from_str(&json).expect("deserialize record");

    let mut restored = EventHandler::with_record(event, config, record);
    let report = restored.undeploy(&store).await;
    assert!(report.fully_succeeded());
    assert!(store.is_empty());
}

#[tokio::test]
async fn receiver_endpoint_is_derivable_without_filename_parsing() {
    let event = test_event(serde_json::json!({"c1": ["Temperature", ">", 20]}));
    let id = event.id().to_string();
    let handler = EventHandler::new(event, test_cep_config());

    assert_eq!(
        handler.receiver_endpoint(1),
        format!("http://cep.example.org:9763/endpoints/httpReceiver{id}1")
    );
}
