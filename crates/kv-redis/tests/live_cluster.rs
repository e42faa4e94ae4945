//! Pruebas contra un cluster Redis real. Se omiten si `KV_CLUSTER_NODES`
//! no está definido.

use kv_core::{FieldMeta, FieldValue, Row, RowSchema, RowStep, StepConfig, StepState, ValueType, VecRowSink,
              VecRowSource};
use kv_redis::ClusterEnv;
use uuid::Uuid;

fn cluster_env() -> Option<ClusterEnv> {
    match ClusterEnv::from_env() {
        Ok(env) => Some(env),
        Err(e) => {
            eprintln!("skipping live cluster test: {e}");
            None
        }
    }
}

fn schema() -> RowSchema {
    RowSchema::new(vec![FieldMeta::new("key", ValueType::String), FieldMeta::new("val", ValueType::String)])
}

#[test]
fn store_then_fetch_round_trip() {
    let Some(env) = cluster_env() else { return };
    let key = format!("kvflow:test:{}", Uuid::new_v4());

    let store_cfg = StepConfig::store("key", "val", 60, env.endpoints.iter().cloned());
    let mut store = RowStep::store("save", store_cfg, env.connector());
    let mut source = VecRowSource::new(schema(), vec![Row::new(vec![key.as_str().into(), "hello".into()])]);
    store.run(&mut source, &mut VecRowSink::new()).expect("store against live cluster");
    assert_eq!(store.state(), StepState::Done);

    let fetch_schema = RowSchema::new(vec![FieldMeta::new("key", ValueType::String)]);
    let fetch_cfg = StepConfig::fetch("key", "val", "String", env.endpoints.iter().cloned());
    let mut fetch = RowStep::fetch("lookup", fetch_cfg, env.connector());
    let mut source = VecRowSource::new(fetch_schema,
                                       vec![Row::new(vec![key.as_str().into()]),
                                            Row::new(vec![format!("{key}:missing").into()])]);
    let mut sink = VecRowSink::new();
    fetch.run(&mut source, &mut sink).expect("fetch against live cluster");

    assert_eq!(sink.rows[0].get(1), Some(&FieldValue::from("hello")));
    assert_eq!(sink.rows[1].get(1), Some(&FieldValue::Null));
}
