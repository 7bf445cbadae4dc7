//! End-to-end binds through the public API.

use std::collections::HashMap;

use bindery::logging::LogLevel;
use bindery::{
    BindError, Binder, Configurable, EnvSource, FileLocator, LoggingConfig, MapSource, Origin,
    ResolveError, Shape, bind, resolve,
};
use serde_json::json;

#[derive(Debug, Default, PartialEq, Configurable)]
struct IntermediateA {
    #[config("fieldE")]
    field_e: String,
}

#[derive(Debug, Default, PartialEq, Configurable)]
struct IntermediateB {
    #[config("fieldG")]
    field_g: String,
    #[config("fieldH,optional")]
    field_h: String,
}

#[derive(Debug, Default, PartialEq, Configurable)]
struct RootType {
    #[config("fieldA")]
    field_a: String,
    #[config("fieldB,optional")]
    field_b: i64,
    #[config("fieldC,optional")]
    field_c: String,
    #[config("fieldD")]
    field_d: IntermediateA,
    #[config("fieldF,optional")]
    field_f: Vec<IntermediateB>,
    field_h: String,
    field_i: bool,
}

fn root_tree() -> MapSource {
    MapSource::from_json(json!({
        "fieldA": "hello",
        "fieldB": 10,
        "fieldD": { "fieldE": "world" },
        "fieldF": [
            { "fieldG": "foo", "fieldH": "bar" },
            { "fieldG": "baz" },
        ],
        "field-h": "-",
        "field-i": true,
    }))
}

fn root_expected() -> RootType {
    RootType {
        field_a: "hello".into(),
        field_b: 10,
        field_c: String::new(),
        field_d: IntermediateA {
            field_e: "world".into(),
        },
        field_f: vec![
            IntermediateB {
                field_g: "foo".into(),
                field_h: "bar".into(),
            },
            IntermediateB {
                field_g: "baz".into(),
                field_h: String::new(),
            },
        ],
        field_h: "-".into(),
        field_i: true,
    }
}

fn no_vars() -> Vec<(String, String)> {
    Vec::new()
}

#[test]
fn test_bind_from_tree() {
    let mut out = RootType::default();
    bind(&mut out, &[&root_tree()]).unwrap();
    assert_eq!(out, root_expected());
}

#[test]
fn test_first_source_wins() {
    let env = EnvSource::from_vars(
        "config",
        [("CONFIG_FIELDA", "from-env"), ("CONFIG_FIELDD_FIELDE", "env-world")],
    );
    let mut out = RootType::default();
    bind(&mut out, &[&env, &root_tree()]).unwrap();

    assert_eq!(out.field_a, "from-env");
    assert_eq!(out.field_d.field_e, "env-world");
    assert_eq!(out.field_b, 10);
    assert_eq!(out.field_f.len(), 2);

    let mut reversed = RootType::default();
    bind(&mut reversed, &[&root_tree(), &env]).unwrap();
    assert_eq!(reversed, root_expected());
}

#[test]
fn test_environment_only() {
    let env = EnvSource::from_vars(
        "config",
        [
            ("CONFIG_FIELDA", "hello"),
            ("CONFIG_FIELDD_FIELDE", "world"),
            ("CONFIG_FIELD_H", "h"),
            ("CONFIG_FIELD_I", "0"),
        ],
    );
    let mut out = RootType::default();
    bind(&mut out, &[&env]).unwrap();

    assert_eq!(
        out,
        RootType {
            field_a: "hello".into(),
            field_d: IntermediateA {
                field_e: "world".into(),
            },
            field_h: "h".into(),
            ..Default::default()
        }
    );
}

#[test]
fn test_missing_required_keys_are_all_reported() {
    let mut out = RootType::default();
    let err = bind(&mut out, &[&MapSource::default()]).unwrap_err();

    let BindError::Unresolved(report) = &err else {
        panic!("expected unresolved keys, got {err:?}");
    };
    assert_eq!(
        report.keys().collect::<Vec<_>>(),
        vec!["fieldA", "fieldD", "field-h", "field-i", "fieldD.fieldE"]
    );
    assert!(
        report
            .iter()
            .all(|e| matches!(e, ResolveError::NotPresent { .. }))
    );
    assert!(err.to_string().contains("no value in any source for `fieldA`"));
    assert!(err.to_string().starts_with("failed to bind configuration (5 error(s))"));
}

#[derive(Debug, Default, PartialEq, Configurable)]
struct Listen {
    #[config("host,optional")]
    host: String,
    #[config("port,optional")]
    port: u16,
}

#[test]
fn test_optional_missing_keeps_current_value() {
    let mut listen = Listen {
        host: "0.0.0.0".into(),
        port: 8080,
    };
    let source = MapSource::from_json(json!({ "host": "127.0.0.1" }));
    bind(&mut listen, &[&source]).unwrap();
    assert_eq!(listen.host, "127.0.0.1");
    assert_eq!(listen.port, 8080);
}

#[test]
fn test_bind_is_idempotent() {
    let source = root_tree();
    let mut out = RootType::default();
    bind(&mut out, &[&source]).unwrap();
    let first = format!("{out:?}");
    bind(&mut out, &[&source]).unwrap();
    assert_eq!(format!("{out:?}"), first);
}

#[derive(Debug, Default, Configurable)]
struct Volume {
    name: String,
    #[config("read-only,optional")]
    read_only: bool,
}

#[derive(Debug, Default, Configurable)]
struct PodSpec {
    #[config("container.image")]
    image: String,
    #[config("volumes,optional")]
    volumes: Vec<Volume>,
}

#[test]
fn test_nested_path_and_optional_sequence() {
    let without = MapSource::from_json(json!({ "container": { "image": "nginx" } }));
    let mut spec = PodSpec::default();
    bind(&mut spec, &[&without]).unwrap();
    assert_eq!(spec.image, "nginx");
    assert!(spec.volumes.is_empty());

    let with = MapSource::from_json(json!({
        "container": { "image": "nginx" },
        "volumes": [{ "name": "data" }, { "name": "logs", "read-only": true }],
    }));
    bind(&mut spec, &[&with]).unwrap();
    assert_eq!(spec.volumes.len(), 2);
    assert_eq!(spec.volumes[1].name, "logs");
    assert!(spec.volumes[1].read_only);
    assert!(!spec.volumes[0].read_only);
}

#[test]
fn test_sequence_elements_are_required() {
    let source = MapSource::from_json(json!({
        "container": { "image": "nginx" },
        "volumes": [{ "name": "data" }, { "read-only": true }],
    }));
    let mut spec = PodSpec::default();
    let err = bind(&mut spec, &[&source]).unwrap_err();
    assert_eq!(err.errors().len(), 1);
    assert_eq!(err.errors()[0].key(), "volumes.[1].name");
}

#[test]
fn test_sequence_from_environment_is_unsupported() {
    let env = EnvSource::from_vars("app", [("APP_VOLUMES", "data")]);
    let tree = MapSource::from_json(json!({
        "container": { "image": "nginx" },
        "volumes": [{ "name": "data" }],
    }));
    let mut spec = PodSpec::default();

    let err = bind(&mut spec, &[&env, &tree]).unwrap_err();
    assert_eq!(err.errors().len(), 1);
    let failure = &err.errors()[0];
    assert_eq!(failure.key(), "volumes");
    assert_eq!(failure.origin(), Some("env:APP"));
    assert!(matches!(failure, ResolveError::Unsupported { shape: Shape::Sequence, .. }));
    assert!(spec.volumes.is_empty());
}

#[test]
fn test_unset_sequence_variable_falls_through() {
    let env = EnvSource::from_vars("app", [("APP_CONTAINER_IMAGE", "nginx:1.27")]);
    let tree = MapSource::from_json(json!({
        "container": { "image": "nginx" },
        "volumes": [{ "name": "data" }],
    }));
    let mut spec = PodSpec::default();

    bind(&mut spec, &[&env, &tree]).unwrap();
    assert_eq!(spec.image, "nginx:1.27");
    assert_eq!(spec.volumes.len(), 1);
    assert_eq!(spec.volumes[0].name, "data");
}

#[derive(Debug, Default, Configurable)]
struct Mount {
    #[config("volume")]
    volume: Box<Volume>,
}

#[test]
fn test_boxed_record_field() {
    let source = MapSource::from_json(json!({ "volume": { "name": "data", "read-only": true } }));
    let mut mount = Mount::default();
    bind(&mut mount, &[&source]).unwrap();
    assert_eq!(mount.volume.name, "data");
    assert!(mount.volume.read_only);
}

#[test]
fn test_invalid_value_is_not_masked() {
    let env = EnvSource::from_vars("config", [("CONFIG_FIELDB", "ten")]);
    let mut out = RootType::default();
    let err = bind(&mut out, &[&env, &root_tree()]).unwrap_err();

    assert_eq!(err.errors().len(), 1);
    let failure = &err.errors()[0];
    assert_eq!(failure.key(), "fieldB");
    assert_eq!(failure.origin(), Some("env:CONFIG"));
    assert!(matches!(failure, ResolveError::InvalidValue { shape: Shape::Integer, .. }));
    assert_eq!(out.field_b, 0);
    assert_eq!(out.field_a, "hello");
}

#[test]
fn test_coercion_failure_names_the_source() {
    let source = MapSource::from_json(json!({
        "container": { "image": 7 },
    }))
    .named("manifest");
    let mut spec = PodSpec::default();
    let err = bind(&mut spec, &[&source]).unwrap_err();

    assert_eq!(
        err.errors()[0].to_string(),
        "source `manifest` holds an invalid string value for `container.image`: \
         expected string, found integer"
    );
}

#[derive(Debug, Default, Configurable)]
struct Labelled {
    #[config("labels,optional")]
    labels: HashMap<String, String>,
}

#[test]
fn test_unset_table_variable_falls_through() {
    let env = EnvSource::from_vars("", no_vars());
    let tree = MapSource::from_json(json!({ "labels": { "team": "core" } }));
    let mut out = Labelled::default();

    bind(&mut out, &[&env, &tree]).unwrap();
    assert_eq!(out.labels.get("team").map(String::as_str), Some("core"));
}

#[test]
fn test_table_from_environment_is_unsupported() {
    let env = EnvSource::from_vars("", [("LABELS", "team=core")]);
    let tree = MapSource::from_json(json!({ "labels": { "team": "core" } }));
    let mut out = Labelled::default();

    let err = bind(&mut out, &[&env, &tree]).unwrap_err();
    assert_eq!(err.errors().len(), 1);
    assert!(matches!(
        &err.errors()[0],
        ResolveError::Unsupported { shape: Shape::Table, origin, key } if origin == "env" && key == "labels"
    ));

    bind(&mut out, &[&tree, &env]).unwrap();
    assert_eq!(out.labels.get("team").map(String::as_str), Some("core"));
}

#[derive(Debug, Default, Configurable)]
struct LoggedApp {
    name: String,
    #[config("logging,optional")]
    logging: LoggingConfig,
}

#[test]
fn test_environment_first_over_logging_section() {
    let env = EnvSource::from_vars("app", [("APP_LOGGING_LEVEL", "debug")]);
    let tree = MapSource::from_json(json!({
        "name": "x",
        "logging": { "level": "warn", "filters": { "bindery": "trace" } },
    }));
    let mut app = LoggedApp::default();

    let provenance = resolve(&mut app, &[&env, &tree]).unwrap();
    assert_eq!(app.name, "x");
    assert_eq!(app.logging.level, LogLevel::Debug);
    assert_eq!(
        app.logging.filters.get("bindery").map(String::as_str),
        Some("trace")
    );
    assert_eq!(provenance.source_of("logging.level"), Some("env:APP"));
    assert_eq!(provenance.source_of("logging.filters"), Some("map"));
}

#[test]
fn test_environment_first_without_logging_section() {
    let env = EnvSource::from_vars("app", no_vars());
    let tree = MapSource::from_json(json!({ "name": "x" }));
    let mut app = LoggedApp::default();

    bind(&mut app, &[&env, &tree]).unwrap();
    assert_eq!(app.name, "x");
    assert!(app.logging.filters.is_empty());
}

#[test]
fn test_failures_are_aggregated() {
    let source = MapSource::from_json(json!({
        "fieldA": 1,
        "fieldB": "ten",
        "fieldD": "not a record",
        "fieldF": [{ "fieldH": "x" }],
        "field-i": "yes",
    }));
    let mut out = RootType::default();
    let err = bind(&mut out, &[&source]).unwrap_err();

    let keys: Vec<&str> = err.errors().iter().map(ResolveError::key).collect();
    assert_eq!(
        keys,
        vec![
            "fieldA",
            "fieldB",
            "fieldD",
            "field-h",
            "field-i",
            "fieldD.fieldE",
            "fieldF.[0].fieldG",
        ]
    );
}

#[test]
fn test_absent_source_is_a_no_op() {
    let absent: Option<MapSource> = None;
    let mut with_absent = RootType::default();
    bind(&mut with_absent, &[&absent, &root_tree(), &absent]).unwrap();
    assert_eq!(with_absent, root_expected());
}

#[test]
fn test_leaf_destination_is_rejected() {
    let mut name = String::new();
    let err = bind(&mut name, &[&root_tree()]).unwrap_err();
    assert_eq!(
        err,
        BindError::NotStructured {
            type_name: "alloc::string::String",
            shape: Shape::String,
        }
    );
    assert!(err.errors().is_empty());
}

#[test]
fn test_sequence_destination() {
    let source = MapSource::from_json(json!([{ "name": "a" }, { "name": "b" }]));
    let mut volumes: Vec<Volume> = vec![Volume::default()];
    // The root itself is never allocated; only its current elements bind.
    bind(&mut volumes, &[&source]).unwrap();
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].name, "a");
}

#[test]
fn test_provenance() {
    let env = EnvSource::from_vars("config", [("CONFIG_FIELDA", "from-env")]);
    let tree = root_tree().named("tree");
    let mut out = RootType::default();
    let provenance = resolve(&mut out, &[&env, &tree]).unwrap();

    assert_eq!(provenance.source_of("fieldA"), Some("env:CONFIG"));
    assert_eq!(provenance.source_of("fieldB"), Some("tree"));
    assert_eq!(provenance.source_of("fieldD"), Some("env:CONFIG"));
    assert_eq!(provenance.source_of("fieldF"), Some("tree"));
    assert_eq!(provenance.source_of("fieldF.[1].fieldG"), Some("tree"));
    assert_eq!(provenance.origin("fieldC"), Some(&Origin::Unset));
    assert_eq!(provenance.origin("fieldF.[1].fieldH"), Some(&Origin::Unset));
    assert_eq!(provenance.source_of("missing"), None);
}

#[test]
fn test_binder_owns_sources() {
    let binder = Binder::new()
        .source(EnvSource::from_vars("config", [("CONFIG_FIELDA", "binder")]))
        .source(root_tree().named("tree"));
    assert_eq!(binder.source_names(), vec!["env:CONFIG", "tree"]);

    let mut out = RootType::default();
    binder.bind(&mut out).unwrap();
    assert_eq!(out.field_a, "binder");
    assert!(out.field_i);
}

#[cfg(feature = "toml-config")]
#[test]
fn test_located_files_layer_by_profile() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("pod.toml"),
        r#"
volumes = [{ name = "data" }]

[container]
image = "nginx:1.25"
"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("pod.production.toml"),
        "[container]\nimage = \"nginx:1.27\"\n",
    )
    .unwrap();

    let files = FileLocator::new("pod")
        .profile("production")
        .search_path(dir.path())
        .sources()
        .unwrap();
    let binder = Binder::new().sources(files);
    assert_eq!(binder.len(), 2);

    let mut spec = PodSpec::default();
    let provenance = binder.resolve(&mut spec).unwrap();
    assert_eq!(spec.image, "nginx:1.27");
    assert_eq!(spec.volumes.len(), 1);
    assert_eq!(spec.volumes[0].name, "data");

    let base = dir.path().join("pod.toml").display().to_string();
    assert_eq!(provenance.source_of("volumes.[0].name"), Some(base.as_str()));
}
