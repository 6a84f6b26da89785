//! Loading permission trees from JSON files.

use std::io::Write;

use realm_shim::{
    Bootstrap, ErrorCategory, Permit, PermissionTree, PermitNode, PropertyKey, StandardHost,
    WellKnownSymbol,
};

fn write_tree(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn standard_tree_survives_a_trip_through_a_file() {
    let tree = PermissionTree::standard();
    let file = write_tree(&tree.to_json_pretty().unwrap());

    let loaded = PermissionTree::from_path(file.path()).unwrap();
    assert_eq!(loaded, tree);
    assert_eq!(loaded.fingerprint().unwrap(), tree.fingerprint().unwrap());
}

#[test]
fn hand_written_tree_parses_leaves_subtrees_and_symbols() {
    let file = write_tree(
        r#"{
            "NaN": "keep_data",
            "Array": {
                "prototype": {
                    "constructor": "make_accessor",
                    "@@iterator": "keep_data"
                },
                "@@species": "keep_accessor"
            }
        }"#,
    );
    let tree = PermissionTree::from_path(file.path()).unwrap();

    assert_eq!(
        tree.top_level_names(),
        vec![PropertyKey::from("Array"), PropertyKey::from("NaN")]
    );
    let array = tree.root().get(&"Array".into()).and_then(PermitNode::as_subtree).unwrap();
    assert_eq!(
        array.get(&WellKnownSymbol::Species.key()),
        Some(&PermitNode::Leaf(Permit::KeepAccessor))
    );
    let prototype = array.get(&"prototype".into()).and_then(PermitNode::as_subtree).unwrap();
    assert!(prototype.contains_key(&WellKnownSymbol::Iterator.key()));
    assert_eq!(tree.root().table_count(), 3);
}

#[test]
fn unknown_symbol_is_rejected() {
    let file = write_tree(r#"{ "@@nope": "keep_data" }"#);
    let err = PermissionTree::from_path(file.path()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("@@nope"), "{err}");
}

#[test]
fn unknown_permit_is_rejected() {
    let file = write_tree(r#"{ "NaN": "keep_everything" }"#);
    let err = PermissionTree::from_path(file.path()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn missing_file_is_a_host_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PermissionTree::from_path(dir.path().join("absent.json")).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Host);
}

#[test]
fn fingerprint_tracks_content() {
    let standard = PermissionTree::standard();
    let edited = PermissionTree::new(standard.root().clone().with("escape", Permit::KeepDataInherited));

    let fingerprint = standard.fingerprint().unwrap();
    assert_eq!(fingerprint.len(), 64);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(fingerprint, PermissionTree::default().fingerprint().unwrap());
    assert_ne!(fingerprint, edited.fingerprint().unwrap());
}

#[test]
fn loaded_tree_drives_a_bootstrap() {
    let file = write_tree(&PermissionTree::standard().to_json_pretty().unwrap());
    let tree = PermissionTree::from_path(file.path()).unwrap();

    let mut bootstrap = Bootstrap::new(StandardHost::new())
        .unwrap()
        .with_permission_tree(tree);
    let rec = bootstrap.create_new_unsafe_rec(Vec::new()).unwrap();
    assert!(rec
        .shared_global_descs()
        .contains_key(&PropertyKey::from("JSON")));
}
