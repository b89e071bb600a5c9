//! Dependency table and database behavior over decoded assets

use unity_asset_deps::constants::class_ids;
use unity_asset_deps::deps::DependencyTable;
use unity_asset_deps::typetree::TypeTreeNode;
use unity_asset_deps::{
    Asset, BundleFile, DependencyDatabase, ExternalFileRef, ObjectRecord, TypeHint,
};

// --- schema construction -------------------------------------------------

fn node(type_name: &str, field_name: &str) -> TypeTreeNode {
    let mut n = TypeTreeNode::new();
    n.type_name = type_name.to_string();
    n.field_name = field_name.to_string();
    n.type_hint = TypeHint::from_type_name(type_name);
    n
}

fn vector_of(element: TypeTreeNode, field_name: &str) -> TypeTreeNode {
    let mut data = element;
    data.field_name = "data".to_string();
    let mut array = node("Array", "Array");
    array.is_array = true;
    array.children = vec![node("int", "size"), data];
    let mut wrapper = node("vector", field_name);
    wrapper.children = vec![array];
    wrapper
}

fn pptr_node(field_name: &str) -> TypeTreeNode {
    let mut n = node("PPtr<Object>", field_name);
    n.children = vec![node("int", "m_FileID"), node("SInt64", "m_PathID")];
    n
}

fn asset_info_node(field_name: &str) -> TypeTreeNode {
    let mut n = node("AssetInfo", field_name);
    n.children = vec![
        node("int", "preloadIndex"),
        node("int", "preloadSize"),
        pptr_node("asset"),
    ];
    n
}

fn preload_data_schema() -> TypeTreeNode {
    let mut root = node("PreloadData", "Base");
    root.children = vec![
        node("string", "m_Name"),
        vector_of(node("string", "dep"), "m_Dependencies"),
        vector_of(pptr_node("ptr"), "m_Assets"),
    ];
    root
}

fn asset_bundle_schema() -> TypeTreeNode {
    let mut pair = node("pair", "data");
    pair.children = vec![node("string", "first"), asset_info_node("second")];
    let mut container_array = node("Array", "Array");
    container_array.is_array = true;
    container_array.children = vec![node("int", "size"), pair];
    let mut container = node("map", "m_Container");
    container.children = vec![container_array];

    let mut root = node("AssetBundle", "Base");
    root.children = vec![
        node("string", "m_Name"),
        vector_of(pptr_node("ptr"), "m_PreloadTable"),
        container,
        asset_info_node("m_MainAsset"),
        node("string", "m_AssetBundleName"),
        vector_of(node("string", "dep"), "m_Dependencies"),
    ];
    root
}

fn texture_schema() -> TypeTreeNode {
    let mut root = node("Texture2D", "Base");
    root.children = vec![node("string", "m_Name"), node("int", "m_Width")];
    root
}

// --- payload encoding ----------------------------------------------------

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

fn put_pptr(buf: &mut Vec<u8>, file_id: i32, path_id: i64) {
    buf.extend_from_slice(&file_id.to_le_bytes());
    buf.extend_from_slice(&path_id.to_le_bytes());
}

fn preload_payload(deps: &[&str], assets: &[(i32, i64)]) -> Vec<u8> {
    let mut buf = Vec::new();
    put_str(&mut buf, ""); // m_Name
    buf.extend_from_slice(&(deps.len() as i32).to_le_bytes());
    for dep in deps {
        put_str(&mut buf, dep);
    }
    buf.extend_from_slice(&(assets.len() as i32).to_le_bytes());
    for &(file_id, path_id) in assets {
        put_pptr(&mut buf, file_id, path_id);
    }
    buf
}

fn texture_payload(name: &str, width: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    put_str(&mut buf, name);
    buf.extend_from_slice(&width.to_le_bytes());
    buf
}

#[allow(clippy::type_complexity)]
fn bundle_payload(
    name: &str,
    preload: &[(i32, i64)],
    container: &[(&str, i32, i32, (i32, i64))],
    main_asset: (i32, i64),
    deps: &[&str],
) -> Vec<u8> {
    let mut buf = Vec::new();
    put_str(&mut buf, name); // m_Name
    buf.extend_from_slice(&(preload.len() as i32).to_le_bytes());
    for &(file_id, path_id) in preload {
        put_pptr(&mut buf, file_id, path_id);
    }
    buf.extend_from_slice(&(container.len() as i32).to_le_bytes());
    for &(path, index, size, (file_id, path_id)) in container {
        put_str(&mut buf, path);
        buf.extend_from_slice(&index.to_le_bytes());
        buf.extend_from_slice(&size.to_le_bytes());
        put_pptr(&mut buf, file_id, path_id);
    }
    buf.extend_from_slice(&0i32.to_le_bytes()); // m_MainAsset.preloadIndex
    buf.extend_from_slice(&0i32.to_le_bytes()); // m_MainAsset.preloadSize
    put_pptr(&mut buf, main_asset.0, main_asset.1);
    put_str(&mut buf, name); // m_AssetBundleName
    buf.extend_from_slice(&(deps.len() as i32).to_le_bytes());
    for dep in deps {
        put_str(&mut buf, dep);
    }
    buf
}

// --- asset assembly ------------------------------------------------------

fn base_asset(name: &str) -> Asset {
    let mut asset = Asset::new(name, 17);
    asset
        .metadata
        .type_trees
        .insert(class_ids::PRELOAD_DATA, preload_data_schema());
    asset
        .metadata
        .type_trees
        .insert(class_ids::ASSET_BUNDLE, asset_bundle_schema());
    asset
        .metadata
        .type_trees
        .insert(class_ids::TEXTURE_2D, texture_schema());
    asset
}

fn texture_object(path_id: i64, name: &str) -> ObjectRecord {
    ObjectRecord::new(path_id, class_ids::TEXTURE_2D, texture_payload(name, 64))
}

// --- tests ---------------------------------------------------------------

#[test]
fn preload_pointers_resolve_across_files() {
    let mut ui = base_asset("CAB-ui");
    ui.external_refs
        .push(ExternalFileRef::new("archive:/CAB-shared/CAB-shared"));
    ui.insert_object(ObjectRecord::new(
        1,
        class_ids::PRELOAD_DATA,
        preload_payload(
            &["archive:/CAB-shared/CAB-shared"],
            &[(1, 301), (0, 77), (-1, -1)],
        ),
    ));
    ui.insert_object(texture_object(77, "button"));

    let mut shared = base_asset("CAB-shared");
    shared.insert_object(texture_object(301, "atlas"));
    shared.insert_object(texture_object(302, "orphan"));

    let mut db = DependencyDatabase::new();
    db.add_asset("ui.unity3d", &ui);
    db.add_asset("shared.unity3d", &shared);
    let report = db.into_report();

    // the external pointer (1, 301) resolved through the ref list
    let shared_table = report.table("CAB-shared").unwrap();
    let atlas = &shared_table.objects[&301];
    assert_eq!(atlas.name.as_deref(), Some("atlas"));
    assert_eq!(
        atlas.referenced_by.iter().collect::<Vec<_>>(),
        vec!["CAB-ui"]
    );

    // nothing referenced 302, so the cleanup pass removed it
    assert!(!shared_table.objects.contains_key(&302));

    // the local pointer (0, 77) is not a cross-file dependency: no
    // back-reference, no dangling diagnostic
    let ui_table = report.table("CAB-ui").unwrap();
    assert!(!ui_table.objects.contains_key(&77));
    assert_eq!(report.dangling_references, 0);

    // the invariant the report exists for: every surviving entry is referenced
    for table in &report.tables {
        for entry in table.objects.values() {
            assert!(!entry.referenced_by.is_empty());
        }
    }
}

#[test]
fn local_pointer_with_any_path_id_never_dangles() {
    let mut asset = base_asset("CAB-local");
    asset.insert_object(ObjectRecord::new(
        1,
        class_ids::PRELOAD_DATA,
        // local ids that resolve nowhere, including an id that exists in no
        // object table at all
        preload_payload(&[], &[(0, 999_999), (0, -42)]),
    ));

    let mut db = DependencyDatabase::new();
    db.add_asset("local.unity3d", &asset);
    let report = db.into_report();
    assert_eq!(report.dangling_references, 0);
}

#[test]
fn dangling_reference_is_diagnostic_not_error() {
    let mut asset = base_asset("CAB-edge");
    asset.external_refs.push(ExternalFileRef::new("CAB-absent"));
    asset.insert_object(ObjectRecord::new(
        1,
        class_ids::PRELOAD_DATA,
        // target file not in this run; target id missing from ref list
        preload_payload(&[], &[(1, 10), (7, 10)]),
    ));

    let mut db = DependencyDatabase::new();
    db.add_asset("edge.unity3d", &asset);
    let report = db.into_report();

    assert_eq!(report.tables.len(), 1);
    assert_eq!(report.dangling_references, 2);
}

#[test]
fn version_skew_target_id_is_diagnostic() {
    let mut a = base_asset("CAB-a");
    a.external_refs.push(ExternalFileRef::new("CAB-b"));
    a.insert_object(ObjectRecord::new(
        1,
        class_ids::PRELOAD_DATA,
        preload_payload(&[], &[(1, 5555)]), // id absent from CAB-b
    ));
    let mut b = base_asset("CAB-b");
    b.insert_object(texture_object(1, "present"));

    let mut db = DependencyDatabase::new();
    db.add_asset("a.unity3d", &a);
    db.add_asset("b.unity3d", &b);
    let report = db.into_report();

    assert_eq!(report.dangling_references, 1);
}

#[test]
fn variant_bundles_dedup_case_insensitively() {
    let mut first = base_asset("Bundle_Main");
    first.insert_object(texture_object(10, "from_first"));
    let mut second = base_asset("bundle_main");
    second.insert_object(texture_object(20, "from_second"));

    let mut db = DependencyDatabase::new();
    db.add_asset("first.unity3d", &first);
    db.add_asset("second.unity3d", &second);

    assert_eq!(db.tables().len(), 1);
    assert_eq!(db.tables()[0].name, "Bundle_Main");
    assert_eq!(db.tables()[0].source_file, "first.unity3d");
    assert_eq!(db.duplicates_skipped(), 1);
}

#[test]
fn manifest_exports_name_objects_without_decoding() {
    let mut asset = base_asset("CAB-bundle");
    asset.insert_object(ObjectRecord::new(
        1,
        class_ids::ASSET_BUNDLE,
        bundle_payload(
            "ui_common",
            &[(0, 77)],
            &[("assets/ui/button.png", 0, 1, (0, 77))],
            (-1, -1),
            &["cab-shared"],
        ),
    ));
    // payload name says "raw"; the export map must win
    asset.insert_object(texture_object(77, "raw"));

    let table = DependencyTable::from_asset("bundle.unity3d", &asset);
    assert_eq!(
        table.objects[&77].name.as_deref(),
        Some("assets/ui/button.png")
    );
    let manifest = table.asset_bundle.as_ref().unwrap();
    assert_eq!(manifest.name, "ui_common");
    assert_eq!(manifest.dependencies, vec!["cab-shared"]);
}

#[test]
fn empty_manifest_is_dropped_at_cleanup() {
    let mut asset = base_asset("CAB-variant");
    asset.insert_object(ObjectRecord::new(
        1,
        class_ids::ASSET_BUNDLE,
        bundle_payload("variant", &[], &[], (-1, -1), &[]),
    ));

    let mut db = DependencyDatabase::new();
    db.add_asset("variant.unity3d", &asset);
    assert!(db.tables()[0].asset_bundle.is_some());

    let report = db.into_report();
    assert!(report.tables[0].asset_bundle.is_none());
}

#[test]
fn objects_without_schemas_are_skipped() {
    let mut asset = base_asset("CAB-partial");
    asset.insert_object(texture_object(1, "known"));
    // class 9999 has no type tree anywhere: skipped, not an error
    asset.insert_object(ObjectRecord::new(2, 9999, vec![1, 2, 3, 4]));

    let table = DependencyTable::from_asset("partial.unity3d", &asset);
    assert!(table.objects.contains_key(&1));
    assert!(!table.objects.contains_key(&2));
}

#[test]
fn asset_names_lose_path_prefixes() {
    let asset = base_asset("C:/build/output/level1");
    let table = DependencyTable::from_asset("level1.assets", &asset);
    assert_eq!(table.name, "level1");
}

#[test]
fn progress_counts_are_monotonic_and_complete() {
    let mut asset = base_asset("CAB-progress");
    for i in 0..5 {
        asset.insert_object(texture_object(i, "tex"));
    }

    let mut seen = Vec::new();
    let _ = DependencyTable::from_asset_with_progress("p.unity3d", &asset, |done, total| {
        seen.push((done, total));
    });

    assert_eq!(seen.first(), Some(&(0, 5)));
    assert_eq!(seen.last(), Some(&(5, 5)));
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
}

#[test]
fn bundles_register_assets_in_container_order() {
    let mut a = base_asset("CAB-one");
    a.insert_object(texture_object(1, "t1"));
    let mut b = base_asset("CAB-two");
    b.insert_object(texture_object(1, "t2"));

    let bundle = BundleFile {
        info: Default::default(),
        assets: vec![a, b],
    };
    let mut db = DependencyDatabase::new();
    db.build_from_bundle("pair.unity3d", &bundle);

    let names: Vec<&str> = db.tables().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["CAB-one", "CAB-two"]);
}

#[test]
fn report_serializes_with_sorted_backrefs_and_no_empty_ref_lists() {
    let mut target = base_asset("CAB-hub");
    target.insert_object(texture_object(9, "shared_font"));

    let make_referer = |name: &str| {
        let mut asset = base_asset(name);
        asset.external_refs.push(ExternalFileRef::new("CAB-hub"));
        asset.insert_object(ObjectRecord::new(
            1,
            class_ids::PRELOAD_DATA,
            preload_payload(&[], &[(1, 9)]),
        ));
        asset
    };
    let zeta = make_referer("CAB-zeta");
    let alpha = make_referer("CAB-alpha");

    let mut db = DependencyDatabase::new();
    db.add_asset("hub.unity3d", &target);
    db.add_asset("zeta.unity3d", &zeta);
    db.add_asset("alpha.unity3d", &alpha);
    let report = db.into_report();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    let tables = json["tables"].as_array().unwrap();

    // hub has no external refs: the list is omitted, not an empty array
    let hub = &tables[0];
    assert_eq!(hub["name"], "CAB-hub");
    assert!(hub.get("external_refs").is_none());

    // back-reference sets render as ordered lists
    let refs = hub["objects"]["9"]["referenced_by"].as_array().unwrap();
    let refs: Vec<&str> = refs.iter().filter_map(|v| v.as_str()).collect();
    assert_eq!(refs, vec!["CAB-alpha", "CAB-zeta"]);

    // referers keep their empty object maps rather than disappearing
    let zeta_table = &tables[1];
    assert_eq!(zeta_table["name"], "CAB-zeta");
    assert!(zeta_table["objects"].as_object().unwrap().is_empty());
}
