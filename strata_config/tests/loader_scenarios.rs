//! End-to-end scenarios for a loader assembled from maps, closures,
//! properties files and deferred sources.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use rstest::rstest;
use tempfile::TempDir;

use strata_config::{ConfigLoader, ConfigValue, PropertiesFile, Source};
use test_helpers::clock::ManualClock;
use test_helpers::source::SharedMapSource;

/// Writes `test.properties` into a temporary resource root and returns the
/// directory (keep it alive) plus the registered file.
fn properties_fixture() -> (TempDir, PropertiesFile) {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(
        dir.path().join("test.properties"),
        "test_key_string=apple\n# fixture for file-backed lookups\ntest_key_int: 17\n",
    )
    .expect("write fixture");

    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
    let file = PropertiesFile::resource("test.properties").resource_root(root);
    (dir, file)
}

fn scenario_loader() -> (TempDir, ConfigLoader) {
    let entries: HashMap<String, String> = [
        ("expanded.first", "${expanded.second}"),
        (
            "expanded.second",
            "${expanded.last.1}.${expanded.last.2}.${expanded.last.1}",
        ),
        ("expanded.never", "${expanded.missing}"),
        ("expanded.last.1", "foo"),
        ("expanded.last.2", "bar"),
        ("found.key", "banana"),
        ("some.flag.for.kiwi", "green"),
        ("some.flag.for.banana", "yellow"),
        ("some.flag.for", "rainbow"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();

    let (dir, file) = properties_fixture();
    let loader = ConfigLoader::builder()
        .add_map("Test sources", entries)
        .add_properties_file(file)
        .build()
        .expect("loader builds");
    (dir, loader)
}

#[rstest]
// Placeholder chains resolve through intermediate keys.
#[case("expanded.first", Some("foo.bar.foo"))]
#[case("expanded.last.1", Some("foo"))]
// An unresolvable placeholder is preserved verbatim.
#[case("expanded.never", Some("${expanded.missing}"))]
// Overrides fall back from the specific to the generic key.
#[case("some.flag.for.{kiwi}", Some("green"))]
#[case("some.flag.for.{sky}", Some("rainbow"))]
// A placeholder inside an override resolves before the fallback applies.
#[case("some.flag.for.{${found.key}}", Some("yellow"))]
// File-backed entries resolve like any other source.
#[case("test_key_string", Some("apple"))]
#[case("missing.value", None)]
fn get_string_end_to_end(#[case] key: &str, #[case] expected: Option<&str>) {
    let (_dir, loader) = scenario_loader();
    let actual = loader.get_string(key).expect("lookup succeeds");
    assert_eq!(actual, ConfigValue::new(key, expected.map(str::to_owned)));
}

#[test]
fn expansion_loops_across_sources_fail() {
    let entries: HashMap<String, String> = [("a", "${b}"), ("b", "${a}")]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    let loader = ConfigLoader::builder()
        .add_map("Cyclic source", entries)
        .build()
        .expect("loader builds");

    let err = loader.get_string("a").expect_err("expansion must loop");
    assert_eq!(err.to_string(), "Property Expansion Loop");
}

#[test]
fn typed_lookups_coerce_file_backed_values() {
    let (_dir, loader) = scenario_loader();

    assert_eq!(
        loader.get_i32("test_key_int").expect("resolves").require().expect("present"),
        17
    );
    let err = loader.get_i64("test_key_string").expect_err("not numeric");
    assert_eq!(
        err.to_string(),
        "Could not parse 'test_key_string' value as type 'i64'"
    );
}

#[test]
fn missing_required_properties_file_fails_the_build() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");

    let err = ConfigLoader::builder()
        .add_properties_file(PropertiesFile::resource("non-existing.properties").resource_root(root))
        .build()
        .expect_err("required file is absent");

    assert_eq!(
        err.to_string(),
        "Missing required .properties file for configuration: non-existing.properties"
    );
}

#[test]
fn optional_properties_file_is_skipped() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");

    let loader = ConfigLoader::builder()
        .add_properties_file(
            PropertiesFile::resource("non-existing.properties")
                .resource_root(root)
                .optional(),
        )
        .build()
        .expect("optional file may be absent");

    assert!(!loader.get_string("any.key").expect("lookup succeeds").is_present());
}

#[test]
fn sources_added_later_take_priority_over_files() {
    let (_dir, file) = properties_fixture();
    let loader = ConfigLoader::builder()
        .add_properties_file(file)
        .add_map(
            "Overrides",
            [("test_key_string".to_owned(), "pear".to_owned())].into_iter().collect(),
        )
        .build()
        .expect("loader builds");

    assert_eq!(
        loader.get_string("test_key_string").expect("resolves").require().expect("present"),
        "pear"
    );
}

#[test]
fn cache_age_bounds_follow_the_clock() {
    let clock = Arc::new(ManualClock::scripted([5_000, 5_000, 5_000, 8_000, 10_000]));
    let source = SharedMapSource::new("Mutable source");
    let handle = source.clone();
    let loader = ConfigLoader::builder()
        .add_source(source)
        .enable_cache()
        .build_with_clock(clock)
        .expect("loader builds");

    let get_within = |key: &str, max_age: Duration| {
        loader
            .get_string_no_older_than(key, max_age)
            .expect("lookup succeeds")
            .require()
            .expect("value present")
    };

    handle.put("key1", "value1");
    assert_eq!(
        loader.get_string("key1").expect("lookup succeeds").require().expect("present"),
        "value1"
    );
    handle.put("key1", "value2");
    assert_eq!(
        loader.get_string("key1").expect("lookup succeeds").require().expect("present"),
        "value2"
    );
    handle.put("key1", "value3");
    assert_eq!(get_within("key1", Duration::from_secs(5)), "value2");
    handle.put("key1", "value4");
    assert_eq!(get_within("key1", Duration::from_secs(4)), "value2");
    assert_eq!(get_within("key1", Duration::from_secs(2)), "value4");
    handle.put("key1", "value5");
    assert_eq!(
        loader.get_string("key1").expect("lookup succeeds").require().expect("present"),
        "value5"
    );
}

#[test]
fn deferred_source_activates_from_a_static_flag() {
    let backing: HashMap<String, String> = [("some.key", "some value")]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

    struct StaticFlag;

    impl Source for StaticFlag {
        fn label(&self) -> &str {
            "Static Source"
        }

        fn find(&self, key: &str) -> Option<String> {
            (key == "deferredKey").then(|| "true".to_owned())
        }
    }

    let loader = ConfigLoader::builder()
        .defer_lookup("Deferred Source", move |first_pass| {
            let activated = first_pass
                .get_bool("deferredKey")
                .ok()
                .and_then(ConfigValue::into_inner)
                .unwrap_or(false);
            activated.then_some(move |key: &str| backing.get(key).cloned())
        })
        .add_source(StaticFlag)
        .build()
        .expect("loader builds");

    assert_eq!(
        loader.get_string("some.key").expect("lookup succeeds"),
        ConfigValue::new("some.key", Some("some value".to_owned()))
    );
}
