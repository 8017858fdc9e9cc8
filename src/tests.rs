use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::config::{parse_file, parse_str, Config};
use crate::error::ConfigError;
use crate::tree::{Format, SettingType};

// ── Shared fixture runners ──────────────────────────────────────────

/// Embed fixture files at compile time.
const PARSE_FIXTURES: &str = include_str!("../test-data/fixtures/parse.json");
const PARSE_ERROR_FIXTURES: &str = include_str!("../test-data/fixtures/parse-errors.json");

fn parse(input: &str) -> Config {
    parse_str(input, ".").unwrap()
}

fn parse_err(input: &str) -> ConfigError {
    match parse_str(input, ".") {
        Ok(config) => panic!("expected an error for '{}', got:\n{}", input, config),
        Err(err) => err,
    }
}

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

#[test]
fn test_fixture_parse() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(PARSE_FIXTURES).unwrap();

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let input = fixture["input"].as_str().unwrap();
        let expected = &fixture["expected"];

        let config = match parse_str(input, ".") {
            Ok(config) => config,
            Err(err) => panic!("Fixture '{}': unexpected error: {}", name, err),
        };
        let actual: serde_json::Value = serde_json::from_str(&config.to_json()).unwrap();
        assert_eq!(&actual, expected, "Fixture '{}': JSON mismatch", name);

        // Every fixture must also survive a print/parse round trip.
        let reparsed = match parse_str(&config.to_string(), ".") {
            Ok(reparsed) => reparsed,
            Err(err) => panic!(
                "Fixture '{}': printed form does not parse: {}\n{}",
                name, err, config
            ),
        };
        assert_eq!(reparsed, config, "Fixture '{}': round trip changed the tree", name);
    }
}

#[test]
fn test_fixture_parse_errors() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(PARSE_ERROR_FIXTURES).unwrap();

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let input = fixture["input"].as_str().unwrap();
        let message = fixture["message"].as_str().unwrap();

        let err = match parse_str(input, ".") {
            Ok(_) => panic!("Fixture '{}': expected a syntax error for '{}'", name, input),
            Err(err) => err,
        };
        let syntax = match err.as_syntax() {
            Some(syntax) => syntax,
            None => panic!("Fixture '{}': expected a syntax error, got {:?}", name, err),
        };
        assert!(
            syntax.message.contains(message),
            "Fixture '{}': message '{}' does not contain '{}'",
            name,
            syntax.message,
            message
        );
        if let Some(line) = fixture.get("line").and_then(|v| v.as_u64()) {
            assert_eq!(syntax.position.line as u64, line, "Fixture '{}': line", name);
        }
        if let Some(column) = fixture.get("column").and_then(|v| v.as_u64()) {
            assert_eq!(syntax.position.column as u64, column, "Fixture '{}': column", name);
        }
    }
}

// ── Navigation ──────────────────────────────────────────────────────

#[test]
fn test_lookup_by_path() {
    let config = parse("a = { b = 5; c = [1, 2, 3]; };");
    assert_eq!(config.lookup("a.b").unwrap().value::<i32>().unwrap(), 5);
    let item = config.lookup("a.c.[1]").unwrap();
    assert!(config.lookup("a.c").unwrap().is_array());
    assert_eq!(item.value::<i32>().unwrap(), 2);
    assert_eq!(item.path(), "a.c.[1]");

    let err = config.lookup("a.z").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.path(), Some("a.z"));
}

#[test]
fn test_lookup_relative_to_setting() {
    let config = parse("a = { b = { c = \"deep\"; }; };");
    let a = config.lookup("a").unwrap();
    assert_eq!(a.lookup("b.c").unwrap().value::<String>().unwrap(), "deep");
    assert_eq!(a.lookup_value::<String>("b.c").as_deref(), Some("deep"));
}

#[test]
fn test_index_on_group_follows_key_order() {
    let config = parse("g = { y = 1; x = 2; };");
    assert_eq!(config.lookup("g.[0]").unwrap().name(), "x");
    assert_eq!(config.lookup("g.[1]").unwrap().name(), "y");
    assert!(config.lookup("g.[2]").unwrap_err().is_not_found());
}

#[test]
fn test_malformed_paths() {
    let config = parse("a = { b = 1; };");
    for path in ["", ".a", "a."] {
        let err = config.lookup(path).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidArgument(_)),
            "path '{}' gave {:?}",
            path,
            err
        );
        assert!(config.exists(path).is_err());
    }
}

#[test]
fn test_exists() {
    let config = parse("a = { b = 1; }; l = (1);");
    assert!(config.exists("a.b").unwrap());
    assert!(config.exists("l.[0]").unwrap());
    assert!(!config.exists("a.c").unwrap());
    assert!(!config.exists("l.[1]").unwrap());
    assert!(!config.exists("a.b.c").unwrap());
}

#[test]
fn test_name_lookup_on_list_misses() {
    let config = parse("l = (1, 2);");
    assert!(config.lookup("l.x").unwrap_err().is_not_found());
}

#[test]
fn test_parent_path_and_index() {
    let config = parse("a = { b = (10, 20); };");
    let item = config.lookup("a.b.[1]").unwrap();
    assert_eq!(item.path(), "a.b.[1]");
    assert_eq!(item.index(), Some(1));
    assert_eq!(item.name(), "");
    assert_eq!(item.parent().unwrap().name(), "b");
    assert_eq!(item.parent().unwrap().parent().unwrap().path(), "a");

    let root = config.root();
    assert!(root.is_root());
    assert_eq!(root.path(), "");
    assert_eq!(root.index(), None);
    assert!(root.parent().unwrap_err().is_not_found());
}

#[test]
fn test_children_iterate_in_order() {
    let config = parse("l = (3, \"x\", true);");
    let l = config.lookup("l").unwrap();
    let types: Vec<SettingType> = l.children().map(|s| s.setting_type()).collect();
    assert_eq!(
        types,
        [SettingType::Int, SettingType::String, SettingType::Bool]
    );
    assert_eq!(l.len(), 3);
    assert!(l.get(2).unwrap().value::<bool>().unwrap());
    let err = l.get(3).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.path(), Some("l.[3]"));
}

#[test]
fn test_get_mut_miss_reports_full_path() {
    let mut config = parse("g = { l = (1); };");
    let err = config.lookup_mut("g.l").unwrap().get_mut(4).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.path(), Some("g.l.[4]"));
}

#[test]
fn test_source_lines() {
    let config = parse("a = 1;\n\nb = {\n  c = 2;\n};");
    assert_eq!(config.lookup("a").unwrap().source_line(), Some(1));
    assert_eq!(config.lookup("b").unwrap().source_line(), Some(3));
    assert_eq!(config.lookup("b.c").unwrap().source_line(), Some(4));
    assert_eq!(config.lookup("b.c").unwrap().source_file(), None);
    assert_eq!(config.root().source_line(), None);
}

// ── Typed extraction ────────────────────────────────────────────────

#[test]
fn test_numeric_narrowing() {
    let config = parse("big = 5000000000; small = 5L;");
    let big = config.lookup("big").unwrap();
    assert_eq!(big.setting_type(), SettingType::Int64);
    assert_eq!(big.value::<i64>().unwrap(), 5_000_000_000);

    let err = big.value::<i32>().unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(err.path(), Some("big"));

    assert_eq!(config.lookup("small").unwrap().value::<i32>().unwrap(), 5);
}

#[test]
fn test_unsigned_targets() {
    let config = parse("neg = -1; ok = 7; big = 5000000000;");
    let err = config.lookup("neg").unwrap().value::<u32>().unwrap_err();
    assert!(matches!(err, ConfigError::Type { ref message, .. } if message == "negative value"));
    assert_eq!(config.lookup_value::<u32>("ok"), Some(7));
    assert_eq!(config.lookup_value::<u64>("big"), Some(5_000_000_000));
    assert_eq!(config.lookup_value::<u32>("big"), None);
}

#[test]
fn test_float_and_bool_conversions() {
    let config = parse("i = 3; f = 2.5; t = true; s = \"text\";");
    assert_eq!(config.lookup_value::<f64>("i"), Some(3.0));
    assert_eq!(config.lookup_value::<f32>("f"), Some(2.5));
    assert_eq!(config.lookup_value::<bool>("i"), Some(true));
    assert_eq!(config.lookup_value::<i32>("t"), Some(1));
    assert_eq!(config.lookup_value::<f64>("t"), None);
    assert_eq!(config.lookup_value::<i32>("f"), None);
    assert_eq!(config.lookup_value::<String>("i"), None);
    assert_eq!(config.lookup_value::<i32>("s"), None);
}

#[test]
fn test_value_on_container_is_type_error() {
    let config = parse("g = { a = 1; };");
    assert!(config.lookup("g").unwrap().value::<i32>().unwrap_err().is_type_error());
}

#[test]
fn test_lookup_value_swallows_errors() {
    let config = parse("a = 1;");
    assert_eq!(config.lookup_value::<i32>("a"), Some(1));
    assert_eq!(config.lookup_value::<i32>("missing"), None);
    assert_eq!(config.lookup_value::<i32>(""), None);
}

// ── Mutation ────────────────────────────────────────────────────────

#[test]
fn test_add_zero_values() {
    let mut config = Config::new();
    let mut root = config.root_mut();
    root.add("n", SettingType::Int).unwrap();
    root.add("s", SettingType::String).unwrap();
    root.add("g", SettingType::Group).unwrap();
    assert_eq!(config.lookup_value::<i32>("n"), Some(0));
    assert_eq!(config.lookup_value::<String>("s").as_deref(), Some(""));
    assert!(config.lookup("g").unwrap().is_group());
}

#[test]
fn test_group_names_are_unique() {
    let mut config = parse("g = { a = 1; };");
    let mut g = config.lookup_mut("g").unwrap();
    let err = g.add("a", SettingType::Int).unwrap_err();
    assert!(matches!(err, ConfigError::SettingNameConflict { ref path } if path == "g.a"));

    let err = g.add("", SettingType::Int).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidArgument(_)));
}

#[test]
fn test_array_homogeneity() {
    let mut config = parse("a = [1, 2];");
    let mut array = config.lookup_mut("a").unwrap();
    assert!(array.add_value("", "x").unwrap_err().is_type_error());
    assert!(array.add("", SettingType::Group).unwrap_err().is_type_error());
    array.add_value("ignored", 3).unwrap();

    let a = config.lookup("a").unwrap();
    assert_eq!(a.len(), 3);
    assert_eq!(a.get(2).unwrap().name(), "");
    assert_eq!(a.get(2).unwrap().value::<i32>().unwrap(), 3);
}

#[test]
fn test_float_into_int_array_leaves_it_unchanged() {
    let mut config = parse("a = [1, 2];");
    let before = config.clone();
    let err = config.lookup_mut("a").unwrap().add_value("", 1.5f32).unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(config, before);
}

#[test]
fn test_empty_array_takes_first_type() {
    let mut config = parse("a = [];");
    let mut array = config.lookup_mut("a").unwrap();
    array.add_value("", "first").unwrap();
    assert!(array.add_value("", 1).unwrap_err().is_type_error());
}

#[test]
fn test_add_on_scalar_not_supported() {
    let mut config = parse("a = 1;");
    let mut a = config.lookup_mut("a").unwrap();
    let err = a.add("b", SettingType::Int).unwrap_err();
    assert!(matches!(err, ConfigError::OperationNotSupported { operation: "add", .. }));
}

#[test]
fn test_remove_by_path() {
    let mut config = parse("a = { b = 1; c = 2; }; l = (1, 2, 3);");
    config.remove("a.b").unwrap();
    assert!(!config.exists("a.b").unwrap());
    assert!(config.exists("a.c").unwrap());

    config.remove("l.[0]").unwrap();
    let l = config.lookup("l").unwrap();
    assert_eq!(l.len(), 2);
    assert_eq!(l.get(0).unwrap().value::<i32>().unwrap(), 2);

    let err = config.remove("a.zz").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.path(), Some("a.zz"));
    assert!(config.remove("nope.x").unwrap_err().is_not_found());
}

#[test]
fn test_remove_whole_subtree() {
    let mut config = parse("g = { h = { i = (1, 2); }; }; keep = 1;");
    config.remove("g").unwrap();
    assert!(!config.exists("g").unwrap());
    assert_eq!(config.root().len(), 1);
    assert_eq!(config.to_string(), "keep = 1;\n");
}

#[test]
fn test_remove_at() {
    let mut config = parse("l = (\"a\", \"b\", \"c\");");
    let mut l = config.lookup_mut("l").unwrap();
    l.remove_at(1).unwrap();
    let err = l.remove_at(5).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.path(), Some("l.[5]"));

    let values: Vec<String> = config
        .lookup("l")
        .unwrap()
        .children()
        .map(|s| s.value::<String>().unwrap())
        .collect();
    assert_eq!(values, ["a", "c"]);
}

#[test]
fn test_set_converts_into_fixed_type() {
    let mut config = parse("i = 1; s = \"x\"; g = {};");
    config.lookup_mut("i").unwrap().set(42i64).unwrap();
    assert_eq!(config.lookup("i").unwrap().setting_type(), SettingType::Int);
    assert_eq!(config.lookup_value::<i32>("i"), Some(42));

    let err = config.lookup_mut("i").unwrap().set(5_000_000_000i64).unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(config.lookup_value::<i32>("i"), Some(42));

    assert!(config.lookup_mut("s").unwrap().set(1).unwrap_err().is_type_error());
    config.lookup_mut("s").unwrap().set("y").unwrap();
    assert_eq!(config.lookup_value::<String>("s").as_deref(), Some("y"));

    let err = config.lookup_mut("g").unwrap().set(1).unwrap_err();
    assert!(matches!(err, ConfigError::OperationNotSupported { operation: "set", .. }));
}

#[test]
fn test_set_format_hex() {
    let mut config = Config::new();
    config.root_mut().add_value("h", 255).unwrap().set_format(Format::Hex);
    config.root_mut().add_value("s", "x").unwrap().set_format(Format::Hex);
    assert_eq!(config.lookup("h").unwrap().format(), Format::Hex);
    assert_eq!(config.lookup("s").unwrap().format(), Format::Default);
    assert_eq!(config.to_string(), "h = 0xff;\ns = \"x\";\n");
}

#[test]
fn test_add_copy_from_other_document() {
    let source = parse("g = { x = 1; y = (1, \"a\"); };");
    let mut config = parse("keep = true;");
    config
        .root_mut()
        .add_copy(source.lookup("g").unwrap())
        .unwrap();

    assert_eq!(config.lookup_value::<String>("g.y.[1]").as_deref(), Some("a"));
    assert_eq!(config.lookup("g.x").unwrap().parent().unwrap().name(), "g");
    assert_eq!(config.lookup("g").unwrap(), source.lookup("g").unwrap());

    let err = config
        .root_mut()
        .add_copy(source.lookup("g").unwrap())
        .unwrap_err();
    assert!(matches!(err, ConfigError::SettingNameConflict { .. }));
}

#[test]
fn test_add_copy_into_list_drops_name() {
    let source = parse("g = { x = 1; };");
    let mut config = parse("l = ();");
    config
        .lookup_mut("l")
        .unwrap()
        .add_copy(source.lookup("g").unwrap())
        .unwrap();
    let copied = config.lookup("l.[0]").unwrap();
    assert_eq!(copied.name(), "");
    assert_eq!(copied.lookup_value::<i32>("x"), Some(1));
}

#[test]
fn test_clone_is_independent() {
    let original = parse("a = { b = 1; };");
    let mut copy = original.clone();
    copy.lookup_mut("a.b").unwrap().set(2).unwrap();
    assert_eq!(original.lookup_value::<i32>("a.b"), Some(1));
    assert_eq!(copy.lookup_value::<i32>("a.b"), Some(2));
    assert_eq!(copy.lookup("a.b").unwrap().parent().unwrap().name(), "a");
    assert_ne!(original, copy);
}

#[test]
fn test_failed_read_keeps_settings() {
    let mut config = parse("a = 1;");
    assert!(config.read_str("b = ").is_err());
    assert_eq!(config.lookup_value::<i32>("a"), Some(1));
    assert!(!config.exists("b").unwrap());
}

// ── Printing ────────────────────────────────────────────────────────

#[test]
fn test_print_layout() {
    let config = parse("a = 1; g = { b = \"x\"; l = (1, 2); arr = [1, 2]; };");
    let expected = "\
a = 1;
g = {
    arr = [1, 2];
    b = \"x\";
    l = (
        1,
        2
    );
};
";
    assert_eq!(config.to_string(), expected);
}

#[test]
fn test_print_empty_root() {
    assert_eq!(Config::new().to_string(), "");
    assert_eq!(parse("g = {}; l = ();").to_string(), "g = {};\nl = ();\n");
}

#[test]
fn test_print_scalars() {
    let config = parse("h = 0xFF; w = 0x1FFL; n = 5000000000; f = 2.0; s = \"a\\\"b\\n\";");
    let text = config.to_string();
    assert!(text.contains("h = 0xff;"), "{}", text);
    assert!(text.contains("w = 0x1ffL;"), "{}", text);
    assert!(text.contains("n = 5000000000L;"), "{}", text);
    assert!(text.contains("f = 2.0;"), "{}", text);
    assert!(text.contains("s = \"a\\\"b\\n\";"), "{}", text);
}

#[test]
fn test_non_finite_floats_never_stored() {
    let err = parse_err("big = 1e39;");
    assert!(err.as_syntax().unwrap().message.contains("float out of range"));

    let mut config = parse("f = 1.5; l = ();");
    let err = config.lookup_mut("f").unwrap().set(f32::NAN).unwrap_err();
    assert!(err.is_type_error());
    assert!(config
        .lookup_mut("l")
        .unwrap()
        .add_value("", f32::INFINITY)
        .unwrap_err()
        .is_type_error());
    assert_eq!(config.lookup_value::<f32>("f"), Some(1.5));
    assert!(config.lookup("l").unwrap().is_empty());
}

#[test]
fn test_extreme_floats_round_trip() {
    let mut config = parse("max = 3.4028235e38; tiny = 1e-30; neg = -2.5e-3;");
    config.root_mut().add_value("added", f32::MIN).unwrap();
    let reparsed = parse(&config.to_string());
    assert_eq!(reparsed, config);
    assert_eq!(reparsed.lookup_value::<f32>("max"), Some(f32::MAX));
}

#[test]
fn test_config_can_cross_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Config>();

    let shared = std::sync::Arc::new(std::sync::Mutex::new(parse("n = 1;")));
    let worker = {
        let shared = std::sync::Arc::clone(&shared);
        std::thread::spawn(move || {
            shared.lock().unwrap().lookup_mut("n").unwrap().set(2).unwrap();
        })
    };
    worker.join().unwrap();
    assert_eq!(shared.lock().unwrap().lookup_value::<i32>("n"), Some(2));
}

#[test]
fn test_round_trip() {
    let source = "\
# application settings
name = \"demo\" \" app\";
version = 3;
ratio = 2.34;
limits = { max = 5000000000; mask = 0xFF00; enabled = TRUE; };
hosts = [\"a\", \"b\"];
mixed = (1, \"two\", { three = 3.5; }, [4L, 5L], ());
";
    let config = parse(source);
    let printed = config.to_string();
    let reparsed = parse(&printed);
    assert_eq!(reparsed, config);
    assert_eq!(reparsed.to_string(), printed);
    assert_eq!(reparsed.lookup("limits.mask").unwrap().format(), Format::Hex);
}

#[test]
fn test_setting_display() {
    let config = parse("g = { a = 1; };");
    assert_eq!(
        config.lookup("g").unwrap().to_string(),
        "g = {\n    a = 1;\n}"
    );
    assert_eq!(config.lookup("g.a").unwrap().to_string(), "a = 1");
}

// ── JSON ────────────────────────────────────────────────────────────

#[test]
fn test_json_pretty() {
    let config = parse("a = { b = [1, 2]; };");
    assert_eq!(
        config.to_json_pretty(),
        "{\n  \"a\": {\n    \"b\": [\n      1,\n      2\n    ]\n  }\n}"
    );
    assert_eq!(config.to_json(), "{\"a\":{\"b\":[1,2]}}");
}

#[test]
fn test_json_escapes_strings() {
    let mut config = Config::new();
    config.root_mut().add_value("s", "q\"b\\\r\u{1}").unwrap();
    assert_eq!(config.to_json(), r#"{"s":"q\"b\\\u000d\u0001"}"#);
    let v: serde_json::Value = serde_json::from_str(&config.to_json()).unwrap();
    assert_eq!(v["s"], "q\"b\\\r\u{1}");
}

#[test]
fn test_json_of_setting() {
    let config = parse("l = (\"x\\ty\", 1.5);");
    let json = crate::json::to_json(config.lookup("l").unwrap());
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v, serde_json::json!(["x\ty", 1.5]));
}

// ── Syntax errors ───────────────────────────────────────────────────

#[test]
fn test_error_position_on_second_line() {
    let err = parse_err("a = 1;\nb = [1, \"x\"];");
    let syntax = err.as_syntax().unwrap();
    assert_eq!(syntax.position.line, 2);
    assert_eq!(syntax.position.column, 9);
    assert_eq!(syntax.file, None);
    assert_eq!(
        syntax.to_string(),
        "<input>:2:9: array elements must have the same type"
    );
}

#[test]
fn test_escaped_quote_and_trailing_comment() {
    let config = parse("name = \"a\\\"b\"; # comment\n");
    assert_eq!(config.lookup_value::<String>("name").as_deref(), Some("a\"b"));
    assert_eq!(config.root().len(), 1);
}

#[test]
fn test_unterminated_block_comment_position() {
    let err = parse_err("a = 1;\n  /* never closed\nb = 2;");
    let syntax = err.as_syntax().unwrap();
    assert_eq!(syntax.message, "unterminated comment");
    assert_eq!(syntax.position.line, 2);
    assert_eq!(syntax.position.column, 3);
}

// ── Files & includes ────────────────────────────────────────────────

#[test]
fn test_read_simple_config() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/test-data/simple_config.cfg");
    let config = parse_file(path, ".").unwrap();
    assert_eq!(config.lookup_value::<i32>("int"), Some(1));
    let double = config.lookup_value::<f64>("double").unwrap();
    assert!((double - 2.34).abs() < 1e-5);
    assert_eq!(config.lookup_value::<String>("string").as_deref(), Some("string"));
    assert_eq!(
        config.lookup("int").unwrap().source_file(),
        Some(Path::new(path))
    );
}

#[test]
fn test_read_file_relative_to_include_dir() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app.cfg", "port = 8080;");
    let config = parse_file("app.cfg", dir.path()).unwrap();
    assert_eq!(config.lookup_value::<u32>("port"), Some(8080));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = parse_file("absent.cfg", dir.path()).unwrap_err();
    assert!(err.is_io_error());
    assert!(matches!(
        parse_file("", dir.path()).unwrap_err(),
        ConfigError::InvalidArgument(_)
    ));
}

#[test]
fn test_write_then_read() {
    let dir = TempDir::new().unwrap();
    let config = parse("a = { b = (1, \"two\"); c = 0x10; }; f = 0.5;");
    config.write_file(dir.path().join("out.cfg")).unwrap();

    let mut reread = Config::with_include_dir(dir.path());
    reread.read_file("out.cfg").unwrap();
    assert_eq!(reread, config);

    let err = config
        .write_file(dir.path().join("missing").join("out.cfg"))
        .unwrap_err();
    assert!(err.is_io_error());
}

#[test]
fn test_include_glob() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sub/b.cfg", "b = 2;");
    write(dir.path(), "sub/a.cfg", "a = 1;");
    write(dir.path(), "sub/skip.txt", "c = 3;");

    let config = parse_str("@include \"sub/*.cfg\"\nmain = 0;", dir.path()).unwrap();
    assert_eq!(config.lookup_value::<i32>("a"), Some(1));
    assert_eq!(config.lookup_value::<i32>("b"), Some(2));
    assert_eq!(config.lookup_value::<i32>("main"), Some(0));
    assert!(!config.exists("c").unwrap());

    let a = config.lookup("a").unwrap();
    assert_eq!(a.source_file(), Some(dir.path().join("sub").join("a.cfg").as_path()));
    assert_eq!(a.source_line(), Some(1));
}

#[test]
fn test_include_glob_wildcards() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sub/a.cfg", "a = 1;");
    write(dir.path(), "sub/b.cfg", "b = 2;");
    write(dir.path(), "sub/ab.cfg", "ab = 3;");

    let config = parse_str("@include \"sub/?.cfg\"", dir.path()).unwrap();
    assert!(config.exists("a").unwrap());
    assert!(config.exists("b").unwrap());
    assert!(!config.exists("ab").unwrap());

    let config = parse_str("@include \"sub/[b]*.cfg\"", dir.path()).unwrap();
    assert!(!config.exists("a").unwrap());
    assert!(config.exists("b").unwrap());
    assert!(!config.exists("ab").unwrap());
}

#[test]
fn test_include_literal_and_regex() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sub/a.cfg", "a = 1;");
    write(dir.path(), "sub/b.cfg", "b = 2;");
    write(dir.path(), "sub/c.cfg", "c = 3;");

    let config = parse_str("@include \"sub/a.cfg\"", dir.path()).unwrap();
    assert!(config.exists("a").unwrap());
    assert!(!config.exists("b").unwrap());

    let config = parse_str(r#"@include "sub/[ab]\\.cfg""#, dir.path()).unwrap();
    assert!(config.exists("a").unwrap());
    assert!(config.exists("b").unwrap());
    assert!(!config.exists("c").unwrap());
}

#[test]
fn test_include_inside_group() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "db.cfg", "host = \"localhost\"; port = 5432;");
    let config = parse_str("db = {\n@include \"db.cfg\"\n};", dir.path()).unwrap();
    assert_eq!(config.lookup_value::<i32>("db.port"), Some(5432));
}

#[test]
fn test_include_without_matches_is_empty() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let config = parse_str("@include \"sub/*.cfg\"\na = 1;", dir.path()).unwrap();
    assert_eq!(config.root().len(), 1);
}

#[test]
fn test_include_missing_directory() {
    let dir = TempDir::new().unwrap();
    let err = parse_str("@include \"nodir/*.cfg\"", dir.path()).unwrap_err();
    assert!(err.is_io_error());
}

#[test]
fn test_include_nested_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.cfg", "@include \"inner/one.cfg\"\ntop = 1;");
    write(dir.path(), "inner/one.cfg", "@include \"inner/two.cfg\"\none = 1;");
    write(dir.path(), "inner/two.cfg", "two = 2;");

    let config = parse_file("main.cfg", dir.path()).unwrap();
    assert_eq!(config.root().len(), 3);
    assert_eq!(config.lookup_value::<i32>("two"), Some(2));
}

#[test]
fn test_include_cycle_stops_at_depth_limit() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "loop.cfg", "@include \"loop.cfg\"");
    let err = parse_file("loop.cfg", dir.path()).unwrap_err();
    let syntax = err.as_syntax().unwrap();
    assert!(syntax.message.contains("deeper than 10"), "{}", syntax.message);
    assert_eq!(syntax.file.as_deref(), Some(dir.path().join("loop.cfg").as_path()));
}

#[test]
fn test_syntax_error_in_included_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "parts/bad.cfg", "ok = 1;\nx = ;");
    let err = parse_str("a = 1;\n@include \"parts/bad.cfg\"", dir.path()).unwrap_err();
    let syntax = err.as_syntax().unwrap();
    assert_eq!(syntax.position.line, 2);
    assert_eq!(
        syntax.file.as_deref(),
        Some(dir.path().join("parts").join("bad.cfg").as_path())
    );
}
