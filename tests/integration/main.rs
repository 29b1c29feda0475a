//! Integration tests for memocache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated to a temp cache dir and config file
    fn memocache(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("memocache");
        cmd.env_remove("MEMOCACHE_DIR")
            .env_remove("MEMOCACHE_CONFIG")
            .arg("--dir")
            .arg(temp.path().join("cache"))
            .arg("--config")
            .arg(temp.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("memocache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Persistent memoization cache"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("memocache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("memocache"));
    }

    #[test]
    fn set_then_get() {
        let temp = TempDir::new().unwrap();
        memocache(&temp)
            .args(["set", "foo", "\"bar\""])
            .assert()
            .success()
            .stdout(predicate::str::contains("Stored foo"));

        memocache(&temp)
            .args(["get", "foo"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"bar\""));
    }

    #[test]
    fn has_reports_presence() {
        let temp = TempDir::new().unwrap();
        memocache(&temp)
            .args(["has", "foo"])
            .assert()
            .success()
            .stdout(predicate::str::diff("false\n"));

        memocache(&temp)
            .args(["set", "foo", "[1, 2, 3, 4]", "--chunks", "2"])
            .assert()
            .success();

        memocache(&temp)
            .args(["has", "foo", "--index", "1"])
            .assert()
            .success()
            .stdout(predicate::str::diff("true\n"));
    }

    #[test]
    fn get_missing_key_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        memocache(&temp)
            .args(["get", "absent"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Missing cache key absent"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn compiled_backend_by_extension() {
        let temp = TempDir::new().unwrap();
        memocache(&temp)
            .args(["set", "m", "{\"a\": [1, 2]}", "--backend", "msl"])
            .assert()
            .success();

        assert!(temp.path().join("cache").join("m_0.msl").is_file());

        memocache(&temp)
            .args(["get", "m", "-b", "compiled-code"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"a\""));
    }

    #[test]
    fn raw_numeric_get_requires_layout() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("cache")).unwrap();
        let bytes: Vec<u8> = [1i32, 2, 3, 4]
            .iter()
            .flat_map(|x| x.to_ne_bytes())
            .collect();
        std::fs::write(temp.path().join("cache").join("nums_0.bin"), bytes).unwrap();

        memocache(&temp)
            .args(["get", "nums", "--backend", "raw-numeric"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--dtype"));

        memocache(&temp)
            .args([
                "get", "nums", "--backend", "bin", "--dtype", "int32", "--length", "2",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("4"));
    }

    #[test]
    fn list_shows_entries() {
        let temp = TempDir::new().unwrap();
        memocache(&temp)
            .args(["list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached entries"));

        memocache(&temp)
            .args(["set", "alpha", "[1, 2, 3, 4, 5, 6, 7, 8, 9]", "--chunks", "3"])
            .assert()
            .success();
        memocache(&temp)
            .args(["set", "beta", "true"])
            .assert()
            .success();

        memocache(&temp)
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("alpha\nbeta\n"));

        memocache(&temp)
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"chunks\": 3"))
            .stdout(predicate::str::contains("\"backend\": \"generic-object\""));
    }

    #[test]
    fn set_rejects_invalid_json() {
        let temp = TempDir::new().unwrap();
        memocache(&temp)
            .args(["set", "k", "{not json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        memocache(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        memocache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("chunks = 8"));
    }

    #[test]
    fn config_init_then_refuse() {
        let temp = TempDir::new().unwrap();
        memocache(&temp)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(temp.path().join("config.toml").is_file());

        memocache(&temp)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));

        memocache(&temp)
            .args(["config", "init", "--force"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
    }

    #[test]
    fn config_backend_is_the_default() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            "[cache]\nbackend = \"compiled-code\"\n",
        )
        .unwrap();

        memocache(&temp)
            .args(["set", "k", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("compiled-code"));
        assert!(temp.path().join("cache").join("k_0.msl").is_file());
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[cache]\nchunks = 0\n").unwrap();

        memocache(&temp)
            .args(["list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn zero_workers_config_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[cache]\nworkers = 0\n").unwrap();

        memocache(&temp)
            .args(["set", "k", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cache.workers"));
    }

    #[test]
    fn dir_flag_overrides_config_dir() {
        let temp = TempDir::new().unwrap();
        let configured = temp.path().join("configured");
        std::fs::write(
            temp.path().join("config.toml"),
            format!("[cache]\ndir = {:?}\n", configured.display().to_string()),
        )
        .unwrap();

        memocache(&temp).args(["set", "k", "1"]).assert().success();
        assert!(temp.path().join("cache").join("k_0.pkl").is_file());
        assert!(!configured.exists());
    }
}

mod store_tests {
    use memocache::cache::{Backend, CacheStore, Options, RawLayout};
    use memocache::config::CacheConfig;
    use memocache::{Dtype, NumericArray, Value};
    use std::num::NonZeroUsize;
    use tempfile::TempDir;

    fn n(count: usize) -> NonZeroUsize {
        NonZeroUsize::new(count).unwrap()
    }

    fn open(temp: &TempDir) -> CacheStore {
        CacheStore::open(&CacheConfig::with_dir(temp.path())).unwrap()
    }

    #[test]
    fn getset_string() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        store.set("foo", &"bar".into(), &Options::new()).unwrap();
        assert_eq!(store.get("foo", &Options::new()).unwrap(), Value::from("bar"));
        assert!(temp.path().join("foo_0.pkl").is_file());
    }

    #[test]
    fn compiled_code_string() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let options = Options::new().backend(Backend::CompiledCode);
        store.set("foo", &"bar".into(), &options).unwrap();
        assert_eq!(store.get("foo", &options).unwrap(), Value::from("bar"));
    }

    #[test]
    fn hundred_thousand_in_thirteen_chunks() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let value = Value::from((0..100_000i64).collect::<Vec<_>>());
        let options = Options::new().chunks(n(13));

        store.set("test_chunks", &value, &options).unwrap();
        for index in 0..13 {
            assert!(store.has("test_chunks", index, Backend::GenericObject));
        }
        assert!(!store.has("test_chunks", 13, Backend::GenericObject));
        assert_eq!(store.get("test_chunks", &options).unwrap(), value);
    }

    #[test]
    fn raw_numeric_hundred_thousand() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let arr = NumericArray::from((0..100_000i64).collect::<Vec<_>>());
        let options = Options::new()
            .backend(Backend::RawNumeric)
            .decode(RawLayout::new(Dtype::I64, n(100_000)));

        store.set("test_numpy", &Value::Array(arr.clone()), &options).unwrap();
        assert_eq!(
            std::fs::metadata(temp.path().join("test_numpy_0.bin"))
                .unwrap()
                .len(),
            800_000
        );

        let loaded = store.get("test_numpy", &options).unwrap();
        let arrays = loaded.as_sequence().unwrap();
        assert_eq!(arrays.len(), 1);
        assert_eq!(arrays[0].as_array(), Some(&arr));
    }

    #[test]
    fn chunk_count_invariance_every_backend() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let len = 26;
        let plain = Value::from((0..len as i64).collect::<Vec<_>>());
        let arrays = Value::List(
            (0..len)
                .map(|i| Value::Array(NumericArray::from(vec![i as u16, 0, 1])))
                .collect(),
        );

        for chunks in [1, 2, 13, len] {
            for backend in [Backend::GenericObject, Backend::CompiledCode] {
                let key = format!("plain_{chunks}");
                let options = Options::new().backend(backend).chunks(n(chunks));
                store.set(&key, &plain, &options).unwrap();
                assert_eq!(store.get(&key, &options).unwrap(), plain);
            }

            let key = format!("arrays_{chunks}");
            let options = Options::new()
                .backend(Backend::RawNumeric)
                .chunks(n(chunks))
                .decode(RawLayout::new(Dtype::U16, n(3)));
            store.set(&key, &arrays, &options).unwrap();
            assert_eq!(store.get(&key, &options).unwrap(), arrays);
        }
    }

    #[test]
    fn manifest_wins_over_caller_chunks() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let value = Value::from((0..1000i64).collect::<Vec<_>>());

        store.set("k", &value, &Options::new().chunks(n(13))).unwrap();
        assert!(temp.path().join("k.pkl.chunks").is_file());
        assert_eq!(store.get("k", &Options::new().chunks(n(3))).unwrap(), value);
    }

    #[test]
    fn non_sequences_ignore_chunk_count() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let value = Value::Map(vec![("a".into(), Value::from(vec![1, 2, 3]))]);

        store.set("map", &value, &Options::new().chunks(n(2))).unwrap();
        assert!(!store.has("map", 1, Backend::GenericObject));
        assert_eq!(store.get("map", &Options::new().chunks(n(2))).unwrap(), value);
    }

    #[test]
    fn legacy_json_file_reads_as_generic_object() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("old_0.pkl"), br#"["bar", 1, 2.5]"#).unwrap();
        let store = open(&temp);
        assert_eq!(
            store.get("old", &Options::new()).unwrap(),
            Value::List(vec!["bar".into(), Value::Int(1), Value::Float(2.5)])
        );
    }

    #[test]
    fn raw_length_mismatch_errors() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let options = Options::new().backend(Backend::RawNumeric);
        store
            .set("r", &NumericArray::from(vec![1.0f64, 2.0, 3.0]).into(), &options)
            .unwrap();

        let err = store
            .get("r", &options.decode(RawLayout::new(Dtype::F64, n(2))))
            .unwrap_err();
        assert!(matches!(
            err,
            memocache::CacheError::MalformedRawNumericData { len: 24, slice: 16 }
        ));
    }
}

mod memo_tests {
    use memocache::cache::{Backend, Options};
    use memocache::config::CacheConfig;
    use memocache::{CacheError, KeySpec, Memoizer, Value};
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn producer_runs_once_then_force() {
        let temp = TempDir::new().unwrap();
        let memo = Memoizer::open(&CacheConfig::with_dir(temp.path())).unwrap();
        let mut executed = 0;
        let mut load = || {
            executed += 1;
            Value::Int(executed)
        };

        memo.get_or_compute("test_getfunction", &Options::new(), &mut load)
            .unwrap();
        let cached = memo
            .get_or_compute("test_getfunction", &Options::new(), &mut load)
            .unwrap();
        assert_eq!(cached, Value::Int(1));

        let forced = memo
            .recompute("test_getfunction", &Options::new(), &mut load)
            .unwrap();
        assert_eq!(forced, Value::Int(2));
        assert_eq!(executed, 2);
    }

    #[test]
    fn composite_members_are_independent() {
        let temp = TempDir::new().unwrap();
        let memo = Memoizer::open(&CacheConfig::with_dir(temp.path())).unwrap();
        let specs = [
            KeySpec::new("left", Backend::GenericObject),
            KeySpec::new("right", Backend::CompiledCode),
        ];

        memo.get_all_or_compute(&specs, || vec![Value::from("l"), Value::from(vec![1, 2])])
            .unwrap();

        assert_eq!(
            memo.get("right", &Options::new().backend(Backend::CompiledCode))
                .unwrap(),
            Value::from(vec![1, 2])
        );
        assert!(matches!(
            memo.get("right", &Options::new()),
            Err(CacheError::MissingEntry { .. })
        ));
    }

    #[test]
    #[serial]
    fn default_dir_is_under_home() {
        let temp = TempDir::new().unwrap();
        let previous = std::env::var_os("HOME");
        std::env::set_var("HOME", temp.path());

        let memo = Memoizer::open(&CacheConfig::default());

        match previous {
            Some(home) => std::env::set_var("HOME", home),
            None => std::env::remove_var("HOME"),
        }

        let memo = memo.unwrap();
        assert_eq!(memo.store().dir(), temp.path().join(".memocache"));
        assert!(temp.path().join(".memocache").is_dir());
    }
}
