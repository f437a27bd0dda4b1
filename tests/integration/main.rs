//! Integration tests for cadir

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Command isolated from user and project configuration
    fn cadir(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("cadir");
        cmd.current_dir(dir)
            .env("CADIR_CONFIG", dir.join("no-config.toml"))
            .env_remove("RUST_LOG")
            .arg("--no-local");
        cmd
    }

    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("app")).unwrap();
            fs::write(dir.path().join("app/deps.lock"), "pkg = 1.0.0\n").unwrap();
            Self { dir }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn restore(&self, extra: &[&str]) -> Command {
            let mut cmd = cadir(self.path());
            cmd.args([
                "-s",
                "app/deps",
                "-i",
                "app/deps.lock",
                "-d",
                "cache",
                "-w",
                "app",
                "-c",
                "mkdir -p deps && echo built >> deps/lib.txt && echo setup-ran",
            ])
            .args(extra);
            cmd
        }

        fn entries(&self) -> Vec<PathBuf> {
            fs::read_dir(self.path().join("cache"))
                .unwrap()
                .map(|e| e.unwrap().path())
                .filter(|p| p.is_dir())
                .collect()
        }
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        cadir(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--cache-source"))
            .stdout(predicate::str::contains("pack"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        cadir(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cadir"));
    }

    #[test]
    fn missing_required_flags_exit_1() {
        let temp = TempDir::new().unwrap();
        cadir(temp.path())
            .args(["-s", "deps"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("--identity-file"));
    }

    #[test]
    fn unknown_flag_exits_1() {
        let temp = TempDir::new().unwrap();
        cadir(temp.path()).arg("--bogus").assert().code(1);
    }

    #[test]
    fn missing_destination_exits_1() {
        let temp = TempDir::new().unwrap();
        cadir(temp.path())
            .args(["-s", "deps", "-i", "lock", "-c", "true"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("--cache-destination"));
    }

    #[test]
    fn unreadable_identity_exits_2() {
        let project = Project::new();
        fs::remove_file(project.path().join("app/deps.lock")).unwrap();

        project
            .restore(&[])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Error:"));
        assert!(!project.path().join("cache").exists());
    }

    #[test]
    fn failing_setup_exits_3() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("deps.lock"), "x").unwrap();

        cadir(temp.path())
            .args(["-s", "deps", "-i", "deps.lock", "-d", "cache", "-c", "exit 4"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Setup command failed"));
    }

    #[test]
    fn miss_then_hit() {
        let project = Project::new();

        project.restore(&[]).assert().success();
        let entries = project.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            fs::read_to_string(entries[0].join("lib.txt")).unwrap(),
            "built\n"
        );

        fs::write(project.path().join("app/deps/lib.txt"), "local edit\n").unwrap();
        project.restore(&[]).assert().success();

        // Setup did not run again; the entry was copied back
        assert_eq!(
            fs::read_to_string(project.path().join("app/deps/lib.txt")).unwrap(),
            "built\n"
        );
        assert_eq!(project.entries().len(), 1);
    }

    #[test]
    fn verbose_echoes_command_output() {
        let project = Project::new();

        project
            .restore(&["-v"])
            .assert()
            .success()
            .stdout(predicate::str::contains("setup-ran"));
    }

    #[test]
    fn quiet_run_prints_nothing() {
        let project = Project::new();

        project
            .restore(&[])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn finalize_failure_exits_4() {
        let project = Project::new();
        project.restore(&[]).assert().success();

        project
            .restore(&["-f", "exit 1"])
            .assert()
            .code(4)
            .stderr(predicate::str::contains("Finalize command failed"));
    }

    #[cfg(unix)]
    #[test]
    fn link_mode_creates_symlink() {
        let project = Project::new();
        project.restore(&[]).assert().success();

        project
            .restore(&["-l", "-f", "touch finalized"])
            .assert()
            .success();

        let source = project.path().join("app/deps");
        assert!(fs::symlink_metadata(&source)
            .unwrap()
            .file_type()
            .is_symlink());
        let target = fs::read_link(&source).unwrap();
        assert!(target.is_absolute());
        assert_eq!(fs::read_to_string(source.join("lib.txt")).unwrap(), "built\n");
        assert!(!project.path().join("app/finalized").exists());
    }

    #[test]
    fn journal_records_events() {
        let project = Project::new();
        let config = project.path().join("cadir.toml");
        fs::write(&config, "[cache]\njournal = true\n").unwrap();

        project
            .restore(&[])
            .env("CADIR_CONFIG", &config)
            .assert()
            .success();
        project
            .restore(&[])
            .env("CADIR_CONFIG", &config)
            .assert()
            .success();

        let journal = fs::read_to_string(project.path().join("cache/journal.log")).unwrap();
        let events: Vec<serde_json::Value> = journal
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event"], "cache.populated");
        assert_eq!(events[1]["event"], "cache.copied");
    }

    #[test]
    fn config_supplies_destination_and_setup() {
        let project = Project::new();
        let config = project.path().join("cadir.toml");
        fs::write(
            &config,
            "[cache]\nroot = \"cache\"\n\n[commands]\nsetup = \"mkdir -p deps && touch deps/ok\"\nworking_directory = \"app\"\n",
        )
        .unwrap();

        cadir(project.path())
            .env("CADIR_CONFIG", &config)
            .args(["-s", "app/deps", "-i", "app/deps.lock"])
            .assert()
            .success();

        assert_eq!(project.entries().len(), 1);
        assert!(project.entries()[0].join("ok").exists());
    }

    #[test]
    fn local_config_is_discovered() {
        let project = Project::new();
        fs::write(
            project.path().join(".cadir.toml"),
            "[cache]\nroot = \"local-cache\"\n",
        )
        .unwrap();

        cargo_bin_cmd!("cadir")
            .current_dir(project.path().join("app"))
            .env("CADIR_CONFIG", project.path().join("no-config.toml"))
            .args(["-s", "deps", "-i", "deps.lock", "-c", "mkdir -p deps"])
            .assert()
            .success();

        // Relative cache root resolves against the working directory of the process
        assert!(project.path().join("app/local-cache").is_dir());
    }

    #[test]
    fn invalid_config_exits_1() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("bad.toml");
        fs::write(&config, "[cache\n").unwrap();

        cadir(temp.path())
            .env("CADIR_CONFIG", &config)
            .args(["key", "anything"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn key_prints_sha256() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("empty.lock"), "").unwrap();

        cadir(temp.path())
            .args(["key", "empty.lock"])
            .assert()
            .success()
            .stdout(
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n",
            );
    }

    #[test]
    fn key_missing_file_exits_2() {
        let temp = TempDir::new().unwrap();
        cadir(temp.path()).args(["key", "nope"]).assert().code(2);
    }

    #[test]
    fn pack_unpack_roundtrip() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "alpha").unwrap();
        fs::write(src.join("nested/b.txt"), "beta").unwrap();

        cadir(temp.path())
            .args(["pack", "src", "out.tar.gz", "--level", "9"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Packed"));

        cadir(temp.path())
            .args(["unpack", "out.tar.gz", "restored"])
            .assert()
            .success();

        let restored = temp.path().join("restored");
        assert_eq!(fs::read_to_string(restored.join("a.txt")).unwrap(), "alpha");
        assert_eq!(
            fs::read_to_string(restored.join("nested/b.txt")).unwrap(),
            "beta"
        );
    }

    #[test]
    fn pack_bad_level_exits_10() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        cadir(temp.path())
            .args(["pack", "src", "out.tar.gz", "--level", "12"])
            .assert()
            .code(10);
        assert!(!temp.path().join("out.tar.gz").exists());
    }

    #[test]
    fn unpack_missing_archive_exits_10() {
        let temp = TempDir::new().unwrap();
        cadir(temp.path())
            .args(["unpack", "missing.tar.gz", "out"])
            .assert()
            .code(10);
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        cadir(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("no-config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        cadir(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("[archive]"));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        cadir(temp.path())
            .args(["config", "init"])
            .assert()
            .success();

        assert!(temp.path().join("no-config.toml").exists());
    }
}
