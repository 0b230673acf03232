//! End-to-end tests for the `kiln` binary
//!
//! A shell script stands in for esbuild: it copies the entry file to the
//! `--outfile` path and fails for entries whose name contains "broken".

#![cfg(unix)]

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const STUB_ESBUILD: &str = r#"#!/bin/sh
entry="$1"
out=""
for arg in "$@"; do
  case "$arg" in
    --outfile=*) out="${arg#--outfile=}" ;;
  esac
done
case "$entry" in
  *broken*) echo "error: Unexpected end of file" >&2; exit 1 ;;
esac
cp "$entry" "$out"
"#;

struct Project {
    dir: TempDir,
    esbuild: PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let esbuild = dir.path().join("esbuild-stub.sh");
        fs::write(&esbuild, STUB_ESBUILD).unwrap();
        fs::set_permissions(&esbuild, fs::Permissions::from_mode(0o755)).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        Self { dir, esbuild }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join(relative)).unwrap()
    }

    fn kiln(&self) -> Command {
        let mut cmd = Command::cargo_bin("kiln").unwrap();
        cmd.current_dir(self.root())
            .env("KILN_ESBUILD", &self.esbuild)
            .env_remove("KILN_JSON")
            .env_remove("KILN_SOURCE_DIR")
            .env_remove("KILN_OUTPUT_DIR")
            .env_remove("KILN_LEDGER");
        cmd
    }
}

mod help_messages {
    use super::*;

    #[test]
    fn test_main_help_shows_commands() {
        Command::cargo_bin("kiln")
            .unwrap()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build"))
            .stdout(predicate::str::contains("status"))
            .stdout(predicate::str::contains("clean"))
            .stdout(predicate::str::contains("KILN_ESBUILD"));
    }

    #[test]
    fn test_build_help_shows_flags() {
        Command::cargo_bin("kiln")
            .unwrap()
            .args(["build", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--full"))
            .stdout(predicate::str::contains("--json"))
            .stdout(predicate::str::contains("--source"));
    }
}

mod build_command {
    use super::*;

    #[test]
    fn test_first_build_compiles_and_stamps() {
        let project = Project::new();
        project.write("src/app.ts", "export const app = 1;\n");

        project
            .kiln()
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::contains("Built src/app.ts"))
            .stdout(predicate::str::contains("1 built, 0 unchanged, 0 ignored"));

        let output = project.read("dist/app.js");
        assert!(output.starts_with("// Built: "));
        assert!(output.ends_with("export const app = 1;\n"));
        assert!(project.root().join(".build-cache.json").is_file());
    }

    #[test]
    fn test_second_build_is_a_no_op() {
        let project = Project::new();
        project.write("src/app.ts", "export const app = 1;\n");

        project.kiln().arg("build").assert().success();
        project
            .kiln()
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::contains("Unchanged src/app.ts"))
            .stdout(predicate::str::contains("0 built, 1 unchanged"));
    }

    #[test]
    fn test_ignored_file_is_skipped() {
        let project = Project::new();
        project.write("src/scratch.ts", "// @build ignore\nlet x = 1;\n");

        project
            .kiln()
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::contains("Skipping src/scratch.ts"));

        assert!(!project.root().join("dist/scratch.js").exists());
    }

    #[test]
    fn test_compile_failure_exits_non_zero() {
        let project = Project::new();
        project.write("src/broken.ts", "export const = ;\n");

        project
            .kiln()
            .arg("build")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Build failed"))
            .stderr(predicate::str::contains("Unexpected end of file"));
    }

    #[test]
    fn test_json_summary() {
        let project = Project::new();
        project.write("src/a.ts", "export const a = 1;\n");
        project.write("src/b.ts", "// @build ignore\n");

        let output = project.kiln().args(["build", "--json"]).output().unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["mode"], "incremental");
        assert_eq!(json["built"], 1);
        assert_eq!(json["ignored"], 1);
    }

    #[test]
    fn test_full_build_removes_orphans() {
        let project = Project::new();
        project.write("src/app.ts", "export const app = 1;\n");
        project.write("dist/stale.js", "// left over\n");

        project
            .kiln()
            .args(["build", "--full"])
            .assert()
            .success()
            .stdout(predicate::str::contains("full rebuild"));

        assert!(!project.root().join("dist/stale.js").exists());
        assert!(project.root().join("dist/app.js").is_file());
    }

    #[test]
    fn test_project_file_layout() {
        let project = Project::new();
        project.write("kiln.toml", "[build]\nsource = \"ts\"\noutput = \"code\"\n");
        project.write("ts/lib/util.ts", "export const util = 1;\n");

        project.kiln().arg("build").assert().success();

        assert!(project.root().join("code/lib/util.js").is_file());
    }

    #[test]
    fn test_missing_source_dir_fails() {
        let project = Project::new();

        project
            .kiln()
            .args(["build", "--source", "nowhere"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Source directory not found"));
    }
}

mod status_command {
    use super::*;

    #[test]
    fn test_status_reports_stale_without_building() {
        let project = Project::new();
        project.write("src/app.ts", "export const app = 1;\n");

        project
            .kiln()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("stale"))
            .stdout(predicate::str::contains("1 of 1 files would be rebuilt"));

        assert!(!project.root().join("dist").exists());
        assert!(!project.root().join(".build-cache.json").exists());
    }

    #[test]
    fn test_status_json_after_build() {
        let project = Project::new();
        project.write("src/app.ts", "export const app = 1;\n");
        project.kiln().arg("build").assert().success();

        let output = project.kiln().args(["status", "--json"]).output().unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["files"][0]["file"], "src/app.ts");
        assert_eq!(json["files"][0]["status"], "unchanged");
    }
}

mod clean_command {
    use super::*;

    #[test]
    fn test_clean_refuses_output_enclosing_project() {
        let project = Project::new();
        project.write("src/app.ts", "export const app = 1;\n");

        project
            .kiln()
            .args(["clean", "--output", "."])
            .assert()
            .failure()
            .stderr(predicate::str::contains("must not contain"));

        assert!(project.root().join("src/app.ts").is_file());
    }

    #[test]
    fn test_clean_removes_outputs_and_ledger() {
        let project = Project::new();
        project.write("src/app.ts", "export const app = 1;\n");
        project.kiln().arg("build").assert().success();

        project.kiln().arg("clean").assert().success();

        assert!(!project.root().join("dist").exists());
        assert!(!project.root().join(".build-cache.json").exists());
        assert!(project.root().join("src/app.ts").is_file());
    }
}
