//! CLI integration tests for the bizdef binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("bizdef"))
}

// Helper to create a file inside the temp dir
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

const ORDER_ID: &str = "title: Order ID\ntype: string\npii: false\n";

const OPENAPI: &str = "openapi: 3.0.3
info:
  title: Orders
paths:
  /orders/{orderId}:
    get:
      parameters:
        - name: orderId
          in: path
          schema:
            x-business-definition: file://defs/order_id.yaml
components:
  schemas:
    Order:
      type: object
      properties:
        id:
          x-business-definition: file://defs/order_id.yaml
          type: integer
";

const ODCS: &str = "apiVersion: v3.0.2
kind: DataContract
schema:
  - name: orders
    properties:
      - name: order_id
        authoritativeDefinitions:
          - type: businessDefinition
            url: file://defs/order_id.yaml
";

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_temp_file(&dir, "defs/order_id.yaml", ORDER_ID);
    write_temp_file(&dir, "order-api.yaml", OPENAPI);
    write_temp_file(&dir, "order-data-contract.yaml", ODCS);
    dir
}

mod resolve_command {
    use super::*;

    #[test]
    fn resolve_to_output_file() {
        let dir = fixture();
        let output = dir.path().join("out.yaml");

        cmd()
            .args([
                "resolve",
                dir.path().join("order-api.yaml").to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Processed OpenAPI"));

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("x-pii: false"));
        assert!(content.contains("title: Order ID"));
        // authored type wins over the definition
        assert!(content.contains("type: integer"));
    }

    #[test]
    fn resolve_to_stdout() {
        let dir = fixture();

        cmd()
            .args([
                "resolve",
                dir.path().join("order-data-contract.yaml").to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("businessName: Order ID"))
            .stdout(predicate::str::contains("logicalType: string"));
    }

    #[test]
    fn resolve_with_explicit_kind() {
        let dir = fixture();
        let input = write_temp_file(
            &dir,
            "bare.yaml",
            "components:\n  schemas:\n    Id:\n      x-business-definition: file://defs/order_id.yaml\n",
        );

        cmd()
            .args(["resolve", input.to_str().unwrap(), "--kind", "openapi"])
            .assert()
            .success()
            .stdout(predicate::str::contains("x-pii: false"));
    }

    #[test]
    fn resolve_unknown_kind_fails() {
        let dir = fixture();

        cmd()
            .args([
                "resolve",
                dir.path().join("defs/order_id.yaml").to_str().unwrap(),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("cannot detect document kind"));
    }

    #[test]
    fn resolve_missing_definition_warns_and_succeeds() {
        let dir = TempDir::new().unwrap();
        let input = write_temp_file(
            &dir,
            "api.yaml",
            "openapi: 3.0.3\ncomponents:\n  schemas:\n    Id:\n      x-business-definition: file://defs/gone.yaml\n",
        );
        let output = dir.path().join("out.yaml");

        cmd()
            .args([
                "resolve",
                input.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stderr(predicate::str::contains("business definition not found"))
            .stderr(predicate::str::contains("gone.yaml"));

        assert!(output.exists());
    }

    #[test]
    fn resolve_other_scheme_is_silent() {
        let dir = TempDir::new().unwrap();
        let input = write_temp_file(
            &dir,
            "api.yaml",
            "openapi: 3.0.3\ncomponents:\n  schemas:\n    Id:\n      x-business-definition: https://example.com/order_id\n",
        );

        cmd()
            .args(["resolve", input.to_str().unwrap()])
            .assert()
            .success()
            .stderr(predicate::str::is_empty());
    }

    #[test]
    fn resolve_invalid_definition_writes_nothing() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "defs/order_id.yaml", "title: [unclosed\n");
        let input = write_temp_file(&dir, "order-api.yaml", OPENAPI);
        let output = dir.path().join("out.yaml");

        cmd()
            .args([
                "resolve",
                input.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid business definition"));

        assert!(!output.exists());
    }

    #[test]
    fn resolve_missing_input() {
        cmd()
            .args(["resolve", "/nonexistent/order-api.yaml"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn resolve_with_cache() {
        let dir = fixture();

        cmd()
            .args([
                "resolve",
                dir.path().join("order-api.yaml").to_str().unwrap(),
                "--cache",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("title: Order ID"));
    }
}

mod build_command {
    use super::*;

    #[test]
    fn build_defaults_in_working_directory() {
        let dir = fixture();

        cmd()
            .current_dir(dir.path())
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Processed OpenAPI order-api.yaml -> gen/order-api-resolved.yaml",
            ))
            .stdout(predicate::str::contains("Processed ODCS order-data-contract.yaml"));

        assert!(dir.path().join("gen/order-api-resolved.yaml").exists());
        let contract =
            fs::read_to_string(dir.path().join("gen/order-data-contract-resolved.yaml")).unwrap();
        assert!(contract.contains("businessName: Order ID"));
    }

    #[test]
    fn build_single_input_with_out_dir() {
        let dir = fixture();
        let out_dir = dir.path().join("site/resolved");

        cmd()
            .args([
                "build",
                "--odcs",
                dir.path().join("order-data-contract.yaml").to_str().unwrap(),
                "--out-dir",
                out_dir.to_str().unwrap(),
                "--quiet",
            ])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        assert!(out_dir.join("order-data-contract-resolved.yaml").exists());
        assert!(!out_dir.join("order-api-resolved.yaml").exists());
    }

    #[test]
    fn build_missing_default_input_fails() {
        let dir = TempDir::new().unwrap();

        cmd()
            .current_dir(dir.path())
            .arg("build")
            .assert()
            .code(3)
            .stderr(predicate::str::contains("order-api.yaml"));
    }
}

mod check_command {
    use super::*;

    #[test]
    fn check_clean_directory() {
        let dir = fixture();

        cmd()
            .args(["check", dir.path().to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 documents checked, all passed"));
    }

    #[test]
    fn check_broken_reference() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "order-api.yaml", OPENAPI);

        cmd()
            .args(["check", dir.path().to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E002"));
    }

    #[test]
    fn check_json_output() {
        let dir = TempDir::new().unwrap();
        let api = write_temp_file(&dir, "order-api.yaml", OPENAPI);

        let output = cmd()
            .args(["check", api.to_str().unwrap(), "--format", "json"])
            .assert()
            .code(1)
            .get_output()
            .stdout
            .clone();

        let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(result["files_checked"], 1);
        assert_eq!(result["errors"], 2);
        assert_eq!(result["results"][0]["diagnostics"][0]["code"], "E002");
    }

    #[test]
    fn check_strict_fails_on_warning() {
        let dir = TempDir::new().unwrap();
        write_temp_file(
            &dir,
            "api.yaml",
            "openapi: 3.0.3\ncomponents:\n  schemas:\n    Id:\n      x-business-definition: https://example.com/order_id\n",
        );

        cmd()
            .args(["check", dir.path().to_str().unwrap()])
            .assert()
            .success();

        cmd()
            .args(["check", dir.path().to_str().unwrap(), "--strict"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("W001"));
    }

    #[test]
    fn check_missing_path() {
        cmd()
            .args(["check", "/nonexistent/dir"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("path not found"));
    }
}
