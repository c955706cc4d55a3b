use predicates::prelude::*;

use super::common::TestEnv;

fn env_with_modules() -> TestEnv {
  let env = TestEnv::new();
  env.write_file(
    "qml/QtQuick/Controls/package.yml",
    "exports:\n  Slider: QtQuick.Controls/Slider 1.0\n  Button: QtQuick.Controls/Button 1.0\n",
  );
  env.write_file("qml/QtQuick/package.yml", "exports:\n  Item: QtQuick/Item\n");
  env
}

#[test]
fn modules_flag_prints_sorted_table() {
  let env = env_with_modules();

  let output = env.qmlbridge_cmd().args(["build", "--modules"]).output().unwrap();
  assert!(output.status.success());

  let stdout = String::from_utf8(output.stdout).unwrap();
  let lines: Vec<&str> = stdout.lines().collect();
  assert_eq!(lines[0], format!("{:25} {}", "ES6 Module Alias", "Actual QML import"));
  assert_eq!(lines[1], "-".repeat(70));
  assert_eq!(lines[2], format!("{:25} {}", "Button", "QtQuick.Controls/Button 1.0"));
  assert_eq!(lines[3], format!("{:25} {}", "Item", "QtQuick/Item"));
  assert_eq!(lines[4], format!("{:25} {}", "Slider", "QtQuick.Controls/Slider 1.0"));
  assert!(!env.path("build").exists());
}

#[test]
fn modules_flag_ignores_paths() {
  let env = env_with_modules();
  env.write_file("app.js", "var x = 1;\n");

  env
    .qmlbridge_cmd()
    .args(["build", "app.js", "build", "--modules"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Button"));
  assert!(!env.path("build").exists());
}

#[test]
fn modules_json_is_a_map() {
  let env = env_with_modules();

  let output = env.qmlbridge_cmd().args(["build", "--modules", "-o", "json"]).output().unwrap();
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["Item"], "QtQuick/Item");
}

#[test]
fn registered_module_is_imported_with_project_version() {
  let env = env_with_modules();
  env.write_file("package.yml", "dependencies:\n  Button: 1.4\n");
  env.write_file("app.js", "var Button = require('Button');\nvar Item = require('Item');\n");

  env
    .build_cmd(&["app.js"])
    .assert()
    .success()
    .stderr(predicate::str::contains("no version specified"));

  let app = env.read_file("build/app.js");
  assert!(app.contains(".import QtQuick.Controls 1.4 as QML_Button\n"));
  assert!(app.contains(".import QtQuick as QML_Item\n"));
  assert!(app.contains("var Button = (QML_Button.Button.module ? QML_Button.Button.module.exports : QML_Button.Button);"));
}
