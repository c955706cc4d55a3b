use predicates::prelude::*;

use super::common::TestEnv;

fn app_env() -> TestEnv {
  let env = TestEnv::new();
  env.write_file("src/app.js", "var util = require('./util');\nutil.greet();\n");
  env.write_file("src/util.js", "exports.greet = function () {};\nglobal.greeted = true;\n");
  env.write_file("src/Main.qml", "import QtQuick 2.4\nItem {}\n");
  env
}

#[test]
fn build_rewrites_sources_and_lists_them() {
  let env = app_env();

  env
    .build_cmd(&["src"])
    .assert()
    .success()
    .stdout(predicate::str::contains(" - src/util.js"))
    .stdout(predicate::str::contains(" - src/app.js"))
    .stdout(predicate::str::contains(" - src/Main.qml"))
    .stdout(predicate::str::contains("Built 3 files"));

  let app = env.read_file("build/app.js");
  assert!(app.starts_with(".pragma library\n.import \"util.js\" as QML_util\n"));
  assert!(app.contains("var util = QML_util.module.exports;\n"));
  assert!(app.contains("var greeted = global.greeted = QML_util.global.greeted;\n"));
  assert!(!app.contains("require("));

  assert!(env.read_file("build/util.js").ends_with("var greeted = global.greeted;\n"));
  assert_eq!(env.read_file("build/Main.qml"), "import QtQuick 2.4\nItem {}\n");
  assert!(env.path(".qmlbridge_cache").is_file());
}

#[test]
fn second_build_is_a_noop() {
  let env = app_env();
  env.build_cmd(&["src"]).assert().success();

  env
    .build_cmd(&["src"])
    .assert()
    .success()
    .stdout(predicate::str::contains(" - src/").not())
    .stdout(predicate::str::contains("Everything up to date"));
}

#[test]
fn json_report_lists_actions_and_order() {
  let env = app_env();

  let output = env.build_cmd(&["src"]).args(["-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let built = json["built"].as_array().unwrap();
  assert_eq!(built.len(), 3);
  assert!(built.iter().any(|f| f["file"] == "src/Main.qml" && f["action"] == "copied"));
  assert!(built.iter().any(|f| f["file"] == "src/app.js" && f["action"] == "rewritten"));

  let order: Vec<&str> = json["build_order"]
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v.as_str().unwrap())
    .collect();
  assert_eq!(order, vec!["src/util.js", "src/app.js"]);
}

#[test]
fn polyfills_are_included_by_default() {
  let env = TestEnv::new();
  env.write_file("app.js", "var p = new Promise(function () {});\n");

  env
    .qmlbridge_cmd()
    .args(["build", "app.js", "build", "--no-babel"])
    .assert()
    .success();

  let app = env.read_file("build/app.js");
  assert!(app.contains(".import Quickly 0.1 as QML_Quickly\n"));
  assert!(app.contains("var Promise = _Polyfills.Promise;\n"));
}

#[test]
fn dependency_cycle_exits_with_status_1() {
  let env = TestEnv::new();
  env.write_file("a.js", "var b = require('./b');\n");
  env.write_file("b.js", "var a = require('./a');\n");

  env
    .build_cmd(&["a.js"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Dependency cycle:"))
    .stderr(predicate::str::contains(" - a.js\n - b.js\n - a.js"));
}

#[test]
fn extension_in_require_is_rejected() {
  let env = TestEnv::new();
  env.write_file("a.js", "var foo = require('./foo.js');\n");
  env.write_file("foo.js", "");

  env
    .build_cmd(&["a.js"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("use './foo'"));
}

#[test]
fn bare_name_of_local_file_suggests_relative_form() {
  let env = TestEnv::new();
  env.write_file("a.js", "var foo = require('foo');\n");
  env.write_file("foo.js", "");

  env
    .build_cmd(&["a.js"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("did you mean to require './foo'"));
}

#[test]
fn aborted_build_lists_files_built_before_the_failure() {
  let env = TestEnv::new();
  env.write_file("src/a.js", "exports.a = 1;\n");
  env.write_file("src/b.js", "var x = require('left-pad');\n");

  env
    .build_cmd(&["src"])
    .assert()
    .code(2)
    .stdout(predicate::str::contains(" - src/a.js"))
    .stdout(predicate::str::contains("src/b.js").not())
    .stderr(predicate::str::contains("cannot resolve 'left-pad'"));
}

#[test]
fn unresolved_import_exits_with_status_2() {
  let env = TestEnv::new();
  env.write_file("a.js", "var x = require('left-pad');\n");

  env
    .build_cmd(&["a.js"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("cannot resolve 'left-pad'"));
}

#[test]
fn external_packages_are_built_into_dependencies() {
  let env = TestEnv::new();
  env.write_file("node_modules/left-pad/package.json", r#"{ "name": "left-pad", "main": "pad.js" }"#);
  env.write_file("node_modules/left-pad/pad.js", "module.exports = function (s) { return s; };\n");
  env.write_file("app.js", "var pad = require('left-pad');\n");

  env
    .build_cmd(&["app.js"])
    .assert()
    .success()
    .stdout(predicate::str::contains(" - node_modules/left-pad/pad.js"));

  assert!(env.path("build/dependencies/left-pad/pad.js").is_file());
  assert!(env.read_file("build/app.js").contains(".import \"dependencies/left-pad/pad.js\" as QML_pad\n"));
}

#[cfg(unix)]
#[test]
fn lowering_command_output_is_rewritten() {
  let env = TestEnv::new();
  env.write_file("app.js", "var x = require('./x');\n");
  env.write_file("x.js", "");

  env
    .qmlbridge_cmd()
    .env("QMLBRIDGE_BABEL", "cat")
    .args(["build", "app.js", "build", "--no-polyfills"])
    .assert()
    .success();

  assert!(env.read_file("build/app.js").contains("var x = QML_x.module.exports;"));
}

#[cfg(unix)]
#[test]
fn failing_lowering_command_exits_with_status_2() {
  let env = TestEnv::new();
  env.write_file("app.js", "var x = 1;\n");

  env
    .qmlbridge_cmd()
    .env("QMLBRIDGE_BABEL", "false")
    .args(["build", "app.js", "build", "--no-polyfills"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("lowering"));
}
