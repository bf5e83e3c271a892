//! Tests for the `c99conv` binary: argument handling and exit statuses.

#![cfg(unix)]

mod common;

use common::Fixture;
use std::process::{Command, Output};

fn c99conv() -> Command {
    Command::new(env!("CARGO_BIN_EXE_c99conv"))
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn no_arguments_prints_usage_and_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let out = c99conv().current_dir(dir.path()).output().unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("usage: c99conv <input file> <output file>"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn one_argument_prints_usage_and_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let out = c99conv()
        .arg("vp8.c")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).starts_with("C99 to C89 Converter Wrapper"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn successful_run_exits_0_and_prints_kept_lines() {
    let fx = Fixture::new();
    let output = fx.output("vp8_c89.c");
    let out = c99conv()
        .arg("--project-root")
        .arg(&fx.root)
        .arg("--cc")
        .arg(fx.fake_cl_command())
        .arg("--no-progress")
        .arg(&fx.input)
        .arg(&output)
        .args(["-I", "out/Release/gen"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(stdout(&out), "note: kept line\n");
    assert!(output.exists());
    assert!(!fx.intermediate().exists());
    assert!(fx.recorded_args().windows(2).any(|w| w == ["-I", "out/Release/gen"]));
}

#[test]
fn preprocess_failure_status_is_passed_through() {
    let fx = Fixture::new();
    fx.use_fake_cl_via_build_env();
    fx.set_compiler_exit(3);
    let out = c99conv()
        .arg("--project-root")
        .arg(&fx.root)
        .arg(&fx.input)
        .arg(fx.output("out.c"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(3));
    assert_eq!(stdout(&out), "vp8.c\nnote: kept line\n");
    assert!(!fx.intermediate().exists());
    assert!(!fx.converter_called());
}

#[test]
fn converter_failure_status_is_passed_through() {
    let fx = Fixture::new();
    fx.set_converter_exit(7);
    let out = c99conv()
        .arg("--project-root")
        .arg(&fx.root)
        .arg("--cc")
        .arg(fx.fake_cl_command())
        .arg(&fx.input)
        .arg(fx.output("out.c"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(7));
    assert!(!fx.intermediate().exists());
    assert_eq!(stdout(&out), "note: kept line\n");
    assert!(!out.stdout.contains(&0x1b));
}

#[test]
fn project_root_is_discovered_from_cwd() {
    let fx = Fixture::new();
    let out = c99conv()
        .current_dir(fx.root.join("libavcodec"))
        .env_remove("C99CONV_PROJECT_ROOT")
        .arg("--cc")
        .arg(fx.fake_cl_command())
        .arg("vp8.c")
        .arg(fx.output("out.c"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(fx.output("out.c").exists());
}

#[test]
fn malformed_build_env_exits_1_with_message() {
    let fx = Fixture::new();
    fx.write_build_env("{'CC': 'cl.exe'");
    let out = c99conv()
        .arg("--project-root")
        .arg(&fx.root)
        .arg(&fx.input)
        .arg(fx.output("out.c"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Malformed build environment"), "stderr: {stderr}");
    assert!(!fx.converter_called());
}

#[test]
fn json_report_follows_diagnostics() {
    let fx = Fixture::new();
    let out = c99conv()
        .arg("--project-root")
        .arg(&fx.root)
        .arg("--cc")
        .arg(fx.fake_cl_command())
        .arg("--json")
        .arg(&fx.input)
        .arg(fx.output("out.c"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    let (first, rest) = text.split_once('\n').unwrap();
    assert_eq!(first, "note: kept line");
    let report: serde_json::Value = serde_json::from_str(rest).unwrap();
    assert_eq!(report["exit_code"], 0);
    assert_eq!(report["failed_stage"], serde_json::Value::Null);
}

#[test]
fn own_flag_spellings_after_output_reach_the_compiler() {
    let fx = Fixture::new();
    let output = fx.output("out.c");
    let out = c99conv()
        .arg("--project-root")
        .arg(&fx.root)
        .arg("--cc")
        .arg(fx.fake_cl_command())
        .arg(&fx.input)
        .arg(&output)
        .args(["-v", "-h", "--json", "-DNDEBUG"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(stdout(&out), "note: kept line\n");
    assert!(output.exists());
    let args = fx.recorded_args();
    let forced = args.iter().position(|a| a == "-FIstdlib.h").unwrap();
    assert_eq!(&args[forced + 1..forced + 5], ["-v", "-h", "--json", "-DNDEBUG"]);
}

#[test]
fn relative_project_root_with_parent_hops_finds_build_env() {
    let fx = Fixture::new();
    fx.use_fake_cl_via_build_env();
    let sibling = fx.root.parent().unwrap().join("x");
    std::fs::create_dir_all(&sibling).unwrap();

    let out = c99conv()
        .current_dir(&sibling)
        .arg("--project-root")
        .arg("../ffmpeg")
        .arg(&fx.input)
        .arg(fx.output("out.c"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(fx.root.join("args.txt").exists());
    assert!(fx.output("out.c").exists());
}

#[test]
fn diagnostics_precede_converter_output() {
    let fx = Fixture::new();
    common::write_script(
        &fx.root.join("chromium/binaries/c99conv.exe"),
        "#!/bin/sh\necho CONVERTER_SAYS\ncat \"$1\" > \"$2\"\n",
    );
    let out = c99conv()
        .arg("--project-root")
        .arg(&fx.root)
        .arg("--cc")
        .arg(fx.fake_cl_command())
        .arg(&fx.input)
        .arg(fx.output("out.c"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "note: kept line\nCONVERTER_SAYS\n");
}

#[test]
fn diagnostics_survive_missing_converter() {
    let fx = Fixture::new();
    let out = c99conv()
        .arg("--project-root")
        .arg(&fx.root)
        .arg("--cc")
        .arg(fx.fake_cl_command())
        .arg("--converter")
        .arg(fx.dir.path().join("missing.exe"))
        .arg(&fx.input)
        .arg(fx.output("out.c"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stdout(&out), "note: kept line\n");
    assert!(!fx.intermediate().exists());
}
