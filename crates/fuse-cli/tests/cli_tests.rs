use std::path::Path;
use std::process::{Command, Output};

use fuse_kernel::primitives::{make_box, make_box_at, make_open_box};
use fuse_kernel::{Kernel, KernelIntrospect, TruckKernel};
use truck_modeling::{Point3, Vector3};

fn step_fuse(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_step-fuse"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn brep_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".brep"))
        .collect()
}

// ── Argument handling ──────────────────────────────────────────────────────

#[test]
fn no_arguments_prints_usage_and_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = step_fuse(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
    assert!(output.stdout.is_empty());
}

#[test]
fn non_numeric_thread_count_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = step_fuse(dir.path(), &["abc"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(brep_files(dir.path()).is_empty());
}

#[test]
fn zero_threads_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = step_fuse(dir.path(), &["0"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn help_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = step_fuse(dir.path(), &["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("NUM_THREADS"));
}

// ── Failing runs ───────────────────────────────────────────────────────────

#[test]
fn missing_step_files_exit_one_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = step_fuse(dir.path(), &["4"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("last_dura.step"));
    assert!(output.stdout.is_empty());
    assert!(brep_files(dir.path()).is_empty());
}

#[test]
fn bad_config_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fuse.toml"), "threads = 4\n").unwrap();
    let output = step_fuse(dir.path(), &["4", "--config", "fuse.toml"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("fuse.toml"));
}

#[test]
fn missing_output_dir_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = step_fuse(dir.path(), &["4", "--output-dir", "nowhere"]);
    assert_eq!(output.status.code(), Some(1));
}

// ── Full run ───────────────────────────────────────────────────────────────

#[test]
fn full_run_prints_two_lines_and_writes_brep() {
    let dir = tempfile::tempdir().unwrap();
    let mut kernel = TruckKernel::new();
    let volume = kernel.store_solid(make_box(1.0, 1.0, 1.0));
    let surface = kernel.store_solid(make_open_box(1.0, 1.0, 1.0).unwrap());
    kernel
        .export_step(&volume, &dir.path().join("last_diff.step"))
        .unwrap();
    kernel
        .export_step(&surface, &dir.path().join("last_dura.step"))
        .unwrap();

    let output = step_fuse(dir.path(), &["3"]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(brep_files(dir.path()), vec!["connected_shape_3.brep"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Connected shape exported to connected_shape_3.brep");

    let seconds = lines[1]
        .strip_prefix("Total execution time with 3 threads: ")
        .and_then(|rest| rest.strip_suffix(" seconds"))
        .unwrap();
    let (_, decimals) = seconds.split_once('.').unwrap();
    assert_eq!(decimals.len(), 9);
    assert!(seconds.parse::<f64>().unwrap() >= 0.0);
}

#[test]
fn overlapping_solids_fuse_into_one_closed_shell() {
    let dir = tempfile::tempdir().unwrap();
    let mut kernel = TruckKernel::new();
    let volume = kernel.store_solid(make_box(10.0, 10.0, 10.0));
    let surface = kernel.store_solid(make_box_at(
        Point3::new(5.0, 5.0, 5.0),
        Vector3::new(10.0, 10.0, 10.0),
    ));
    kernel
        .export_step(&volume, &dir.path().join("last_diff.step"))
        .unwrap();
    kernel
        .export_step(&surface, &dir.path().join("last_dura.step"))
        .unwrap();

    let brep = dir.path().join("connected_shape_2.brep");
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let output = step_fuse(dir.path(), &["2"]);
        assert_eq!(
            output.status.code(),
            Some(0),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(String::from_utf8_lossy(&output.stdout)
            .starts_with("Connected shape exported to connected_shape_2.brep\n"));
        outputs.push(std::fs::read(&brep).unwrap());
    }
    assert_eq!(brep_files(dir.path()), vec!["connected_shape_2.brep"]);
    assert_eq!(outputs[0], outputs[1]);

    let fused = kernel.import_brep(&brep).unwrap();
    let stats = kernel.shape_stats(&fused).unwrap();
    assert_eq!(stats.shells, 1);
    assert!(stats.closed);
    assert_eq!(stats.euler_characteristic(), 2);
}
