use ir_root::{Histogram, RootWriter};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_insitu"))
}

fn tmp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("insitu_cli_{}_{}_{}", std::process::id(), nanos, tag));
    std::fs::create_dir_all(&p).unwrap();
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

/// Symmetric triangular peak; the mean is exactly `center`.
fn peak(name: &str, center: f64) -> Histogram {
    let mut h = Histogram::uniform(name, name, 40, center - 40.0, center + 40.0).unwrap();
    for i in 0..231 {
        let u = (i % 21) as f64 - 10.0;
        let v = ((i / 21) % 11) as f64 - 5.0;
        h.fill(center + 2.0 * (u + v), 1.0);
    }
    h
}

fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("insitu.root");
    let mut w = RootWriter::new("insitu.root");
    w.add(peak("data_17_pTref100_200_pT150.0", 140.0))
        .add(peak("Py8_2017_pTref100_200_pT150.0", 147.0))
        .add(peak("data_17_pTref300_400_pT350.0", 330.0))
        .add(peak("Py8_2017_pTref300_400_pT350.0", 336.0))
        .add(peak("Py8_2017_no_number", 1.0));
    w.write(&path).unwrap();
    path
}

fn write_settings(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("settings.config");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn end_to_end_writes_png_and_artifact() {
    let dir = tmp_dir("e2e");
    let input = write_fixture(&dir);
    let output = dir.join("data_vs_mc.png");
    let artifact = dir.join("response.json");
    let settings = write_settings(
        &dir,
        &format!(
            "# binning\npT_ref.Bins: 100 200 300\npT_ref.Bins: 400 500\nInput.File: {}\nOutput.Artifact: {}\n",
            input.display(),
            artifact.display()
        ),
    );

    let out = run(&[
        "--settings",
        settings.to_string_lossy().as_ref(),
        "--output",
        output.to_string_lossy().as_ref(),
    ]);
    assert!(out.status.success(), "insitu should succeed, stderr={}", String::from_utf8_lossy(&out.stderr));

    let png = std::fs::read(&output).unwrap();
    assert!(png.starts_with(PNG_MAGIC));

    let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&artifact).unwrap()).unwrap();
    assert_eq!(v["schema_version"], "insitu_response_v1");
    assert_eq!(v["meta"]["mode"], "mean");
    assert_eq!(v["bin_edges"].as_array().unwrap().len(), 5);
    assert_eq!(v["data_y"][0].as_f64().unwrap(), 140.0);
    assert_eq!(v["mc_y"][2].as_f64().unwrap(), 336.0);
    assert!(v["ratio_y"][1].is_null());
    assert!((v["ratio_y"][0].as_f64().unwrap() - 147.0 / 140.0).abs() < 1e-12);
    assert_eq!(v["skipped"].as_array().unwrap().len(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn command_line_overrides_settings() {
    let dir = tmp_dir("override");
    let input = write_fixture(&dir);
    let output = dir.join("plot.svg");
    let artifact = dir.join("fit.json");
    let settings = write_settings(
        &dir,
        "pT_ref.Bins: 100 200 300 400 500\nInput.File: /nonexistent/input.root\n",
    );

    let out = run(&[
        "--settings",
        settings.to_string_lossy().as_ref(),
        "--input",
        input.to_string_lossy().as_ref(),
        "--output",
        output.to_string_lossy().as_ref(),
        "--mode",
        "fit-peak",
        "--artifact",
        artifact.to_string_lossy().as_ref(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    assert!(std::fs::read_to_string(&output).unwrap().starts_with("<svg"));

    let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&artifact).unwrap()).unwrap();
    assert_eq!(v["meta"]["mode"], "fit_peak");
    // Binned peaks are centered one above the fill center; every fit converges.
    let close = |x: &serde_json::Value, want: f64| (x.as_f64().unwrap() - want).abs() < 0.05;
    assert!(close(&v["data_y"][0], 141.0), "{}", v["data_y"]);
    assert!(close(&v["data_y"][2], 331.0), "{}", v["data_y"]);
    assert!(close(&v["mc_y"][0], 148.0), "{}", v["mc_y"]);
    assert!(close(&v["mc_y"][2], 337.0), "{}", v["mc_y"]);
    assert_eq!(v["data_y"][1].as_f64().unwrap(), 0.0);
    let skipped = v["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1, "{skipped:?}");
    assert_eq!(skipped[0]["name"], "Py8_2017_no_number");
    assert_eq!(skipped[0]["reason"]["reason"], "no_reference_range");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_input_fails() {
    let dir = tmp_dir("missing");
    let output = dir.join("out.png");
    let settings = write_settings(&dir, "pT_ref.Bins: 100 200\nInput.File: /nonexistent/insitu.root\n");

    let out = run(&["--settings", settings.to_string_lossy().as_ref(), "--output", output.to_string_lossy().as_ref()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("/nonexistent/insitu.root"));
    assert!(!output.exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_bins_and_settings_fail() {
    let dir = tmp_dir("nobins");
    let settings = write_settings(&dir, "# no binning\nInput.File: whatever.root\n");
    let out = run(&["--settings", settings.to_string_lossy().as_ref()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("pT_ref.Bins"));

    let out = run(&["--settings", dir.join("absent.config").to_string_lossy().as_ref()]);
    assert!(!out.status.success());

    std::fs::remove_dir_all(&dir).ok();
}
