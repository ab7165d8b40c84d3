//! Integration tests: write TH1D files to disk and read them back.

use approx::assert_relative_eq;
use ir_root::{Histogram, RootError, RootFile, RootWriter};
use std::path::PathBuf;

fn tmp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ir_root_{}_{}", std::process::id(), name))
}

fn gaussian_like(name: &str, center: f64, n: usize) -> Histogram {
    let mut h = Histogram::uniform(name, name, 40, center - 20.0, center + 20.0).unwrap();
    for i in 0..n {
        // Triangular spread, symmetric about `center` for multiples of 231 fills.
        let u = (i % 21) as f64 - 10.0;
        let v = ((i / 21) % 11) as f64 - 5.0;
        h.fill(center + 0.5 * (u + v), 1.0);
    }
    h
}

#[test]
fn written_file_reads_back_through_mmap() {
    let path = tmp_path("mmap.root");
    let mut w = RootWriter::new("mmap.root");
    w.add(gaussian_like("data_17_pT150.0", 150.0, 2310));
    w.add(gaussian_like("Py8_2017_pT150.0", 152.0, 1386));
    w.write(&path).unwrap();

    let f = RootFile::open(&path).unwrap();
    let hs = f.histograms().unwrap();
    assert_eq!(hs.len(), 2);
    assert_eq!(hs[0].name, "data_17_pT150.0");
    assert_eq!(hs[1].name, "Py8_2017_pT150.0");
    assert_relative_eq!(hs[0].mean(), 150.0, epsilon = 1e-9);
    assert_relative_eq!(hs[1].mean(), 152.0, epsilon = 1e-9);
    assert_eq!(hs[0].entries, 2310.0);
    assert!(hs[0].std_dev() > 1.0);

    std::fs::remove_file(&path).ok();
}

#[test]
fn statistics_survive_round_trip() {
    let mut h = Histogram::new("w", "weighted", vec![0.0, 1.0, 2.0, 4.0, 8.0]).unwrap();
    for (x, w) in [(0.5, 1.5), (1.5, 2.0), (3.0, 0.25), (7.5, 1.0), (10.0, 3.0)] {
        h.fill(x, w);
    }
    let mut w = RootWriter::new("w.root").with_compression(1);
    w.add(h.clone());
    let f = RootFile::from_bytes(w.to_bytes().unwrap(), PathBuf::from("w.root")).unwrap();
    let back = f.get_histogram("w").unwrap();

    assert_eq!(back.bin_edges, h.bin_edges);
    assert_eq!(back.bin_content, h.bin_content);
    assert_eq!(back.sumw2, h.sumw2);
    assert_eq!(back.overflow, 3.0);
    assert_eq!(back.stats, h.stats);
    assert_relative_eq!(back.mean(), h.mean());
    assert_relative_eq!(back.std_dev(), h.std_dev());
}

#[test]
fn highest_cycle_wins_and_order_is_kept() {
    let mut w = RootWriter::new("cycles.root");
    w.add(gaussian_like("z_first", 10.0, 10));
    w.add(gaussian_like("a_second", 20.0, 10));
    w.add(gaussian_like("z_first", 30.0, 231));
    let f = RootFile::from_bytes(w.to_bytes().unwrap(), PathBuf::from("cycles.root")).unwrap();

    assert_eq!(f.list_keys().unwrap().len(), 3);
    let hs = f.histograms().unwrap();
    let names: Vec<&str> = hs.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["z_first", "a_second"]);
    assert_relative_eq!(hs[0].mean(), 30.0, epsilon = 1e-9);
}

#[test]
fn missing_key_and_bad_paths() {
    let mut w = RootWriter::new("k.root");
    w.add(gaussian_like("h", 0.0, 5));
    let f = RootFile::from_bytes(w.to_bytes().unwrap(), PathBuf::from("k.root")).unwrap();

    assert!(matches!(f.get_histogram("nope"), Err(RootError::KeyNotFound(_))));
    assert!(matches!(f.get_histogram(""), Err(RootError::KeyNotFound(_))));
    assert!(matches!(f.get_histogram("h/inner"), Err(RootError::Deserialization(_))));
}

#[test]
fn truncated_file_fails_cleanly() {
    let mut w = RootWriter::new("t.root");
    w.add(gaussian_like("h", 0.0, 5));
    let bytes = w.to_bytes().unwrap();
    let cut = bytes[..bytes.len() - 20].to_vec();
    let f = RootFile::from_bytes(cut, PathBuf::from("t.root")).unwrap();
    assert!(f.histograms().is_err());
}

#[test]
fn nested_directories_resolve_and_top_level_skips_them() {
    let path = tmp_path("nested.root");
    let mut w = RootWriter::new("nested.root").with_compression(4);
    w.add(gaussian_like("data_17_pT150.0", 150.0, 231));
    w.add_in("syst", gaussian_like("data_17_pT150.0", 155.0, 462));
    w.add_in("syst/up", gaussian_like("Py8_2017_pT350.0", 350.0, 693));
    w.add(gaussian_like("Py8_2017_pT150.0", 152.0, 231));
    w.write(&path).unwrap();

    let f = RootFile::open(&path).unwrap();
    let classes: Vec<String> = f.list_keys().unwrap().into_iter().map(|k| k.class_name).collect();
    assert_eq!(classes, vec!["TH1D", "TDirectoryFile", "TH1D"]);

    // The directory key is not a histogram and its contents are not listed.
    let names: Vec<String> = f.histograms().unwrap().into_iter().map(|h| h.name).collect();
    assert_eq!(names, vec!["data_17_pT150.0", "Py8_2017_pT150.0"]);

    let inner = f.get_histogram("syst/data_17_pT150.0").unwrap();
    assert_eq!(inner.entries, 462.0);
    assert_relative_eq!(inner.mean(), 155.0, epsilon = 1e-9);
    let deep = f.get_histogram("syst/up/Py8_2017_pT350.0").unwrap();
    assert_eq!(deep.entries, 693.0);
    assert_relative_eq!(deep.mean(), 350.0, epsilon = 1e-9);
    assert_relative_eq!(f.get_histogram("data_17_pT150.0").unwrap().mean(), 150.0, epsilon = 1e-9);

    assert!(matches!(f.get_histogram("syst/missing"), Err(RootError::KeyNotFound(_))));
    assert!(matches!(f.get_histogram("nodir/data_17_pT150.0"), Err(RootError::KeyNotFound(_))));
    assert!(matches!(f.get_histogram("syst/up/Py8_2017_pT350.0/x"), Err(RootError::Deserialization(_))));

    std::fs::remove_file(&path).ok();
}
