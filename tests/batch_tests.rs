use edfdeid::discovery::EdfPaths;
use edfdeid::doctest_utils::SampleEdf;
use edfdeid::{batch, DeidentifyConfig, ErrorKind, FileStatus, EDF_HEADER_SIZE};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// 构造一个混合了正常文件与损坏文件的目录
fn populate(root: &Path) {
    fs::create_dir_all(root.join("site_a/night1")).unwrap();
    fs::create_dir_all(root.join("site_b")).unwrap();

    let samples = [
        ("site_a/night1/p01.edf", SampleEdf::default().patient_id("Alice")),
        ("site_a/p02.edf", SampleEdf::default().patient_id("Bob").start_date("00.00.00")),
        ("site_b/p03.edf", SampleEdf::default().patient_id("Carol").start_date("31.02.20")),
        ("site_b/p04.EDF", SampleEdf::default().patient_id("Dave").signals(4)),
    ];
    for (name, sample) in samples {
        sample.write_to(root.join(name)).unwrap();
    }
    fs::write(root.join("site_b/p05.edf"), b"garbage").unwrap();
    fs::write(root.join("site_b/readme.txt"), b"not a recording").unwrap();
}

fn config(seed: u64, parallel: bool) -> DeidentifyConfig {
    DeidentifyConfig {
        random_seed: Some(seed),
        parallel,
        ..DeidentifyConfig::default()
    }
}

#[test]
fn test_directory_batch_reports_every_file() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());
    let config = config(17, false);

    let summary = batch::run(EdfPaths::new(dir.path(), &config.extensions), &config).unwrap();

    assert_eq!(summary.reports.len(), 5);
    assert_eq!(summary.written, 3);
    assert_eq!(summary.failed, 2);
    assert!(summary.has_failures());

    let kind_of = |name: &str| {
        summary
            .reports
            .iter()
            .find(|r| r.path.ends_with(name))
            .map(|r| (r.status, r.error_kind))
            .unwrap()
    };
    assert_eq!(kind_of("p01.edf"), (FileStatus::Written, None));
    assert_eq!(kind_of("p02.edf"), (FileStatus::Written, None));
    assert_eq!(kind_of("p03.edf"), (FileStatus::Failed, Some(ErrorKind::DateFormat)));
    assert_eq!(kind_of("p04.EDF"), (FileStatus::Written, None));
    assert_eq!(kind_of("p05.edf"), (FileStatus::Failed, Some(ErrorKind::Format)));

    println!("{}", serde_json::to_string_pretty(&summary).unwrap());
}

#[test]
fn test_parallel_matches_sequential_under_seed() {
    let seq_dir = TempDir::new().unwrap();
    let par_dir = TempDir::new().unwrap();
    populate(seq_dir.path());
    populate(par_dir.path());

    let edf = ["edf".to_string()];
    let seq = batch::run(EdfPaths::new(seq_dir.path(), &edf), &config(99, false)).unwrap();
    let par = batch::run(EdfPaths::new(par_dir.path(), &edf), &config(99, true)).unwrap();

    assert_eq!(seq.reports.len(), par.reports.len());
    for (s, p) in seq.reports.iter().zip(&par.reports) {
        assert_eq!(
            s.path.strip_prefix(seq_dir.path()).unwrap(),
            p.path.strip_prefix(par_dir.path()).unwrap()
        );
        assert_eq!(s.status, p.status);
        assert_eq!(s.new_date, p.new_date);
    }

    // 两棵目录树处理后的内容完全一致
    for report in &seq.reports {
        let relative = report.path.strip_prefix(seq_dir.path()).unwrap();
        let twin = par_dir.path().join(relative);
        assert_eq!(fs::read(&report.path).unwrap(), fs::read(twin).unwrap());
    }
}

#[test]
fn test_failed_files_are_untouched_and_sizes_preserved() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());

    let files: Vec<_> = EdfPaths::new(dir.path(), &["edf".to_string()]).collect();
    let before: Vec<Vec<u8>> = files.iter().map(|p| fs::read(p).unwrap()).collect();

    let summary = batch::run(files.clone(), &config(5, true)).unwrap();

    for ((path, old), report) in files.iter().zip(&before).zip(&summary.reports) {
        let new = fs::read(path).unwrap();
        assert_eq!(new.len(), old.len(), "{} changed size", path.display());
        if report.status == FileStatus::Failed {
            assert_eq!(&new, old, "{} was modified despite failing", path.display());
        } else {
            assert_eq!(new[EDF_HEADER_SIZE..], old[EDF_HEADER_SIZE..]);
        }
    }
}

#[test]
fn test_dry_run_batch_changes_nothing() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());
    let files: Vec<_> = EdfPaths::new(dir.path(), &["edf".to_string()]).collect();
    let before: Vec<Vec<u8>> = files.iter().map(|p| fs::read(p).unwrap()).collect();

    let config = DeidentifyConfig { dry_run: true, ..config(1, false) };
    let summary = batch::run(files.clone(), &config).unwrap();

    assert_eq!(summary.dry_run, 3);
    assert_eq!(summary.written, 0);
    for (path, old) in files.iter().zip(&before) {
        assert_eq!(&fs::read(path).unwrap(), old);
    }
}

#[test]
fn test_verify_lists_failures() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());

    let reports = batch::verify(EdfPaths::new(dir.path(), &["edf".to_string()]));
    let failed: Vec<_> = reports.iter().filter(|r| !r.ok).collect();

    // 日期错误在校验阶段不算格式错误，只有 p05 无法解码
    assert_eq!(reports.len(), 5);
    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with("p05.edf"));
}

#[test]
fn test_event_exports_lose_their_dates() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());
    let export = "Start Time,Duration (seconds),Event\n\
                  5/22/2018 8:16:00 PM, 30.000, Wake\n\
                  5/23/2018 1:02:03 AM, 30.000, N1\n";
    fs::write(dir.path().join("site_a/night1/p01.csv"), export).unwrap();
    fs::write(dir.path().join("site_b/p03.CSV"), "5/22/2018 9:00:00 PM,0,Lights Off\n").unwrap();
    fs::write(dir.path().join("site_b/p05.csv"), b"\xff\xfe\x00binary").unwrap();

    let config = config(1, true);
    let events = EdfPaths::new(dir.path(), &config.event_extensions);
    let summary = batch::strip_event_dates(events, &config).unwrap();

    // 只挑出 csv，EDF 文件不受影响
    assert_eq!(summary.reports.len(), 3);
    assert_eq!(summary.written, 2);
    assert_eq!(summary.failed, 1);
    assert!(summary.reports.iter().all(|r| r.path.extension().unwrap() != "edf"));

    let night1 = fs::read_to_string(dir.path().join("site_a/night1/p01.csv")).unwrap();
    assert_eq!(
        night1,
        "Start Time,Duration (seconds),Event\n20:16:00, 30.000, Wake\n01:02:03, 30.000, N1\n"
    );
    let p03 = fs::read_to_string(dir.path().join("site_b/p03.CSV")).unwrap();
    assert_eq!(p03, "21:00:00,0,Lights Off\n");
    assert_eq!(fs::read(dir.path().join("site_b/p05.csv")).unwrap(), b"\xff\xfe\x00binary");

    let failed = summary.reports.iter().find(|r| r.status == FileStatus::Failed).unwrap();
    assert!(failed.path.ends_with("p05.csv"));
    assert_eq!(failed.error_kind, Some(ErrorKind::Format));
    println!("{}", serde_json::to_string_pretty(&summary).unwrap());
}

#[test]
fn test_event_dry_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("night.csv");
    fs::write(&path, "5/22/2018 8:16:00 PM, 30.000, Wake\n").unwrap();

    let config = DeidentifyConfig { dry_run: true, ..config(1, false) };
    let summary = batch::strip_event_dates(vec![path.clone()], &config).unwrap();

    assert_eq!(summary.dry_run, 1);
    assert_eq!(summary.reports[0].rewritten, 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), "5/22/2018 8:16:00 PM, 30.000, Wake\n");
}
