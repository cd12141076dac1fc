use std::collections::BTreeSet;
use std::path::Path;

use zeal_cpu_validation::{is_vector_file, load_test_file, run_test_case};

#[test]
fn test_all_z80_opcodes() {
    let test_dir = Path::new("test_data/z80/v1");
    if !test_dir.exists() {
        eprintln!("No SingleStepTests data under {}, skipping", test_dir.display());
        return;
    }

    let mut entries: Vec<_> = std::fs::read_dir(test_dir)
        .expect("Failed to read test directory")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_vector_file(p))
        .collect();
    entries.sort();

    let mut total_tests = 0;
    let mut failed_tests = 0;
    let mut failed_files = BTreeSet::new();
    let mut first_failures: Vec<String> = Vec::new();

    for path in &entries {
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        let tests = load_test_file(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
        assert!(!tests.is_empty(), "Test file {file_name} is empty");

        for tc in &tests {
            if let Err(err) = run_test_case(tc) {
                failed_tests += 1;
                if failed_files.insert(file_name.clone()) && first_failures.len() < 50 {
                    first_failures.push(err);
                }
            }
        }
        total_tests += tests.len();
    }

    eprintln!(
        "\nZ80 SingleStepTests: {} passed, {} failed across {} files",
        total_tests - failed_tests,
        failed_tests,
        entries.len()
    );
    if !first_failures.is_empty() {
        eprintln!("\nFirst failure per file ({} files):", failed_files.len());
        for err in &first_failures {
            eprintln!("  {err}");
        }
    }

    assert_eq!(
        failed_tests,
        0,
        "{failed_tests} tests failed across {} files (out of {total_tests})",
        failed_files.len()
    );
}
