//! README example: 5. Run a whole session from a TOML file

use std::fs;
use std::path::PathBuf;

use eprtools::{run_session, Session};

fn setup_test_dir(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push("eprtools_tests");
    path.push(name);
    path.push(format!(
        "{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    fs::create_dir_all(&path).unwrap();
    path
}

fn copy_fixtures(dir: &PathBuf) -> PathBuf {
    for name in ["radical.txt", "copper.txt", "session.toml"] {
        fs::copy(format!("files/{}", name), dir.join(name)).unwrap();
    }
    dir.join("session.toml")
}

#[test]
fn session_writes_csv_and_plot() {
    let dir = setup_test_dir("session_writes_csv_and_plot");
    let session_path = copy_fixtures(&dir);

    let session = Session::load(&session_path).unwrap();
    assert_eq!(session.frequency_hz(), 9.48314e9);

    let written = run_session(&session, &session_path).unwrap();

    assert!(written.contains(&dir.join("CSV_radical.csv")));
    assert!(written.contains(&dir.join("CSV_copper.csv")));
    assert!(dir.join("CSV_radical.csv").exists());
    if cfg!(feature = "plot") {
        assert!(written.contains(&dir.join("session.html")));
        assert!(dir.join("session.html").exists());
    }
}

#[test]
fn session_output_dir_is_created() {
    let dir = setup_test_dir("session_output_dir_is_created");
    copy_fixtures(&dir);
    let session_path = dir.join("csv_only.toml");
    fs::write(
        &session_path,
        "output_dir = \"converted\"\nfiles = [\"radical.txt\"]\n",
    )
    .unwrap();

    let session = Session::load(&session_path).unwrap();
    let written = run_session(&session, &session_path).unwrap();

    assert_eq!(written, vec![dir.join("converted").join("CSV_radical.csv")]);
}
