use assert_cmd::Command;

fn cli() -> Command {
    Command::cargo_bin("catalog-cli").unwrap()
}

#[test]
fn test_routes_lists_catalog_surface() {
    let output = cli().arg("routes").assert().success().get_output().clone();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("/healthz"));
    assert!(stdout.contains("/catalog/authors"));
    assert!(stdout.contains("GET|POST  /catalog/bookinstance/{id}/update"));
}

#[test]
fn test_check_seed_reports_counts() {
    let seed = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/seed.json");
    let output = cli()
        .args(["check-seed", seed])
        .assert()
        .success()
        .get_output()
        .clone();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("authors: 3"));
    assert!(stdout.contains("bookinstances: 4"));
    assert!(stdout.contains("books: 3"));
    assert!(stdout.contains("genres: 3"));
}

#[test]
fn test_check_seed_rejects_missing_file() {
    cli()
        .args(["check-seed", "does/not/exist.json"])
        .assert()
        .failure();
}
