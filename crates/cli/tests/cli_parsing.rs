use awc_cli::{Cli, Commands};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[test]
fn test_compile_arguments() {
    let cli = Cli::try_parse_from([
        "awc",
        "-vv",
        "compile",
        "specs/triage.aw.yml",
        "--output-dir",
        "out",
    ])
    .unwrap();
    assert_eq!(cli.options.verbose, 2);
    match cli.command {
        Commands::Compile {
            paths,
            output_dir,
            stdout,
        } => {
            assert_eq!(paths, vec![PathBuf::from("specs/triage.aw.yml")]);
            assert_eq!(output_dir, Some(PathBuf::from("out")));
            assert!(!stdout);
        }
        _ => panic!("expected compile"),
    }
}

#[test]
fn test_stdout_conflicts_with_output_dir() {
    let result = Cli::try_parse_from(["awc", "compile", "--stdout", "--output-dir", "out"]);
    assert!(result.is_err());
}

#[test]
fn test_global_options_after_subcommand() {
    let cli = Cli::try_parse_from([
        "awc",
        "check-actions",
        "--strict",
        "--timeout-secs",
        "3",
        "--api-url",
        "https://ghe.example.com/api/v3",
    ])
    .unwrap();
    assert!(matches!(cli.command, Commands::CheckActions { strict: true, .. }));

    let options = cli.options.resolver_options();
    assert_eq!(options.timeout, Duration::from_secs(3));
    assert_eq!(options.api_base, "https://ghe.example.com/api/v3");
}

#[test]
fn test_default_resolver_options() {
    let cli = Cli::try_parse_from(["awc", "cache", "list"]).unwrap();
    let options = cli.options.resolver_options();
    assert_eq!(options.timeout, Duration::from_secs(10));
    assert_eq!(options.api_base, "https://api.github.com");
}

#[test]
fn test_cache_path_selection() {
    let cli = Cli::try_parse_from(["awc", "--cache-file", "/tmp/pins.json", "cache", "list"]).unwrap();
    assert_eq!(
        cli.options.cache_path(Path::new(".")),
        Some(PathBuf::from("/tmp/pins.json"))
    );

    let cli = Cli::try_parse_from(["awc", "--no-cache", "cache", "clear"]).unwrap();
    assert_eq!(cli.options.cache_path(Path::new(".")), None);
    let cache = cli.options.open_cache(Path::new(".")).unwrap();
    assert!(cache.path().is_none());
}

#[test]
fn test_default_cache_path_is_in_repository() {
    let temp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join(".git")).unwrap();
    let nested = temp.path().join(".github/workflows");
    std::fs::create_dir_all(&nested).unwrap();

    let cli = Cli::try_parse_from(["awc", "cache", "list"]).unwrap();
    assert_eq!(
        cli.options.cache_path(&nested),
        Some(temp.path().join(".github/aw/actions-lock.json"))
    );
}

#[test]
fn test_cache_clear_empties_file() {
    let temp = tempfile::TempDir::new().unwrap();
    let file = temp.path().join("pins.json");
    let mut cache = awc_actions::ActionCache::load(&file).unwrap();
    cache.insert("actions/checkout", "v5", &"a".repeat(40));
    cache.persist().unwrap();

    let file_arg = file.to_string_lossy().to_string();
    let cli = Cli::try_parse_from(["awc", "--cache-file", &file_arg, "cache", "clear"]).unwrap();
    match cli.command {
        Commands::Cache { command } => command.execute(&cli.options).unwrap(),
        _ => panic!("expected cache"),
    }
    assert!(awc_actions::ActionCache::load(&file).unwrap().is_empty());
}
