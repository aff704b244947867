//! CLI tests

use crate::*;
use clap::Parser;
use std::io::Write;

#[test]
fn test_cli_parses_versions_diff() {
    let id = Uuid::new_v4();
    let cli = Cli::try_parse_from(["folio", "versions", "diff", &id.to_string(), "1", "3"]).unwrap();

    match cli.command {
        Commands::Versions {
            action: VersionAction::Diff { post_id, from, to },
        } => {
            assert_eq!(post_id, id);
            assert_eq!((from, to), (1, 3));
        }
        _ => panic!("expected versions diff"),
    }
    assert_eq!(cli.format, OutputFormat::Text);
    assert!(!cli.quiet);
}

#[test]
fn test_cli_global_flags_after_subcommand() {
    let id = Uuid::new_v4();
    let cli = Cli::try_parse_from([
        "folio",
        "versions",
        "list",
        &id.to_string(),
        "--format",
        "json",
        "--database",
        "/tmp/blog.db",
        "-q",
    ])
    .unwrap();

    assert_eq!(cli.format, OutputFormat::Json);
    assert!(cli.quiet);
    assert_eq!(cli.database, Some(PathBuf::from("/tmp/blog.db")));
}

#[test]
fn test_cli_rejects_malformed_post_id() {
    assert!(Cli::try_parse_from(["folio", "versions", "list", "not-a-uuid"]).is_err());
}

#[test]
fn test_cli_body_and_body_file_conflict() {
    let result = Cli::try_parse_from([
        "folio",
        "posts",
        "new",
        "Title",
        "--body",
        "text",
        "--body-file",
        "body.md",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_cli_prune_keep_is_optional() {
    let id = Uuid::new_v4().to_string();

    let cli = Cli::try_parse_from(["folio", "versions", "prune", &id]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Versions {
            action: VersionAction::Prune { keep: None, .. }
        }
    ));

    let cli = Cli::try_parse_from(["folio", "versions", "prune", &id, "--keep", "3"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Versions {
            action: VersionAction::Prune { keep: Some(3), .. }
        }
    ));
}

#[test]
fn test_read_body_prefers_inline_text() {
    assert_eq!(read_body(Some("inline".to_string()), None).unwrap(), Some("inline".to_string()));
    assert_eq!(read_body(None, None).unwrap(), None);
}

#[test]
fn test_read_body_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "line1\nline2\n").unwrap();

    let body = read_body(None, Some(file.path().to_path_buf())).unwrap();
    assert_eq!(body, Some("line1\nline2\n".to_string()));
}

#[test]
fn test_read_body_missing_file() {
    let err = read_body(None, Some(PathBuf::from("/nonexistent/folio/body.md"))).unwrap_err();
    assert!(err.to_string().contains("Failed to read body file"));
}

#[test]
fn test_cli_database_flag_overrides_config() {
    let mut config = Config::default();
    config.database.path = Some(PathBuf::from("/srv/folio/config.db"));

    let path = resolve_database_path(&config, Some(Path::new("/tmp/flag.db")));
    assert_eq!(path, PathBuf::from("/tmp/flag.db"));
}

#[test]
fn test_short_id() {
    let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
    assert_eq!(short_id(&id), "67e55044");
}
