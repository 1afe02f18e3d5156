use super::*;

#[test]
fn parses_update_for_all_tags() {
    let cli = Cli::try_parse_from(["tagpulse", "update"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Update { tag: None }));
}

#[test]
fn parses_update_with_tag_filter() {
    let cli = Cli::try_parse_from(["tagpulse", "update", "--tag", "Rust"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Update { tag: Some(ref t) } if t == "Rust"
    ));
}

#[test]
fn parses_worker() {
    let cli = Cli::try_parse_from(["tagpulse", "worker"]).unwrap();
    assert!(matches!(cli.command, Commands::Worker));
}

#[test]
fn enqueue_keeps_trailing_arguments_including_flags() {
    let cli =
        Cli::try_parse_from(["tagpulse", "enqueue", "tagpulse", "update", "--tag", "Foo"]).unwrap();
    match cli.command {
        Commands::Enqueue { command } => {
            assert_eq!(command.join(" "), "tagpulse update --tag Foo");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn enqueue_requires_a_command() {
    assert!(Cli::try_parse_from(["tagpulse", "enqueue"]).is_err());
}

#[test]
fn parses_tag_add() {
    let cli = Cli::try_parse_from(["tagpulse", "tag", "add", "#Rust"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Tag {
            command: tags::TagCommands::Add { ref name }
        } if name == "#Rust"
    ));
}

#[test]
fn status_defaults_to_ten_results() {
    let cli = Cli::try_parse_from(["tagpulse", "status"]).unwrap();
    assert!(matches!(cli.command, Commands::Status { results: 10 }));
}

#[test]
fn status_accepts_result_count() {
    let cli = Cli::try_parse_from(["tagpulse", "status", "--results", "3"]).unwrap();
    assert!(matches!(cli.command, Commands::Status { results: 3 }));
}

#[test]
fn parses_links_and_hotness() {
    assert!(matches!(
        Cli::try_parse_from(["tagpulse", "links"]).unwrap().command,
        Commands::Links
    ));
    assert!(matches!(
        Cli::try_parse_from(["tagpulse", "hotness"]).unwrap().command,
        Commands::Hotness
    ));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["tagpulse"]).is_err());
}

#[test]
fn production_logs_are_plain() {
    assert!(!use_ansi(&tagpulse_core::Environment::Production));
    assert!(use_ansi(&tagpulse_core::Environment::Development));
    assert!(use_ansi(&tagpulse_core::Environment::Test));
}
