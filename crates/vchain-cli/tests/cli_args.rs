use clap::Parser;
use vchain_cli::{Cli, Command, Settings};
use vchain_models::ModelKind;

fn no_env() -> Option<config::Map<String, String>> {
    Some(Default::default())
}

#[test]
fn test_yaml_config_drives_extend() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vchain.yaml");
    std::fs::write(
        &path,
        "token: abc\ninput: car.mp4\noutput: car-long.mp4\nn: 3\nmodel: gen3\nexplore: true\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from(["vchain", "extend", "--config", path.to_str().unwrap()]).unwrap();
    assert!(matches!(cli.command, Command::Extend(_)));

    let settings = Settings::load_with_env(&cli, no_env()).unwrap();
    assert_eq!(settings.require_token().unwrap(), "abc");
    assert_eq!(settings.n, 3);
    assert_eq!(settings.input.as_deref().unwrap().to_str(), Some("car.mp4"));

    let generation = settings.generation_settings().unwrap();
    assert!(generation.explore_mode);
    assert!(matches!(generation.model, ModelKind::Gen3(_)));
}

#[test]
fn test_count_flag_beats_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vchain.yaml");
    std::fs::write(&path, "n: 3\n").unwrap();

    let cli = Cli::try_parse_from([
        "vchain",
        "--config",
        path.to_str().unwrap(),
        "extend",
        "-n",
        "5",
    ])
    .unwrap();
    let settings = Settings::load_with_env(&cli, no_env()).unwrap();
    assert_eq!(settings.n, 5);
}

#[test]
fn test_work_dir_from_env() {
    let cli = Cli::try_parse_from(["vchain", "loop", "--input", "a.mp4", "--output", "b.mp4"]).unwrap();
    let mut env = config::Map::new();
    env.insert("VCHAIN_WORK_DIR".to_string(), "/tmp/vchain-work".to_string());
    let settings = Settings::load_with_env(&cli, Some(env)).unwrap();
    assert_eq!(
        settings.chain_config().work_dir,
        std::path::PathBuf::from("/tmp/vchain-work")
    );
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["vchain", "upload"]).is_err());
}

#[test]
fn test_wait_flag_sets_request_spacing() {
    let cli = Cli::try_parse_from(["vchain", "generate", "--wait", "0.5", "--text", "sea"]).unwrap();
    let settings = Settings::load_with_env(&cli, no_env()).unwrap();
    let config = settings.client_config().unwrap();
    assert_eq!(config.min_interval, std::time::Duration::from_millis(500));
}
