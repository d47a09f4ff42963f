//! Config file plus environment layering, checked by startup validation.

use tasknag::BotConfig;
use tasknag::channels::{has_blocking_issues, validate_config};

const DEPLOYMENT: &str = r#"
[telegram]
bot_token = "from-file"
group_id = -100200

[topics]
it = 11
sport = 12
monthly = 13

[schedule]
utc_offset_hours = 3
start_hour = 8
check_interval_secs = 1800
"#;

#[test]
fn environment_overrides_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasknag.toml");
    std::fs::write(&path, DEPLOYMENT).unwrap();

    let mut config = BotConfig::from_file(&path).unwrap();
    config
        .apply_env_with(|key| match key {
            "BOT_TOKEN" => Some(" from-env ".to_owned()),
            "SPORT_TOPIC_ID" => Some("22".to_owned()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.telegram.bot_token, "from-env");
    assert_eq!(config.telegram.group_id, -100_200);
    assert_eq!(config.topics.it, 11);
    assert_eq!(config.topics.sport, 22);
    assert_eq!(config.schedule.progress_interval_secs(), 2700);
    assert_eq!(config.schedule.offset().local_minus_utc(), 3 * 3600);
    assert!(validate_config(&config).is_empty());
}

#[test]
fn file_with_clashing_topics_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasknag.toml");
    std::fs::write(
        &path,
        "[telegram]\nbot_token = \"t\"\n\n[topics]\nit = 5\nsport = 5\n",
    )
    .unwrap();

    let config = BotConfig::from_file(&path).unwrap();
    let issues = validate_config(&config);
    assert!(has_blocking_issues(&issues));
    assert!(issues.iter().any(|i| i.id == "topics-duplicate"));
}
