use std::fs;
use std::path::PathBuf;

use tempfile::tempdir;

use crate::config::{AgentConfig, ReplayCadence};
use crate::error::BanditError;

#[test]
fn test_default_config() {
    let config = AgentConfig::new(8, 16, "default");
    assert_eq!(config.batch_size, 50);
    assert_eq!(config.memory_capacity, 2000);
    assert_eq!(config.epsilon, 1.0);
    assert_eq!(config.epsilon_min, 0.001);
    assert_eq!(config.epsilon_decay, 0.15);
    assert_eq!(config.learning_rate, 0.001);
    assert_eq!(config.replay_cadence, ReplayCadence::SkipEveryNth(20));
    assert_eq!(config.weights_dir, PathBuf::from("./save/agents"));
    assert!(config.seed.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_weights_path_is_derived_from_name() {
    let config = AgentConfig::new(2, 2, "llvm");
    assert_eq!(config.weights_path(), PathBuf::from("./save/agents/agent_weights_llvm.bin"));
}

#[test]
fn test_from_json_file_fills_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent.json");
    fs::write(
        &path,
        r#"{
            "state_size": 5,
            "action_size": 12,
            "name": "flags",
            "batch_size": 16,
            "replay_cadence": { "EveryNth": 10 }
        }"#,
    )
    .unwrap();

    let config = AgentConfig::from_json_file(&path).unwrap();
    assert_eq!(config.state_size, 5);
    assert_eq!(config.action_size, 12);
    assert_eq!(config.batch_size, 16);
    assert_eq!(config.replay_cadence, ReplayCadence::EveryNth(10));
    assert_eq!(config.memory_capacity, 2000);
    assert_eq!(config.epsilon_decay, 0.15);
}

#[test]
fn test_from_json_file_validates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent.json");
    fs::write(&path, r#"{ "state_size": 5, "action_size": 0, "name": "flags" }"#).unwrap();
    assert!(matches!(
        AgentConfig::from_json_file(&path),
        Err(BanditError::InvalidParameter { .. })
    ));
}

#[test]
fn test_from_json_file_reports_malformed_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        AgentConfig::from_json_file(&path),
        Err(BanditError::SerializationError { .. })
    ));
}

#[test]
fn test_validate_rejects_bad_values() {
    let base = AgentConfig::new(4, 3, "agent");
    let cases = vec![
        AgentConfig { batch_size: 0, ..base.clone() },
        AgentConfig { memory_capacity: 0, ..base.clone() },
        AgentConfig { name: String::new(), ..base.clone() },
        AgentConfig { name: "../escape".to_string(), ..base.clone() },
        AgentConfig { epsilon: 1.5, ..base.clone() },
        AgentConfig { epsilon_min: -0.1, ..base.clone() },
        AgentConfig { epsilon_decay: 0.0, ..base.clone() },
        AgentConfig { epsilon_decay: 1.0, ..base.clone() },
        AgentConfig { learning_rate: 0.0, ..base.clone() },
        AgentConfig { learning_rate: f32::NAN, ..base.clone() },
        AgentConfig { replay_cadence: ReplayCadence::EveryNth(0), ..base.clone() },
    ];
    for config in cases {
        assert!(config.validate().is_err(), "accepted {:?}", config);
    }
}

#[test]
fn test_replay_cadence_schedules() {
    let skip = ReplayCadence::SkipEveryNth(20);
    assert!(skip.should_replay(1));
    assert!(skip.should_replay(19));
    assert!(!skip.should_replay(20));
    assert!(skip.should_replay(21));

    let every = ReplayCadence::EveryNth(20);
    assert!(!every.should_replay(1));
    assert!(every.should_replay(20));
    assert!(every.should_replay(40));

    assert!(!ReplayCadence::Manual.should_replay(20));
}
