/// Configuration files and the board built from them
use pedalboard::{PedalError, PedalKind, Pedalboard, PedalboardConfig, Space};
use std::io::Write;

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.toml");

    let mut config = PedalboardConfig {
        sample_rate: 48000,
        chain: vec![PedalKind::Compressor, PedalKind::Wah, PedalKind::Loop],
        ..PedalboardConfig::default()
    };
    config.reverb.space = Space::Room;
    config.midi.port = Some("nanoKEY".to_string());
    config
        .controls
        .entry("wah".to_string())
        .or_default()
        .insert("q".to_string(), 4.0);
    config.active.insert("wah".to_string(), true);

    config.save(&path).unwrap();
    let loaded = PedalboardConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_reports_bad_files() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.toml");
    assert!(matches!(
        PedalboardConfig::load(&missing),
        Err(PedalError::Io(_))
    ));

    let broken = dir.path().join("broken.toml");
    let mut file = std::fs::File::create(&broken).unwrap();
    writeln!(file, "chain = [\"boost\"").unwrap();
    assert!(matches!(
        PedalboardConfig::load(&broken),
        Err(PedalError::InvalidConfig(_))
    ));
}

#[test]
fn test_board_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.toml");
    std::fs::write(
        &path,
        r#"
        max_loop_seconds = 2.0
        chain = ["wah", "looper", "delay"]

        [reverb]
        impulse = false

        [controls.wah]
        boost = 2.0

        [controls.delay]
        feedback = 0.9

        [active]
        wah = true
        delay = false
        "#,
    )
    .unwrap();

    let config = PedalboardConfig::load(&path).unwrap();
    let board = Pedalboard::new(&config).unwrap();
    let chain = board.control().chain();

    assert_eq!(chain.len(), 3);
    assert_eq!(chain.unit(2).unwrap().kind(), PedalKind::Loop);
    let wah = chain.unit(1).unwrap();
    assert!(wah.is_active());
    assert_eq!(wah.binding("boost").unwrap().value(), 2.0);

    let delay = chain.unit(3).unwrap();
    assert!(!delay.is_active());
    // Clamped to the feedback domain
    assert!((delay.binding("feedback").unwrap().value() - 0.7).abs() < 1e-6);

    assert!(board.control().router().looper(2).is_some());
}
