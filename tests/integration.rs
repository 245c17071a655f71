use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn run_bin(work_dir: &Path, config: Option<&Path>) -> Output {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_averager"));

    let mut command = Command::new(bin);
    command.current_dir(work_dir);
    match config {
        Some(config) => command.env("AVERAGER_CONFIG", config),
        None => command.env_remove("AVERAGER_CONFIG"),
    };
    let output = command.output().expect("failed to execute command");

    let stdout_str = String::from_utf8_lossy(&output.stdout);
    let stderr_str = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "failed to run binary\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );

    output
}

fn test_dir(name: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir_all(&test_dir).expect("failed to create test directory");
    test_dir
}

#[test]
fn default_sample() {
    let test_dir = test_dir("default_sample");

    let output = run_bin(&test_dir, None);
    let stdout_str = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout_str.trim(), "Result: 30.0");

    let stderr_str = String::from_utf8_lossy(&output.stderr);
    assert!(stderr_str.contains(" - Aplicacao - INFO - starting data processing"));

    let log_file = test_dir.join("logs").join("aplicacao.log");
    let log_str = fs::read_to_string(&log_file).expect("failed to read log file");
    assert!(log_str.contains(" - Aplicacao - DEBUG - processing value 50 at position 4"));
    assert!(log_str.contains(" - Aplicacao - INFO - processing complete, computed mean: 30.0"));
    for line in log_str.lines() {
        assert_eq!(line.split(" - ").nth(1), Some("Aplicacao"), "{line}");
    }

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_sample() {
    let test_dir = test_dir("invalid_sample");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "sample = [ 1, 2, \"invalido\", 4,]\n"
        + "\n"
        + "[log]\n"
        + "name = \"Teste\"\n"
        + "file = \"teste.log\"\n"
        + "level = \"info\"\n";
    fs::write(&config_path, config_contents).expect("failed to write config file");

    let output = run_bin(&test_dir, Some(&config_path));
    let stdout_str = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout_str.trim(), "Error: invalid value: invalido");

    let log_str = fs::read_to_string(test_dir.join("teste.log")).expect("failed to read log file");
    assert!(log_str.contains(" - Teste - ERROR - invalid value found: invalido"));
    assert!(log_str.contains(" - Teste - CRITICAL - critical error in processing: invalid value: invalido"));
    assert!(!log_str.contains(" - DEBUG - "));

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn nested_sample_value() {
    let test_dir = test_dir("nested_sample_value");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "sample = [ 1, [ 2,], 3,]\n"
        + "\n"
        + "[log]\n"
        + "file = \"nested.log\"\n";
    fs::write(&config_path, config_contents).expect("failed to write config file");

    let output = run_bin(&test_dir, Some(&config_path));
    let stdout_str = String::from_utf8_lossy(&output.stdout);
    assert!(stdout_str.trim().starts_with("Error: invalid value: ["), "{stdout_str}");

    let log_str =
        fs::read_to_string(test_dir.join("nested.log")).expect("failed to read log file");
    assert!(log_str.contains(" - Aplicacao - ERROR - invalid value found: ["));
    assert!(!log_str.contains("at position 2"));

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn bad_config_fails() {
    let test_dir = test_dir("bad_config_fails");

    let config_path = test_dir.join("config.toml");
    fs::write(&config_path, "[log]\nname = \"\"\n").expect("failed to write config file");

    let output = Command::new(env!("CARGO_BIN_EXE_averager"))
        .current_dir(&test_dir)
        .env("AVERAGER_CONFIG", &config_path)
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    fs::remove_dir_all(&test_dir).ok();
}
