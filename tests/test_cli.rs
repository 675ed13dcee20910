//! Smoke tests: commands run end to end without panicking.

use ofc_solver::cli::run_with_args;

fn args(list: &[&str]) -> Vec<String> {
    std::iter::once("ofc").chain(list.iter().copied()).map(String::from).collect()
}

#[test]
fn test_eval_and_compare() {
    run_with_args(args(&["eval", "QsQc7d/2h2c8s8dTh/3s3d3cJhJd"]));
    run_with_args(args(&["eval", "Qs/2h/"]));
    run_with_args(args(&[
        "compare",
        "QsQc7d/2h2c8s8dTh/3s3d3cJhJd",
        "2s3c4d/5h5c7s9dJh/6s6h6d2c3h",
    ]));
}

#[test]
fn test_fantasy_command() {
    run_with_args(args(&["fantasy", "AsAhAd2c3c4c5c6cKsKhKd9s9h7d"]));
    run_with_args(args(&[
        "--progressive", "fantasy", "AsAhKdKc2c3c4c5c6c8s8h8dJsJhTd9d", "--trigger", "AA",
    ]));
    // wrong size and unknown trigger are reported, not panics
    run_with_args(args(&["fantasy", "AsAhAd2c3c4c5c6cKsKhKd9s9h"]));
    run_with_args(args(&["fantasy", "AsAhAd2c3c4c5c6cKsKhKd9s9h7d", "--trigger", "JJ"]));
}

#[test]
fn test_bad_input_is_reported() {
    run_with_args(args(&["eval", "not-a-board"]));
    run_with_args(args(&["suggest", "Qs//", "QsKd"]));
    run_with_args(args(&["--policy", "greedy", "eval", "Qs//"]));
}

#[test]
fn test_train_history_and_play() {
    let dir = std::env::temp_dir().join(format!("ofc-solver-cli-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let dir_arg = dir.to_string_lossy().to_string();

    run_with_args(args(&[
        "--dir", &dir_arg, "--horizon", "2", "train", "-n", "4", "--checkpoint-every", "2",
    ]));
    assert!(dir.join("current_state.json").exists());

    run_with_args(args(&["--dir", &dir_arg, "history", "--backup", "--clean", "1"]));
    run_with_args(args(&["--dir", &dir_arg, "--horizon", "2", "suggest", "Qs/2h3h/As", "KdKc4s", "--trained"]));
    run_with_args(args(&["--dir", &dir_arg, "play", "--deal-seed", "3"]));

    let _ = std::fs::remove_dir_all(&dir);
}
