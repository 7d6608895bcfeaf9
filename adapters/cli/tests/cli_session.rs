use std::process::{Command, Output};

fn parking_jam(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parking-jam"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch the parking-jam binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn replayed_clicks_clear_the_first_level() {
    let output = parking_jam(&["--level", "1", "--clicks", "0,6;1,6;2,6"]);

    assert!(output.status.success(), "session exits cleanly");
    let text = stdout(&output);
    assert!(text.starts_with("Level 1: 3 cars"), "unexpected output:\n{text}");
    assert!(text.contains("level cleared, all 3 cars parked"));
    assert!(text.trim_end().ends_with("parked 3/3"));
}

#[test]
fn exported_code_plays_the_same_level() {
    let exported = parking_jam(&["--level", "1", "--export-code"]);
    assert!(exported.status.success());
    let code = stdout(&exported).trim().to_owned();
    assert!(code.starts_with("parking:v1:5x6:"));

    let output = parking_jam(&["--code", &code, "--clicks", "0,6;1,6;2,6"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("level cleared, all 3 cars parked"));
}

#[test]
fn locked_levels_are_refused() {
    let output = parking_jam(&["--level", "3"]);

    assert!(!output.status.success());
    let message = String::from_utf8_lossy(&output.stderr);
    assert!(message.contains("level 3 is locked or does not exist"));
}
