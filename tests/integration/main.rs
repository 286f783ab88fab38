//! Integration tests for Crucible
//!
//! These exercise the CLI surface without a container backend: parsing,
//! help text, and the user-input error paths that must fail before any
//! backend interaction.

mod cli_tests {
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn crucible() -> Command {
        Command::cargo_bin("crucible").unwrap()
    }

    #[test]
    fn help_displays() {
        crucible()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Multi-platform build and test orchestrator",
            ));
    }

    #[test]
    fn version_displays() {
        crucible()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("crucible"));
    }

    #[test]
    fn help_lists_all_commands() {
        let assert = crucible().arg("--help").assert().success();
        let output = assert.get_output().stdout.clone();
        let help = String::from_utf8(output).unwrap();

        for command in ["run", "check", "lint", "test", "ci", "rebuild", "clean", "shell", "volumes"]
        {
            assert!(help.contains(command), "help missing command: {command}");
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        crucible()
            .arg("frobnicate")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Unknown command: frobnicate"))
            .stderr(predicate::str::contains("Recognized commands"));
    }

    #[test]
    fn unknown_environment_is_rejected() {
        crucible()
            .args(["check", "solaris"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Unknown environment: solaris"))
            .stderr(predicate::str::contains("host, linux, windows"));
    }

    #[test]
    fn shell_rejects_host() {
        crucible()
            .args(["shell", "host"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("host"));
    }

    #[test]
    fn rebuild_rejects_host() {
        crucible()
            .args(["rebuild", "host"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("runs natively"));
    }
}
