use std::{
    io::{self, Read},
    process::{Command, ExitStatus, Stdio},
};

use tracing::debug;

use crate::envsync;

/// Runs command lines through the configured native shell.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    executable: String,
    args: Vec<String>,
}

/// What a captured run produced: its exit code and stdout and stderr
/// interleaved as they were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub code: i32,
    pub output: String,
}

impl ExternalCommand {
    /// Creates an executor for `executable` invoked with `args` before each
    /// command line
    pub fn new(executable: &str, args: &[String]) -> Self {
        Self {
            executable: executable.to_string(),
            args: args.to_vec(),
        }
    }

    /// Executes `line` with inherited standard streams and returns its exit
    /// code
    pub fn execute(&self, line: &str) -> io::Result<i32> {
        let status = self
            .pass_through_command(line)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        Ok(self.exit_code(status))
    }

    /// Executes `line` through `cmd /V:ON /C` with delayed expansion enabled,
    /// collecting stdout and stderr into one buffer
    pub fn execute_captured_cmd(&self, line: &str) -> io::Result<CapturedOutput> {
        let mut command = Command::new(&self.executable);
        command.arg("/V:ON").arg("/C");
        push_raw_arg(&mut command, line);
        self.capture_combined(command)
    }

    // Helper methods

    /// `cmd` gets the line verbatim; other shells get it as one quoted
    /// argument.
    fn pass_through_command(&self, line: &str) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.args);
        if envsync::is_cmd_shell(&self.executable) {
            push_raw_arg(&mut cmd, line);
        } else {
            cmd.arg(line);
        }
        cmd
    }

    fn capture_combined(&self, mut command: Command) -> io::Result<CapturedOutput> {
        let (mut reader, writer) = os_pipe::pipe()?;
        let writer_clone = writer.try_clone()?;

        command
            .stdin(Stdio::inherit())
            .stdout(writer)
            .stderr(writer_clone);
        let mut child = command.spawn()?;
        // The command still owns the pipe's write ends; the read below only
        // sees EOF once they are closed.
        drop(command);

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let status = child.wait()?;

        Ok(CapturedOutput {
            code: self.exit_code(status),
            output: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    fn exit_code(&self, status: ExitStatus) -> i32 {
        let code = status.code().unwrap_or_else(|| signal_code(status));
        debug!(executable = %self.executable, code, "command finished");
        code
    }
}

#[cfg(windows)]
fn push_raw_arg(command: &mut Command, line: &str) {
    use std::os::windows::process::CommandExt;
    // cmd does its own quote parsing; escaping by Rust would corrupt it
    command.raw_arg(line);
}

#[cfg(not(windows))]
fn push_raw_arg(command: &mut Command, line: &str) {
    command.arg(line);
}

#[cfg(unix)]
fn signal_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map_or(1, |signal| 128 + signal)
}

#[cfg(not(unix))]
fn signal_code(_status: ExitStatus) -> i32 {
    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sh() -> ExternalCommand {
        ExternalCommand::new("sh", &["-c".to_string()])
    }

    #[test]
    fn test_execute_basic_command() {
        let tmp_dir = TempDir::new().expect("Failed to create temp dir");
        let test_file = tmp_dir.path().join("test.txt");

        let code = sh()
            .execute(&format!("touch '{}'", test_file.display()))
            .unwrap();
        assert_eq!(code, 0);
        assert!(test_file.exists());
    }

    #[test]
    fn test_execute_reports_exit_code() {
        assert_eq!(sh().execute("exit 7").unwrap(), 7);
    }

    #[test]
    fn test_execute_missing_shell() {
        let command = ExternalCommand::new("definitely-not-a-shell-veil", &[]);
        let result = command.execute("true");
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_cmd_receives_line_unchanged() {
        use std::os::unix::fs::PermissionsExt;

        let tmp_dir = TempDir::new().unwrap();
        let args_file = tmp_dir.path().join("args");
        let fake_cmd = tmp_dir.path().join("cmd");
        fs::write(
            &fake_cmd,
            format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n", args_file.display()),
        )
        .unwrap();
        fs::set_permissions(&fake_cmd, fs::Permissions::from_mode(0o755)).unwrap();

        let command = ExternalCommand::new(&fake_cmd.display().to_string(), &["/C".to_string()]);
        let code = command.execute(r#"git commit -m "a b""#).unwrap();

        assert_eq!(code, 0);
        assert_eq!(
            fs::read_to_string(&args_file).unwrap(),
            "/C\ngit commit -m \"a b\"\n"
        );
    }

    #[test]
    fn test_capture_interleaves_streams() {
        let tmp_dir = TempDir::new().unwrap();
        let script = tmp_dir.path().join("script.sh");
        fs::write(&script, "echo out; echo err 1>&2; echo done; exit 3\n").unwrap();

        let mut command = Command::new("sh");
        command.arg(&script);
        let captured = sh().capture_combined(command).unwrap();

        assert_eq!(captured.code, 3);
        assert_eq!(captured.output, "out\nerr\ndone\n");
    }
}
