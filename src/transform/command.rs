// src/transform/command.rs

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use super::{OutputFile, SourceFile, Transform, TransformContext, TransformError};

/// Pipes each input through a shell command (stdin to stdout).
///
/// The environment gets `ASSETPIPE_MODE` (`dev`/`release`) and
/// `ASSETPIPE_FILE` (the input path) so one command can serve both modes.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    command: String,
}

impl CommandTransform {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn shell(&self) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.command);
            c
        }
    }

    fn run(&self, ctx: &TransformContext<'_>, input: &SourceFile) -> Result<Vec<u8>, TransformError> {
        let fail = |message: String| TransformError::new(&input.path, message);

        let mut child = self
            .shell()
            .env("ASSETPIPE_MODE", ctx.mode.to_string())
            .env("ASSETPIPE_FILE", &input.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| fail(format!("spawning `{}`: {e}", self.command)))?;

        // Feed stdin on its own thread; the child may fill stdout first.
        let stdin = child.stdin.take();
        let contents = input.contents.clone();
        let writer = std::thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(&contents);
            }
        });

        let output = child
            .wait_with_output()
            .map_err(|e| fail(format!("waiting for `{}`: {e}", self.command)))?;
        let _ = writer.join();

        debug!(
            command = %self.command,
            path = %input.path.display(),
            exit_code = output.status.code().unwrap_or(-1),
            "command transform finished"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!(
                "`{}` exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

impl Transform for CommandTransform {
    fn name(&self) -> &'static str {
        "command"
    }

    fn apply(
        &self,
        ctx: &TransformContext<'_>,
        inputs: &[SourceFile],
    ) -> Result<Vec<OutputFile>, TransformError> {
        inputs
            .iter()
            .map(|input| Ok(OutputFile::new(&input.rel, self.run(ctx, input)?)))
            .collect()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::types::{AssetClass, Mode};
    use std::path::PathBuf;

    fn apply(command: &str, body: &str) -> Result<Vec<OutputFile>, TransformError> {
        let fs = MockFileSystem::new();
        let ctx = TransformContext {
            class: AssetClass::ServerScripts,
            mode: Mode::Release,
            fs: &fs,
        };
        let input = SourceFile {
            path: PathBuf::from("src/php/index.php"),
            rel: PathBuf::from("index.php"),
            contents: body.as_bytes().to_vec(),
        };
        CommandTransform::new(command).apply(&ctx, &[input])
    }

    #[test]
    fn stdout_becomes_the_output() {
        let out = apply("tr a-z A-Z", "<?php echo 1;").unwrap();
        assert_eq!(out[0].contents, b"<?PHP ECHO 1;".to_vec());
    }

    #[test]
    fn mode_is_exported() {
        let out = apply("cat >/dev/null; printf %s \"$ASSETPIPE_MODE\"", "x").unwrap();
        assert_eq!(out[0].contents, b"release".to_vec());
    }

    #[test]
    fn non_zero_exit_is_a_failure() {
        let err = apply("echo boom >&2; exit 3", "x").unwrap_err();
        assert!(err.message.contains("boom"), "{err}");
    }
}
