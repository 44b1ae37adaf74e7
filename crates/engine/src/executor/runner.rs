// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step command execution.
//!
//! Runs the built-in behavior of a step, or a user scriptlet overriding
//! it. Scriptlets get a control channel: a pair of named pipes through
//! which they can call back into the built-in step implementations.

use crate::error::ExecutionError;
use crate::executor::migration;
use crate::plugins::Plugin;
use partcraft_adapters::sources::SourceHandler;
use partcraft_core::{Part, Step};
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// How often the scriptlet loop polls the child process for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Executes built-in or user-specified step commands for one part.
///
/// User scriptlets can call the default built-in action of any step by
/// writing a `{"function": ..., "args": [...]}` line to the call FIFO;
/// every request is answered with exactly one feedback line.
pub struct Runner<'a> {
    part: &'a Part,
    step: Step,
    environment: &'a str,
    plugin: &'a dyn Plugin,
    source_handler: Option<&'a dyn SourceHandler>,
}

impl<'a> Runner<'a> {
    pub fn new(
        part: &'a Part,
        step: Step,
        environment: &'a str,
        plugin: &'a dyn Plugin,
        source_handler: Option<&'a dyn SourceHandler>,
    ) -> Self {
        Self {
            part,
            step,
            environment,
            plugin,
            source_handler,
        }
    }

    /// Run the step: the user scriptlet if one overrides it, the
    /// built-in behavior otherwise.
    pub async fn run(&self) -> Result<(), ExecutionError> {
        match self.part.spec.override_for(self.step) {
            Some(scriptlet) => {
                let name = format!("override-{}", self.step.name());
                let workdir = self.part.step_work_dir(self.step);
                self.run_scriptlet(scriptlet, &name, &workdir).await
            }
            None => self.run_builtin(self.step).await,
        }
    }

    /// Run the built-in commands for a step.
    pub async fn run_builtin(&self, step: Step) -> Result<(), ExecutionError> {
        match step {
            Step::Pull => {
                if let Some(handler) = self.source_handler {
                    handler.pull().await?;
                }
                Ok(())
            }
            Step::Build => self.builtin_build().await,
            Step::Stage => {
                let (files, dirs) = migration::stage_migration_sets(self.part)?;
                migration::migrate_files(
                    &files,
                    &dirs,
                    &self.part.part_install_dir(),
                    &self.part.stage_dir(),
                )
            }
            Step::Prime => {
                let (files, dirs) = migration::prime_migration_sets(self.part)?;
                migration::migrate_files(
                    &files,
                    &dirs,
                    &self.part.stage_dir(),
                    &self.part.prime_dir(),
                )
            }
        }
    }

    /// Synthesize and execute the part's build script.
    async fn builtin_build(&self) -> Result<(), ExecutionError> {
        let script_path = self.part.part_run_dir().join("build.sh");
        let mut script = String::new();
        script.push_str(self.environment);
        script.push_str("set -x\n");
        for command in self.plugin.get_build_commands() {
            script.push_str(&command);
            script.push('\n');
        }

        write_executable(&script_path, &script)?;

        let status = Command::new(&script_path)
            .current_dir(self.part.part_build_dir())
            .status()
            .await
            .map_err(ExecutionError::io("spawning the build script"))?;

        if !status.success() {
            return Err(ExecutionError::PluginBuild {
                part_name: self.part.name.clone(),
            });
        }
        Ok(())
    }

    /// Execute a scriptlet with the control channel set up.
    pub async fn run_scriptlet(
        &self,
        scriptlet: &str,
        scriptlet_name: &str,
        workdir: &Path,
    ) -> Result<(), ExecutionError> {
        let tempdir = tempfile::tempdir()
            .map_err(ExecutionError::io("creating the scriptlet temp directory"))?;
        let call_path = tempdir.path().join("function_call");
        let feedback_path = tempdir.path().join("call_feedback");
        let mut call_fifo = ControlFifo::create(&call_path)?;
        let mut feedback_fifo = ControlFifo::create(&feedback_path)?;

        let interpreter = std::env::current_exe()
            .map_err(ExecutionError::io("resolving the control interpreter"))?;
        let script = format!(
            "set -e\n\
             export CRAFT_PARTS_CALL_FIFO={}\n\
             export CRAFT_PARTS_FEEDBACK_FIFO={}\n\
             export CRAFT_PARTS_INTERPRETER={}\n\
             \n\
             {}\n\
             \n\
             {}\n",
            call_path.display(),
            feedback_path.display(),
            interpreter.display(),
            self.environment,
            scriptlet,
        );

        std::fs::create_dir_all(workdir)
            .map_err(ExecutionError::io("creating the scriptlet working directory"))?;
        let mut child = Command::new("/bin/sh")
            .stdin(Stdio::piped())
            .current_dir(workdir)
            .kill_on_drop(true)
            .spawn()
            .map_err(ExecutionError::io("spawning the scriptlet shell"))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(script.as_bytes())
                .await
                .map_err(ExecutionError::io("writing the scriptlet"))?;
            // dropping stdin closes the pipe so the shell sees EOF
        }

        loop {
            while let Some(call) = call_fifo.read_line()? {
                // Every control call is answered with one feedback line:
                // empty on success, the error text on failure.
                match self.handle_control_api(scriptlet_name, call.trim()).await {
                    Ok(()) => feedback_fifo.write_line("")?,
                    Err(err) => {
                        feedback_fifo.write_line(&err.to_string())?;
                        return Err(err);
                    }
                }
            }

            if let Some(status) = child
                .try_wait()
                .map_err(ExecutionError::io("polling the scriptlet"))?
            {
                if !status.success() {
                    return Err(ExecutionError::ScriptletRun {
                        scriptlet_name: scriptlet_name.to_string(),
                        code: status.code().unwrap_or(-1),
                    });
                }
                return Ok(());
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn handle_control_api(
        &self,
        scriptlet_name: &str,
        call: &str,
    ) -> Result<(), ExecutionError> {
        let invalid = |message: String| ExecutionError::InvalidControlApiCall {
            part_name: self.part.name.clone(),
            message,
        };

        let parsed: serde_json::Value = serde_json::from_str(call).map_err(|err| {
            invalid(format!(
                "{scriptlet_name:?} called a function with invalid json: {err}"
            ))
        })?;

        for attribute in ["function", "args"] {
            if parsed.get(attribute).is_none() {
                return Err(invalid(format!(
                    "control call missing attribute {attribute:?}"
                )));
            }
        }

        let function = parsed
            .get("function")
            .and_then(|f| f.as_str())
            .unwrap_or_default();
        let step = match function {
            "pull" => Step::Pull,
            "build" => Step::Build,
            "stage" => Step::Stage,
            "prime" => Step::Prime,
            other => return Err(invalid(format!("invalid function {other:?}"))),
        };

        tracing::debug!(part = %self.part.name, function, "control API call");
        self.run_builtin(step).await
    }
}

fn write_executable(path: &Path, contents: &str) -> Result<(), ExecutionError> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(ExecutionError::io(format!("creating {parent:?}")))?;
    }
    std::fs::write(path, contents).map_err(ExecutionError::io(format!("writing {path:?}")))?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(ExecutionError::io(format!("marking {path:?} executable")))?;
    Ok(())
}

/// One end of the scriptlet control channel.
///
/// Both ends of each pipe are opened non-blocking read/write, so neither
/// side can deadlock the engine: reads drain whatever is available and
/// writes cannot stall the poll loop.
struct ControlFifo {
    path: PathBuf,
    file: std::fs::File,
    buffer: String,
}

impl ControlFifo {
    fn create(path: &Path) -> Result<Self, ExecutionError> {
        nix::unistd::mkfifo(path, nix::sys::stat::Mode::S_IRWXU)
            .map_err(|err| ExecutionError::Io {
                action: format!("creating fifo {path:?}"),
                source: std::io::Error::other(err),
            })?;

        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(nix::libc::O_NONBLOCK)
            .open(path)
            .map_err(ExecutionError::io(format!("opening fifo {path:?}")))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            buffer: String::new(),
        })
    }

    /// Read a complete line if one is available, without blocking.
    fn read_line(&mut self) -> Result<Option<String>, ExecutionError> {
        let mut chunk = [0_u8; 4096];
        loop {
            match self.file.read(&mut chunk) {
                Ok(0) => break,
                Ok(count) => {
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&chunk[..count]));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    return Err(ExecutionError::Io {
                        action: format!("reading fifo {:?}", self.path),
                        source: err,
                    })
                }
            }
        }

        match self.buffer.find('\n') {
            Some(newline) => {
                let line = self.buffer[..newline].to_string();
                self.buffer.drain(..=newline);
                Ok(Some(line))
            }
            None => Ok(None),
        }
    }

    /// Write a single feedback line.
    fn write_line(&mut self, line: &str) -> Result<(), ExecutionError> {
        use std::io::Write;
        self.file
            .write_all(format!("{line}\n").as_bytes())
            .map_err(ExecutionError::io(format!("writing fifo {:?}", self.path)))
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
