//! Runs one catalog action through the external repair script
//!
//! The script is invoked as `<interpreter> <script> -Action <key>`. Output is
//! read line by line on a worker thread and handed to the UI thread as
//! `RunEvent`s, in the order the script wrote it.

use std::io::{self, BufRead, BufReader, PipeReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use super::catalog::ActionDefinition;
use super::codepage::decode_line;
use super::error::RepairError;
use super::host::hidden_command;
use super::probe::CP850_PRELUDE;
use super::settings::RepairSettings;
use super::Repaint;

pub const SCRIPT_NAME: &str = "winrep_actions.ps1";

const POWERSHELL: &str = "powershell.exe";

/// How the script gets executed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interpreter {
    /// `powershell.exe -Command "& '<script>' -Action '<key>'"` with CP850 output
    PowerShell { program: String },
    /// `<program> <script> -Action <key>`
    Plain { program: String },
}

impl Interpreter {
    pub fn program(&self) -> &str {
        match self {
            Interpreter::PowerShell { program } | Interpreter::Plain { program } => program,
        }
    }

    fn command(&self, script: &Path, key: &str) -> Command {
        match self {
            Interpreter::PowerShell { program } => {
                let script = script.display().to_string().replace('\'', "''");
                let mut cmd = hidden_command(program);
                cmd.args([
                    "-NoProfile",
                    "-NonInteractive",
                    "-WindowStyle",
                    "Hidden",
                    "-ExecutionPolicy",
                    "Bypass",
                    "-Command",
                ])
                .arg(format!(
                    "{CP850_PRELUDE}& '{script}' -Action '{key}' 2>&1; exit $LASTEXITCODE"
                ));
                cmd
            }
            Interpreter::Plain { program } => {
                let mut cmd = hidden_command(program);
                cmd.arg(script).args(["-Action", key]);
                cmd
            }
        }
    }
}

/// Script location plus interpreter
#[derive(Clone, Debug)]
pub struct Launcher {
    pub script: PathBuf,
    pub interpreter: Interpreter,
}

impl Launcher {
    pub fn from_settings(settings: &RepairSettings) -> Self {
        let script = settings
            .script_path
            .clone()
            .unwrap_or_else(default_script_path);
        let interpreter = match &settings.interpreter {
            Some(program) => Interpreter::Plain {
                program: program.clone(),
            },
            None => Interpreter::PowerShell {
                program: POWERSHELL.to_string(),
            },
        };
        Self {
            script,
            interpreter,
        }
    }

    fn script_name(&self) -> String {
        self.script
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.script.display().to_string())
    }
}

/// The script is expected next to the executable
pub fn default_script_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(SCRIPT_NAME)))
        .unwrap_or_else(|| PathBuf::from(SCRIPT_NAME))
}

/// Where the current (or last) invocation stands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Starting,
    Running,
    Completed { success: bool },
    LaunchFailed,
}

/// Final result of one invocation
#[derive(Debug)]
pub enum RunOutcome {
    Success,
    Failed { code: i32 },
    LaunchFailed(RepairError),
}

/// Messages from the worker to the UI thread
#[derive(Debug)]
pub enum RunEvent {
    /// Script found, the process is about to be created
    Started { script: String },
    Spawned,
    Output(String),
    Finished(RunOutcome),
}

pub struct ActionRunner {
    launcher: Launcher,
    state: RunState,
    rx: Option<Receiver<RunEvent>>,
    launches: usize,
}

impl ActionRunner {
    pub fn new(launcher: Launcher) -> Self {
        Self {
            launcher,
            state: RunState::Idle,
            rx: None,
            launches: 0,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, RunState::Starting | RunState::Running)
    }

    /// Number of invocations started so far
    #[cfg(test)]
    pub fn launches(&self) -> usize {
        self.launches
    }

    /// Start `action` on a worker thread. Returns false if a run is active.
    pub fn start(&mut self, action: &'static ActionDefinition, repaint: Repaint) -> bool {
        if self.is_busy() {
            return false;
        }

        let (tx, rx) = mpsc::channel();
        let launcher = self.launcher.clone();
        let key = action.key;

        self.launches += 1;
        tracing::info!(
            "starting action {} via {} (run {})",
            key,
            launcher.script.display(),
            self.launches
        );
        thread::spawn(move || {
            let outcome = run_worker(&launcher, key, &tx, &repaint);
            tracing::debug!("action {} finished: {:?}", key, outcome);
            let _ = tx.send(RunEvent::Finished(outcome));
            repaint();
        });

        self.rx = Some(rx);
        self.state = RunState::Starting;
        true
    }

    /// Drain everything the worker has sent so far
    pub fn poll(&mut self) -> Vec<RunEvent> {
        let mut events = Vec::new();
        let Some(rx) = &self.rx else {
            return events;
        };

        let mut done = false;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    match &event {
                        RunEvent::Spawned => self.state = RunState::Running,
                        RunEvent::Finished(outcome) => {
                            self.state = match outcome {
                                RunOutcome::Success => RunState::Completed { success: true },
                                RunOutcome::Failed { .. } => RunState::Completed { success: false },
                                RunOutcome::LaunchFailed(_) => RunState::LaunchFailed,
                            };
                            done = true;
                        }
                        _ => {}
                    }
                    events.push(event);
                    if done {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // worker died without reporting
                    self.state = RunState::LaunchFailed;
                    events.push(RunEvent::Finished(RunOutcome::LaunchFailed(
                        RepairError::Io(io::Error::other("worker thread stopped unexpectedly")),
                    )));
                    done = true;
                    break;
                }
            }
        }

        if done {
            self.rx = None;
        }
        events
    }
}

fn run_worker(launcher: &Launcher, key: &str, tx: &Sender<RunEvent>, repaint: &Repaint) -> RunOutcome {
    if !launcher.script.is_file() {
        tracing::warn!("repair script missing: {}", launcher.script.display());
        return RunOutcome::LaunchFailed(RepairError::ScriptMissing(launcher.script.clone()));
    }

    send(tx, repaint, RunEvent::Started {
        script: launcher.script_name(),
    });

    // stdout and stderr share one pipe so lines keep the order they were written in
    let (reader, spawned) = match spawn_merged(launcher, key) {
        Ok(spawned) => spawned,
        Err(e) => return RunOutcome::LaunchFailed(RepairError::Io(e)),
    };
    let mut child = match spawned {
        Ok(child) => child,
        Err(source) => {
            tracing::warn!("could not start {}: {}", launcher.interpreter.program(), source);
            return RunOutcome::LaunchFailed(RepairError::Spawn {
                program: launcher.interpreter.program().to_string(),
                source,
            });
        }
    };
    send(tx, repaint, RunEvent::Spawned);

    pump_lines(reader, tx, repaint);

    match child.wait() {
        Ok(status) => match status.code() {
            Some(0) => RunOutcome::Success,
            Some(code) => RunOutcome::Failed { code },
            // killed by a signal
            None => RunOutcome::Failed { code: -1 },
        },
        Err(e) => RunOutcome::LaunchFailed(RepairError::Io(e)),
    }
}

/// Spawn with stdout and stderr both writing into the returned reader.
///
/// The outer error is pipe setup; the inner one is the spawn itself.
fn spawn_merged(launcher: &Launcher, key: &str) -> io::Result<(PipeReader, io::Result<Child>)> {
    let (reader, writer) = io::pipe()?;
    let stderr = writer.try_clone()?;
    // the Command owns the write ends; it is dropped here so the reader sees EOF
    let spawned = launcher
        .interpreter
        .command(&launcher.script, key)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr)
        .spawn();
    Ok((reader, spawned))
}

fn pump_lines(stream: impl Read, tx: &Sender<RunEvent>, repaint: &Repaint) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => send(tx, repaint, RunEvent::Output(decode_line(&buf))),
            Err(e) => {
                tracing::debug!("output stream closed: {}", e);
                break;
            }
        }
    }
}

fn send(tx: &Sender<RunEvent>, repaint: &Repaint, event: RunEvent) {
    let _ = tx.send(event);
    repaint();
}
