use std::env;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// Programs tried, in order, by [`SystemSpeaker::detect`].
const SPEECH_PROGRAMS: &[&str] = &["espeak-ng", "espeak", "say", "spd-say"];

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech synthesis is not supported on this system")]
    Unsupported,
    #[error("speech program failed: {0}")]
    Failed(String),
}

/// Speaks a word aloud. Implementations must not block on playback.
pub trait Speaker {
    fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

/// Speaker for hosts without any speech facility.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeech;

impl Speaker for NoSpeech {
    fn speak(&self, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }
}

/// Shells out to a speech program found on `PATH`. Finished playback
/// processes are reaped on the next call.
#[derive(Debug)]
pub struct SystemSpeaker {
    program: Option<PathBuf>,
    playing: Mutex<Vec<Child>>,
}

impl SystemSpeaker {
    pub fn detect() -> Self {
        let program = env::var_os("PATH").and_then(|paths| {
            let dirs: Vec<PathBuf> = env::split_paths(&paths).collect();
            SPEECH_PROGRAMS
                .iter()
                .find_map(|name| find_program(&dirs, name))
        });
        debug!(program = ?program, "speech program detection finished");
        Self {
            program,
            playing: Mutex::new(Vec::new()),
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
            playing: Mutex::new(Vec::new()),
        }
    }

    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }

    /// Collects exited playback processes; returns how many are still running.
    pub fn reap(&self) -> usize {
        let mut playing = self.playing.lock();
        playing.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!(%status, "speech playback finished");
                false
            }
            Ok(None) => true,
            Err(err) => {
                debug!(error = %err, "could not poll speech process");
                false
            }
        });
        playing.len()
    }
}

impl Speaker for SystemSpeaker {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let Some(program) = &self.program else {
            return Err(SpeechError::Unsupported);
        };
        self.reap();
        let child = Command::new(program)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| SpeechError::Failed(format!("{}: {err}", program.display())))?;
        self.playing.lock().push(child);
        Ok(())
    }
}

fn find_program(dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
