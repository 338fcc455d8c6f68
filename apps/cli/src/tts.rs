//! Text-to-speech through a narrow synthesis interface.
//!
//! [`PiperSynthesizer`] drives the piper command-line tool; tests substitute
//! their own [`Synthesizer`].

use crate::config::{ConfigError, TtsConfig, SENTENCE_TIMEOUT, WORD_TIMEOUT};
use crate::fs_util::write_atomic;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("failed to start TTS process: {0}")]
    Spawn(#[source] io::Error),

    #[error("TTS timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("TTS exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("TTS produced no output file")]
    MissingOutput,

    #[error("nothing to synthesize")]
    EmptyText,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Text to speak and how long the engine may take.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub timeout: Duration,
}

pub trait Synthesizer {
    /// Returns the WAV bytes for `request.text`.
    fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<Vec<u8>, SynthesisError>;
}

/// Runs `<python> -m piper` once per request.
#[derive(Debug, Clone)]
pub struct PiperSynthesizer {
    config: TtsConfig,
}

impl PiperSynthesizer {
    /// Fails when the voice model or its config is missing.
    pub fn new(config: TtsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TtsConfig {
        &self.config
    }

    fn wait(child: &mut std::process::Child, timeout: Duration) -> Result<ExitStatus, SynthesisError> {
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() >= timeout {
                if let Err(e) = child.kill() {
                    warn!("failed to kill TTS process: {}", e);
                }
                if let Err(e) = child.wait() {
                    warn!("failed to reap TTS process: {}", e);
                }
                return Err(SynthesisError::Timeout(timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Synthesizer for PiperSynthesizer {
    fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<Vec<u8>, SynthesisError> {
        let scratch = tempfile::tempdir()?;
        let output = scratch.path().join("speech.wav");
        let stderr_path = scratch.path().join("stderr.log");
        // stderr goes to a file so a chatty child cannot fill the pipe and stall
        let stderr = File::create(&stderr_path)?;

        debug!("piper: {:?} ({}s budget)", request.text, request.timeout.as_secs());
        let mut child = Command::new(&self.config.python)
            .arg("-m")
            .arg("piper")
            .arg("--model")
            .arg(self.config.model_path())
            .arg("--config")
            .arg(self.config.config_path())
            .arg("--length-scale")
            .arg(self.config.length_scale.to_string())
            .arg("--output_file")
            .arg(&output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(SynthesisError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(request.text.as_bytes()) {
                debug!("TTS stdin closed early: {}", e);
            }
        }

        let status = Self::wait(&mut child, request.timeout)?;
        if !status.success() {
            let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(SynthesisError::Failed {
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !output.is_file() {
            return Err(SynthesisError::MissingOutput);
        }
        Ok(fs::read(&output)?)
    }
}

/// `<Capitalised>.wav` for a word.
pub fn output_file_name(word: &str) -> String {
    let mut chars = word.chars();
    let stem: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{stem}.wav")
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default)]
pub struct GenerationSummary {
    pub total: usize,
    pub generated: Vec<PathBuf>,
    pub failed: Vec<(String, String)>,
}

impl GenerationSummary {
    pub fn succeeded(&self) -> usize {
        self.generated.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.succeeded() as f64 * 100.0 / self.total as f64
    }
}

/// Writes synthesized audio into one output directory.
pub struct AudioGenerator<S> {
    synthesizer: S,
    output_dir: PathBuf,
}

impl<S: Synthesizer> AudioGenerator<S> {
    pub fn new(synthesizer: S, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            synthesizer,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn generate_word(&self, word: &str) -> Result<PathBuf, SynthesisError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(SynthesisError::EmptyText);
        }
        let path = self.output_dir.join(output_file_name(word));
        self.render(word, WORD_TIMEOUT, &path)?;
        Ok(path)
    }

    pub fn generate_sentence(&self, text: &str, output: &Path) -> Result<(), SynthesisError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SynthesisError::EmptyText);
        }
        self.render(text, SENTENCE_TIMEOUT, output)
    }

    /// Generate every word, continuing after failures.
    ///
    /// `progress` sees the 1-based index, the total, the word and its result.
    pub fn generate_words<W, F>(&self, words: &[W], mut progress: F) -> GenerationSummary
    where
        W: AsRef<str>,
        F: FnMut(usize, usize, &str, &Result<PathBuf, SynthesisError>),
    {
        let total = words.len();
        let mut summary = GenerationSummary {
            total,
            ..Default::default()
        };
        for (index, word) in words.iter().enumerate() {
            let word = word.as_ref();
            let result = self.generate_word(word);
            progress(index + 1, total, word, &result);
            match result {
                Ok(path) => summary.generated.push(path),
                Err(e) => summary.failed.push((word.to_string(), e.to_string())),
            }
        }
        summary
    }

    fn render(&self, text: &str, timeout: Duration, path: &Path) -> Result<(), SynthesisError> {
        let audio = self
            .synthesizer
            .synthesize(&SynthesisRequest { text, timeout })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(path, &audio)?;
        Ok(())
    }
}

/// `✅ [ 3/10] Hund - Hund.wav` style progress line.
pub fn progress_line(index: usize, total: usize, word: &str, result: &Result<PathBuf, SynthesisError>) -> String {
    let width = total.to_string().len();
    match result {
        Ok(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("✅ [{index:>width$}/{total}] {word} - {name}")
        }
        Err(e) => format!("❌ [{index:>width$}/{total}] {word} - {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Echoes the text back as bytes; fails on words listed in `reject`.
    struct EchoSynthesizer {
        reject: Vec<&'static str>,
        seen: RefCell<Vec<(String, Duration)>>,
    }

    impl Synthesizer for EchoSynthesizer {
        fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<Vec<u8>, SynthesisError> {
            self.seen
                .borrow_mut()
                .push((request.text.to_string(), request.timeout));
            if self.reject.contains(&request.text) {
                return Err(SynthesisError::Timeout(request.timeout));
            }
            Ok(request.text.as_bytes().to_vec())
        }
    }

    fn echo(reject: Vec<&'static str>) -> EchoSynthesizer {
        EchoSynthesizer {
            reject,
            seen: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn file_names_are_capitalised() {
        assert_eq!(output_file_name("wissen"), "Wissen.wav");
        assert_eq!(output_file_name("Hund"), "Hund.wav");
        assert_eq!(output_file_name("übermorgen"), "Übermorgen.wav");
    }

    #[test]
    fn batch_continues_after_failures() {
        let dir = tempfile::tempdir().unwrap();
        let generator = AudioGenerator::new(echo(vec!["sollen"]), dir.path());
        let mut lines = Vec::new();
        let summary = generator.generate_words(&["sagen", "sollen", "denken"], |i, n, w, r| {
            lines.push(progress_line(i, n, w, r));
        });

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "sollen");
        assert!(!summary.is_success());
        assert_eq!(lines[0], "✅ [1/3] sagen - Sagen.wav");
        assert!(lines[1].starts_with("❌ [2/3] sollen - TTS timed out"));
        assert_eq!(fs::read(dir.path().join("Denken.wav")).unwrap(), b"denken");
        assert!(!dir.path().join("Sollen.wav").exists());
    }

    #[test]
    fn sentences_get_the_longer_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let generator = AudioGenerator::new(echo(vec![]), dir.path());
        let out = dir.path().join("nested").join("satz.wav");
        generator.generate_sentence("Der Hund bellt.", &out).unwrap();
        generator.generate_word("Hund").unwrap();

        let seen = generator.synthesizer.seen.borrow();
        assert_eq!(seen[0].1, SENTENCE_TIMEOUT);
        assert_eq!(seen[1].1, WORD_TIMEOUT);
        assert_eq!(fs::read(out).unwrap(), b"Der Hund bellt.");
    }

    #[test]
    fn blank_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let generator = AudioGenerator::new(echo(vec![]), dir.path());
        assert!(matches!(generator.generate_word("  "), Err(SynthesisError::EmptyText)));
        assert!(generator.synthesizer.seen.borrow().is_empty());
    }

    #[test]
    fn piper_requires_model_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = TtsConfig::from_env(&crate::config::ProjectPaths::new(dir.path()));
        assert!(PiperSynthesizer::new(config).is_err());
    }

    /// Fake `python` that ignores its arguments and runs `body`.
    #[cfg(unix)]
    fn script_config(dir: &Path, body: &str) -> TtsConfig {
        use std::os::unix::fs::PermissionsExt;

        let models = dir.join("models");
        fs::create_dir_all(&models).unwrap();
        fs::write(models.join("voice.onnx"), b"").unwrap();
        fs::write(models.join("voice.onnx.json"), b"{}").unwrap();

        let script = dir.join("fake-python");
        fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        TtsConfig {
            python: script.to_string_lossy().into_owned(),
            model_dir: models,
            model_name: "voice".into(),
            length_scale: 1.0,
        }
    }

    // One test so no other test thread forks while a script is open for writing.
    #[cfg(unix)]
    #[test]
    fn piper_process_outcomes() {
        let request = |text| SynthesisRequest {
            text,
            timeout: Duration::from_millis(300),
        };

        let dir = tempfile::tempdir().unwrap();
        let slow = PiperSynthesizer::new(script_config(dir.path(), "sleep 5")).unwrap();
        let started = Instant::now();
        let err = slow.synthesize(&request("Hund")).unwrap_err();
        assert!(matches!(err, SynthesisError::Timeout(t) if t == Duration::from_millis(300)));
        assert!(started.elapsed() < Duration::from_secs(4));

        let dir = tempfile::tempdir().unwrap();
        let failing = PiperSynthesizer::new(script_config(dir.path(), "echo 'no voice' >&2\nexit 3")).unwrap();
        match failing.synthesize(&request("Hund")).unwrap_err() {
            SynthesisError::Failed { stderr, .. } => assert_eq!(stderr, "no voice"),
            other => panic!("unexpected error: {other:?}"),
        }

        let dir = tempfile::tempdir().unwrap();
        let silent = PiperSynthesizer::new(script_config(dir.path(), "cat > /dev/null")).unwrap();
        assert!(matches!(
            silent.synthesize(&request("Hund")).unwrap_err(),
            SynthesisError::MissingOutput
        ));

        // the output path is the last argument; the text arrives on stdin
        let dir = tempfile::tempdir().unwrap();
        let working =
            PiperSynthesizer::new(script_config(dir.path(), "for a; do out=$a; done\ncat > \"$out\"")).unwrap();
        assert_eq!(working.synthesize(&request("Hund")).unwrap(), b"Hund");
    }
}
