use super::{read_text, rule};
use crate::audio::AudioResolver;
use crate::cli::{VoiceArgs, WordSource};
use crate::config::{ProjectPaths, TtsConfig};
use crate::tts::{progress_line, AudioGenerator, PiperSynthesizer};
use anyhow::bail;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

fn tts_config(paths: &ProjectPaths, voice: VoiceArgs) -> TtsConfig {
    let mut config = TtsConfig::from_env(paths);
    if let Some(dir) = voice.model_dir {
        config.model_dir = dir;
    }
    if let Some(name) = voice.model_name {
        config.model_name = name;
    }
    if let Some(scale) = voice.length_scale {
        config.length_scale = scale;
    }
    config
}

fn synthesizer(paths: &ProjectPaths, voice: VoiceArgs) -> anyhow::Result<PiperSynthesizer> {
    let config = tts_config(paths, voice);
    info!(
        "voice {} from {} (length scale {})",
        config.model_name,
        config.model_dir.display(),
        config.length_scale
    );
    Ok(PiperSynthesizer::new(config)?)
}

/// One word per line; blank lines and `#` comments are ignored.
pub fn read_word_file(path: &Path) -> anyhow::Result<Vec<String>> {
    Ok(read_text(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

pub fn generate(
    paths: &ProjectPaths,
    source: WordSource,
    output: PathBuf,
    voice: VoiceArgs,
) -> anyhow::Result<ExitCode> {
    let words = match (source.word, source.input_file) {
        (Some(word), _) => vec![word],
        (None, Some(file)) => read_word_file(&file)?,
        (None, None) => source.words,
    };
    if words.is_empty() {
        bail!("no words to generate");
    }

    let generator = AudioGenerator::new(synthesizer(paths, voice)?, &output);
    println!("Generating {} files into {}", words.len(), output.display());

    let summary = generator.generate_words(&words, |index, total, word, result| {
        println!("{}", progress_line(index, total, word, result));
    });

    println!();
    rule();
    println!(
        "Completed: {}/{} files generated ({:.1}%)",
        summary.succeeded(),
        summary.total,
        summary.success_rate()
    );
    if !summary.failed.is_empty() {
        println!("Failed:");
        for (word, error) in &summary.failed {
            println!("  {word}: {error}");
        }
    }
    rule();

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn sentence(
    paths: &ProjectPaths,
    text: &str,
    output_file: &Path,
    voice: VoiceArgs,
) -> anyhow::Result<ExitCode> {
    let dir = output_file.parent().unwrap_or_else(|| Path::new("."));
    let generator = AudioGenerator::new(synthesizer(paths, voice)?, dir);
    match generator.generate_sentence(text, output_file) {
        Ok(()) => {
            println!("✅ Generated: {}", output_file.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("❌ Failed: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

pub fn check(paths: &ProjectPaths, words: &[String]) -> anyhow::Result<ExitCode> {
    let resolver = AudioResolver::for_project(paths);
    for source in resolver.sources() {
        info!("{}: {}", source.description, source.dir.display());
    }
    let report = resolver.report(words);

    println!("Audio availability for {} words", words.len());
    rule();
    println!("✅ Found ({})", report.found.len());
    for (word, file) in &report.found {
        println!("   • {word:20} → {file}");
    }
    if report.missing.is_empty() {
        println!("✅ All audio files present!");
    } else {
        println!("❌ Missing ({})", report.missing.len());
        for word in &report.missing {
            println!("   • {word}");
        }
    }
    rule();

    Ok(if report.missing.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
