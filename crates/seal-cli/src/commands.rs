use std::path::Path;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use colored::Colorize;
use seal_manifest::{Authenticator, DigestConfig, Recorder, RunSummary};
use seal_stream::STANDARD_REFERENCE;
use tracing::debug;
use walkdir::WalkDir;

use crate::cli::{Cli, OutputFormat};

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = resolve_config(&cli)?;
    let (inputs, destination) = cli.inputs_and_destination();
    debug!(?config, inputs = inputs.len(), destination, "resolved invocation");

    let runs = cli.bench.unwrap_or(1);
    let started = Instant::now();
    let mut summary = RunSummary::default();
    for _ in 0..runs {
        summary = if cli.authenticate {
            cmd_authenticate(&config, inputs, destination)?
        } else {
            cmd_record(&config, inputs, destination, cli.recursive)?
        };
    }
    let elapsed = started.elapsed();

    let to_stderr = destination == STANDARD_REFERENCE;
    print_summary(&summary, cli.format, cli.authenticate, to_stderr)?;
    if cli.bench.is_some() {
        print_bench(&summary, runs, elapsed, cli.authenticate);
    }

    Ok(if summary.succeeded(config.regard_warnings) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Config file (or defaults) with command-line flags applied on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<DigestConfig> {
    let mut config = match &cli.config {
        Some(path) => DigestConfig::load(path)?,
        None => DigestConfig::default(),
    };
    if let Some(hash) = cli.hash {
        config.hash = hash;
    }
    config.decompress |= cli.decompress;
    config.regard_warnings |= cli.regard_warnings;
    config.validate()?;
    Ok(config)
}

fn cmd_record(
    config: &DigestConfig,
    inputs: &[String],
    manifest: &str,
    recursive: bool,
) -> anyhow::Result<RunSummary> {
    if inputs.is_empty() {
        bail!("expected at least one FILE before the MANIFEST");
    }
    let contents = expand_inputs(inputs, recursive)?;
    let summary = Recorder::new(config.clone()).record(&contents, manifest)?;
    Ok(summary)
}

fn cmd_authenticate(
    config: &DigestConfig,
    manifests: &[String],
    report: &str,
) -> anyhow::Result<RunSummary> {
    let summary = Authenticator::new(config.clone()).authenticate(manifests, report)?;
    Ok(summary)
}

/// Replace directory arguments with the regular files beneath them, in
/// name order. Other arguments pass through untouched.
fn expand_inputs(inputs: &[String], recursive: bool) -> anyhow::Result<Vec<String>> {
    let mut contents = Vec::with_capacity(inputs.len());
    for input in inputs {
        if !recursive || !Path::new(input).is_dir() {
            contents.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.with_context(|| format!("cannot walk {input}"))?;
            if entry.file_type().is_file() {
                contents.push(entry.path().to_string_lossy().into_owned());
            }
        }
    }
    Ok(contents)
}

fn print_summary(
    summary: &RunSummary,
    format: OutputFormat,
    authenticate: bool,
    to_stderr: bool,
) -> anyhow::Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(summary)?,
        OutputFormat::Text => render_text(summary, authenticate),
    };
    if to_stderr {
        eprintln!("{text}");
    } else {
        println!("{text}");
    }
    Ok(())
}

fn render_text(summary: &RunSummary, authenticate: bool) -> String {
    let mut lines = Vec::new();
    if authenticate {
        let status = if summary.discrepancies == 0 {
            "✓".green().bold()
        } else {
            "✗".red().bold()
        };
        lines.push(format!(
            "{status} {} authenticated, {} discrepancies",
            summary.verified.to_string().bold(),
            summary.discrepancies.to_string().bold()
        ));
    } else {
        lines.push(format!(
            "{} {} recorded",
            "✓".green().bold(),
            summary.recorded.to_string().bold()
        ));
    }
    for warning in &summary.warnings {
        lines.push(format!(
            "  {} {}: {}",
            "warning:".yellow(),
            warning.reference,
            warning.message
        ));
    }
    lines.join("\n")
}

fn print_bench(summary: &RunSummary, runs: u32, elapsed: Duration, authenticate: bool) {
    let items = if authenticate {
        summary.verified + summary.discrepancies
    } else {
        summary.recorded
    };
    let per_run = elapsed / runs;
    let rate = (items as f64 * f64::from(runs)) / elapsed.as_secs_f64().max(f64::EPSILON);
    eprintln!(
        "{} {runs} runs in {:.3}s ({:.3}s/run, {:.1} items/s)",
        "bench:".cyan(),
        elapsed.as_secs_f64(),
        per_run.as_secs_f64(),
        rate
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use seal_crypto::HashKind;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("seal").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seal.toml");
        std::fs::write(&path, "hash = \"sha224\"\nchunk_size = 4096\n").unwrap();
        let config_arg = path.to_string_lossy().into_owned();

        let config = resolve_config(&parse(&["--config", &config_arg, "a", "m"])).unwrap();
        assert_eq!(config.hash, HashKind::Sha224);
        assert_eq!(config.chunk_size, 4096);
        assert!(!config.decompress);

        let config = resolve_config(&parse(&[
            "--config",
            &config_arg,
            "--hash",
            "sha256",
            "--decompress",
            "a",
            "m",
        ]))
        .unwrap();
        assert_eq!(config.hash, HashKind::Sha256);
        assert!(config.decompress);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(resolve_config(&parse(&["--config", "/no/such/seal.toml", "a", "m"])).is_err());
    }

    #[test]
    fn recursive_expansion() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("sub/a.txt"), b"a").unwrap();
        let root = dir.path().to_string_lossy().into_owned();

        let flat = expand_inputs(&[root.clone()], false).unwrap();
        assert_eq!(flat, vec![root.clone()]);

        let expanded = expand_inputs(&[root.clone(), "-".into()], true).unwrap();
        assert_eq!(expanded.len(), 3);
        assert!(expanded[0].ends_with("b.txt"));
        assert!(expanded[1].ends_with("a.txt"));
        assert_eq!(expanded[2], "-");
    }

    #[test]
    fn record_then_authenticate() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("hello.txt");
        std::fs::write(&content, b"hello").unwrap();
        let content = content.to_string_lossy().into_owned();
        let manifest = dir.path().join("m.rdf").to_string_lossy().into_owned();
        let report = dir.path().join("report.txt").to_string_lossy().into_owned();

        let code = run_command(parse(&[&content, &manifest])).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let code = run_command(parse(&["-a", &manifest, &report])).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        std::fs::write(&content, b"jello").unwrap();
        let code = run_command(parse(&["-a", &manifest, &report])).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        let text = std::fs::read_to_string(&report).unwrap();
        assert!(text.starts_with(&format!("Path: {content}\n")));
    }

    #[test]
    fn warnings_fail_only_when_regarded() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing").to_string_lossy().into_owned();
        let manifest = dir.path().join("m.rdf").to_string_lossy().into_owned();

        let code = run_command(parse(&[&missing, &manifest])).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        let code = run_command(parse(&["--regard-warnings", &missing, &manifest])).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn record_needs_content() {
        assert!(run_command(parse(&["m.rdf"])).is_err());
    }

    #[test]
    fn text_summary_lists_warnings() {
        let mut summary = RunSummary {
            verified: 2,
            discrepancies: 1,
            ..RunSummary::default()
        };
        summary.warn(seal_manifest::Warning::new("gone.txt", "unable to open gone.txt"));
        colored::control::set_override(false);
        let text = render_text(&summary, true);
        assert_eq!(
            text,
            "✗ 2 authenticated, 1 discrepancies\n  warning: gone.txt: unable to open gone.txt"
        );
    }
}
