use std::path::PathBuf;

use clap::Parser;
use seal_crypto::HashKind;

#[derive(Parser, Debug)]
#[command(
    name = "seal",
    about = "Record content digests in a manifest, or authenticate content against one",
    version
)]
pub struct Cli {
    /// FILE... MANIFEST, or with --authenticate, MANIFEST... REPORT
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<String>,

    /// Check content against manifests instead of recording it
    #[arg(short, long)]
    pub authenticate: bool,

    /// Digest algorithm for new records (sha224, sha256)
    #[arg(long, value_name = "ALGORITHM")]
    pub hash: Option<HashKind>,

    /// Digest the decompressed content of gzip and bzip2 files
    #[arg(long)]
    pub decompress: bool,

    /// Expand directory arguments to the files beneath them
    #[arg(short, long)]
    pub recursive: bool,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter directives, e.g. `seal_manifest=debug`
    #[arg(long, value_name = "FILTER")]
    pub debug: Option<String>,

    /// Exit with failure when any warning was reported
    #[arg(long)]
    pub regard_warnings: bool,

    /// Repeat the run N times and report throughput
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub bench: Option<u32>,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Leading inputs and the trailing destination.
    pub fn inputs_and_destination(&self) -> (&[String], &str) {
        match self.paths.split_last() {
            Some((last, rest)) => (rest, last.as_str()),
            None => (&self.paths[..], ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_record() {
        let cli = Cli::try_parse_from(["seal", "a.txt", "b.txt", "manifest.rdf"]).unwrap();
        assert!(!cli.authenticate);
        let (inputs, destination) = cli.inputs_and_destination();
        assert_eq!(inputs, ["a.txt", "b.txt"]);
        assert_eq!(destination, "manifest.rdf");
    }

    #[test]
    fn parse_authenticate() {
        let cli = Cli::try_parse_from(["seal", "-a", "m.rdf", "report.txt"]).unwrap();
        assert!(cli.authenticate);
        assert_eq!(cli.inputs_and_destination(), (&["m.rdf".to_string()][..], "report.txt"));
    }

    #[test]
    fn parse_hash() {
        let cli = Cli::try_parse_from(["seal", "--hash", "SHA-224", "a", "m"]).unwrap();
        assert_eq!(cli.hash, Some(HashKind::Sha224));
        assert!(Cli::try_parse_from(["seal", "--hash", "md5", "a", "m"]).is_err());
    }

    #[test]
    fn parse_flags() {
        let cli = Cli::try_parse_from([
            "seal",
            "--decompress",
            "-r",
            "--regard-warnings",
            "--debug",
            "seal_stream=trace",
            "--bench",
            "3",
            "--format",
            "json",
            "dir",
            "m",
        ])
        .unwrap();
        assert!(cli.decompress && cli.recursive && cli.regard_warnings);
        assert_eq!(cli.debug.as_deref(), Some("seal_stream=trace"));
        assert_eq!(cli.bench, Some(3));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn bench_must_be_positive() {
        assert!(Cli::try_parse_from(["seal", "--bench", "0", "a", "m"]).is_err());
    }

    #[test]
    fn paths_required() {
        assert!(Cli::try_parse_from(["seal"]).is_err());
    }
}
