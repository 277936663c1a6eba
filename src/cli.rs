//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Archive a captured reading session into self-contained offline HTML.
///
/// Reads capture exports and a raw authenticated request from the input
/// directory, fetches each article with its featured comments, inlines
/// every image, and writes one standalone HTML file per article. Runs are
/// resumable: finished articles are recorded and skipped on the next run.
#[derive(Parser, Debug)]
#[command(name = "mparchiver")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to the JSON config file
    #[arg(short = 'C', long, default_value = "config.json")]
    pub config: PathBuf,

    /// Directory holding capture exports (overrides config)
    #[arg(short = 'i', long)]
    pub input_dir: Option<PathBuf>,

    /// Directory receiving archived documents (overrides config)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum random delay between articles in milliseconds (0 to disable, max 60000)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub max_delay: Option<u64>,

    /// Archive secondary articles even when they carry an origin link
    #[arg(long)]
    pub keep_promoted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["mparchiver"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert!(args.input_dir.is_none());
        assert!(args.output_dir.is_none());
        assert!(args.max_delay.is_none());
        assert!(!args.keep_promoted);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["mparchiver", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["mparchiver", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["mparchiver", "-q"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_directory_overrides() {
        let args =
            Args::try_parse_from(["mparchiver", "-i", "captures", "-o", "archive"]).unwrap();
        assert_eq!(args.input_dir, Some(PathBuf::from("captures")));
        assert_eq!(args.output_dir, Some(PathBuf::from("archive")));
    }

    #[test]
    fn test_cli_max_delay_zero_disables() {
        let args = Args::try_parse_from(["mparchiver", "-l", "0"]).unwrap();
        assert_eq!(args.max_delay, Some(0));
    }

    #[test]
    fn test_cli_max_delay_over_max_rejected() {
        let result = Args::try_parse_from(["mparchiver", "-l", "60001"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_keep_promoted_flag() {
        let args = Args::try_parse_from(["mparchiver", "--keep-promoted"]).unwrap();
        assert!(args.keep_promoted);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["mparchiver", "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        // --help causes early exit, so we check it returns an error with Help kind
        let result = Args::try_parse_from(["mparchiver", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
