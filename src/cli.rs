use crate::selection::parse_filters;
use crate::transform::CaseStyle;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Command-line arguments accepted by the `recase` binary.
#[derive(Parser, Debug)]
#[command(
    name = "recase",
    version,
    about = "Pick files interactively and rename them to a consistent case style"
)]
pub struct Cli {
    #[arg(value_name = "PATH", help = "Directories or files to rename (default: .)")]
    pub paths: Vec<PathBuf>,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Read additional paths from FILE, one per line"
    )]
    pub list: Option<PathBuf>,
    #[arg(short, long, value_enum, help = "Target case style (default: from config)")]
    pub style: Option<CaseStyle>,
    #[arg(
        long,
        value_name = "SEP",
        help = "Word separator overriding the style's own"
    )]
    pub separator: Option<String>,
    #[arg(
        short,
        long = "filter",
        value_name = "TEXT",
        action = ArgAction::Append,
        help = "Substring to strip from names; comma-separated, repeatable"
    )]
    pub filters: Vec<String>,
    #[arg(short, long, help = "Skip the picker and act on every listed file")]
    pub all: bool,
    #[arg(short, long, help = "Start the picker with every file selected")]
    pub preselect: bool,
    #[arg(short, long, help = "Copy files instead of renaming them")]
    pub copy: bool,
    #[arg(short = 'n', long, help = "Print the plan without touching any file")]
    pub dry_run: bool,
    #[arg(long, help = "Include dot files when listing directories")]
    pub hidden: bool,
    #[arg(
        long,
        value_name = "FILE",
        env = "RECASE_CONFIG",
        help = "Configuration file (default: platform config dir)"
    )]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Paths to scan, falling back to the working directory.
    pub fn scan_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() && self.list.is_none() {
            vec![PathBuf::from(".")]
        } else {
            self.paths.clone()
        }
    }

    /// CLI filters when any were given, otherwise `configured`.
    pub fn initial_filters(&self, configured: &[String]) -> Vec<String> {
        if self.filters.is_empty() {
            return parse_filters(&configured.join(","));
        }
        parse_filters(&self.filters.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_scan_working_directory() {
        let cli = Cli::try_parse_from(["recase"]).unwrap();
        assert_eq!(cli.scan_paths(), vec![PathBuf::from(".")]);
        assert!(cli.style.is_none());
        assert!(!cli.all);
    }

    #[test]
    fn list_file_alone_does_not_add_working_directory() {
        let cli = Cli::try_parse_from(["recase", "--list", "files.txt"]).unwrap();
        assert!(cli.scan_paths().is_empty());
    }

    #[test]
    fn filters_split_on_commas_and_repeat() {
        let cli = Cli::try_parse_from(["recase", "-f", "IMG, DSC", "-f", " copy ", "-s", "kebab"])
            .unwrap();
        assert_eq!(cli.initial_filters(&[]), vec!["IMG", "DSC", "copy"]);
        assert_eq!(cli.style, Some(CaseStyle::Kebab));
    }

    #[test]
    fn configured_filters_apply_without_flags() {
        let cli = Cli::try_parse_from(["recase", "photos"]).unwrap();
        let configured = vec!["IMG".to_string(), " ".to_string()];
        assert_eq!(cli.initial_filters(&configured), vec!["IMG"]);
    }
}
