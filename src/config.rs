use std::path::PathBuf;

use clap::Parser;
use derive_setters::Setters;

use crate::domain::TVError;

pub const DEFAULT_URL: &str = "http://localhost:8085";
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ctv",
    version,
    about = "A tui based contacts table viewer.",
    long_about = "Fetches all contacts from <URL>/api/contacts/all and shows them as a paginated, sortable and filterable table.\n\nExamples:\n  ctv\n  ctv --url http://contacts.internal:8085 --page-size 25"
)]
pub struct Args {
    #[arg(
        short = 'u',
        long = "url",
        env = "CTV_URL",
        value_name = "URL",
        default_value = DEFAULT_URL,
        help = "Base URL of the contacts service."
    )]
    pub url: String,

    #[arg(
        short = 'p',
        long = "page-size",
        env = "CTV_PAGE_SIZE",
        value_name = "ROWS",
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = parse_page_size,
        help = "Rows shown per page."
    )]
    pub page_size: usize,

    #[arg(
        long = "poll-ms",
        env = "CTV_POLL_MS",
        value_name = "MS",
        default_value_t = 100,
        help = "How long to wait for a key event before checking for loaded data."
    )]
    pub poll_ms: u64,

    #[arg(
        long = "log-file",
        env = "CTV_LOG_FILE",
        value_name = "FILE",
        default_value = "~/.ctv.log",
        help = "Log file, the terminal itself is used by the table."
    )]
    pub log_file: String,

    #[arg(
        long = "log-level",
        env = "CTV_LOG",
        value_name = "FILTER",
        default_value = "info",
        help = "Log filter directive, e.g. `debug` or `ctv=trace`."
    )]
    pub log_level: String,
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("page size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[derive(Debug, Clone, Setters)]
pub struct TVConfig {
    pub base_url: String,
    pub page_size: usize,
    pub event_poll_time: u64,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Default for TVConfig {
    fn default() -> Self {
        TVConfig {
            base_url: DEFAULT_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            event_poll_time: 100,
            log_file: PathBuf::from(".ctv.log"),
            log_level: "info".to_string(),
        }
    }
}

impl TryFrom<Args> for TVConfig {
    type Error = TVError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let log_file = shellexpand::full(&args.log_file)
            .map_err(|e| TVError::Config(format!("log file {}: {e}", args.log_file)))?;
        Ok(TVConfig {
            base_url: args.url,
            page_size: args.page_size.max(1),
            event_poll_time: args.poll_ms,
            log_file: PathBuf::from(log_file.as_ref()),
            log_level: args.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["ctv", "--log-file", "/tmp/ctv.log"]).unwrap();
        let cfg = TVConfig::try_from(args).unwrap();
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.log_file, PathBuf::from("/tmp/ctv.log"));
        assert_eq!(cfg.event_poll_time, 100);
    }

    #[test]
    fn rejects_zero_page_size() {
        assert!(Args::try_parse_from(["ctv", "--page-size", "0"]).is_err());
        assert!(Args::try_parse_from(["ctv", "--page-size", "ten"]).is_err());
    }

    #[test]
    fn explicit_values() {
        let args = Args::try_parse_from([
            "ctv",
            "--url",
            "http://example.test:9000",
            "-p",
            "25",
            "--log-file",
            "/tmp/x.log",
        ])
        .unwrap();
        let cfg = TVConfig::try_from(args).unwrap();
        assert_eq!(cfg.base_url, "http://example.test:9000");
        assert_eq!(cfg.page_size, 25);
    }

    #[test]
    fn setters_chain() {
        let cfg = TVConfig::default().page_size(3).base_url("http://h".to_string());
        assert_eq!(cfg.page_size, 3);
        assert_eq!(cfg.base_url, "http://h");
    }
}
