use clap::Parser;
use std::path::Path;

use crate::import::ContentType;
use crate::io::STDIN_PATH;

#[derive(Parser, Debug)]
#[command(name = "takeout-import")]
#[command(version)]
#[command(about = "Import channel subscriptions from a Takeout export", long_about = None)]
#[command(after_help = "Examples:\n  \
  takeout-import takeout-20240101.zip            list subscriptions found in the archive\n  \
  takeout-import --json subscriptions.csv        print them as JSON\n  \
  cat export.bin | takeout-import -t zip -       read a ZIP archive from stdin")]
pub struct Cli {
    /// Export file path, or - for stdin
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Content type of the export (json, csv, zip, or a MIME type)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub content_type: Option<String>,

    /// Service id stamped on every imported subscription
    #[arg(short = 's', long, value_name = "ID", default_value_t = 0)]
    pub service_id: i32,

    /// Print subscriptions as a JSON array
    #[arg(long)]
    pub json: bool,

    /// Verbose logging (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode, only errors are logged
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn is_stdin(&self) -> bool {
        self.file == STDIN_PATH
    }

    /// Content type token to hand to the extractor.
    ///
    /// An explicit `--type` wins; otherwise the file extension is used.
    /// `None` leaves the choice to the extractor's default.
    pub fn content_type(&self) -> Option<String> {
        if let Some(token) = &self.content_type {
            return Some(token.clone());
        }
        if self.is_stdin() {
            return None;
        }
        ContentType::from_extension(Path::new(&self.file)).map(|ty| ty.as_str().to_string())
    }

    /// Default log filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}
