use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "attest", version, about = "Tamper-evident, selectively redactable attestations")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log line format on stderr. Filtering follows RUST_LOG (default: warn).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Refuse input files larger than this many bytes.
    #[arg(long, global = true, default_value_t = attest_core::format::DEFAULT_MAX_JSON_BYTES)]
    pub max_json_bytes: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Wrap claim documents into one batch and write the wrapped files.
    Wrap {
        /// JSON files or directories containing `*.json` files.
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output directory for wrapped documents.
        #[arg(long, default_value = "./wrapped")]
        out: String,

        /// Document layout: v2|v3
        #[arg(long, default_value = "v2")]
        format: String,

        /// Keep leaves that are already salted (re-wrap a salted payload).
        #[arg(long)]
        preserve_salted: bool,
    },

    /// Verify wrapped documents. Exits non-zero if any fails.
    Verify {
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Redact fields from a wrapped document.
    Obfuscate {
        file: String,

        /// Field path to redact, e.g. `name.first` or `tags[0]`. Repeatable.
        #[arg(long = "path", required = true)]
        paths: Vec<String>,

        /// Output file (default: stdout).
        #[arg(long)]
        out: Option<String>,
    },

    /// Recompute and print the document digest (targetHash).
    Digest { file: String },

    /// Print the claim data of a wrapped document with salts removed.
    Unsalt { file: String },
}
