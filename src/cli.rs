use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rawgate::color::ColorMode;

#[derive(Parser, Debug)]
#[command(
    name = "rawgate",
    version,
    about = "Tokenized raw-script links: create, decode, view and serve"
)]
pub(crate) struct Cli {
    /// Verbose logging to stderr (also RAWGATE_VERBOSE=1)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Colorize output: auto|always|never (also RAWGATE_COLOR)
    #[arg(long, value_enum, global = true)]
    pub color: Option<ColorMode>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Cmd {
    /// Create a shareable token and link from a script file or stdin
    Create {
        /// Script file; '-' or omitted reads stdin
        file: Option<PathBuf>,
        /// Viewer password; blank means no gate
        #[arg(long)]
        password: Option<String>,
        /// Presentation origin for the printed link (env RAWGATE_ORIGIN)
        #[arg(long)]
        origin: Option<String>,
        /// Print only the bare token
        #[arg(long = "token-only")]
        token_only: bool,
    },

    /// Decode a token or shared link and print the record
    Decode {
        /// Bare token, shared link or viewer URL
        input: String,
        /// Include the plaintext password in the output
        #[arg(long = "show-password")]
        show_password: bool,
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the viewer gate for a token or link; prompts while locked
    View {
        /// Bare token, shared link or viewer URL
        input: String,
        /// Identifying header to classify (defaults to a generic browser)
        #[arg(long = "user-agent")]
        user_agent: Option<String>,
        /// Password supplied non-interactively
        #[arg(long)]
        password: Option<String>,
        /// Force the automated-environment path (viewer testing toggle)
        #[arg(long = "simulate-automated")]
        simulate_automated: bool,
    },

    /// Serve the function-shape router (path-rewritten /api/raw surface)
    Serve {
        /// Bind host (env RAWGATE_BIND; default 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
        /// Port (env RAWGATE_PORT; default 8787)
        #[arg(long)]
        port: Option<u16>,
        /// Presentation origin for redirects (env RAWGATE_ORIGIN;
        /// derived from request headers when unset)
        #[arg(long)]
        origin: Option<String>,
    },

    /// Serve the worker-shape reverse proxy fronting the static origin
    Worker {
        /// Bind host (env RAWGATE_BIND; default 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
        /// Port (env RAWGATE_PORT; default 8790)
        #[arg(long)]
        port: Option<u16>,
        /// Origin to front, e.g. https://example.pages.dev
        /// (env RAWGATE_UPSTREAM; required)
        #[arg(long)]
        upstream: Option<String>,
    },

    /// Run diagnostics: build info and effective configuration
    Doctor,
}
