use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use rawgate::classify::{classify, AUTOMATED_UA_MARKERS};
use rawgate::color;
use rawgate::compose;
use rawgate::errors::{
    display_for_serve_error, exit_code_for_io_error, exit_code_for_serve_error, ServeError,
};
use rawgate::gate::{DisclosureGate, GateState};
use rawgate::payload::payload_from_link;
use rawgate::server::function::{function_start, FunctionConfig};
use rawgate::server::worker::{worker_start, WorkerConfig};
use rawgate::{env_nonempty, verbose_enabled};

mod cli;
use cli::{Cli, Cmd};

const GENERIC_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/126.0";
const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8787";

fn main() -> ExitCode {
    // Optional .env for RAWGATE_* settings; absence is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Some(mode) = cli.color {
        color::set_color_mode(mode);
    }
    let verbose = verbose_enabled(cli.verbose);

    let result = match cli.cmd {
        Cmd::Create {
            file,
            password,
            origin,
            token_only,
        } => run_create(file, password, origin, token_only),
        Cmd::Decode {
            input,
            show_password,
            json,
        } => run_decode(&input, show_password, json),
        Cmd::View {
            input,
            user_agent,
            password,
            simulate_automated,
        } => run_view(&input, user_agent.as_deref(), password.as_deref(), simulate_automated),
        Cmd::Serve { bind, port, origin } => {
            return finish_serve(run_serve(bind, port, origin, verbose))
        }
        Cmd::Worker {
            bind,
            port,
            upstream,
        } => return finish_serve(run_worker(bind, port, upstream, verbose)),
        Cmd::Doctor => {
            run_doctor();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let use_err = color::color_enabled_stderr();
            color::log_error_stderr(use_err, &format!("rawgate: error: {e:#}"));
            let code = e
                .downcast_ref::<io::Error>()
                .map(exit_code_for_io_error)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

/// Map serving-surface failures to the shared exit-code scheme.
fn finish_serve(result: Result<(), ServeError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let use_err = color::color_enabled_stderr();
            color::log_error_stderr(
                use_err,
                &format!("rawgate: error: {}", display_for_serve_error(&e)),
            );
            ExitCode::from(exit_code_for_serve_error(&e))
        }
    }
}

fn read_script(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(p) if p.as_os_str() != "-" => {
            std::fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin")?;
            Ok(buf)
        }
    }
}

fn run_create(
    file: Option<PathBuf>,
    password: Option<String>,
    origin: Option<String>,
    token_only: bool,
) -> Result<()> {
    let code = read_script(file)?;
    let token = match compose::create(&code, password.as_deref()) {
        Some(t) => t,
        None => bail!("refusing to create a link for empty script input"),
    };
    if token_only {
        println!("{token}");
        return Ok(());
    }
    let origin = origin
        .or_else(|| env_nonempty("RAWGATE_ORIGIN"))
        .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
    let link = compose::share_link(&origin, &token);
    let use_out = color::color_enabled_stdout();
    println!("token: {token}");
    println!("link:  {}", color::paint(use_out, "\x1b[36;1m", &link));
    if password.as_deref().map(str::trim).is_some_and(|p| !p.is_empty()) {
        let use_err = color::color_enabled_stderr();
        color::log_warn_stderr(
            use_err,
            "rawgate: note: the password travels inside the link; anyone holding the link can decode it",
        );
    }
    Ok(())
}

fn run_decode(input: &str, show_password: bool, json: bool) -> Result<()> {
    let payload = match payload_from_link(input) {
        Some(p) => p,
        None => bail!("invalid token: not a well-formed payload"),
    };
    if json {
        let mut value = serde_json::to_value(&payload).context("serialize payload")?;
        if !show_password {
            if let Some(obj) = value.as_object_mut() {
                if obj.contains_key("password") {
                    obj.insert("password".to_string(), serde_json::json!("<hidden>"));
                }
            }
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    println!("timestamp: {}", payload.timestamp);
    match (&payload.password, show_password) {
        (Some(pw), true) => println!("password:  {pw}"),
        (Some(_), false) => println!("password:  <set> (use --show-password)"),
        (None, _) => println!("password:  <none>"),
    }
    println!("--");
    print!("{}", payload.code);
    if !payload.code.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn run_view(
    input: &str,
    user_agent: Option<&str>,
    password: Option<&str>,
    simulate_automated: bool,
) -> Result<()> {
    let payload = match payload_from_link(input) {
        Some(p) => p,
        None => bail!("invalid token: not a well-formed payload"),
    };
    let class = classify(user_agent.unwrap_or(GENERIC_UA));
    let mut gate = DisclosureGate::new_with_override(payload, class, simulate_automated);

    if let Some(pw) = password {
        if gate.submit(pw) == GateState::Locked {
            bail!("{}", gate.rejection().unwrap_or("locked"));
        }
    }

    // Locked and no password given: prompt on the terminal. While locked
    // nothing of the script is disclosed.
    let use_err = color::color_enabled_stderr();
    while !gate.is_unlocked() {
        if !atty::is(atty::Stream::Stdin) {
            bail!("payload is password-protected; pass --password");
        }
        eprint!("Enter Admin Password: ");
        let _ = io::stderr().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            bail!("aborted");
        }
        let attempt = line.trim_end_matches(['\r', '\n']);
        if gate.submit(attempt) == GateState::Locked {
            if let Some(msg) = gate.rejection() {
                color::log_error_stderr(use_err, msg);
            }
            // Input is cleared by dropping the line buffer each round.
        }
    }

    if let Some(code) = gate.code() {
        print!("{code}");
        if !code.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn effective_bind(bind: Option<String>) -> String {
    bind.or_else(|| env_nonempty("RAWGATE_BIND"))
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

fn effective_port(port: Option<u16>, default: u16) -> u16 {
    port.or_else(|| {
        env_nonempty("RAWGATE_PORT").and_then(|s| s.trim().parse().ok())
    })
    .unwrap_or(default)
}

fn run_serve(
    bind: Option<String>,
    port: Option<u16>,
    origin: Option<String>,
    verbose: bool,
) -> Result<(), ServeError> {
    let cfg = FunctionConfig {
        bind_host: effective_bind(bind),
        port: effective_port(port, 8787),
        origin: origin.or_else(|| env_nonempty("RAWGATE_ORIGIN")),
        verbose,
    };
    let handle = function_start(cfg)?;
    let use_err = color::color_enabled_stderr();
    color::log_info_stderr(
        use_err,
        &format!(
            "rawgate: function router on {} (share links: {}/api/raw/<token>)",
            handle.url, handle.url
        ),
    );
    handle.join();
    Ok(())
}

fn run_worker(
    bind: Option<String>,
    port: Option<u16>,
    upstream: Option<String>,
    verbose: bool,
) -> Result<(), ServeError> {
    let upstream = match upstream.or_else(|| env_nonempty("RAWGATE_UPSTREAM")) {
        Some(u) => u,
        None => {
            return Err(ServeError::Message(
                "worker requires --upstream or RAWGATE_UPSTREAM".to_string(),
            ))
        }
    };
    let cfg = WorkerConfig {
        bind_host: effective_bind(bind),
        port: effective_port(port, 8790),
        upstream,
        verbose,
    };
    let upstream_disp = cfg.upstream.clone();
    let handle = worker_start(cfg)?;
    let use_err = color::color_enabled_stderr();
    color::log_info_stderr(
        use_err,
        &format!(
            "rawgate: worker proxy on {} fronting {}",
            handle.url, upstream_disp
        ),
    );
    handle.join();
    Ok(())
}

fn run_doctor() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("rawgate doctor");
    eprintln!("  version: v{version}");
    eprintln!(
        "  build: date={} target={} profile={} rustc={}",
        env!("RAWGATE_BUILD_DATE"),
        env!("RAWGATE_BUILD_TARGET"),
        env!("RAWGATE_BUILD_PROFILE"),
        env!("RAWGATE_BUILD_RUSTC")
    );
    eprintln!(
        "  host: {} / {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    eprintln!("  automated-ua markers: {}", AUTOMATED_UA_MARKERS.join(", "));
    for key in [
        "RAWGATE_ORIGIN",
        "RAWGATE_UPSTREAM",
        "RAWGATE_BIND",
        "RAWGATE_PORT",
        "RAWGATE_VERBOSE",
        "RAWGATE_COLOR",
    ] {
        match env_nonempty(key) {
            Some(v) => eprintln!("  {key}: {v}"),
            None => eprintln!("  {key}: (unset)"),
        }
    }
}
