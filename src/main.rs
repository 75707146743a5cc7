mod backend;
mod config;
mod db;
mod guard;
mod ipc;
mod prefs;
mod screens;
mod session;
mod validate;

use clap::Parser;
use env_logger::Env;
use std::io::{self, BufRead, Write};

fn main() {
    // stdout carries responses only; logs go to stderr.
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let args = config::Args::parse();
    let workspace = args.workspace.clone();

    let mut state = ipc::AppState::new(args);
    if let Some(path) = workspace {
        if let Err(e) = state.open_workspace(&path) {
            log::error!("could not open workspace {}: {e:#}", path.display());
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("malformed request: {e}");
                // Can't reply without id.
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                });
                let _ = writeln!(stdout, "{}", reply);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    state.close_workspace();
}
