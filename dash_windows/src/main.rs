//! Headless dashboard driver.
//!
//! Usage:
//!   cargo run -p dash_windows --bin dashd -- [--config dash.json] [--tick-hz 60]
//!
//! Reads one JSON command per line on stdin (see `dash_windows::driver`),
//! ticks the window manager at a fixed rate, and logs every event sent to a
//! window's content surface.

use std::env;
use std::io::BufRead;
use std::time::Duration;

use anyhow::Context;
use dash_shared::config::DashConfig;
use dash_windows::driver::{Driver, DriverCommand, Flow};
use tokio::sync::mpsc;
use tracing::info;

struct Args {
    config: Option<String>,
    tick_hz: Option<u32>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        config: None,
        tick_hz: None,
    };
    let argv: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--config" if i + 1 < argv.len() => {
                args.config = Some(argv[i + 1].clone());
                i += 2;
            }
            "--tick-hz" if i + 1 < argv.len() => {
                args.tick_hz = Some(argv[i + 1].parse().context("parse --tick-hz")?);
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(args)
}

fn load_config(args: &Args) -> anyhow::Result<DashConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
            DashConfig::from_json_str(&text).with_context(|| format!("parse {path}"))?
        }
        None => DashConfig::default(),
    };
    if let Some(hz) = args.tick_hz {
        cfg.tick_hz = hz;
    }
    cfg.tick_hz = cfg.tick_hz.max(1);
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args()?;
    let cfg = load_config(&args)?;
    info!(tick_hz = cfg.tick_hz, "Starting dashboard driver");

    let tick = Duration::from_secs_f64(1.0 / cfg.tick_hz as f64);
    let mut driver = Driver::new(cfg);

    let (line_tx, mut line_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    'run: loop {
        loop {
            match line_rx.try_recv() {
                Ok(line) => match DriverCommand::parse(&line) {
                    Ok(cmd) => {
                        let (output, flow) = driver.exec(cmd);
                        for line in output {
                            println!("{line}");
                        }
                        if flow == Flow::Quit {
                            break 'run;
                        }
                    }
                    Err(e) => println!("Error: {e:#}"),
                },
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    info!("Input closed");
                    break 'run;
                }
            }
        }

        for event in driver.tick(tick.as_secs_f64()) {
            info!(entity = %event.entity, payload = %event.payload, "Outbound");
        }

        tokio::time::sleep(tick).await;
    }

    let scene = driver.shutdown();
    info!(entities = scene.entity_count(), "Driver stopped");
    Ok(())
}
