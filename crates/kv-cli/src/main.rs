mod args;
mod io;
mod logging;

use std::path::Path;
use std::process::exit;

use kv_core::{check_step, parse_endpoints, ConfigError, RemarkKind, RowStep, StepConfig, StepMode, ValueType};
use kv_redis::{ClusterEnv, RedisClusterConnector};
use log::{info, warn};

use crate::args::{parse_args, Command, USAGE};
use crate::io::{read_input, JsonLinesSink};

fn load_config(path: &Path) -> Result<StepConfig, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("invalid config {}: {e}", path.display()))
}

fn cluster_env() -> Option<ClusterEnv> {
    match ClusterEnv::from_env() {
        Ok(env) => Some(env),
        Err(ConfigError::NoEndpoints) => None,
        Err(e) => {
            warn!("cluster env ignored: {e}");
            None
        }
    }
}

fn run_check(mode: StepMode, config: &Path, schema: Option<String>, hops: usize) -> i32 {
    let cfg = match load_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[kv-cli check] {e}");
            return 4;
        }
    };
    let prev = match schema.map(|s| io::parse_schema(&s)).transpose() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("[kv-cli check] {e}");
            return 2;
        }
    };
    let remarks = check_step(&cfg, mode, prev.as_ref(), hops);
    for r in &remarks {
        println!("{}", serde_json::to_string(r).unwrap_or_default());
    }
    if remarks.iter().any(|r| r.kind == RemarkKind::Error) {
        4
    } else {
        0
    }
}

fn run_step(mode: StepMode, config: &Path, name: Option<String>, nodes: Option<String>) -> i32 {
    let mut cfg = match load_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[kv-cli {mode}] {e}");
            return 4;
        }
    };
    let env = cluster_env();
    // --nodes > endpoints del archivo > KV_CLUSTER_NODES
    if let Some(list) = nodes {
        match parse_endpoints(&list) {
            Ok(eps) => cfg.set_endpoints(eps),
            Err(e) => {
                eprintln!("[kv-cli {mode}] --nodes: {e}");
                return 2;
            }
        }
    } else if cfg.endpoints().is_empty() {
        if let Some(env) = &env {
            cfg.set_endpoints(env.endpoints.clone());
        }
    }
    let connector = env.as_ref().map(ClusterEnv::connector).unwrap_or_else(RedisClusterConnector::new);

    let mut source = match read_input(std::io::stdin().lock()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[kv-cli {mode}] {e}");
            return 4;
        }
    };
    let mut sink = JsonLinesSink::new(std::io::stdout().lock());
    let name = name.unwrap_or_else(|| format!("kv-{mode}"));
    let mut step = RowStep::new(name, mode, cfg, connector);

    let result = step.run(&mut source, &mut sink);
    let written = sink.rows_written();
    let flushed = sink.finish();
    match result {
        Ok(counters) => {
            info!("kv-cli {mode}:done read={} written={}", counters.lines_read, written);
            match flushed {
                Ok(_) => 0,
                Err(e) => {
                    eprintln!("[kv-cli {mode}] output error: {e}");
                    5
                }
            }
        }
        Err(e) => {
            eprintln!("[kv-cli {mode}] {e}");
            if e.is_connection() {
                5
            } else {
                4
            }
        }
    }
}

fn main() {
    // .env opcional con KV_CLUSTER_NODES
    kv_redis::init_dotenv();
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&raw) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[kv-cli] {e}\n{USAGE}");
            exit(2);
        }
    };
    logging::init(&cli.log_level);

    let code = match cli.command {
        Command::Types => {
            for name in ValueType::selectable_names() {
                println!("{name}");
            }
            0
        }
        Command::Check { mode, config, schema, hops } => run_check(mode, &config, schema, hops),
        Command::Run { mode, config, name, nodes } => run_step(mode, &config, name, nodes),
    };
    exit(code);
}
