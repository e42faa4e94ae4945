use std::path::PathBuf;

use kv_core::StepMode;

pub const USAGE: &str = "Uso:
  kv-cli fetch --config <PATH> [--name <NAME>] [--nodes <host:port,..>] [--log-level <LEVEL>]
  kv-cli store --config <PATH> [--name <NAME>] [--nodes <host:port,..>] [--log-level <LEVEL>]
  kv-cli check --mode <fetch|store> --config <PATH> [--schema <JSON>] [--hops <N>]
  kv-cli types";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ejecuta un step leyendo filas de stdin y escribiéndolas en stdout.
    Run {
        mode: StepMode,
        config: PathBuf,
        name: Option<String>,
        nodes: Option<String>,
    },
    /// Verificación de diseño sin conectar al cluster.
    Check {
        mode: StepMode,
        config: PathBuf,
        schema: Option<String>,
        hops: usize,
    },
    /// Lista los tipos de valor seleccionables.
    Types,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: Command,
    pub log_level: String,
}

fn parse_mode(s: &str) -> Result<StepMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "fetch" => Ok(StepMode::Fetch),
        "store" => Ok(StepMode::Store),
        other => Err(format!("unknown mode: {other}")),
    }
}

/// Parsea `args` sin el nombre del binario.
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let Some(sub) = args.first() else {
        return Err("missing command".to_string());
    };
    let mut mode: Option<StepMode> = None;
    let mut config: Option<PathBuf> = None;
    let mut name: Option<String> = None;
    let mut nodes: Option<String> = None;
    let mut schema: Option<String> = None;
    let mut hops: usize = 1;
    let mut log_level = "info".to_string();
    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        let value = args.get(i).cloned().ok_or_else(|| format!("missing value for {flag}"))?;
        match flag {
            "--mode" => mode = Some(parse_mode(&value)?),
            "--config" => config = Some(PathBuf::from(value)),
            "--name" => name = Some(value),
            "--nodes" => nodes = Some(value),
            "--schema" => schema = Some(value),
            "--hops" => hops = value.parse().map_err(|_| format!("invalid --hops: {value}"))?,
            "--log-level" => log_level = value,
            other => return Err(format!("unknown flag: {other}")),
        }
        i += 1;
    }

    let command = match sub.as_str() {
        "fetch" | "store" => Command::Run { mode: parse_mode(sub)?,
                                            config: config.ok_or("--config is required")?,
                                            name,
                                            nodes },
        "check" => Command::Check { mode: mode.ok_or("--mode is required")?,
                                    config: config.ok_or("--config is required")?,
                                    schema,
                                    hops },
        "types" => Command::Types,
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(CliArgs { command, log_level })
}
