use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tabular_prep::{load_data, preprocess_data};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: tabular-prep <file.csv>");
        std::process::exit(2);
    };

    let data = load_data(&path).with_context(|| format!("loading {}", path.display()))?;
    let data = preprocess_data(data);
    log::info!("{} rows x {} columns ready", data.len(), data.width());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &data).context("writing JSON records")?;
    writeln!(out).context("writing JSON records")?;
    Ok(())
}
