use anyhow::{Context, Result};
use mail_header_analyzer::mail;
use std::{fs, io::{self, Read, Write}};

mod config;

fn main() -> Result<()> {
    env_logger::init();

    let config = config::load()?;
    let options = config.options()?;

    let data = match config.input {
        Some(ref path) => fs::read(path)
            .with_context(|| format!("could not read {}", path.display()))?,
        None => {
            let mut data = vec![];
            io::stdin().read_to_end(&mut data)?;
            data
        }
    };

    // Headers copied from mail clients are not always valid UTF-8
    let headers = String::from_utf8_lossy(&data);
    let model = mail::parse_with(&headers, &options);

    log::debug!("{} fields, {} hops", model.header_list.len(), model.received.rows.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if config.output.pretty {
        serde_json::to_writer_pretty(&mut out, &model)?;
    } else {
        serde_json::to_writer(&mut out, &model)?;
    }

    writeln!(out)?;

    Ok(())
}
