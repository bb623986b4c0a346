use anyhow::{Context, Result};
use log::LevelFilter;
use marksafe::{Config, RenderContext};
use std::fs;
use std::io::{self, Read, Write};

fn main() -> Result<()> {
    let config = Config::parse();

    env_logger::Builder::new()
        .filter_level(if config.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .format_timestamp(None)
        .init();

    config.validate().context("Invalid configuration")?;

    let renderer = config.renderer()?;
    let context = RenderContext::new(config.base_url.as_deref());

    let markdown = match &config.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input: {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let html = renderer.render_with_context(&markdown, &context);

    match &config.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
            fs::write(path, &html)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            log::info!("Rendered {}", path.display());
        }
        None => io::stdout()
            .write_all(html.as_bytes())
            .context("Failed to write stdout")?,
    }

    Ok(())
}
