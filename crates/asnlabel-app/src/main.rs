// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// asn-labels -- ASN QR code label sheet generator
//
// Entry point. Initialises logging, merges the configuration file with the
// command line, then either writes one PDF or serves PDFs over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use asnlabel_core::ServiceConfig;
use asnlabel_core::error::Result;
use asnlabel_core::human_errors::humanize_error;
use asnlabel_document::DocumentAssembler;
use asnlabel_server::LabelServer;
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "asn-labels")]
#[command(version)]
#[command(about = "Generate QR code ASN label sheets (Avery L4731REV-25)", long_about = None)]
struct Cli {
    /// First label number
    #[arg(long)]
    start: Option<u64>,

    /// Text placed before each number
    #[arg(long)]
    prefix: Option<String>,

    /// Number of sheets to generate
    #[arg(long)]
    pages: Option<u32>,

    /// Output PDF path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Outline each label (alignment check)
    #[arg(long)]
    borders: bool,

    /// Minimum number of digits, zero padded
    #[arg(long)]
    zeros: Option<usize>,

    /// Run the HTTP server instead of writing a file
    #[arg(long)]
    serve: bool,

    /// Server port
    #[arg(long, env = "ASN_LABELS_PORT")]
    port: Option<u16>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE", env = "ASN_LABELS_CONFIG")]
    config: Option<PathBuf>,

    /// Glyph encoding threads per page
    #[arg(long)]
    workers: Option<usize>,
}

impl Cli {
    /// Overlay the flags that were given on top of `config`.
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(start) = self.start {
            config.defaults.start = start;
        }
        if let Some(prefix) = &self.prefix {
            config.defaults.prefix = prefix.clone();
        }
        if let Some(pages) = self.pages {
            config.defaults.pages = pages;
        }
        if let Some(zeros) = self.zeros {
            config.defaults.zeros = zeros;
        }
        if self.borders {
            config.defaults.borders = true;
        }
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if let Some(port) = self.port {
            config.server_port = port;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        let human = humanize_error(&err);
        error!(error = %err, subject = err.subject().unwrap_or("-"), "{human}");
        std::process::exit(human.exit_code());
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    cli.apply(&mut config);

    let assembler = DocumentAssembler::new(config.glyph_dir(), config.workers)?;

    if cli.serve {
        serve(&config, assembler)
    } else {
        let request = config.defaults.to_request();
        let document = assembler.generate_to_file(&request, &config.output_file)?;
        info!(
            pages = document.page_count(),
            labels = document.label_count(),
            "labels written"
        );
        println!("Generated PDF file: {}", config.output_file.display());
        Ok(())
    }
}

fn serve(config: &ServiceConfig, assembler: DocumentAssembler) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut server = LabelServer::new(config, Arc::new(assembler));
        server.start().await?;
        println!(
            "Starting ASN label server on :{} (Ctrl+C to stop)",
            server.port()
        );

        tokio::signal::ctrl_c().await?;
        info!("interrupt received");
        server.stop().await
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "asn-labels",
            "--start",
            "1000",
            "--prefix",
            "DOC",
            "--pages",
            "2",
            "--zeros",
            "6",
            "--borders",
            "-o",
            "out.pdf",
        ]);
        let mut config = ServiceConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.defaults.start, 1000);
        assert_eq!(config.defaults.prefix, "DOC");
        assert_eq!(config.defaults.pages, 2);
        assert_eq!(config.defaults.zeros, 6);
        assert!(config.defaults.borders);
        assert_eq!(config.output_file, PathBuf::from("out.pdf"));
        assert!(!cli.serve);
    }

    #[test]
    fn absent_flags_keep_config() {
        let cli = Cli::parse_from(["asn-labels", "--serve"]);
        let mut config = ServiceConfig::default();
        config.defaults.prefix = "BOX".into();
        config.defaults.borders = true;
        cli.apply(&mut config);

        assert!(cli.serve);
        assert_eq!(config.defaults.prefix, "BOX");
        assert!(config.defaults.borders);
        assert_eq!(config, {
            let mut expected = ServiceConfig::default();
            expected.defaults.prefix = "BOX".into();
            expected.defaults.borders = true;
            expected
        });
    }
}
