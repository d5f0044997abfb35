use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use eet_core::config::{Config, EnvironmentType};
use eet_core::envelope::Envelope;
use eet_core::keychain::KeyChain;
use eet_core::receipt::ReceiptBuilder;
use eet_core::verify::verify_envelope;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eet")]
#[command(about = "Signed EET sales receipt envelopes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ReceiptArgs {
    /// Receipt attributes as a Java properties file.
    #[arg(long)]
    receipt: PathBuf,
    /// RSA private key, PEM or DER.
    #[arg(long)]
    key: PathBuf,
    /// Taxpayer certificate, PEM or DER.
    #[arg(long)]
    cert: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the signed SOAP envelope for a receipt.
    Envelope {
        #[command(flatten)]
        receipt: ReceiptArgs,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "playground")]
        env: EnvironmentType,
    },
    /// Print the PKP and BKP fiscal codes of a receipt.
    Codes {
        #[command(flatten)]
        receipt: ReceiptArgs,
    },
    /// Check the digest, signature and fiscal codes of an envelope.
    Verify {
        #[arg(long)]
        envelope: PathBuf,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Envelope { receipt, out, env } => {
            let config = Config::new(env);
            let envelope = build_envelope(&receipt)?;
            tracing::info!(
                env = config.env().as_str(),
                endpoint = config.endpoint_url(),
                "envelope ready"
            );
            let xml = envelope.to_xml_string();
            match out {
                Some(path) => std::fs::write(&path, xml)
                    .with_context(|| format!("failed to write envelope to '{}'", path.display()))?,
                None => println!("{xml}"),
            }
        }
        Commands::Codes { receipt } => {
            let envelope = build_envelope(&receipt)?;
            println!("PKP: {}", envelope.codes().pkp());
            println!("BKP: {}", envelope.codes().bkp());
        }
        Commands::Verify { envelope } => {
            let xml = std::fs::read_to_string(&envelope)
                .with_context(|| format!("failed to read envelope '{}'", envelope.display()))?;
            let codes = verify_envelope(&xml)?;
            println!("OK");
            println!("BKP: {}", codes.bkp());
        }
    }

    Ok(())
}

fn build_envelope(args: &ReceiptArgs) -> Result<Envelope> {
    let key_chain = Arc::new(KeyChain::from_files(&args.key, &args.cert)?);
    let mut receipt = ReceiptBuilder::from_properties_file(&args.receipt)?.build(key_chain);
    Ok(Envelope::build(&mut receipt)?)
}
