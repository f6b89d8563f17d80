//! valkey-operator - renders the desired Deployment for a ValkeyCluster.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Prints the ValkeyCluster CRD (`--crd`)
//! - Renders the Deployment for a cluster manifest (`render`)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kube::{CustomResourceExt, ResourceExt};
use tracing::{error, info};

use valkey_operator::config::{
    DEFAULT_EXPORTER_IMAGE, DEFAULT_EXPORTER_IMAGE_ENV, DEFAULT_IMAGE, DEFAULT_IMAGE_ENV,
};
use valkey_operator::crd::ValkeyCluster;
use valkey_operator::manifest::{OutputFormat, load_cluster, render};
use valkey_operator::{SynthesisDefaults, generate_deployment};

/// valkey-operator - desired-state synthesis for Valkey clusters
#[derive(Parser, Debug)]
#[command(name = "valkey-operator", version, about, long_about = None)]
struct Cli {
    /// Print the ValkeyCluster CRD manifest and exit
    #[arg(long)]
    crd: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the Deployment a ValkeyCluster converges toward
    Render(RenderArgs),
}

/// Render mode arguments
#[derive(Parser, Debug)]
struct RenderArgs {
    /// Path to the ValkeyCluster manifest ("-" reads stdin)
    #[arg(short = 'f', long = "filename")]
    file: PathBuf,

    /// Namespace used when the manifest does not set one
    #[arg(short, long, default_value = "default")]
    namespace: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    output: OutputFormat,

    /// Valkey image used when the cluster does not set one
    #[arg(long, env = DEFAULT_IMAGE_ENV, default_value = DEFAULT_IMAGE)]
    default_image: String,

    /// Exporter image used when the cluster does not set one
    #[arg(long, env = DEFAULT_EXPORTER_IMAGE_ENV, default_value = DEFAULT_EXPORTER_IMAGE)]
    default_exporter_image: String,
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the rendered manifest
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("valkey_operator=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    if cli.crd {
        return match serde_yaml::to_string(&ValkeyCluster::crd()) {
            Ok(crd) => {
                println!("{crd}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to serialize CRD: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match cli.command {
        Some(Commands::Render(args)) => match run_render(args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                if e.is_user_error() {
                    error!("Invalid ValkeyCluster manifest: {}", e);
                } else {
                    error!("Render failed: {}", e);
                }
                ExitCode::from(e.exit_status())
            }
        },
        None => {
            error!("No command given; use --crd or render");
            ExitCode::from(2)
        }
    }
}

impl RenderArgs {
    /// Image defaults resolved from flags, environment and built-in constants.
    fn synthesis_defaults(&self) -> SynthesisDefaults {
        SynthesisDefaults::default()
            .with_image(self.default_image.as_str())
            .with_exporter_image(self.default_exporter_image.as_str())
    }
}

/// Load the manifest, generate the Deployment and print it.
fn run_render(args: RenderArgs) -> valkey_operator::Result<()> {
    let defaults = args.synthesis_defaults();

    let cluster = load_cluster(&args.file, &args.namespace)?;
    let deployment = generate_deployment(&cluster, &defaults);
    info!(
        name = %cluster.name_any(),
        namespace = %cluster.namespace().unwrap_or_default(),
        exporter = cluster.spec.exporter.enabled,
        "Rendered Deployment"
    );

    println!("{}", render(&deployment, args.output)?.trim_end());
    Ok(())
}
