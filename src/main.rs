use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
mod auth;
use saltseal::{Container, HeaderCheck, Kdf, KdfParams, Options, Storage};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KdfChoice {
    /// Single-round MD5, compatible with `openssl enc -md md5`
    Legacy,
    /// Argon2id; only saltseal can open these
    Argon2,
}

#[derive(Debug, clap::Args)]
struct Argon2Args {
    /// Argon2 memory cost in KiB (default: 65536)
    #[arg(long = "argon-mem", global = true)]
    mem_cost_kib: Option<u32>,

    /// Argon2 time cost / iterations (default: 3)
    #[arg(long = "argon-time", global = true)]
    time_cost: Option<u32>,

    /// Argon2 parallelism (default: 1)
    #[arg(long = "argon-parallelism", global = true)]
    parallelism: Option<u32>,
}

impl Argon2Args {
    fn to_kdf_params(&self) -> Result<KdfParams> {
        let default = KdfParams::default();

        Ok(KdfParams::new(
            self.mem_cost_kib.unwrap_or(default.mem_cost_kib()),
            self.time_cost.unwrap_or(default.time_cost()),
            self.parallelism.unwrap_or(default.parallelism()),
        )?)
    }
}

#[derive(Debug, Parser)]
#[command(name = "saltseal")]
#[command(
    version,
    about = "Password-based AES-128-CBC encryption in the OpenSSL \"Salted__\" format."
)]
struct Cli {
    /// Key derivation scheme
    #[arg(long, global = true, value_enum, default_value_t = KdfChoice::Legacy, env = "SALTSEAL_KDF")]
    kdf: KdfChoice,

    #[command(flatten)]
    argon2: Argon2Args,

    /// Reject containers that do not start with "Salted__"
    #[arg(long, global = true, env = "SALTSEAL_STRICT_HEADER")]
    strict_header: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn options(&self) -> Result<Options> {
        let kdf = match self.kdf {
            KdfChoice::Legacy => Kdf::LegacyMd5,
            KdfChoice::Argon2 => Kdf::Argon2id(self.argon2.to_kdf_params()?),
        };
        let header_check = if self.strict_header {
            HeaderCheck::Strict
        } else {
            HeaderCheck::Lenient
        };

        Ok(Options::default()
            .with_kdf(kdf)
            .with_header_check(header_check))
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts a file into a container file
    #[command(arg_required_else_help = true)]
    Encrypt {
        input: PathBuf,
        output: PathBuf,
        /// Overwrite OUTPUT if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Decrypts a container file
    #[command(arg_required_else_help = true)]
    Decrypt {
        input: PathBuf,
        output: PathBuf,
        /// Overwrite OUTPUT if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Encrypts text and prints the container as Base64
    #[command(arg_required_else_help = true)]
    EncryptString { text: String },

    /// Decrypts a Base64 container and prints the text
    #[command(arg_required_else_help = true)]
    DecryptString { encoded: String },

    /// Shows the public fields of a container file as JSON
    #[command(arg_required_else_help = true)]
    Inspect { input: PathBuf },
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn ensure_writable(output: &Path, force: bool) -> Result<()> {
    if !force && Storage::new(output).exists() {
        bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let options = cli.options()?;

    match &cli.command {
        Commands::Encrypt {
            input,
            output,
            force,
        } => {
            ensure_writable(output, *force)?;
            let password = auth::read_new_password()?;
            saltseal::encrypt_file_with(input, output, &password, options)
                .with_context(|| format!("failed to encrypt {}", input.display()))?;
            info!(kdf = options.kdf.name(), "wrote {}", output.display());
        }
        Commands::Decrypt {
            input,
            output,
            force,
        } => {
            ensure_writable(output, *force)?;
            let password = auth::read_password()?;
            saltseal::decrypt_file_with(input, output, &password, options)
                .with_context(|| format!("failed to decrypt {}", input.display()))?;
            info!(kdf = options.kdf.name(), "wrote {}", output.display());
        }
        Commands::EncryptString { text } => {
            let password = auth::read_new_password()?;
            let encoded = saltseal::encrypt_string_with(text, &password, options)?;
            println!("{encoded}");
        }
        Commands::DecryptString { encoded } => {
            let password = auth::read_password()?;
            let text = saltseal::decrypt_string_with(encoded, &password, options)?;
            println!("{text}");
        }
        Commands::Inspect { input } => {
            let data = Storage::new(input.as_path())
                .load()
                .with_context(|| format!("failed to read {}", input.display()))?;
            let container = Container::parse(&data, options.header_check)?;
            println!("{}", serde_json::to_string_pretty(&container.info())?);
        }
    }

    Ok(())
}
