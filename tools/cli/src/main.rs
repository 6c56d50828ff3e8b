//! Keyshard CLI - Command line interface for keyfiles and key shares.
//!
//! Generates encrypted keyfiles, splits keys and secrets into
//! password-protected share files, and recovers them again.

mod files;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use keyshard_account::Address;
use keyshard_common::{decode_hex, Error, SensitiveBytes};
use keyshard_crypto::{KdfParams, KdfStrength};
use keyshard_keystore::{
    generate, recover_from_keyfiles, split_to_keyfiles, KeySource, Keyfile, KeystoreConfig,
    ShareScheme,
};

use crate::files::{read_keyfile, share_path, write_keyfile};

#[derive(Parser)]
#[command(name = "keyshard")]
#[command(about = "Keyshard - Encrypted keyfiles and threshold key shares")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    crypto: CryptoArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Algorithm choices for newly written keyfiles.
#[derive(Args)]
struct CryptoArgs {
    /// Cipher: "aes-128-ctr" or "aes-256-ctr".
    #[arg(long, global = true, default_value = "aes-128-ctr")]
    cipher: String,

    /// Key derivation function: "scrypt" or "pbkdf2".
    #[arg(long, global = true, default_value = "scrypt")]
    kdf: String,

    /// Use cheaper KDF costs.
    #[arg(long, global = true)]
    light: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate (or import) a private key and write it to a keyfile.
    Generate {
        /// Import this private key (hex) instead of generating one.
        #[arg(long, conflicts_with = "vanity")]
        privkey: Option<String>,

        /// Search for an address starting with this hex prefix.
        #[arg(long)]
        vanity: Option<String>,

        /// Match the vanity prefix against the checksum address.
        #[arg(long, requires = "vanity")]
        case_sensitive: bool,

        /// Vanity search time budget in seconds.
        #[arg(long, default_value_t = 60)]
        timeout: u64,

        /// Vanity search worker threads (default: available cores).
        #[arg(long)]
        workers: Option<usize>,

        /// Output file (default: <address>.json).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a private key into share keyfiles.
    SplitKey {
        /// Private key (hex); prompted for when omitted.
        #[arg(long)]
        privkey: Option<String>,

        #[command(flatten)]
        split: SplitArgs,
    },

    /// Split an arbitrary secret into share keyfiles.
    SplitSecret {
        /// Secret text; prompted for when omitted.
        #[arg(long)]
        secret: Option<String>,

        #[command(flatten)]
        split: SplitArgs,
    },

    /// Recover a key or secret from share keyfiles.
    Recover {
        /// Share keyfiles; at least the threshold number.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Prompt for a separate password per file.
        #[arg(long)]
        separate_passwords: bool,
    },

    /// Show a keyfile's public metadata.
    Inspect {
        /// Path to the keyfile.
        file: PathBuf,
    },
}

#[derive(Args)]
struct SplitArgs {
    /// Number of shares to create.
    #[arg(short = 'n', long)]
    shares: usize,

    /// Number of shares needed to recover.
    #[arg(short = 't', long)]
    threshold: usize,

    /// File name prefix; the share index and ".json" are appended.
    #[arg(short, long, default_value = "share-")]
    fileptrn: String,

    /// Prompt for a separate password per share.
    #[arg(long)]
    separate_passwords: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Generate {
            privkey,
            vanity,
            case_sensitive,
            timeout,
            workers,
            output,
        } => {
            let config = keystore_config(&cli.crypto)?;
            let source = match (privkey, vanity) {
                (Some(key_hex), _) => {
                    KeySource::Import(parse_private_key(&Zeroizing::new(key_hex))?)
                }
                (None, Some(prefix)) => KeySource::Vanity {
                    prefix,
                    case_sensitive,
                    budget: Duration::from_secs(timeout),
                    workers: workers.unwrap_or_else(default_workers),
                },
                (None, None) => KeySource::Random,
            };
            cmd_generate(&config, source, output)
        }

        Commands::SplitKey { privkey, split } => {
            let config = keystore_config(&cli.crypto)?;
            let key_hex = match privkey {
                Some(key_hex) => Zeroizing::new(key_hex),
                None => prompt_secret("Private key (hex): ").context("Failed to read private key")?,
            };
            let secret = parse_private_key(&key_hex)?;
            cmd_split(&config, ShareScheme::Secp256k1, &secret, &split)
        }

        Commands::SplitSecret { secret, split } => {
            let config = keystore_config(&cli.crypto)?;
            let text = match secret {
                Some(text) => Zeroizing::new(text),
                None => prompt_secret("Secret: ").context("Failed to read secret")?,
            };
            let secret = SensitiveBytes::new(text.as_bytes().to_vec());
            cmd_split(&config, ShareScheme::Gf256, &secret, &split)
        }

        Commands::Recover {
            files,
            separate_passwords,
        } => cmd_recover(&files, separate_passwords),

        Commands::Inspect { file } => cmd_inspect(&file),
    }
}

fn keystore_config(args: &CryptoArgs) -> Result<KeystoreConfig> {
    let strength = if args.light {
        KdfStrength::Light
    } else {
        KdfStrength::Standard
    };
    KeystoreConfig::from_names(&args.cipher, &args.kdf, strength).context("Invalid crypto options")
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn parse_private_key(key_hex: &str) -> Result<SensitiveBytes> {
    let bytes = decode_hex(key_hex.trim()).context("Private key is not valid hex")?;
    Ok(SensitiveBytes::new(bytes))
}

/// Prompt for hidden input.
fn prompt_secret(prompt: &str) -> keyshard_common::Result<Zeroizing<String>> {
    Ok(Zeroizing::new(rpassword::prompt_password(prompt)?))
}

/// Prompt for password securely.
fn prompt_password(prompt: &str) -> keyshard_common::Result<SensitiveBytes> {
    let password = prompt_secret(prompt)?;
    Ok(SensitiveBytes::new(password.as_bytes().to_vec()))
}

/// Prompt for a new password twice.
fn prompt_new_password(prompt: &str) -> keyshard_common::Result<SensitiveBytes> {
    let password = prompt_password(prompt)?;
    let confirm = prompt_password("Confirm password: ")?;

    if password != confirm {
        return Err(Error::InvalidParams("Passwords do not match".to_string()));
    }

    Ok(password)
}

/// Generate or import a key and write its keyfile.
fn cmd_generate(config: &KeystoreConfig, source: KeySource, output: Option<PathBuf>) -> Result<()> {
    if let KeySource::Vanity { prefix, budget, .. } = &source {
        info!("Searching for address prefix {} for up to {:?}", prefix, budget);
    }

    let password = prompt_new_password("Enter password: ").context("Failed to read password")?;
    let generated = generate(config, password.as_bytes(), source).context("Failed to generate key")?;

    let path = output
        .unwrap_or_else(|| PathBuf::from(format!("{}.json", generated.address.to_lowercase_hex())));
    write_keyfile(&path, &generated.keyfile)?;

    println!("Keyfile written successfully!");
    println!("  Address: {}", generated.address);
    println!("  File: {}", path.display());
    if generated.attempts > 1 {
        println!("  Attempts: {}", generated.attempts);
    }

    Ok(())
}

/// Split a secret and write one keyfile per share.
fn cmd_split(
    config: &KeystoreConfig,
    scheme: ShareScheme,
    secret: &SensitiveBytes,
    args: &SplitArgs,
) -> Result<()> {
    info!("Splitting {} secret into {} shares, threshold {}", scheme, args.shares, args.threshold);

    if scheme == ShareScheme::Secp256k1 {
        let address = Address::from_private_key(secret.as_bytes()).context("Invalid private key")?;
        println!("Splitting key for address {}", address);
    }

    let shared = if args.separate_passwords {
        None
    } else {
        Some(prompt_new_password("Enter password for all shares: ").context("Failed to read password")?)
    };

    let keyfiles = split_to_keyfiles(
        config,
        scheme,
        secret.as_bytes(),
        args.shares,
        args.threshold,
        |index| match &shared {
            Some(password) => Ok(password.clone()),
            None => prompt_new_password(&format!("Enter password for share {}: ", index)),
        },
    )
    .context("Failed to split secret")?;

    for keyfile in &keyfiles {
        let index = keyfile.id.as_bytes()[0];
        let path = share_path(&args.fileptrn, index);
        write_keyfile(&path, keyfile)?;
        println!("  Share {}: {}", index, path.display());
    }

    println!(
        "Wrote {} share files; any {} of them recover the secret.",
        keyfiles.len(),
        args.threshold
    );

    Ok(())
}

/// Recover a secret from share keyfiles.
fn cmd_recover(paths: &[PathBuf], separate_passwords: bool) -> Result<()> {
    info!("Recovering secret from {} share files", paths.len());

    let keyfiles = paths
        .iter()
        .map(|path| read_keyfile(path))
        .collect::<Result<Vec<Keyfile>>>()?;

    let shared = if separate_passwords {
        None
    } else {
        Some(prompt_password("Enter password for all shares: ").context("Failed to read password")?)
    };

    let recovered = recover_from_keyfiles(&keyfiles, |position, _| match &shared {
        Some(password) => Ok(password.clone()),
        None => prompt_password(&format!("Enter password for {}: ", paths[position].display())),
    })
    .context("Failed to recover secret")?;

    match recovered.scheme {
        ShareScheme::Secp256k1 => {
            println!("Recovered private key: 0x{}", hex_of(&recovered.secret).as_str());
            if let Ok(address) = Address::from_private_key(recovered.secret.as_bytes()) {
                println!("  Address: {}", address);
            }
        }
        ShareScheme::Gf256 => {
            println!(
                "Recovered secret: {}",
                String::from_utf8_lossy(recovered.secret.as_bytes())
            );
        }
    }

    Ok(())
}

/// Show keyfile metadata without decrypting.
fn cmd_inspect(path: &Path) -> Result<()> {
    let keyfile = read_keyfile(path)?;
    let crypto = &keyfile.crypto;

    println!("Keyfile Information:");
    println!("  ID: {}", keyfile.id);
    println!("  Version: {}", keyfile.version());
    if keyfile.is_share() {
        println!("  Contents: key share {}", keyfile.id.as_bytes()[0]);
    } else {
        println!("  Address: {}", keyfile.address);
    }
    println!("  Cipher: {}", crypto.cipher);
    println!("  Ciphertext: {} bytes", crypto.ciphertext.len());
    match &crypto.kdf {
        KdfParams::Scrypt(p) => {
            println!("  KDF: scrypt");
            println!("    N: {}", p.n);
            println!("    r: {}", p.r);
            println!("    p: {}", p.p);
        }
        KdfParams::Pbkdf2(p) => {
            println!("  KDF: pbkdf2");
            println!("    Iterations: {}", p.c);
        }
    }

    Ok(())
}

fn hex_of(bytes: &SensitiveBytes) -> Zeroizing<String> {
    Zeroizing::new(hex::encode(bytes.as_bytes()))
}
