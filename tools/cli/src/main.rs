//! ezseal CLI - Command line interface for envelope encryption.
//!
//! This tool encrypts and decrypts files using the self-describing
//! ezseal envelope format.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroize;

use ezseal_crypto::{
    aead, default_registry, Aes256GcmCipher, Argon2Kdf, Argon2Variant, ByteChunks, Cipher,
    KdfParams, XChaCha20Poly1305Cipher,
};
use ezseal_envelope::{decrypt, encrypt, Input};

#[derive(Parser)]
#[command(name = "ezseal")]
#[command(about = "ezseal - password-based encrypted containers")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file into an ezseal envelope.
    Encrypt {
        /// Source file to encrypt.
        #[arg(short, long)]
        input: PathBuf,

        /// Destination envelope file.
        #[arg(short, long)]
        output: PathBuf,

        /// Cipher algorithm (see `ezseal algorithms`).
        #[arg(short, long, default_value = aead::XCHACHA20_POLY1305)]
        cipher: String,

        /// KDF variant: "argon2id", "argon2i", or "argon2d".
        #[arg(short, long, default_value = "argon2id")]
        kdf: String,

        /// KDF strength: "interactive", "moderate", or "sensitive".
        #[arg(short, long, default_value = "moderate")]
        strength: String,
    },

    /// Decrypt an ezseal envelope.
    Decrypt {
        /// Source envelope file.
        #[arg(short, long)]
        input: PathBuf,

        /// Destination file for the recovered plaintext.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List registered KDF and cipher algorithms.
    Algorithms,
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
        Commands::Encrypt {
            input,
            output,
            cipher,
            kdf,
            strength,
        } => cmd_encrypt(&input, &output, &cipher, &kdf, &strength),
        Commands::Decrypt { input, output } => cmd_decrypt(&input, &output),
        Commands::Algorithms => cmd_algorithms(),
    }
}

/// Prompt for password securely.
fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

fn parse_strength(strength: &str) -> Result<KdfParams> {
    match strength {
        "interactive" => Ok(KdfParams::interactive()),
        "moderate" => Ok(KdfParams::moderate()),
        "sensitive" => Ok(KdfParams::sensitive()),
        other => bail!("Unknown strength '{other}': use interactive, moderate, or sensitive"),
    }
}

fn make_cipher(name: &str) -> Result<Box<dyn Cipher>> {
    match name {
        aead::AES_256_GCM => Ok(Box::new(Aes256GcmCipher::new())),
        aead::XCHACHA20_POLY1305 => Ok(Box::new(XChaCha20Poly1305Cipher::new())),
        other => bail!("Unknown cipher '{other}' (see `ezseal algorithms`)"),
    }
}

fn write_chunks(chunks: ByteChunks, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for chunk in chunks {
        writer.write_all(&chunk?)?;
    }
    writer.flush()?;
    Ok(())
}

fn cmd_encrypt(
    input: &Path,
    output: &Path,
    cipher_name: &str,
    kdf_name: &str,
    strength: &str,
) -> Result<()> {
    let params = parse_strength(strength)?;
    let variant = Argon2Variant::from_name(kdf_name)
        .with_context(|| format!("Unknown KDF '{kdf_name}' (see `ezseal algorithms`)"))?;
    let cipher = make_cipher(cipher_name)?;

    let mut password = prompt_password("Enter password: ")?;
    let mut confirm = prompt_password("Confirm password: ")?;
    if password != confirm {
        password.zeroize();
        confirm.zeroize();
        bail!("Passwords do not match");
    }
    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    let kdf = Argon2Kdf::new(variant, params);
    let result = encrypt(&password, &kdf, cipher.as_ref(), Input::path(input));
    password.zeroize();
    confirm.zeroize();

    write_chunks(result.context("Encryption failed")?, output)?;
    info!("Encrypted {} -> {}", input.display(), output.display());
    Ok(())
}

fn cmd_decrypt(input: &Path, output: &Path) -> Result<()> {
    let mut password = prompt_password("Enter password: ")?;
    let result = decrypt(&password, Input::path(input));
    password.zeroize();

    write_chunks(result.context("Decryption failed")?, output)?;
    info!("Decrypted {} -> {}", input.display(), output.display());
    Ok(())
}

fn cmd_algorithms() -> Result<()> {
    let registry = default_registry();
    println!("KDF algorithms:");
    for name in registry.kdf_names() {
        println!("  {name}");
    }
    println!("Cipher algorithms:");
    for name in registry.cipher_names() {
        println!("  {name}");
    }
    Ok(())
}
