//! pbecoder CLI - password-based encryption
//!
//! Encrypts and decrypts files with PBEWithMD5AndDES. The salt is not part
//! of the encrypted file; `encrypt` prints it and `decrypt` needs it back.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process;

use pbecoder::app::Bootstrap;
use pbecoder::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};
use pbecoder::{Result, Salt, encoding, file_ops, pbecrypt};

#[derive(Parser)]
#[command(name = "pbecoder")]
#[command(version)]
#[command(about = "Password-based encryption.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Work directory (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "DIR", env = "PBECODER_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        env = "PBECODER_LOG",
        default_value = "warn"
    )]
    log_level: String,

    /// Also write logs to <work-dir>/log/pbecoder.log
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a new random salt
    Salt,

    /// Encrypt a file and print the salt used
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the base64 ciphertext to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Base64 salt to use; a new one is generated when absent
        #[arg(short, long, value_name = "BASE64")]
        salt: Option<String>,
    },

    /// Decrypt a file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file holding the base64 ciphertext
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the decrypted contents to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Base64 salt printed at encryption time
        #[arg(short, long, value_name = "BASE64")]
        salt: String,
    },

    /// Encrypt and decrypt a short message, printing every step
    Demo {
        /// Passphrase for the demonstration
        #[arg(long, default_value = "azsxdc")]
        password: String,

        /// Message to encrypt
        #[arg(long, default_value = "PBE")]
        data: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

/// The error message followed by each of its sources.
fn error_chain(err: &dyn Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

fn run(cli: Cli) -> Result<()> {
    let mut bootstrap = Bootstrap::new()
        .log_level(cli.log_level)
        .log_to_file(cli.log_file);
    if let Some(dir) = cli.work_dir {
        bootstrap = bootstrap.work_root(dir);
    }
    let _ctx = bootstrap.run()?;

    match cli.command {
        Commands::Salt => {
            println!("{}", Salt::generate()?.to_text());
            Ok(())
        }
        Commands::Encrypt {
            input,
            output,
            salt,
        } => {
            let salt = match salt {
                Some(text) => Salt::from_text(&text)?,
                None => Salt::generate()?,
            };
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::encrypt_file(&input, &output, &salt, &mut *reader)?;
            println!("{}", salt.to_text());
            Ok(())
        }
        Commands::Decrypt {
            input,
            output,
            salt,
        } => {
            let salt = Salt::from_text(&salt)?;
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::decrypt_file(&input, &output, &salt, &mut *reader)
        }
        Commands::Demo { password, data } => demo(&password, &data),
    }
}

fn demo(password: &str, data: &str) -> Result<()> {
    println!("plaintext:\t{}", data);
    println!("password:\t{}", password);

    let salt = Salt::generate()?;
    println!("salt:\t\t{}", salt.to_text());

    let ciphertext = pbecrypt::encrypt(data.as_bytes(), password.as_bytes(), &salt)?;
    println!("encrypted:\t{}", encoding::to_text(&ciphertext));

    let plaintext = pbecrypt::decrypt(&ciphertext, password.as_bytes(), &salt)?;
    println!("decrypted:\t{}", String::from_utf8_lossy(&plaintext));
    Ok(())
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}
