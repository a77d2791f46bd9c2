//! `wallet new` and `wallet show`

use std::io::{self, Write};
use std::path::Path;

use headersig_core::{HeaderSigError, Result};
use headersig_wallet::{Password, Wallet};
use rand::rngs::OsRng;

use crate::cli::WalletCommand;
use crate::password;

/// Run a wallet subcommand
pub fn run(command: WalletCommand) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        WalletCommand::New {
            wallet,
            label,
            password,
        } => {
            let password = password::obtain_new(password)?;
            new_account(&wallet, &label, &password, &mut out)
        }
        WalletCommand::Show { wallet } => show(&wallet, &mut out),
    }
}

/// Generate an account into the wallet at `path`, creating it if absent, and print its public key
pub fn new_account<W: Write + ?Sized>(
    path: &Path,
    label: &str,
    password: &Password,
    out: &mut W,
) -> Result<()> {
    let mut wallet = if path.exists() {
        Wallet::load(path)?
    } else {
        Wallet::new()
    };
    let key = wallet.generate_account(label, password, &mut OsRng)?;
    wallet.save(path)?;
    writeln!(out, "{}", hex::encode(key.as_bytes())).map_err(output_error)
}

/// Print one `label public_key [default]` line per account
pub fn show<W: Write + ?Sized>(path: &Path, out: &mut W) -> Result<()> {
    let wallet = Wallet::load(path)?;
    let default_key = wallet.default_record().ok().map(|r| r.public_key);
    for account in wallet.accounts() {
        let marker = if Some(account.public_key) == default_key {
            " default"
        } else {
            ""
        };
        writeln!(out, "{} {}{marker}", account.label, account.public_key_hex()).map_err(output_error)?;
    }
    Ok(())
}

fn output_error(e: io::Error) -> HeaderSigError {
    HeaderSigError::serialization(format!("cannot write output: {e}"))
}
