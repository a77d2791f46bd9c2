//! `aggregate`: merge signer files without touching the ledger

use std::io::{self, Write};

use headersig_core::{Aggregator, HeaderSigError, Result};

use crate::cli::AggregateArgs;
use crate::commands::combine::read_signer_files;

/// Print the combined form of the given signer files to stdout
pub fn run(args: &AggregateArgs, strict: bool) -> Result<()> {
    let stdout = io::stdout();
    write_combined(args, strict, &mut stdout.lock())
}

/// Write the combined form to `out`
pub fn write_combined<W: Write + ?Sized>(args: &AggregateArgs, strict: bool, out: &mut W) -> Result<()> {
    let strict = strict || args.strict;
    let sets = read_signer_files(&args.sig_files, strict)?;
    let combined = Aggregator::new(strict).combine(&sets)?;
    write!(out, "{combined}")
        .and_then(|()| out.flush())
        .map_err(|e| HeaderSigError::serialization(format!("cannot write combined signatures: {e}")))
}
