//! Password entry
//!
//! A password given by flag or environment is used as is. Otherwise the
//! operator is prompted on the terminal with echo disabled.

use std::io::{BufRead, Write};

use headersig_core::{HeaderSigError, Result};
use headersig_wallet::Password;
use zeroize::Zeroizing;

/// Password from the flag, or from a hidden terminal prompt
pub fn obtain(flag: Option<String>) -> Result<Password> {
    match flag {
        Some(password) => Ok(Password::new(password)),
        None => hidden_prompt("Wallet password: "),
    }
}

/// Password for a new account; an interactive answer must be typed twice
pub fn obtain_new(flag: Option<String>) -> Result<Password> {
    match flag {
        Some(password) => Ok(Password::new(password)),
        None => confirm(hidden_prompt),
    }
}

/// Ask twice through `ask` and require both answers to agree
pub fn confirm<F>(mut ask: F) -> Result<Password>
where
    F: FnMut(&str) -> Result<Password>,
{
    let first = ask("New wallet password: ")?;
    let second = ask("Repeat password: ")?;
    if first.expose() != second.expose() {
        return Err(HeaderSigError::authentication("passwords do not match"));
    }
    Ok(first)
}

/// Prompt on the controlling terminal without echoing the answer
pub fn hidden_prompt(label: &str) -> Result<Password> {
    rpassword::prompt_password(label)
        .map(Password::new)
        .map_err(|e| HeaderSigError::authentication(format!("cannot read password: {e}")))
}

/// Write `label` to `output` and read one line from `input`
///
/// Used where no terminal is involved; the answer is not hidden.
pub fn prompt<R, W>(input: &mut R, output: &mut W, label: &str) -> Result<Password>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    output
        .write_all(label.as_bytes())
        .and_then(|()| output.flush())
        .map_err(|e| HeaderSigError::authentication(format!("cannot prompt for password: {e}")))?;

    let mut line = Zeroizing::new(String::new());
    let read = input
        .read_line(&mut line)
        .map_err(|e| HeaderSigError::authentication(format!("cannot read password: {e}")))?;
    if read == 0 {
        return Err(HeaderSigError::authentication("no password supplied"));
    }
    Ok(Password::new(line.trim_end_matches(['\r', '\n'])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    #[test]
    fn test_prompt_strips_line_ending() {
        let mut out = Vec::new();
        let password = prompt(&mut Cursor::new("s3cret \r\n"), &mut out, "pw: ").unwrap();
        assert_eq!(password.expose(), "s3cret ");
        assert_eq!(out, b"pw: ");
    }

    #[test]
    fn test_prompt_at_eof() {
        assert_matches!(
            prompt(&mut Cursor::new(""), &mut Vec::new(), "pw: "),
            Err(HeaderSigError::AuthenticationError { .. })
        );
    }

    #[test]
    fn test_confirm() {
        let mut input = Cursor::new("abc\nabc\n");
        let mut shown = Vec::new();
        let password = confirm(|label| prompt(&mut input, &mut shown, label)).unwrap();
        assert_eq!(password.expose(), "abc");
        assert_eq!(shown, b"New wallet password: Repeat password: ");

        let mut input = Cursor::new("abc\nabd\n");
        assert_matches!(
            confirm(|label| prompt(&mut input, &mut Vec::new(), label)),
            Err(HeaderSigError::AuthenticationError { .. })
        );
    }

    #[test]
    fn test_new_password_flag_skips_confirmation() {
        assert_eq!(obtain_new(Some("flag".into())).unwrap().expose(), "flag");
    }

    #[test]
    fn test_flag_wins() {
        assert_eq!(obtain(Some("flag".into())).unwrap().expose(), "flag");
    }
}
