use anyhow::{Result, bail};
use std::io::{self, IsTerminal};
use zeroize::Zeroizing;

pub const PASSWORD_ENV: &str = "SALTSEAL_PASSWORD";

/// Password for decrypting: env var, then piped stdin, then a TTY prompt.
pub fn read_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = non_interactive()? {
        return Ok(pw);
    }

    if io::stdin().is_terminal() {
        let pw = Zeroizing::new(rpassword::prompt_password("Password: ")?);
        if !pw.is_empty() {
            return Ok(pw);
        }
    }

    bail!("No password provided")
}

/// Password for encrypting. Same sources as [`read_password`], but a TTY
/// prompt asks twice.
pub fn read_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = non_interactive()? {
        return Ok(pw);
    }

    if !io::stdin().is_terminal() {
        bail!("No password provided");
    }

    let pw1 = Zeroizing::new(rpassword::prompt_password("New password: ")?);
    let pw2 = Zeroizing::new(rpassword::prompt_password("Confirm password: ")?);

    if pw1.is_empty() {
        bail!("password cannot be empty");
    }

    if pw1 != pw2 {
        bail!("passwords do not match");
    }

    Ok(pw1)
}

fn non_interactive() -> Result<Option<Zeroizing<String>>> {
    //  SALTSEAL_PASSWORD="supersecret" saltseal decrypt in.enc out.txt
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Some(Zeroizing::new(pw)));
        }
    }

    //  printf "%s" "$SECRET" | saltseal decrypt in.enc out.txt
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_line(&mut buf)?;
        trim_newline(&mut buf);

        if !buf.is_empty() {
            return Ok(Some(buf));
        }
    }

    Ok(None)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
