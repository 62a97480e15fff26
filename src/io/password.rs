use std::io;

/// Prompt shown when asking for an archive password.
pub const PROMPT: &str = "Enter password: ";

/// Source of archive passwords.
///
/// The terminal is the only source the binary uses; anything else (tests,
/// embedding) can supply its own.
pub trait PasswordPrompt {
    /// Read one password. Blocks until one is available.
    fn read_password(&mut self) -> io::Result<String>;
}

/// Reads passwords from the controlling terminal with echo disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn read_password(&mut self) -> io::Result<String> {
        rpassword::prompt_password(PROMPT)
    }
}

/// Ask `prompt` for a password when `wanted`, otherwise return the empty
/// password, which means "do not encrypt".
pub fn get_password<P>(prompt: &mut P, wanted: bool) -> io::Result<String>
where
    P: PasswordPrompt + ?Sized,
{
    if wanted {
        prompt.read_password()
    } else {
        Ok(String::new())
    }
}
