// bases/download_cli/src/prompt.rs
use std::io::{self, BufRead, Write};

pub const REDOWNLOAD_QUESTION: &str = "Do you want to re-download? (y/N): ";

/// Yes/no question put to the operator
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Asks on stdout and waits for a line on stdin. No timeout.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", question)?;
        stdout.flush()?;

        // EOF leaves the answer empty, which reads as "no"
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;

        Ok(is_affirmative(&answer))
    }
}

/// Only a lone `y`/`Y` (surrounding whitespace ignored) means yes
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
