//! Line-based prompts on stdin.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};

/// Print `question` and read one trimmed line. Fails when stdin is not a terminal.
pub fn read_line(question: &str) -> Result<String> {
    if !atty::is(atty::Stream::Stdin) {
        bail!("stdin is not a terminal; rerun with --yes to skip the prompt");
    }

    print!("{}", question);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask a y/N question. Anything but `y`/`Y` is a no.
pub fn confirm(question: &str) -> Result<bool> {
    let answer = read_line(&format!("{} (y/N): ", question))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer, "y" | "Y")
}
