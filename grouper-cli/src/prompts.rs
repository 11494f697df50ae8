//! Interactive stdin/stdout prompts.
//!
//! Kept deliberately thin: each function reads one line, trims it,
//! and hands back a plain value or `None` for "use the default". The
//! CLI only falls back to these when the corresponding `clap` flag
//! wasn't given (see `cli.rs`).

use std::io::{self, Write};

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_string())
}

pub fn input_path() -> io::Result<String> {
    read_line("Enter input file path: ")
}

pub fn radius() -> io::Result<String> {
    read_line("Enter radius (max distance from center in blocks): ")
}

pub fn use_multithreading(detected_cores: usize) -> io::Result<bool> {
    let answer = read_line(&format!(
        "Use multithreading? [Y/n] (detected {detected_cores} cores): "
    ))?;
    Ok(!answer.eq_ignore_ascii_case("n") && !answer.eq_ignore_ascii_case("no"))
}

pub fn thread_count(default_cores: usize) -> io::Result<usize> {
    let answer = read_line(&format!("Enter number of threads (default {default_cores}): "))?;
    if answer.is_empty() {
        return Ok(default_cores);
    }
    Ok(answer.parse::<usize>().unwrap_or(default_cores).max(1))
}
