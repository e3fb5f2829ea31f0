use std::io::{self, BufRead, Write};

/// Line-based user input, so interactive commands can be driven from tests
pub trait Prompter {
    /// Shows `message` and returns the trimmed answer. `None` on end of input.
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>>;

    /// Prints an informational line
    fn say(&mut self, message: &str);
}

/// Reads from stdin and writes to stdout
pub struct StdioPrompter;

impl Prompter for StdioPrompter {
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        print!("{}", message);
        io::stdout().flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn say(&mut self, message: &str) {
        println!("{}", message);
    }
}
