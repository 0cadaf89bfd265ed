use anyhow::Result;
use cardstat_core::Category;
use cardstat_finance::VendorPrompt;
use std::io::{self, BufRead, Write};

/// Asks on the terminal for a category of each new vendor
pub struct StdinPrompt<R> {
    input: R,
}

impl StdinPrompt<io::StdinLock<'static>> {
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> StdinPrompt<R> {
    #[cfg(test)]
    fn from_reader(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> VendorPrompt for StdinPrompt<R> {
    fn ask(&mut self, vendor_key: &str, suggested: &Category) -> Result<Option<String>> {
        print!("New vendor '{}' [{}]: ", vendor_key, suggested);
        io::stdout().flush().ok();

        let mut s = String::new();
        if self.input.read_line(&mut s)? == 0 {
            return Ok(None);
        }
        let s = s.trim();
        Ok(if s.is_empty() { None } else { Some(s.to_string()) })
    }
}
