//! Líneas de estado para el operador, separadas de los logs.
//!
//! info = azul, success = verde, warning = amarillo, error = rojo.
use std::io::{self, Write};

use crossterm::style::{StyledContent, Stylize};

pub struct Console<W: Write> {
    out: W,
}

impl Console<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Console<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    fn line(&mut self, tag: StyledContent<&str>, msg: &str) -> io::Result<()> {
        writeln!(self.out, "{tag} {msg}")
    }

    pub fn info(&mut self, msg: &str) -> io::Result<()> {
        self.line("[INFO]".blue(), msg)
    }

    pub fn success(&mut self, msg: &str) -> io::Result<()> {
        self.line("[ OK ]".green(), msg)
    }

    pub fn warning(&mut self, msg: &str) -> io::Result<()> {
        self.line("[WARN]".yellow(), msg)
    }

    pub fn error(&mut self, msg: &str) -> io::Result<()> {
        self.line("[FAIL]".red(), msg)
    }

    pub fn plain(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.out, "{msg}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_tag_and_message() {
        let mut c = Console::new(Vec::new());
        c.success("netbox is active").unwrap();
        c.error("boom").unwrap();
        let text = String::from_utf8(c.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[ OK ]") && lines[0].ends_with("netbox is active"));
        assert!(lines[1].contains("[FAIL]") && lines[1].ends_with("boom"));
    }
}
