use std::io::{self, IsTerminal, Write};

const FRAMES: [char; 8] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧'];

/// Progress indicator shown on stderr while a task is polled.
///
/// Disabled when stderr is not a terminal so piped output stays clean. The
/// drawn line is cleared on [`Spinner::finish`] and again on drop, so an
/// early return never leaves a frame in front of an error message.
pub struct Spinner {
    out: Option<Box<dyn Write>>,
    index: usize,
    drawn: usize,
}

impl Spinner {
    pub fn new(enabled: bool) -> Self {
        let out: Option<Box<dyn Write>> = if enabled && io::stderr().is_terminal() {
            Some(Box::new(io::stderr()))
        } else {
            None
        };
        Self {
            out,
            index: 0,
            drawn: 0,
        }
    }

    #[cfg(test)]
    pub fn to_writer(out: Box<dyn Write>) -> Self {
        Self {
            out: Some(out),
            index: 0,
            drawn: 0,
        }
    }

    /// Advance one frame, optionally with a message next to it.
    pub fn tick(&mut self, message: Option<&str>) {
        let Some(out) = self.out.as_mut() else {
            return;
        };
        let frame = FRAMES[self.index];
        let line = match message {
            Some(m) => format!("{} {}", frame, m),
            None => frame.to_string(),
        };
        let width = line.chars().count();
        let pad = self.drawn.saturating_sub(width);
        let _ = write!(out, "\r{}{}", line, " ".repeat(pad));
        let _ = out.flush();
        self.drawn = width;
        self.index = (self.index + 1) % FRAMES.len();
    }

    pub fn finish(&mut self) {
        if self.drawn == 0 {
            return;
        }
        if let Some(out) = self.out.as_mut() {
            let _ = write!(out, "\r{}\r", " ".repeat(self.drawn));
            let _ = out.flush();
        }
        self.drawn = 0;
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.finish();
    }
}
