use crossterm::style::{StyledContent, Stylize};
use std::fmt;

/// Probability band used to pick how a notification is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn classify(probability: u8) -> Severity {
        match probability {
            70.. => Severity::Critical,
            50..=69 => Severity::High,
            30..=49 => Severity::Medium,
            10..=29 => Severity::Low,
            _ => Severity::Minimal,
        }
    }

    fn style(self, text: String) -> StyledContent<String> {
        let text = text.bold();
        match self {
            Severity::Critical => text.green(),
            Severity::High => text.blue(),
            Severity::Medium => text.cyan(),
            Severity::Low => text.yellow(),
            Severity::Minimal => text.red(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Minimal => "minimal",
        };
        write!(f, "{}", s)
    }
}

/// Renders notification text, with or without terminal styling.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    styled: bool,
}

impl Formatter {
    pub fn new(styled: bool) -> Formatter {
        Formatter { styled }
    }

    pub fn plain() -> Formatter {
        Formatter::new(false)
    }

    pub fn format(&self, probability: u8, severity: Severity) -> String {
        let text = format!("{}%", probability);
        if self.styled {
            severity.style(text).to_string()
        } else {
            text
        }
    }

    pub fn probability(&self, probability: u8) -> String {
        self.format(probability, Severity::classify(probability))
    }

    pub fn bold(&self, text: &str) -> String {
        if self.styled {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, text: &str) -> String {
        if self.styled {
            text.bold().underlined().to_string()
        } else {
            text.to_string()
        }
    }
}

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One bar per sample, scaled over 0..=100.
pub fn sparkline(samples: &[u8]) -> String {
    samples
        .iter()
        .map(|&p| BARS[usize::from(p.min(100)) * (BARS.len() - 1) / 100])
        .collect()
}
