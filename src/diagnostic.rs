use std::io;

use crate::error::{CompileError, CompileWarning, RuntimeError};
use crate::graph::listing::Listing;
use crate::span::Span;

/// A compile or runtime diagnostic (error or warning).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// A compile error, pointing at its block in `listing`.
    pub fn from_compile(err: &CompileError, listing: &Listing) -> Self {
        let d = Diagnostic::error(err.to_string(), listing.span(err.pos()));
        match err {
            CompileError::UnknownPrefab { .. } => {
                d.with_help("custom block ids count up from the built-in threshold".to_string())
            }
            CompileError::InvalidTypeId { block, family } => {
                d.with_note(format!("{} is not one of the {} blocks", block.id, family))
            }
            CompileError::DuplicateBlock { .. } => {
                d.with_help("move one of the blocks to a free cell".to_string())
            }
            CompileError::DanglingTerminal { endpoint, .. } => d.with_note(format!(
                "no terminal {} on a block at {}",
                endpoint.key, endpoint.block
            )),
            CompileError::WireMismatch { a, b, reason, .. } => {
                let span = listing.span(Some(a.block)).merge(listing.span(Some(b.block)));
                Diagnostic { span, ..d }.with_note(reason.clone())
            }
            CompileError::AmbiguousInput { count, .. } => d
                .with_note(format!("{} wires end here", count))
                .with_help("an input takes a single wire".to_string()),
            CompileError::ValueCycle { .. } => {
                d.with_help("store the value in a variable to break the cycle".to_string())
            }
            CompileError::UnresolvedGoto { label, .. } => {
                d.with_help(format!("add a label named `{}`", label))
            }
            CompileError::AmbiguousLabel { positions, .. } => {
                let at: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
                d.with_note(format!("defined at {}", at.join(", ")))
            }
            CompileError::GotoRecursion { chain, first, .. } => d
                .with_note(format!("{} -> {}", chain.join(" -> "), first))
                .with_help("put a statement between the label and its goto".to_string()),
            CompileError::NestingTooDeep { chain, .. } => {
                d.with_note(format!("nesting: {}", chain.join(" > ")))
            }
        }
    }

    /// A compile warning, pointing at its block in `listing`.
    pub fn from_warning(warning: &CompileWarning, listing: &Listing) -> Self {
        let d = Diagnostic::warning(warning.to_string(), listing.span(warning.pos()));
        match warning {
            CompileWarning::DuplicateLabel { label, positions, .. } => {
                let at: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
                d.with_note(format!("defined at {}", at.join(", ")))
                    .with_help(format!("a goto to `{}` would be ambiguous", label))
            }
        }
    }

    /// A runtime error, pointing at its block in `listing`.
    pub fn from_runtime(err: &RuntimeError, listing: &Listing) -> Self {
        let d = Diagnostic::error(err.to_string(), listing.span(err.block().map(|b| b.pos)));
        match err {
            RuntimeError::NonFinite { .. } => {
                d.with_note("an input is NaN or infinite".to_string())
            }
            RuntimeError::Timeout { .. } => {
                d.with_help("raise `limits.max_steps` or shorten the loop".to_string())
            }
            RuntimeError::DepthExceeded { .. } => {
                d.with_help("raise `limits.max_call_depth`".to_string())
            }
            RuntimeError::InvalidTerminal { .. } | RuntimeError::Physics { .. } => d,
        }
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, filename: &str, source: &str) -> io::Result<()> {
        use ariadne::Source;
        self.report(filename, true)
            .eprint((filename, Source::from(source)))
    }

    /// Render without colors into `out`.
    pub fn write_to<W: io::Write>(&self, filename: &str, source: &str, out: W) -> io::Result<()> {
        use ariadne::Source;
        self.report(filename, false)
            .write((filename, Source::from(source)), out)
    }

    fn report<'a>(
        &self,
        filename: &'a str,
        color: bool,
    ) -> ariadne::Report<'a, (&'a str, std::ops::Range<usize>)> {
        use ariadne::{Color, Config, Label, Report, ReportKind};

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let label_color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let mut report = Report::build(kind, filename, self.span.start as usize)
            .with_config(Config::default().with_color(color))
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.range()))
                    .with_message(&self.message)
                    .with_color(label_color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        report.finish()
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(
    diagnostics: &[Diagnostic],
    filename: &str,
    source: &str,
) -> io::Result<()> {
    for diag in diagnostics {
        diag.render(filename, source)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlockRef;
    use crate::graph::build::PrefabBuilder;
    use crate::graph::catalog::ids;
    use crate::graph::{Endpoint, GridPos, PrefabList, TerminalKey};

    fn listing() -> Listing {
        let mut b = PrefabBuilder::new("level");
        b.number(4.0, (2, 0, 1));
        b.place(ids::WIN, (0, 0, 0));
        let prefab = b.build();
        Listing::of(&PrefabList::default(), &prefab)
    }

    #[test]
    fn test_error_construction() {
        let d = Diagnostic::error("two blocks".to_string(), Span::new(10, 15));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "two blocks");
        assert_eq!(d.span.start, 10);
        assert_eq!(d.span.end, 15);
        assert!(d.notes.is_empty());
        assert!(d.help.is_none());
    }

    #[test]
    fn test_chained_builders() {
        let d = Diagnostic::warning("hint".to_string(), Span::new(0, 5))
            .with_note("note 1".to_string())
            .with_help("help text".to_string())
            .with_note("note 2".to_string());
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.notes, vec!["note 1", "note 2"]);
        assert_eq!(d.help.as_deref(), Some("help text"));
    }

    #[test]
    fn test_compile_error_points_at_block_line() {
        let listing = listing();
        let err = CompileError::ValueCycle {
            block: BlockRef::new("level", ids::WIN, GridPos::new(0, 0, 0)),
        };
        let d = Diagnostic::from_compile(&err, &listing);
        assert_eq!(&listing.text[d.span.range()], "(0, 0, 0) #252 Win");
        assert!(d.help.is_some());
    }

    #[test]
    fn test_error_without_block_points_at_header() {
        let listing = listing();
        let err = CompileError::NestingTooDeep {
            chain: vec!["level".into(), "level".into()],
            limit: 32,
        };
        let d = Diagnostic::from_compile(&err, &listing);
        assert_eq!(&listing.text[d.span.range()], "prefab level");
        assert_eq!(d.notes, vec!["nesting: level > level"]);
    }

    #[test]
    fn test_wire_mismatch_spans_both_blocks() {
        let listing = listing();
        let err = CompileError::WireMismatch {
            prefab: "level".into(),
            a: Endpoint::new(GridPos::new(2, 0, 1), TerminalKey::new(15, 1, 3)),
            b: Endpoint::new(GridPos::new(0, 0, 0), TerminalKey::new(3, 1, 7)),
            reason: "number into void".into(),
        };
        let d = Diagnostic::from_compile(&err, &listing);
        let text = &listing.text[d.span.range()];
        assert!(text.starts_with("(2, 0, 1) #36 Number 4"));
        assert!(text.ends_with("(0, 0, 0) #252 Win"));
        assert_eq!(d.notes, vec!["number into void"]);
    }

    #[test]
    fn test_runtime_error_diagnostic() {
        let listing = listing();
        let err = RuntimeError::Timeout {
            steps: 11,
            budget: 10,
        };
        let d = Diagnostic::from_runtime(&err, &listing);
        assert_eq!(d.span, listing.span(None));
        assert!(d.help.unwrap().contains("max_steps"));
    }

    #[test]
    fn test_write_to_contains_message_and_help() {
        let listing = listing();
        let err = CompileError::UnresolvedGoto {
            block: BlockRef::new("level", ids::WIN, GridPos::new(0, 0, 0)),
            label: "end".into(),
        };
        let d = Diagnostic::from_compile(&err, &listing);
        let mut out = Vec::new();
        d.write_to("level", &listing.text, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("goto `end` at (0, 0, 0) has no matching label"));
        assert!(text.contains("add a label named `end`"));
    }

    #[test]
    fn test_duplicate_label_warning() {
        let listing = listing();
        let warning = CompileWarning::DuplicateLabel {
            prefab: "level".into(),
            label: "end".into(),
            positions: vec![GridPos::new(2, 0, 1), GridPos::new(0, 0, 0)],
        };
        let d = Diagnostic::from_warning(&warning, &listing);
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(&listing.text[d.span.range()], "(2, 0, 1) #36 Number 4");
        assert_eq!(d.notes, vec!["defined at (2, 0, 1), (0, 0, 0)"]);

        let mut out = Vec::new();
        d.write_to("level", &listing.text, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Warning"));
        assert!(text.contains("a goto to `end` would be ambiguous"));
    }

    #[test]
    fn test_render_diagnostics_does_not_fail() {
        let listing = listing();
        let diagnostics = vec![
            Diagnostic::warning("first".to_string(), listing.span(Some(GridPos::new(2, 0, 1)))),
            Diagnostic::warning("second".to_string(), listing.span(None)),
        ];
        render_diagnostics(&diagnostics, "level", &listing.text).unwrap();
    }
}
