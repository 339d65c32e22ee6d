#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct Position {
    pub byte: usize,
    pub line: usize,
    pub col: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            byte: 0,
            line: 1,
            col: 1,
        }
    }
}

/// A span between two positions, inclusive on the both ends.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// A span covering the start of `line`, for nodes whose exact extent is unknown.
    pub fn at_line(line: usize) -> Self {
        let pos = Position {
            line,
            ..Default::default()
        };

        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn line(&self) -> usize {
        self.start.line
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Default)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

pub trait HasSpan {
    fn span(&self) -> &Span;
}
