use std::error::Error;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Error,
    Warn,
}

/// The place a diagnostic is attributed to: `<file>:<line>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: String,
    pub line: usize,
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub location: Option<Location>,
    pub message: String,
}

impl Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, &self.message),
            None => write!(f, "{}", &self.message),
        }
    }
}

#[derive(Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: DiagnosticMessage,
    pub source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl Diagnostic {
    /// Returns the error this diagnostic was built from if it has type `E`.
    pub fn source_as<E: Error + 'static>(&self) -> Option<&E> {
        self.source.as_deref().and_then(|err| err.downcast_ref())
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.message)
    }
}

impl Error for Diagnostic {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn Error + 'static))
    }
}

#[must_use = "DiagnosticBuilder is useless unless emitted"]
pub struct DiagnosticBuilder<'a, 'emt> {
    owner: &'a mut Diagnostics<'emt>,
    level: Level,
    location: Option<Location>,
    message: Option<String>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl<'a, 'emt> DiagnosticBuilder<'a, 'emt> {
    fn new(owner: &'a mut Diagnostics<'emt>, level: Level) -> Self {
        Self {
            owner,
            level,
            location: None,
            message: None,
            source: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<Option<Location>>) -> Self {
        self.location = location.into();

        self
    }

    /// Uses the `error` to fill in the message (unless already set) and the source.
    pub fn with_error(mut self, error: impl Error + Send + Sync + 'static) -> Self {
        self.message = self.message.or_else(|| Some(error.to_string()));
        self.source = Some(Box::new(error));

        self
    }

    /// Emits the diagnostic.
    ///
    /// Panics if the message is not set.
    pub fn emit(self) {
        let diagnostic = Diagnostic {
            level: self.level,
            message: DiagnosticMessage {
                location: self.location,
                message: self.message.expect("message must be set"),
            },
            source: self.source,
        };

        self.owner.emit(diagnostic);
    }
}

type Emitter<'emt> = Box<dyn FnMut(&Diagnostic) + 'emt>;

/// The diagnostic sink: an ordered stream of diagnostics plus an error counter.
#[derive(Default)]
pub struct Diagnostics<'emt> {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    emitter: Option<Emitter<'emt>>,
}

impl<'emt> Diagnostics<'emt> {
    pub fn new() -> Self {
        Self {
            diagnostics: vec![],
            error_count: 0,
            emitter: None,
        }
    }

    /// Sets a callback invoked with every diagnostic as soon as it's emitted.
    pub fn set_emitter(&mut self, emitter: Emitter<'emt>) {
        self.emitter = Some(emitter);
    }

    pub fn with_level(&mut self, level: Level) -> DiagnosticBuilder<'_, 'emt> {
        DiagnosticBuilder::new(self, level)
    }

    pub fn error(&mut self) -> DiagnosticBuilder<'_, 'emt> {
        self.with_level(Level::Error)
    }

    pub fn warn(&mut self) -> DiagnosticBuilder<'_, 'emt> {
        self.with_level(Level::Warn)
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter()
            .filter(|diagnostic| diagnostic.level == Level::Error)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.level == Level::Error {
            self.error_count += 1;
        }

        if let Some(emitter) = &mut self.emitter {
            emitter(&diagnostic);
        }

        self.diagnostics.push(diagnostic);
    }
}
