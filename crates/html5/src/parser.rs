//! Public parser lifecycle: bytes in, tree-sink calls out.
//!
//! The parser glues the input stream, tokenizer, and tree builder together
//! and owns the cross-cutting behaviors: token-at-a-time pumping (so content
//! model switches land before the next character is consumed), meta-driven
//! encoding restarts, pause/resume at script insertion points, error handler
//! delivery, and the terminal failed/claimed states.

use crate::charset::{CharsetSource, Encoding, LabelResolution};
use crate::context::{Counters, DocumentParseContext};
use crate::errors::{Error, ErrorPolicy, ParseErrorCode};
use crate::input::InputStream;
use crate::sink::TreeSink;
use crate::tokenizer::{TokenStep, Tokenizer, TokenizerConfig};
use crate::tree_builder::{TreeBuilder, TreeBuilderConfig};

/// Callback for parse-error observation: (line, column, code).
pub type ErrorHandler = Box<dyn FnMut(u32, u32, ParseErrorCode)>;

/// Parser construction options.
#[derive(Default)]
pub struct ParserOptions {
    /// Caller-declared document encoding label (e.g. from a transport
    /// header). Resolved at construction; unknown labels fail `new`.
    pub charset: Option<String>,
    /// Enable scripting behaviors: `noscript` parses as raw text and a
    /// completed `script` element pauses the parse.
    pub scripting: bool,
    pub error_policy: ErrorPolicy,
}

#[derive(Debug, PartialEq, Eq)]
enum ParserState {
    Ready,
    Paused,
    Finished,
    Failed(Error),
    BufferClaimed,
}

/// A streaming HTML5 parser bound to a tree sink.
pub struct Parser<S: TreeSink> {
    stream: InputStream,
    tokenizer: Tokenizer,
    builder: TreeBuilder<S>,
    ctx: DocumentParseContext,
    error_handler: Option<ErrorHandler>,
    error_policy: ErrorPolicy,
    scripting: bool,
    state: ParserState,
}

impl<S: TreeSink> Parser<S> {
    /// Create a parser. `document` is the sink's root node handle; every
    /// top-level construction call targets it.
    pub fn new(sink: S, document: S::Handle, options: ParserOptions) -> Result<Self, Error> {
        let declared = match options.charset.as_deref() {
            None => None,
            Some(label) => match crate::charset::resolve_label(label.as_bytes()) {
                Some(LabelResolution::Supported(encoding)) => Some(encoding),
                _ => return Err(Error::Encoding),
            },
        };
        Ok(Self {
            stream: InputStream::new(declared),
            tokenizer: Tokenizer::new(TokenizerConfig::default()),
            builder: TreeBuilder::new(
                TreeBuilderConfig {
                    scripting: options.scripting,
                },
                document,
                sink,
            ),
            ctx: DocumentParseContext::with_error_policy(options.error_policy),
            error_handler: None,
            error_policy: options.error_policy,
            scripting: options.scripting,
            state: ParserState::Ready,
        })
    }

    /// Install an observer for parse errors. Purely observational.
    pub fn set_error_handler(&mut self, handler: Option<ErrorHandler>) {
        self.error_handler = handler;
    }

    pub fn sink(&self) -> &S {
        self.builder.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.builder.sink_mut()
    }

    /// Consume the parser, returning the sink.
    pub fn into_sink(mut self) -> S {
        self.builder.abort();
        self.builder.into_sink()
    }

    /// The document charset, once detection has committed.
    pub fn charset(&self) -> Option<(&'static str, CharsetSource)> {
        self.stream
            .charset()
            .map(|(encoding, source)| (encoding.name(), source))
    }

    pub fn counters(&self) -> &Counters {
        &self.ctx.counters
    }

    /// Append a chunk of document bytes and pump the pipeline.
    pub fn parse_chunk(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.check_ready()?;
        if self.state == ParserState::Finished {
            return Err(Error::BadParam);
        }
        self.stream.append(bytes);
        if self.state == ParserState::Paused {
            return Err(Error::Paused);
        }
        self.pump()
    }

    /// Insert bytes at the current read point (script-inserted data).
    pub fn insert_chunk(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.check_ready()?;
        self.stream.insert(bytes);
        if self.state == ParserState::Paused {
            // The host is injecting while paused; data is parsed on resume.
            return Ok(());
        }
        self.pump()
    }

    /// Signal that the last chunk has been supplied.
    pub fn finish(&mut self) -> Result<(), Error> {
        self.check_ready()?;
        if self.state == ParserState::Paused {
            return Err(Error::Paused);
        }
        self.stream.finish();
        let _ = self.stream.pump(&mut self.ctx);
        self.tokenizer.finish();
        self.pump()
    }

    /// Resume after a script-insertion pause.
    pub fn resume(&mut self) -> Result<(), Error> {
        match self.state {
            ParserState::Paused => {
                self.state = ParserState::Ready;
                self.pump()
            }
            _ => Err(Error::BadParam),
        }
    }

    /// Change the document charset by label.
    ///
    /// Only effective while the current charset is tentative; once confident
    /// or certain the charset is immutable and the call is a no-op.
    pub fn change_charset(&mut self, label: &str) -> Result<(), Error> {
        self.check_ready()?;
        let encoding = match crate::charset::resolve_label(label.as_bytes()) {
            Some(LabelResolution::Supported(encoding)) => encoding,
            _ => return Err(Error::Encoding),
        };
        match self.stream.charset() {
            None => {
                self.stream.set_charset(encoding, CharsetSource::Certain);
                Ok(())
            }
            Some((_, source)) if source >= CharsetSource::Confident => Ok(()),
            Some((current, _)) if current == encoding => {
                self.stream.set_charset(encoding, CharsetSource::Confident);
                Ok(())
            }
            Some(_) => {
                self.restart_with(encoding, CharsetSource::Certain)?;
                self.pump()
            }
        }
    }

    /// Transfer the raw document buffer to the caller. The parser releases
    /// every reference it holds; only dropping it remains useful.
    pub fn claim_buffer(&mut self) -> Result<Vec<u8>, Error> {
        if matches!(self.state, ParserState::BufferClaimed) {
            return Err(Error::BadParam);
        }
        self.builder.abort();
        self.state = ParserState::BufferClaimed;
        Ok(self.stream.claim_buffer())
    }

    fn check_ready(&self) -> Result<(), Error> {
        match self.state {
            ParserState::Failed(err) => Err(err),
            ParserState::BufferClaimed => Err(Error::BadParam),
            _ => Ok(()),
        }
    }

    /// Drive the pipeline until it blocks on input, pauses, or completes.
    fn pump(&mut self) -> Result<(), Error> {
        let result = self.pump_inner();
        self.deliver_errors();
        if let Err(err) = result {
            match err {
                Error::Paused => self.state = ParserState::Paused,
                err => {
                    self.builder.abort();
                    self.state = ParserState::Failed(err);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    fn pump_inner(&mut self) -> Result<(), Error> {
        loop {
            let _ = self.stream.pump(&mut self.ctx);
            let mut restarted = false;
            loop {
                let step = self
                    .tokenizer
                    .next_token(self.stream.input(), &mut self.ctx)?;
                match step {
                    TokenStep::Token(token) => {
                        let outcome =
                            self.builder
                                .push_token(&token, self.stream.input(), &mut self.ctx)?;
                        if let Some(model) = outcome.content_model {
                            self.tokenizer.set_content_model(model);
                        }
                        self.tokenizer.set_cdata_allowed(outcome.cdata_allowed);
                        if let Some(label) = outcome.encoding_change.as_deref() {
                            if self.maybe_restart_for_meta(label)? {
                                restarted = true;
                                break;
                            }
                        }
                        if outcome.pause {
                            return Err(Error::Paused);
                        }
                        if outcome.stopped {
                            self.state = ParserState::Finished;
                            return Ok(());
                        }
                    }
                    TokenStep::Starved => break,
                    TokenStep::Drained => {
                        self.state = ParserState::Finished;
                        return Ok(());
                    }
                }
            }
            if restarted {
                continue;
            }
            // No new decoded input will appear until the caller supplies
            // more bytes.
            return Ok(());
        }
    }

    /// Handle a meta-declared encoding. Returns true when a restart happened.
    fn maybe_restart_for_meta(&mut self, label: &str) -> Result<bool, Error> {
        let Some((current, source)) = self.stream.charset() else {
            return Ok(false);
        };
        if source >= CharsetSource::Confident {
            return Ok(false);
        }
        let encoding = match crate::charset::resolve_label(label.as_bytes()) {
            // A meta cannot declare UTF-16; it parsed as ASCII-compatible.
            Some(LabelResolution::Supported(Encoding::Utf16Le))
            | Some(LabelResolution::Supported(Encoding::Utf16Be)) => Encoding::Utf8,
            Some(LabelResolution::Supported(encoding)) => encoding,
            // Unknown or undecodable labels leave the tentative default.
            _ => return Ok(false),
        };
        if encoding == current {
            self.stream.set_charset(encoding, CharsetSource::Confident);
            return Ok(false);
        }
        self.restart_with(encoding, CharsetSource::Confident)?;
        Ok(true)
    }

    /// Restart the parse under a new charset: reset the tokenizer and tree
    /// builder, notify the sink, and re-feed the buffered bytes.
    fn restart_with(&mut self, encoding: Encoding, source: CharsetSource) -> Result<(), Error> {
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "html5.input",
            "encoding restart to {} ({source:?})",
            encoding.name()
        );
        // Release every engine reference before the sink discards the old
        // tree.
        self.builder.reset();
        self.builder
            .sink_mut()
            .change_encoding(encoding.name())
            .map_err(Error::Sink)?;
        self.tokenizer = Tokenizer::new(TokenizerConfig::default());
        if self.stream.is_finished() {
            self.tokenizer.finish();
        }
        let counters = self.ctx.counters.clone();
        self.ctx = DocumentParseContext::with_error_policy(self.error_policy);
        self.ctx.counters = counters;
        self.ctx.counters.encoding_restarts =
            self.ctx.counters.encoding_restarts.saturating_add(1);
        self.stream.restart(encoding, source);
        Ok(())
    }

    fn deliver_errors(&mut self) {
        let errors = self.ctx.take_errors();
        let Some(handler) = self.error_handler.as_mut() else {
            return;
        };
        for error in errors {
            let (line, col) = self.stream.input().line_col(error.position);
            handler(line, col, error.code);
        }
    }
}

impl<S: TreeSink> std::fmt::Debug for Parser<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("state", &self.state)
            .field("charset", &self.stream.charset())
            .field("scripting", &self.scripting)
            .finish_non_exhaustive()
    }
}
