//! Scan engine
//!
//!     State: a stack of [Frame]s with the root at the bottom, a cursor, a relevance total and
//!     a buffer of text not yet handed to the emitter. Each turn of the loop runs the
//!     multiplexer of the top frame's mode from the cursor and acts on the winning rule:
//!
//!         Begin(child)    flush the buffer, open the child's scope, push a frame
//!         End             find which frame the end belongs to, flush, pop up to and including
//!                         it, enter its continuation if any
//!         Illegal         per the illegal policy
//!         no match        the rest of the input is text; done
//!
//!     The buffer is flushed through the keyword table of the top mode, or through an embedded
//!     scan when the top mode declares a sub-language.
//!
//! Delimiter Text
//!
//!     Whether a begin or end lexeme is part of the mode it delimits is decided by the mode's
//!     flags. Begin: `excludeBegin` leaves the lexeme in the parent, `returnBegin` does not
//!     consume it (the child sees it again), `skip` keeps it in the parent's buffer without a
//!     flush. End: the flags of the mode on top of the stack decide, even when the end matched
//!     belongs to an ancestor.
//!
//! Progress
//!
//!     Two guards keep the loop finite. A zero-width end directly after a zero-width begin at
//!     the same offset consumes one character (or fails, outside safe mode). Past a fixed
//!     iteration floor, a loop count above three times the cursor offset fails the scan; this is
//!     checked before every match, whatever kind of rule ends up winning. The mode stack is
//!     also capped at [MAX_STACK_DEPTH] frames.

use super::hooks::{self, BeginResponse};
use super::result::{Frame, ScanResult};
use super::{IllegalPolicy, ScanOptions};
use crate::glint::compiling::multiplexer::next_char_boundary;
use crate::glint::compiling::regex_source::matches_at;
use crate::glint::compiling::{
    CaptureScopes, CompiledMode, DelimiterScope, Language, ModeId, RuleKind, RuleMatch,
    MAX_KEYWORD_HITS,
};
use crate::glint::detection;
use crate::glint::emitting::Emitter;
use crate::glint::error::{IllegalContext, NoProgressReason, ScanError};
use crate::glint::grammar::SubLanguage;
use crate::glint::registry::Registry;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Embedded scans nest at most this deep; deeper regions stay plain text.
pub const MAX_EMBED_DEPTH: usize = 16;

/// Embedded scans that detect their language among candidates nest at most this deep. Each
/// level rescans the region once per candidate.
pub const MAX_DETECTED_EMBED_DEPTH: usize = 2;

/// Open modes allowed at once. A deeper stack fails the scan as a runaway.
pub const MAX_STACK_DEPTH: usize = 4096;

/// Characters of context kept either side of an illegal lexeme.
const CONTEXT_CHARS: usize = 100;

pub(crate) struct Scanner<'a, E: Emitter> {
    registry: &'a Registry,
    language: &'a Language,
    code: &'a str,
    options: ScanOptions,
    embed_depth: usize,
    emitter: E,
    stack: Vec<Frame>,
    buffer: String,
    relevance: u32,
    keyword_hits: HashMap<String, u32>,
    continuations: HashMap<String, Vec<Frame>>,
    last_match: Option<(RuleKind, usize)>,
    resuming: bool,
    iterations: usize,
    index: usize,
}

impl<'a, E: Emitter> Scanner<'a, E> {
    pub fn new(
        registry: &'a Registry,
        language: &'a Language,
        code: &'a str,
        options: ScanOptions,
        embed_depth: usize,
    ) -> Self {
        Self {
            registry,
            language,
            code,
            options,
            embed_depth,
            emitter: E::default(),
            stack: Vec::new(),
            buffer: String::new(),
            relevance: 0,
            keyword_hits: HashMap::new(),
            continuations: HashMap::new(),
            last_match: None,
            resuming: false,
            iterations: 0,
            index: 0,
        }
    }

    /// Scan the whole input. `continuation` is the final stack of a previous scan of the same
    /// language; its open scopes are reopened first.
    pub fn run(mut self, continuation: Option<Vec<Frame>>) -> Result<ScanResult<E>, ScanError> {
        let language = self.language;
        match continuation {
            Some(frames) if !frames.is_empty() => {
                for frame in &frames[1..] {
                    if let Some(scope) = language.mode(frame.mode).scope() {
                        self.emitter.open_node(scope);
                    }
                }
                self.stack = frames;
            }
            _ => self.stack = vec![Frame::root()],
        }

        match self.scan_loop() {
            Ok(()) => {
                self.emitter.close_all_nodes();
                self.emitter.finalize();
                Ok(ScanResult {
                    language: Some(language.name().to_string()),
                    relevance: self.relevance,
                    illegal: false,
                    illegal_by: None,
                    tree: self.emitter,
                    top: self.stack,
                })
            }
            Err(ScanError::IllegalLexeme(context)) if self.options.illegal == IllegalPolicy::Abort => {
                debug!(language = language.name(), %context, "scan aborted");
                let pending = std::mem::take(&mut self.buffer);
                self.emitter.add_text(&pending);
                self.emitter.close_all_nodes();
                self.emitter.add_text(&self.code[context.offset..]);
                self.emitter.finalize();
                Ok(ScanResult {
                    language: Some(language.name().to_string()),
                    relevance: 0,
                    illegal: true,
                    illegal_by: Some(*context),
                    tree: self.emitter,
                    top: self.stack,
                })
            }
            Err(err) => Err(err),
        }
    }

    fn scan_loop(&mut self) -> Result<(), ScanError> {
        let code = self.code;
        let language = self.language;
        loop {
            self.iterations += 1;
            if self.iterations > self.options.iteration_floor && self.iterations > self.index * 3 {
                return Err(self.no_progress(self.index, NoProgressReason::Runaway));
            }
            if self.resuming {
                self.resuming = false;
            } else {
                self.top_mut().regex_index = 0;
            }
            if self.index > code.len() {
                break;
            }

            let top = self.top();
            let matcher = language.mode(top.mode).matcher();
            let Some((m, resume)) = matcher.exec(code, self.index, top.regex_index)? else {
                break;
            };
            self.top_mut().regex_index = resume;

            let before = &code[self.index..m.index];
            let processed = self.process_lexeme(before, &m)?;
            self.index = m.index + processed;
        }

        let rest = code.get(self.index..).unwrap_or_default();
        self.buffer.push_str(rest);
        self.process_buffer()
    }

    fn top(&self) -> &Frame {
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn top_mode(&self) -> &'a CompiledMode {
        self.language.mode(self.top().mode)
    }

    /// Handle one match. Returns how far past the match start the cursor moves.
    fn process_lexeme(&mut self, before: &str, m: &RuleMatch) -> Result<usize, ScanError> {
        self.buffer.push_str(before);
        let lexeme = m.text(self.code);

        let zero_width_pair = matches!(
            (self.last_match, m.kind),
            (Some((RuleKind::Begin(_), last_index)), RuleKind::End) if last_index == m.index
        );
        if zero_width_pair && lexeme.is_empty() {
            let mode = self.top_mode().label();
            if !self.options.safe_mode {
                return Err(self.no_progress(m.index, NoProgressReason::ZeroWidthMatch));
            }
            warn!(language = self.language.name(), mode, offset = m.index, "zero-width match, skipping a character");
            return Ok(self.consume_char(m.index));
        }
        self.last_match = Some((m.kind, m.index));

        match m.kind {
            RuleKind::Begin(child) => return self.do_begin(child, m),
            RuleKind::Illegal if self.options.illegal != IllegalPolicy::Ignore => {
                return Err(ScanError::IllegalLexeme(Box::new(self.illegal_context(m))));
            }
            RuleKind::End => {
                if let Some(processed) = self.do_end(m)? {
                    return Ok(processed);
                }
            }
            RuleKind::Illegal => {}
        }

        if m.kind == RuleKind::Illegal && lexeme.is_empty() {
            return Ok(self.consume_char(m.index));
        }
        self.buffer.push_str(lexeme);
        Ok(lexeme.len())
    }

    /// Move the character at `at` into the buffer. At the end of input this steps past it,
    /// which ends the loop.
    fn consume_char(&mut self, at: usize) -> usize {
        match next_char_boundary(self.code, at) {
            Some(next) => {
                self.buffer.push_str(&self.code[at..next]);
                next - at
            }
            None => 1,
        }
    }

    fn do_begin(&mut self, child: ModeId, m: &RuleMatch) -> Result<usize, ScanError> {
        let mode = self.language.mode(child);
        let lexeme = m.text(self.code);

        let mut data = None;
        for hook in [mode.before_begin, mode.on_begin].into_iter().flatten() {
            match hooks::on_begin(hook, self.code, m) {
                BeginResponse::Reject => return Ok(self.do_ignore(m)),
                BeginResponse::Accept(captured) => data = captured.or(data),
            }
        }

        // A returned lexeme is scanned again, so it must not reach any buffer now.
        let flags = mode.flags;
        let consumed = !flags.return_begin;
        if flags.skip {
            if consumed {
                self.buffer.push_str(lexeme);
            }
        } else {
            if flags.exclude_begin && consumed {
                self.buffer.push_str(lexeme);
            }
            self.process_buffer()?;
            if consumed && !flags.exclude_begin {
                self.buffer = lexeme.to_string();
            }
        }
        self.start_new_mode(child, m, data, false)?;
        Ok(if flags.return_begin { 0 } else { lexeme.len() })
    }

    /// A rejected begin. Retry the remaining rules at the same offset, or move on a character
    /// once every rule has had its turn.
    fn do_ignore(&mut self, m: &RuleMatch) -> usize {
        if self.top().regex_index == 0 {
            self.consume_char(m.index)
        } else {
            self.resuming = true;
            0
        }
    }

    fn start_new_mode(
        &mut self,
        id: ModeId,
        m: &RuleMatch,
        data: Option<String>,
        via_starts: bool,
    ) -> Result<(), ScanError> {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(self.no_progress(m.index, NoProgressReason::Runaway));
        }
        let mode = self.language.mode(id);
        if let Some(scope) = mode.scope() {
            self.emitter.open_node(scope);
        }
        match &mode.begin_scope {
            Some(DelimiterScope::Wrap(scope)) => {
                let text = std::mem::take(&mut self.buffer);
                self.emitter.add_keyword(&text, scope);
            }
            // A continuation is entered on its predecessor's end match, whose groups are not its own.
            Some(DelimiterScope::Captures(captures)) if !via_starts => {
                self.emit_multi_class(captures, m);
                self.buffer.clear();
            }
            _ => {}
        }
        trace!(mode = mode.label(), offset = m.index, via_starts, "open");
        self.stack.push(Frame::new(id, data, via_starts));
        Ok(())
    }

    fn do_end(&mut self, m: &RuleMatch) -> Result<Option<usize>, ScanError> {
        let Some((ended, matched)) = self.end_of_mode(m) else {
            return Ok(None);
        };
        let language = self.language;
        let origin = self.top_mode();
        let own_end = matched == self.stack.len() - 1;
        let lexeme = m.text(self.code);
        let flags = origin.flags;

        match &origin.end_scope {
            Some(DelimiterScope::Wrap(scope)) if !flags.return_end => {
                self.process_buffer()?;
                self.emitter.add_keyword(lexeme, scope);
            }
            Some(DelimiterScope::Captures(captures)) if own_end => {
                self.process_buffer()?;
                self.emit_multi_class(captures, m);
            }
            _ if flags.skip => {
                if !flags.return_end {
                    self.buffer.push_str(lexeme);
                }
            }
            _ => {
                if !(flags.return_end || flags.exclude_end) {
                    self.buffer.push_str(lexeme);
                }
                self.process_buffer()?;
                if flags.exclude_end && !flags.return_end {
                    self.buffer = lexeme.to_string();
                }
            }
        }

        let ended_mode = language.mode(self.stack[ended].mode);
        while self.stack.len() > ended {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            let mode = language.mode(frame.mode);
            if mode.scope().is_some() {
                self.emitter.close_node();
            }
            if !mode.flags.skip && mode.sub_language.is_none() {
                self.relevance = self.relevance.saturating_add(mode.relevance);
            }
            trace!(mode = mode.label(), offset = m.index, via_starts = frame.via_starts, "close");
        }
        if let Some(starts) = ended_mode.starts() {
            self.start_new_mode(starts, m, None, true)?;
        }
        Ok(Some(if flags.return_end { 0 } else { lexeme.len() }))
    }

    /// Stack positions of the frame an end match closes and of the frame whose end pattern
    /// matched. The search follows `endsWithParent` upwards, then `endsParent` chains further
    /// up from the matching frame. The root frame never ends.
    fn end_of_mode(&self, m: &RuleMatch) -> Option<(usize, usize)> {
        let language = self.language;
        let mut position = self.stack.len() - 1;
        while position > 0 {
            let frame = &self.stack[position];
            let mode = language.mode(frame.mode);
            let matched = mode.end.as_ref().is_some_and(|end| matches_at(end, self.code, m.index))
                && mode
                    .on_end
                    .map_or(true, |hook| hooks::on_end(hook, self.code, m, frame.data.as_deref()));
            if matched {
                let matched_at = position;
                while position > 1 && language.mode(self.stack[position].mode).flags.ends_parent {
                    position -= 1;
                }
                return Some((position, matched_at));
            }
            if !mode.flags.ends_with_parent {
                return None;
            }
            position -= 1;
        }
        None
    }

    fn process_buffer(&mut self) -> Result<(), ScanError> {
        let mode = self.top_mode();
        match &mode.sub_language {
            Some(sub_language) => self.process_sub_language(sub_language, mode.relevance)?,
            None => self.process_keywords(),
        }
        self.buffer.clear();
        Ok(())
    }

    fn process_keywords(&mut self) {
        let text = std::mem::take(&mut self.buffer);
        let Some(table) = self.top_mode().keywords() else {
            self.emitter.add_text(&text);
            return;
        };

        let mut plain = String::new();
        let mut last = 0;
        for (start, end) in table.words(&text) {
            plain.push_str(&text[last..start]);
            last = end;
            let word = &text[start..end];
            let key = table.normalize(word);
            let Some(keyword) = table.get(&key) else {
                plain.push_str(word);
                continue;
            };

            self.emitter.add_text(&plain);
            plain.clear();
            let hits = self.keyword_hits.entry(key).or_insert(0);
            *hits += 1;
            if *hits <= MAX_KEYWORD_HITS {
                self.relevance = self.relevance.saturating_add(keyword.relevance);
            }
            match &keyword.scope {
                Some(scope) => self.emitter.add_keyword(word, scope),
                None => plain.push_str(word),
            }
        }
        plain.push_str(&text[last..]);
        self.emitter.add_text(&plain);
    }

    fn process_sub_language(&mut self, sub_language: &SubLanguage, relevance: u32) -> Result<(), ScanError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.buffer);
        if self.embed_depth >= MAX_EMBED_DEPTH {
            debug!(depth = self.embed_depth, "embedding too deep, keeping plain text");
            self.emitter.add_text(&text);
            return Ok(());
        }

        let result: ScanResult<E> = match sub_language {
            SubLanguage::Single(name) => {
                let Some(embedded) = self.registry.get_language(name) else {
                    warn!(language = self.language.name(), sub_language = %name, "unknown sub-language, keeping plain text");
                    self.emitter.add_text(&text);
                    return Ok(());
                };
                let options = ScanOptions {
                    illegal: IllegalPolicy::Ignore,
                    ..self.options
                };
                let continuation = self.continuations.remove(name);
                let mut result = Scanner::new(self.registry, &embedded, &text, options, self.embed_depth + 1)
                    .run(continuation)?;
                self.continuations
                    .insert(name.clone(), std::mem::take(&mut result.top));
                result
            }
            SubLanguage::Candidates(_) if self.embed_depth >= MAX_DETECTED_EMBED_DEPTH => {
                debug!(depth = self.embed_depth, "detected embedding too deep, keeping plain text");
                self.emitter.add_text(&text);
                return Ok(());
            }
            SubLanguage::Candidates(names) => {
                detection::rank::<E>(self.registry, &text, names, self.options, self.embed_depth + 1)?.best
            }
        };

        if relevance > 0 {
            self.relevance = self.relevance.saturating_add(result.relevance);
        }
        match &result.language {
            Some(name) => self.emitter.add_sublanguage(result.tree, name),
            None => self.emitter.add_text(&text),
        }
        Ok(())
    }

    /// Emit each group of a multi-part delimiter: scoped groups as keywords, the others
    /// through the keyword table of the top mode.
    fn emit_multi_class(&mut self, captures: &CaptureScopes, m: &RuleMatch) {
        for (group, scope) in captures.groups() {
            let Some(text) = m.group(self.code, *group) else {
                continue;
            };
            match scope {
                Some(scope) => self.emitter.add_keyword(text, scope),
                None => {
                    self.buffer = text.to_string();
                    self.process_keywords();
                    self.buffer.clear();
                }
            }
        }
    }

    fn illegal_context(&self, m: &RuleMatch) -> IllegalContext {
        IllegalContext {
            lexeme: m.text(self.code).to_string(),
            mode: self.top_mode().label().to_string(),
            offset: m.index,
            context: context_window(self.code, m.index),
        }
    }

    fn no_progress(&self, offset: usize, reason: NoProgressReason) -> ScanError {
        ScanError::NoProgress {
            language: self.language.name().to_string(),
            mode: self.top_mode().label().to_string(),
            offset,
            reason,
        }
    }
}

/// Up to [CONTEXT_CHARS] characters either side of `offset`.
fn context_window(code: &str, offset: usize) -> String {
    let start = code[..offset]
        .char_indices()
        .rev()
        .nth(CONTEXT_CHARS - 1)
        .map_or(0, |(i, _)| i);
    let end = code[offset..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map_or(code.len(), |(i, _)| offset + i);
    code[start..end].to_string()
}
