//! Formula tokenizer and translator
//!
//! Translates Excel formula syntax into a Python expression over a cell
//! store `c` keyed by `(sheet, column_letters, row)`. A single-pass
//! tokenizer classifies the formula into tokens (references come from the
//! [resolver](crate::resolve) and are consumed by span); a small recursive
//! descent pass then renders the token stream.
//!
//! Reference rendering is pluggable through [`RefStyle`] so the emitter
//! can derive one relativized expression per vectorized group: in a loop,
//! relative axes render as offsets from the induction variable while
//! absolute axes stay literal.

pub mod functions;

use crate::error::TranslateError;
use crate::resolve::{extract_references, RefCoord, RefTarget, Reference};
use crate::tables::TableIndex;
use functions::{catalog, FunctionCatalog, FunctionDef};
use sheetc_core::{column_to_letters, CellCoord};

/// How references are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefStyle {
    /// Literal coordinates
    Scalar,
    /// `_r` is the loop variable; relative rows become offsets from it
    VerticalLoop { base_row: u32 },
    /// `_ci` is the loop variable (column index); relative columns become
    /// offsets from it
    HorizontalLoop { base_col: u32 },
}

/// Translation context for one formula
#[derive(Debug, Clone, Copy)]
pub struct TranslateContext<'a> {
    /// Sheet hosting the formula
    pub sheet: &'a str,
    /// Position of the host cell, when known (enables static `ROW()` /
    /// `COLUMN()` translation)
    pub host: Option<CellCoord>,
    /// Table metadata for structured references
    pub tables: &'a TableIndex,
    pub style: RefStyle,
}

impl<'a> TranslateContext<'a> {
    /// Scalar context without a known host position
    pub fn new(sheet: &'a str, tables: &'a TableIndex) -> Self {
        Self {
            sheet,
            host: None,
            tables,
            style: RefStyle::Scalar,
        }
    }

    pub fn with_host(mut self, host: CellCoord) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_style(mut self, style: RefStyle) -> Self {
        self.style = style;
        self
    }
}

/// Non-fatal degradation noticed during translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateIssue {
    /// Function name missing from the catalog; a fallback target was used
    UnknownFunction(String),
    /// Fragment passed through untranslated
    Unrecognized(String),
}

/// Result of translating one formula
#[derive(Debug, Clone)]
pub struct Translation {
    /// Target-language expression
    pub expr: String,
    /// Every reference consumed by the formula, in source order
    pub references: Vec<Reference>,
    /// Degradations to report as diagnostics
    pub issues: Vec<TranslateIssue>,
}

/// Translate a formula into a Python expression
pub fn translate(formula: &str, ctx: &TranslateContext) -> Result<Translation, TranslateError> {
    let body = formula.strip_prefix('=').unwrap_or(formula);
    let references = extract_references(formula, ctx.sheet);
    let tokens = tokenize(body, &references)?;

    let mut translator = Translator {
        ctx,
        refs: &references,
        issues: Vec::new(),
    };
    let mut cursor = Cursor {
        tokens: &tokens,
        pos: 0,
    };
    let mut expr = translator.expr(&mut cursor, false);
    if expr.is_empty() {
        expr = "None".to_string();
    }
    let issues = translator.issues;

    Ok(Translation {
        expr,
        references,
        issues,
    })
}

/// Render a Python string literal (single-quoted)
pub(crate) fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

/// Store key for a reference's sheet: external cells live under a
/// `file|sheet` compound key so they never collide with local sheets
pub(crate) fn store_sheet(reference: &Reference) -> String {
    match &reference.external_file {
        Some(file) => format!("{}|{}", file, reference.sheet),
        None => reference.sheet.clone(),
    }
}

// === Tokenizer ===

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Index into the extracted references
    Ref(usize),
    Number(String),
    Str(String),
    Bool(bool),
    /// Identifier directly followed by `(`
    Func(String),
    /// Any other identifier (named range etc.)
    Ident(String),
    Op(&'static str),
    Comma,
    LParen,
    RParen,
    Unknown(char),
}

fn tokenize(body: &str, refs: &[Reference]) -> Result<Vec<Token>, TranslateError> {
    let bytes = body.as_bytes();
    let mut tokens = Vec::new();
    let mut next_ref = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if next_ref < refs.len() && refs[next_ref].start == i {
            tokens.push(Token::Ref(next_ref));
            i = refs[next_ref].end;
            next_ref += 1;
            continue;
        }

        let b = bytes[i];

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if b == b'"' {
            let (content, end) = scan_string(body, i)?;
            tokens.push(Token::Str(content));
            i = end;
            continue;
        }

        if b.is_ascii_digit()
            || (b == b'.' && bytes.get(i + 1).is_some_and(|c| c.is_ascii_digit()))
        {
            let end = scan_number(bytes, i);
            tokens.push(Token::Number(body[i..end].to_string()));
            i = end;
            continue;
        }

        if b.is_ascii_alphabetic() || b == b'_' {
            let mut j = i + 1;
            while j < bytes.len()
                && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_' || bytes[j] == b'.')
            {
                j += 1;
            }
            let name = &body[i..j];
            if bytes.get(j) == Some(&b'(') {
                tokens.push(Token::Func(name.to_string()));
            } else if name.eq_ignore_ascii_case("TRUE") {
                tokens.push(Token::Bool(true));
            } else if name.eq_ignore_ascii_case("FALSE") {
                tokens.push(Token::Bool(false));
            } else {
                tokens.push(Token::Ident(name.to_string()));
            }
            i = j;
            continue;
        }

        // Two-character operators first
        match (b, bytes.get(i + 1)) {
            (b'<', Some(b'>')) => {
                tokens.push(Token::Op("<>"));
                i += 2;
                continue;
            }
            (b'<', Some(b'=')) => {
                tokens.push(Token::Op("<="));
                i += 2;
                continue;
            }
            (b'>', Some(b'=')) => {
                tokens.push(Token::Op(">="));
                i += 2;
                continue;
            }
            _ => {}
        }

        match b {
            b'+' => tokens.push(Token::Op("+")),
            b'-' => tokens.push(Token::Op("-")),
            b'*' => tokens.push(Token::Op("*")),
            b'/' => tokens.push(Token::Op("/")),
            b'^' => tokens.push(Token::Op("^")),
            b'&' => tokens.push(Token::Op("&")),
            b'%' => tokens.push(Token::Op("%")),
            b'=' => tokens.push(Token::Op("=")),
            b'<' => tokens.push(Token::Op("<")),
            b'>' => tokens.push(Token::Op(">")),
            b',' | b';' => tokens.push(Token::Comma),
            b'(' => tokens.push(Token::LParen),
            b')' => tokens.push(Token::RParen),
            _ => tokens.push(Token::Unknown(body[i..].chars().next().unwrap_or('?'))),
        }
        i += body[i..].chars().next().map_or(1, |c| c.len_utf8());
    }

    Ok(tokens)
}

fn scan_string(body: &str, start: usize) -> Result<(String, usize), TranslateError> {
    let bytes = body.as_bytes();
    let mut content = String::new();
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                content.push('"');
                i += 2;
                continue;
            }
            return Ok((content, i + 1));
        }
        let ch = body[i..].chars().next().unwrap_or('?');
        content.push(ch);
        i += ch.len_utf8();
    }
    Err(TranslateError::UnterminatedString)
}

fn scan_number(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

// === Translator ===

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }
}

struct Arg {
    text: String,
    /// Set when the argument was exactly one reference token
    single_ref: Option<usize>,
}

struct Translator<'a> {
    ctx: &'a TranslateContext<'a>,
    refs: &'a [Reference],
    issues: Vec<TranslateIssue>,
}

impl<'a> Translator<'a> {
    /// Render tokens until a top-level `)`, an argument-separating comma
    /// (when `stop_at_comma`), or the end of input
    fn expr(&mut self, cur: &mut Cursor<'a>, stop_at_comma: bool) -> String {
        let mut out = String::new();
        // A leading `-`/`+` (or one right after an operator) is a sign,
        // not a binary operator
        let mut expect_operand = true;
        loop {
            match cur.peek() {
                None | Some(Token::RParen) => break,
                Some(Token::Comma) if stop_at_comma => break,
                Some(Token::Comma) => {
                    cur.next();
                    out.push_str(", ");
                    expect_operand = true;
                }
                Some(Token::Op(op)) => {
                    let op = *op;
                    cur.next();
                    match op {
                        "-" | "+" if expect_operand => {
                            let operand = self.operand(cur);
                            if op == "-" {
                                out.push('-');
                            }
                            out.push_str(&operand);
                            expect_operand = false;
                        }
                        "&" => {
                            let operand = self.operand(cur);
                            out.push_str(" + str(");
                            if operand.is_empty() {
                                out.push_str("''");
                            } else {
                                out.push_str(&operand);
                            }
                            out.push(')');
                            expect_operand = false;
                        }
                        "%" => {
                            out.push_str(" / 100");
                            expect_operand = false;
                        }
                        "=" => {
                            out.push_str(" == ");
                            expect_operand = true;
                        }
                        "<>" => {
                            out.push_str(" != ");
                            expect_operand = true;
                        }
                        "^" => {
                            out.push_str(" ** ");
                            expect_operand = true;
                        }
                        other => {
                            out.push(' ');
                            out.push_str(other);
                            out.push(' ');
                            expect_operand = true;
                        }
                    }
                }
                Some(_) => {
                    let p = self.operand(cur);
                    out.push_str(&p);
                    expect_operand = false;
                }
            }
        }
        out.trim().to_string()
    }

    /// One operand: a primary plus any immediately following `%`
    fn operand(&mut self, cur: &mut Cursor<'a>) -> String {
        let mut p = self.primary(cur);
        while matches!(cur.peek(), Some(Token::Op("%"))) {
            cur.next();
            p.push_str(" / 100");
        }
        p
    }

    fn primary(&mut self, cur: &mut Cursor<'a>) -> String {
        match cur.next() {
            None => String::new(),
            Some(Token::Ref(i)) => {
                let i = *i;
                self.render_reference(&self.refs[i])
            }
            Some(Token::Number(s)) => s.clone(),
            Some(Token::Str(s)) => py_str(s),
            Some(Token::Bool(b)) => if *b { "True" } else { "False" }.to_string(),
            Some(Token::Func(name)) => {
                let name = name.clone();
                self.call(cur, &name)
            }
            Some(Token::LParen) => {
                let inner = self.expr(cur, false);
                if matches!(cur.peek(), Some(Token::RParen)) {
                    cur.next();
                }
                format!("({})", inner)
            }
            Some(Token::Ident(s)) => {
                self.issues.push(TranslateIssue::Unrecognized(s.clone()));
                s.clone()
            }
            Some(Token::Unknown(ch)) => ch.to_string(),
            // Prefix sign reaches here when an operand opens with it
            Some(Token::Op("-")) => format!("-{}", self.primary(cur)),
            Some(Token::Op("+")) => self.primary(cur),
            Some(Token::Op(op)) => format!(" {} ", op),
            Some(Token::Comma) => ", ".to_string(),
            Some(Token::RParen) => String::new(),
        }
    }

    fn call(&mut self, cur: &mut Cursor<'a>, name: &str) -> String {
        // The tokenizer guarantees a `(` follows a Func token
        if matches!(cur.peek(), Some(Token::LParen)) {
            cur.next();
        }

        let mut args: Vec<Arg> = Vec::new();
        if !matches!(cur.peek(), Some(Token::RParen) | None) {
            loop {
                let start_pos = cur.pos;
                let text = self.expr(cur, true);
                let single_ref = if cur.pos == start_pos + 1 {
                    match cur.tokens.get(start_pos) {
                        Some(Token::Ref(i)) => Some(*i),
                        _ => None,
                    }
                } else {
                    None
                };
                let text = if text.is_empty() {
                    "None".to_string()
                } else {
                    text
                };
                args.push(Arg { text, single_ref });
                match cur.peek() {
                    Some(Token::Comma) => {
                        cur.next();
                    }
                    _ => break,
                }
            }
        }
        // Tolerate a missing `)` at end of input
        if matches!(cur.peek(), Some(Token::RParen)) {
            cur.next();
        }

        self.render_call(name, &args)
    }

    fn render_call(&mut self, name: &str, args: &[Arg]) -> String {
        let upper = name.to_uppercase();
        match upper.as_str() {
            "TRUE" => return "True".to_string(),
            "FALSE" => return "False".to_string(),
            "PI" => return "xl_pi()".to_string(),
            "TODAY" | "NOW" => {
                let def = catalog().get(&upper).expect("date functions registered");
                return format!("{}()", def.target);
            }
            _ => {}
        }

        match catalog().get(&upper) {
            Some(def) if def.dynamic => self.render_dynamic(def, args),
            Some(def) => format!("{}({})", def.target, join_args(args)),
            None => {
                log::warn!("unknown function {}, using fallback target", name);
                self.issues
                    .push(TranslateIssue::UnknownFunction(name.to_string()));
                format!(
                    "{}({})",
                    FunctionCatalog::fallback_target(name),
                    join_args(args)
                )
            }
        }
    }

    /// Dynamic functions take the live cell store and the current sheet
    fn render_dynamic(&mut self, def: &FunctionDef, args: &[Arg]) -> String {
        let sheet_lit = py_str(self.ctx.sheet);
        match def.name {
            "INDIRECT" => format!("xl_indirect(c, {}, {})", sheet_lit, join_args(args)),
            "OFFSET" => {
                // When the base is a plain reference its position is known
                // statically and the shim can do real arithmetic.
                if let Some((reference, corner)) = self.plain_base(args) {
                    let rest = join_args(&args[1..]);
                    let base_sheet = py_str(&store_sheet(reference));
                    let col = py_str(&column_to_letters(corner.col));
                    if rest.is_empty() {
                        format!("xl_offset(c, {}, {}, {})", base_sheet, col, corner.row)
                    } else {
                        format!(
                            "xl_offset(c, {}, {}, {}, {})",
                            base_sheet, col, corner.row, rest
                        )
                    }
                } else {
                    let rest = join_args(if args.is_empty() { args } else { &args[1..] });
                    if rest.is_empty() {
                        format!("xl_offset(c, {}, None, None)", sheet_lit)
                    } else {
                        format!("xl_offset(c, {}, None, None, {})", sheet_lit, rest)
                    }
                }
            }
            "ROW" => {
                if args.is_empty() {
                    match (self.ctx.style, self.ctx.host) {
                        (RefStyle::VerticalLoop { .. }, _) => "_r".to_string(),
                        (_, Some(host)) => host.row.to_string(),
                        (_, None) => format!("xl_row(c, {})", sheet_lit),
                    }
                } else if let Some((_, corner)) = self.plain_base(args) {
                    self.row_expr(corner.row, corner.row_abs)
                } else {
                    format!("xl_row(c, {}, {})", sheet_lit, join_args(args))
                }
            }
            "COLUMN" => {
                if args.is_empty() {
                    match (self.ctx.style, self.ctx.host) {
                        (RefStyle::HorizontalLoop { .. }, _) => "_ci".to_string(),
                        (_, Some(host)) => host.col.to_string(),
                        (_, None) => format!("xl_column(c, {})", sheet_lit),
                    }
                } else if let Some((_, corner)) = self.plain_base(args) {
                    self.col_number_expr(corner.col, corner.col_abs)
                } else {
                    format!("xl_column(c, {}, {})", sheet_lit, join_args(args))
                }
            }
            other => format!("{}({})", other, join_args(args)),
        }
    }

    /// First argument as a plain reference, with its start corner
    fn plain_base(&self, args: &[Arg]) -> Option<(&'a Reference, RefCoord)> {
        let i = args.first()?.single_ref?;
        let reference = &self.refs[i];
        match &reference.target {
            RefTarget::Cell(c) => Some((reference, *c)),
            RefTarget::Range(start, _) => Some((reference, *start)),
            RefTarget::Table { .. } => None,
        }
    }

    fn render_reference(&mut self, reference: &Reference) -> String {
        let sheet_lit = py_str(&store_sheet(reference));
        match &reference.target {
            RefTarget::Cell(c) => format!(
                "c.get(({}, {}, {}))",
                sheet_lit,
                self.col_expr(c.col, c.col_abs),
                self.row_expr(c.row, c.row_abs)
            ),
            RefTarget::Range(start, end) => format!(
                "_rng(c, {}, {}, {}, {}, {})",
                sheet_lit,
                self.col_expr(start.col, start.col_abs),
                self.row_expr(start.row, start.row_abs),
                self.col_expr(end.col, end.col_abs),
                self.row_expr(end.row, end.row_abs)
            ),
            RefTarget::Table { table, column } => {
                let resolved = self
                    .ctx
                    .tables
                    .get(table)
                    .and_then(|t| t.column_coord(column).map(|col| (t, col)));
                match resolved {
                    Some((t, col)) => format!(
                        "[c.get(({}, {}, _tr)) for _tr in range({}, {})]",
                        py_str(&t.sheet),
                        py_str(&column_to_letters(col)),
                        t.data_start_row,
                        t.data_end_row + 1
                    ),
                    None => {
                        log::debug!("unresolved table reference {}", reference.raw);
                        self.issues
                            .push(TranslateIssue::Unrecognized(reference.raw.clone()));
                        reference.raw.clone()
                    }
                }
            }
        }
    }

    /// Column rendered as letters (or a `_cl(...)` expression in a
    /// horizontal loop)
    fn col_expr(&self, col: u32, absolute: bool) -> String {
        if let RefStyle::HorizontalLoop { base_col } = self.ctx.style {
            if !absolute {
                let offset = col as i64 - base_col as i64;
                return match offset {
                    0 => "_cl(_ci)".to_string(),
                    o if o > 0 => format!("_cl(_ci + {})", o),
                    o => format!("_cl(_ci - {})", -o),
                };
            }
        }
        py_str(&column_to_letters(col))
    }

    /// Row rendered as a number (or an `_r` offset in a vertical loop)
    fn row_expr(&self, row: u32, absolute: bool) -> String {
        if let RefStyle::VerticalLoop { base_row } = self.ctx.style {
            if !absolute {
                let offset = row as i64 - base_row as i64;
                return match offset {
                    0 => "_r".to_string(),
                    o if o > 0 => format!("_r + {}", o),
                    o => format!("_r - {}", -o),
                };
            }
        }
        row.to_string()
    }

    /// Column rendered as a number (for `COLUMN(...)`)
    fn col_number_expr(&self, col: u32, absolute: bool) -> String {
        if let RefStyle::HorizontalLoop { base_col } = self.ctx.style {
            if !absolute {
                let offset = col as i64 - base_col as i64;
                return match offset {
                    0 => "_ci".to_string(),
                    o if o > 0 => format!("_ci + {}", o),
                    o => format!("_ci - {}", -o),
                };
            }
        }
        col.to_string()
    }
}

fn join_args(args: &[Arg]) -> String {
    args.iter()
        .map(|a| a.text.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
