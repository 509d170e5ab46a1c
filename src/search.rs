use crate::address::LineMatcher;
use crate::error::{EdError, EdResult};
use regex::bytes::Regex;

/// Strip the line terminator so `$` anchors and replacements see only the
/// line body.
pub fn body(text: &[u8]) -> &[u8] {
    text.strip_suffix(b"\n").unwrap_or(text)
}

/// Split `input` at the first `delim` not preceded by a backslash.
///
/// Returns the text before it (escapes intact), the remainder after it, and
/// whether a closing delimiter was found at all. An unterminated segment
/// runs to the end of the input.
pub fn scan_delimited(input: &str, delim: char) -> (&str, &str, bool) {
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delim {
            return (&input[..i], &input[i + c.len_utf8()..], true);
        }
    }
    (input, "", false)
}

/// Turn `\<delim>` back into a bare delimiter; every other escape is left
/// for the regex engine.
pub fn unescape_delimiter(raw: &str, delim: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&delim) {
            continue;
        }
        out.push(c);
    }
    out
}

/// Rewrite an ed replacement string into a `regex` expansion template.
///
/// `&` is the whole match and `\1`..`\9` are groups. A backslash makes the
/// next character literal, and a bare `$` is escaped so the regex crate does
/// not read it as a group reference.
pub fn convert_replacement(raw: &str, delim: char) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(d) if d.is_ascii_digit() => {
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                }
                Some('$') => out.push_str("$$"),
                Some(d) if d == delim => out.push(d),
                Some(d) => out.push(d),
                None => out.push('\\'),
            },
            '&' => out.push_str("${0}"),
            '$' => out.push_str("$$"),
            _ => out.push(c),
        }
    }
    out
}

/// How a substitution picks which matches on a line to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// 1-based index of the first match to replace.
    pub nth: usize,
    /// Replace every match from `nth` onwards.
    pub global: bool,
}

impl Default for Occurrence {
    fn default() -> Self {
        Self {
            nth: 1,
            global: false,
        }
    }
}

/// A parsed `s` command, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub pattern: String,
    /// Expansion template, already in `regex` syntax.
    pub template: String,
    pub occurrence: Occurrence,
    /// Print suffix (`p`, `n` or `l`) for the last substituted line.
    pub print: Option<char>,
}

/// Last pattern and last substitution, shared by addresses, `g`/`v` and `s`.
///
/// Patterns are compiled as byte regexes so lines that are not valid UTF-8
/// can still be searched.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pattern: Option<String>,
    regex: Option<Regex>,
    substitution: Option<Substitution>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` and make it the remembered one. An empty pattern
    /// means the remembered one.
    pub fn compile(&mut self, pattern: &str) -> EdResult<Regex> {
        if pattern.is_empty() {
            return self.regex.clone().ok_or(EdError::NoPreviousPattern);
        }
        if self.pattern.as_deref() == Some(pattern) {
            if let Some(regex) = &self.regex {
                return Ok(regex.clone());
            }
        }
        let regex = Regex::new(pattern)?;
        self.pattern = Some(pattern.to_string());
        self.regex = Some(regex.clone());
        Ok(regex)
    }

    /// Parse the text following an `s` command.
    ///
    /// `s` on its own repeats the previous substitution. A replacement of
    /// exactly `%` reuses the previous replacement. Leaving off the final
    /// delimiter implies the `p` suffix.
    pub fn parse_substitute(&mut self, args: &str) -> EdResult<Substitution> {
        let mut chars = args.chars();
        let delim = match chars.next() {
            None => {
                return self
                    .substitution
                    .clone()
                    .ok_or(EdError::NoPreviousSubstitution);
            }
            Some(c) if c == ' ' || c == '\n' => return Err(EdError::InvalidSuffix),
            Some(c) => c,
        };
        let rest = chars.as_str();

        let (raw_pattern, rest, closed) = scan_delimited(rest, delim);
        if !closed {
            return Err(EdError::Unterminated("substitute pattern"));
        }
        let (raw_replacement, flags, closed) = scan_delimited(rest, delim);

        let template = if raw_replacement == "%" {
            self.substitution
                .as_ref()
                .map(|s| s.template.clone())
                .ok_or(EdError::NoPreviousSubstitution)?
        } else {
            convert_replacement(raw_replacement, delim)
        };

        let (occurrence, mut print) = parse_flags(flags)?;
        if !closed {
            print = Some('p');
        }

        let substitution = Substitution {
            pattern: unescape_delimiter(raw_pattern, delim),
            template,
            occurrence,
            print,
        };
        self.substitution = Some(substitution.clone());
        Ok(substitution)
    }
}

impl LineMatcher for SearchState {
    fn matches(&mut self, text: &[u8], pattern: &str) -> EdResult<bool> {
        let regex = self.compile(pattern)?;
        Ok(regex.is_match(body(text)))
    }
}

fn parse_flags(flags: &str) -> EdResult<(Occurrence, Option<char>)> {
    let mut occurrence = Occurrence::default();
    let mut print = None;
    let mut digits = String::new();
    for c in flags.chars() {
        match c {
            'g' => occurrence.global = true,
            'p' | 'n' | 'l' => print = Some(c),
            '0'..='9' => digits.push(c),
            _ => return Err(EdError::InvalidSuffix),
        }
    }
    if !digits.is_empty() {
        occurrence.nth = digits.parse().map_err(|_| EdError::InvalidSuffix)?;
        if occurrence.nth == 0 {
            return Err(EdError::InvalidSuffix);
        }
    }
    Ok((occurrence, print))
}

/// Apply one substitution to a stored line. `None` when nothing on the line
/// was replaced. The result keeps the line terminator.
pub fn substitute_line(regex: &Regex, text: &[u8], sub: &Substitution) -> Option<Vec<u8>> {
    let line = body(text);
    let mut out = Vec::with_capacity(line.len() + 1);
    let mut last = 0;
    let mut replaced = false;

    for (i, caps) in regex.captures_iter(line).enumerate() {
        let n = i + 1;
        let hit = if sub.occurrence.global {
            n >= sub.occurrence.nth
        } else {
            n == sub.occurrence.nth
        };
        if !hit {
            continue;
        }
        let Some(m) = caps.get(0) else { continue };
        out.extend_from_slice(&line[last..m.start()]);
        caps.expand(sub.template.as_bytes(), &mut out);
        last = m.end();
        replaced = true;
        if !sub.occurrence.global {
            break;
        }
    }

    if !replaced {
        return None;
    }
    out.extend_from_slice(&line[last..]);
    out.push(b'\n');
    Some(out)
}
