//! Textual forms recognized by the rewriter.
//!
//! The matchers only look at `require()` calls with a single string literal
//! argument and at the two re-export shapes babel emits. Everything else is
//! left untouched, except that a `require(` the matchers did not consume is
//! reported instead of silently passed through.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `var x = require('spec');` (also `let`/`const`).
pub static BINDING_REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"\b(var|let|const)\s+([A-Za-z_$][\w$]*)\s*=\s*require\(\s*['"]([^'"\n]+)['"]\s*\)\s*;"#)
    .expect("valid regex")
});

/// A top-level statement `require('spec');`: starts at column 0 and ends with
/// the semicolon. Indented or unterminated requires are left to
/// [`INLINE_REQUIRE`], since they may be nested in a block or continued on the
/// next line.
pub static EFFECT_REQUIRE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"^require\(\s*['"]([^'"\n]+)['"]\s*\)\s*;\s*$"#).expect("valid regex"));

/// `require('spec')` anywhere in an expression.
pub static INLINE_REQUIRE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"require\(\s*['"]([^'"\n]+)['"]\s*\)"#).expect("valid regex"));

/// Any call to `require`, used to find forms the matchers above do not cover.
pub static ANY_REQUIRE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"require\s*\(([^)\n]*)\)?").expect("valid regex"));

/// Getter-based re-export:
///
/// ```js
/// Object.defineProperty(exports, 'name', {
///   enumerable: true,
///   get: function get() {
///     return _source.name;
///   }
/// });
/// ```
pub static GETTER_REEXPORT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r#"Object\.defineProperty\(exports,\s*['"]([\w$]+)['"],\s*\{\s*enumerable:\s*true,\s*get:\s*function(?:\s+get)?\s*\(\)\s*\{\s*return\s+([\w$.]+)\.([\w$]+);\s*\}\s*\}\);"#,
  )
  .expect("valid regex")
});

/// `exports.name = _source.default;` at the start of a line.
pub static DEFAULT_REEXPORT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)exports\.([\w$]+)\s*=\s*([\w$.]+)\.default;").expect("valid regex"));

/// Property reads on the implicit `global` object.
pub static GLOBAL_READ: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\bglobal\.([A-Za-z_$][\w$]*)").expect("valid regex"));

/// Copy of `text` with comments and the contents of string literals blanked
/// out.
///
/// Byte offsets and newlines are preserved, and quotes stay in place. Regex
/// literals are not recognized.
pub fn mask_comments_and_strings(text: &str) -> String {
  #[derive(Clone, Copy)]
  enum State {
    Code,
    LineComment,
    BlockComment,
    Literal(u8),
  }

  let bytes = text.as_bytes();
  let mut out = Vec::with_capacity(bytes.len());
  let blank = |b: u8| if b == b'\n' { b'\n' } else { b' ' };
  let mut state = State::Code;
  let mut i = 0;

  while i < bytes.len() {
    let b = bytes[i];
    let next = bytes.get(i + 1).copied();
    match state {
      State::Code => match (b, next) {
        (b'/', Some(b'/')) => {
          state = State::LineComment;
          out.extend_from_slice(b"  ");
          i += 2;
          continue;
        }
        (b'/', Some(b'*')) => {
          state = State::BlockComment;
          out.extend_from_slice(b"  ");
          i += 2;
          continue;
        }
        (b'\'' | b'"' | b'`', _) => {
          state = State::Literal(b);
          out.push(b);
        }
        _ => out.push(b),
      },
      State::LineComment => {
        if b == b'\n' {
          state = State::Code;
        }
        out.push(blank(b));
      }
      State::BlockComment => {
        if b == b'*' && next == Some(b'/') {
          state = State::Code;
          out.extend_from_slice(b"  ");
          i += 2;
          continue;
        }
        out.push(blank(b));
      }
      State::Literal(quote) => {
        if b == b'\\'
          && let Some(escaped) = next
        {
          out.push(b' ');
          out.push(blank(escaped));
          i += 2;
          continue;
        }
        if b == quote || (b == b'\n' && quote != b'`') {
          state = State::Code;
          out.push(b);
        } else {
          out.push(blank(b));
        }
      }
    }
    i += 1;
  }

  // Only whole characters outside comments and literals are copied, so the
  // result is valid UTF-8.
  String::from_utf8_lossy(&out).into_owned()
}

/// Check whether `c` can be part of a JavaScript identifier.
pub fn is_ident_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '$'
}

/// Replace every match of `re` with the result of `f`, stopping at the first error.
pub fn try_replace_all<E>(
  re: &Regex,
  text: &str,
  mut f: impl FnMut(&Captures<'_>) -> Result<Option<String>, E>,
) -> Result<String, E> {
  let mut out = String::with_capacity(text.len());
  let mut last = 0;

  for caps in re.captures_iter(text) {
    let Some(whole) = caps.get(0) else { continue };
    if let Some(replacement) = f(&caps)? {
      out.push_str(&text[last..whole.start()]);
      out.push_str(&replacement);
      last = whole.end();
    }
  }

  out.push_str(&text[last..]);
  Ok(out)
}

/// Names read from the `global` object, sorted.
pub fn scan_globals(text: &str) -> BTreeSet<String> {
  GLOBAL_READ
    .captures_iter(text)
    .filter_map(|caps| caps.get(1))
    .map(|m| m.as_str().to_string())
    .collect()
}

/// Specifier of an effect-only require line, if `line` is one.
pub fn effect_specifier(line: &str) -> Option<&str> {
  EFFECT_REQUIRE.captures(line).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Remove effect-only require lines.
///
/// A removed run of lines takes one adjacent blank line with it, so that a
/// require separated by blank lines on both sides leaves a single blank line
/// behind and one glued to code on either side leaves none.
pub fn strip_effect_lines(text: &str) -> String {
  let lines: Vec<&str> = text.split_inclusive('\n').collect();
  let is_blank = |line: &str| line.trim().is_empty();

  let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
  let mut i = 0;
  while i < lines.len() {
    if effect_specifier(lines[i]).is_none() {
      kept.push(lines[i]);
      i += 1;
      continue;
    }

    let mut end = i;
    while end < lines.len() && effect_specifier(lines[end]).is_some() {
      end += 1;
    }

    let blank_before = kept.last().is_some_and(|line| is_blank(line));
    let blank_after = lines.get(end).is_some_and(|line| is_blank(line));
    if blank_after {
      end += 1;
    } else if blank_before {
      kept.pop();
    }
    i = end;
  }

  kept.concat()
}

/// Rewrite both re-export shapes into `var name = exports.name = source.name;`.
pub fn fix_exports(text: &str) -> String {
  let text = GETTER_REEXPORT.replace_all(text, |caps: &Captures<'_>| {
    let (name, source, property) = (&caps[1], &caps[2], &caps[3]);
    if name == property {
      format!("var {name} = exports.{name} = {source}.{name};")
    } else {
      caps[0].to_string()
    }
  });

  DEFAULT_REEXPORT
    .replace_all(&text, "${1}var ${2} = exports.${2} = ${3}.default;")
    .into_owned()
}
