//! Textual representation of values.
//!
//! [`lrepr`] renders a [`Value`] under a set of [`PrintOptions`], and the
//! `Display` impls of every collection kind go through the same helpers with
//! the default options.

use std::fmt::{self, Display, Write};

use crate::contracts::MetaMap;
use crate::language::Value;

/// Controls how values are printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    /// Print at most this many elements of each collection, then `...`.
    pub print_length: Option<usize>,
    /// Collections nested deeper than this print as `#`.
    pub print_level: Option<usize>,
    /// Prefix values that carry metadata with `^{...} `.
    pub print_meta: bool,
    /// Quote and escape strings.
    pub print_readably: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            print_length: None,
            print_level: None,
            print_meta: false,
            print_readably: true,
        }
    }
}

/// Render `value` as a string.
pub fn lrepr(value: &Value, opts: &PrintOptions) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_value(&mut out, value, opts);
    out
}

/// Write `items` separated by `sep` between `open` and `close`.
pub(crate) fn write_sequence<W, I>(
    out: &mut W,
    items: I,
    open: &str,
    sep: &str,
    close: &str,
) -> fmt::Result
where
    W: Write + ?Sized,
    I: IntoIterator,
    I::Item: Display,
{
    out.write_str(open)?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.write_str(sep)?;
        }
        write!(out, "{item}")?;
    }
    out.write_str(close)
}

pub(crate) fn write_value<W: Write + ?Sized>(
    out: &mut W,
    value: &Value,
    opts: &PrintOptions,
) -> fmt::Result {
    Printer { opts }.value(out, value, 0)
}

fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            c => result.push(c),
        }
    }
    result
}

struct Printer<'a> {
    opts: &'a PrintOptions,
}

impl Printer<'_> {
    fn value<W: Write + ?Sized>(&self, out: &mut W, value: &Value, depth: usize) -> fmt::Result {
        let meta = value.attached_meta().filter(|m| !m.is_empty());
        if let Some(meta) = meta.filter(|_| self.opts.print_meta) {
            out.write_char('^')?;
            self.map(out, meta, depth)?;
            out.write_char(' ')?;
        }
        match value {
            Value::Nil => out.write_str("nil"),
            Value::Bool(b) => write!(out, "{b}"),
            Value::Int(n) => write!(out, "{n}"),
            Value::Str(s) if self.opts.print_readably => write!(out, "\"{}\"", escape_string(s)),
            Value::Str(s) => out.write_str(s),
            Value::Keyword(k) => write!(out, "{k}"),
            Value::Symbol(s) => write!(out, "{s}"),
            Value::List(l) => self.items(out, l.iter(), "(", ")", depth),
            Value::Seq(s) => self.items(out, s.iter(), "(", ")", depth),
            Value::Vector(v) => self.items(out, v.iter(), "[", "]", depth),
            Value::Set(s) => self.items(out, s.iter(), "#{", "}", depth),
            Value::Map(m) => self.map(out, m, depth),
        }
    }

    fn too_deep(&self, depth: usize) -> bool {
        self.opts.print_level.is_some_and(|level| depth >= level)
    }

    fn items<'v, W, I>(
        &self,
        out: &mut W,
        items: I,
        open: &str,
        close: &str,
        depth: usize,
    ) -> fmt::Result
    where
        W: Write + ?Sized,
        I: Iterator<Item = &'v Value>,
    {
        if self.too_deep(depth) {
            return out.write_char('#');
        }
        out.write_str(open)?;
        let limit = self.opts.print_length.unwrap_or(usize::MAX);
        for (i, item) in items.enumerate() {
            if i > 0 {
                out.write_char(' ')?;
            }
            if i >= limit {
                out.write_str("...")?;
                break;
            }
            self.value(out, item, depth + 1)?;
        }
        out.write_str(close)
    }

    fn map<W: Write + ?Sized>(&self, out: &mut W, map: &MetaMap, depth: usize) -> fmt::Result {
        if self.too_deep(depth) {
            return out.write_char('#');
        }
        out.write_char('{')?;
        let limit = self.opts.print_length.unwrap_or(usize::MAX);
        for (i, (k, v)) in map.iter().enumerate() {
            if i > 0 {
                out.write_str(", ")?;
            }
            if i >= limit {
                out.write_str("...")?;
                break;
            }
            self.value(out, k, depth + 1)?;
            out.write_char(' ')?;
            self.value(out, v, depth + 1)?;
        }
        out.write_char('}')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{keyword, map, vector};

    #[test]
    fn test_scalars() {
        let opts = PrintOptions::default();
        assert_eq!(lrepr(&Value::Nil, &opts), "nil");
        assert_eq!(lrepr(&Value::Bool(true), &opts), "true");
        assert_eq!(lrepr(&Value::Int(-4), &opts), "-4");
        assert_eq!(lrepr(&Value::from(keyword("k")), &opts), ":k");
    }

    #[test]
    fn test_strings_readably() {
        let s = Value::str("a\"b\n");
        assert_eq!(lrepr(&s, &PrintOptions::default()), "\"a\\\"b\\n\"");
        let plain = PrintOptions {
            print_readably: false,
            ..PrintOptions::default()
        };
        assert_eq!(lrepr(&s, &plain), "a\"b\n");
    }

    #[test]
    fn test_print_length_truncates() {
        let v = Value::Vector(vector((1..=5).map(Value::Int)));
        let opts = PrintOptions {
            print_length: Some(2),
            ..PrintOptions::default()
        };
        assert_eq!(lrepr(&v, &opts), "[1 2 ...]");
        assert_eq!(lrepr(&v, &PrintOptions::default()), "[1 2 3 4 5]");
    }

    #[test]
    fn test_print_level_elides_nesting() {
        let inner = Value::Vector(vector([Value::Int(1)]));
        let outer = Value::Vector(vector([inner, Value::Int(2)]));
        let opts = PrintOptions {
            print_level: Some(1),
            ..PrintOptions::default()
        };
        assert_eq!(lrepr(&outer, &opts), "[# 2]");
    }

    #[test]
    fn test_print_meta() {
        use crate::contracts::Meta;
        let meta = map([(Value::from(keyword("tag")), Value::Int(1))]);
        let v = Value::Vector(vector([Value::Int(1)]).with_meta(meta));
        let opts = PrintOptions {
            print_meta: true,
            ..PrintOptions::default()
        };
        assert_eq!(lrepr(&v, &opts), "^{:tag 1} [1]");
        assert_eq!(v.to_string(), "[1]");
    }
}
