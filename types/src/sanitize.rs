//! Sanitization for oracle-supplied display text.
//!
//! Names, glyphs and descriptions returned by the oracle end up in the catalog
//! and are printed by whatever renders the surface. Terminal escape sequences
//! can rewrite the screen or smuggle hyperlinks, so they never enter the
//! catalog.

use std::borrow::Cow;

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Strip escape sequences and control characters, folding line breaks and tabs
/// into single spaces.
///
/// Token labels are single-line, so `\n`, `\r` and `\t` become spaces rather
/// than being preserved. Returns `Cow::Borrowed` when the input is clean.
///
/// ```
/// use aether_types::sanitize_display_text;
///
/// assert_eq!(sanitize_display_text("Mud Pie"), "Mud Pie");
/// assert_eq!(sanitize_display_text("Mud\x1b[2J Pie"), "Mud Pie");
/// assert_eq!(sanitize_display_text("Mud\nPie"), "Mud Pie");
/// ```
#[must_use]
pub fn sanitize_display_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_unwanted) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ESC => skip_escape(&mut chars),
            '\n' | '\r' | '\t' => {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            // C1 CSI behaves like ESC [ on some terminals.
            '\u{9b}' => skip_csi(&mut chars),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    Cow::Owned(out)
}

fn is_unwanted(c: char) -> bool {
    c.is_control()
}

fn skip_escape<I>(chars: &mut std::iter::Peekable<I>)
where
    I: Iterator<Item = char>,
{
    match chars.peek() {
        Some('[') => {
            chars.next();
            skip_csi(chars);
        }
        Some(']' | 'P' | '_' | '^') => {
            chars.next();
            skip_string_sequence(chars);
        }
        Some(_) => {
            // Two-character sequence such as ESC c.
            chars.next();
        }
        None => {}
    }
}

/// CSI: parameter/intermediate bytes up to a final byte in `@`..=`~`.
fn skip_csi<I>(chars: &mut std::iter::Peekable<I>)
where
    I: Iterator<Item = char>,
{
    for c in chars.by_ref() {
        if ('@'..='~').contains(&c) {
            break;
        }
    }
}

/// OSC/DCS/APC/PM: runs until BEL or ST (`ESC \`).
fn skip_string_sequence<I>(chars: &mut std::iter::Peekable<I>)
where
    I: Iterator<Item = char>,
{
    while let Some(c) = chars.next() {
        if c == BEL {
            break;
        }
        if c == ESC {
            if chars.peek() == Some(&'\\') {
                chars.next();
            }
            break;
        }
    }
}
