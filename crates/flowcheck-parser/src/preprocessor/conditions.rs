//! Conditional compilation
//!
//! A configuration is a label for the one assumption under which a file is
//! analyzed: `NAME` (NAME is defined), `!NAME` (NAME is not defined) or the
//! empty label (nothing is defined). Callers may join labels with `;` to
//! assume several symbols at once.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::split_directive;

static DEFINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(!?)[ \t]*defined[ \t]*(?:\([ \t]*(\w+)[ \t]*\)|[ \t]+(\w+))$")
        .expect("defined pattern is valid")
});

/// Configurations found in `#ifdef` / `#ifndef` lines, first seen first.
///
/// `#ifdef N` gives `N`, `#ifndef N` gives `!N`. Symbols are never combined
/// into joint configurations.
pub fn get_cfgs(code: &str) -> Vec<String> {
    let mut cfgs = Vec::new();
    let mut seen = HashSet::new();

    for line in code.lines() {
        let cfg = match split_directive(line) {
            Some(("ifdef", _)) => get_def(line, true),
            Some(("ifndef", _)) => match get_def(line, false) {
                name if name.is_empty() => name,
                name => format!("!{name}"),
            },
            _ => continue,
        };
        if !cfg.is_empty() && seen.insert(cfg.clone()) {
            cfgs.push(cfg);
        }
    }
    cfgs
}

/// Symbol of an `#ifdef` line (`def = true`) or `#ifndef` line
/// (`def = false`). Empty when the line has another form.
pub fn get_def(line: &str, def: bool) -> String {
    let keyword = if def { "ifdef" } else { "ifndef" };
    match split_directive(line) {
        Some((kw, rest)) if kw == keyword => {
            rest.split_whitespace().next().unwrap_or_default().to_string()
        }
        _ => String::new(),
    }
}

/// Whether the branch guarded by `def` is taken under `cfg`.
///
/// `def` is `NAME` for `#ifdef NAME` and `!NAME` for `#ifndef NAME`.
pub fn match_cfg_def(cfg: &str, def: &str) -> bool {
    let (negated, symbol) = match def.strip_prefix('!') {
        Some(symbol) => (true, symbol),
        None => (false, def),
    };
    let defined = !symbol.is_empty() && cfg.split(';').any(|assumption| assumption == symbol);
    defined != negated
}

/// One open `#if` group
struct Frame {
    parent_active: bool,
    /// Some branch of the group has been taken
    taken: bool,
    active: bool,
}

fn is_active(stack: &[Frame]) -> bool {
    stack.last().map_or(true, |f| f.active)
}

fn open(stack: &mut Vec<Frame>, condition: bool) {
    let parent_active = is_active(stack);
    stack.push(Frame {
        parent_active,
        taken: condition,
        active: parent_active && condition,
    });
}

/// Value of an `#if` / `#elif` expression under `cfg`.
///
/// `defined(X)`, `defined X` and their negations are decided like
/// `#ifdef` / `#ifndef`. `0` and `false` are false; any other expression is
/// assumed true.
fn eval_if(expr: &str, cfg: &str) -> bool {
    let expr = expr.trim();
    if let Some(caps) = DEFINED.captures(expr) {
        let name = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        return match_cfg_def(cfg, &format!("{}{name}", &caps[1]));
    }
    !matches!(expr, "0" | "false")
}

/// Source text for one configuration.
///
/// Conditional directive lines and lines of branches not taken under `cfg`
/// become empty lines; every other line is copied. An unterminated group
/// extends to the end of the file, stray `#else` / `#endif` lines are dropped.
pub fn get_code(code: &str, cfg: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut stack: Vec<Frame> = Vec::new();

    for line in code.lines() {
        let keep = match split_directive(line) {
            Some(("ifdef", _)) => {
                open(&mut stack, match_cfg_def(cfg, &get_def(line, true)));
                false
            }
            Some(("ifndef", _)) => {
                let def = format!("!{}", get_def(line, false));
                open(&mut stack, match_cfg_def(cfg, &def));
                false
            }
            Some(("if", expr)) => {
                open(&mut stack, eval_if(expr, cfg));
                false
            }
            Some(("elif", expr)) => {
                if let Some(frame) = stack.last_mut() {
                    let condition = !frame.taken && eval_if(expr, cfg);
                    frame.active = frame.parent_active && condition;
                    frame.taken |= condition;
                }
                false
            }
            Some(("else", _)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.active = frame.parent_active && !frame.taken;
                    frame.taken = true;
                }
                false
            }
            Some(("endif", _)) => {
                stack.pop();
                false
            }
            _ => is_active(&stack),
        };

        if keep {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
