//! # Compiler
//!
//! Turns the text of a module descriptor into an ordered statement tree
//! (`Vec<Statement>`) before anything is evaluated, so a syntax error anywhere
//! in a file aborts the module before its first side effect.
//!
//! Each line is one statement, split into words with POSIX shell rules
//! (`shlex`): quotes group words, adjacent pieces concatenate, and `$VAR`
//! references are kept verbatim for the evaluator to expand. Blocks are
//! `if <cond>` / `elif <cond>` / `else` / `end`.

use crate::{
    constants::{ENVMASTER_SENTINEL, VERSION_BINDING},
    models::{Condition, Mode, PathKind, Statement, VersionMatch},
};
use thiserror::Error;

/// Errors that can occur while compiling a descriptor or version-pin file.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompilerError {
    /// The first bytes are not the sentinel.
    #[error("not a module file (missing '{}' sentinel)", ENVMASTER_SENTINEL)]
    MissingSentinel,
    /// A line could not be understood.
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

fn syntax(line: usize, message: impl Into<String>) -> CompilerError {
    CompilerError::Syntax {
        line,
        message: message.into(),
    }
}

type Lines = std::vec::IntoIter<(usize, Vec<String>)>;

/// How a block ended.
enum BlockEnd {
    Eof,
    Elif(usize, Condition),
    Else(usize),
    End,
}

// --- PUBLIC COMPILER API ---

/// Compiles a module descriptor.
pub fn compile_descriptor(source: &str) -> Result<Vec<Statement>, CompilerError> {
    let mut lines = tokenize_lines(source)?.into_iter();
    let (statements, end) = parse_block(&mut lines, false)?;
    match end {
        BlockEnd::Eof => Ok(statements),
        // `parse_block` rejects block keywords outside of an `if` itself.
        BlockEnd::Elif(line, _) | BlockEnd::Else(line) => {
            Err(syntax(line, "'elif'/'else' without a matching 'if'"))
        }
        BlockEnd::End => Err(syntax(0, "'end' without a matching 'if'")),
    }
}

/// Compiles a version-pin file and returns the version it binds, if any.
///
/// Accepted bindings: `version 5.0`, `version = 5.0` and `version=5.0`.
/// When several are present the last one wins.
pub fn compile_version_file(source: &str) -> Result<Option<String>, CompilerError> {
    let mut version = None;
    for (line, words) in tokenize_lines(source)? {
        let binding = match words.as_slice() {
            [key, value] if key == VERSION_BINDING => value.clone(),
            [key, eq, value] if key == VERSION_BINDING && eq == "=" => value.clone(),
            [single] => match single.split_once('=') {
                Some((key, value)) if key.trim() == VERSION_BINDING => value.trim().to_string(),
                _ => return Err(syntax(line, format!("unexpected '{}'", single))),
            },
            _ => {
                return Err(syntax(
                    line,
                    format!("expected '{} <value>'", VERSION_BINDING),
                ));
            }
        };
        version = Some(binding);
    }
    Ok(version)
}

// --- HELPER IMPLEMENTATIONS ---

/// Splits the source into words per line, skipping the sentinel line, blank
/// lines and comments. Line numbers are 1-based.
fn tokenize_lines(source: &str) -> Result<Vec<(usize, Vec<String>)>, CompilerError> {
    if !source.starts_with(ENVMASTER_SENTINEL) {
        return Err(CompilerError::MissingSentinel);
    }

    let mut result = Vec::new();
    for (idx, raw) in source.lines().enumerate().skip(1) {
        let line_no = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let words = shlex::split(trimmed).ok_or_else(|| syntax(line_no, "unterminated quote"))?;
        if !words.is_empty() {
            result.push((line_no, words));
        }
    }
    Ok(result)
}

fn parse_block(lines: &mut Lines, nested: bool) -> Result<(Vec<Statement>, BlockEnd), CompilerError> {
    let mut statements = Vec::new();

    while let Some((line, words)) = lines.next() {
        let Some((head, args)) = words.split_first() else {
            continue;
        };
        let keyword = head.to_ascii_lowercase();
        match keyword.as_str() {
            "if" => statements.push(parse_if(lines, line, args)?),
            "elif" | "else" | "end" | "endif" if !nested => {
                return Err(syntax(line, format!("'{}' without a matching 'if'", head)));
            }
            "elif" => return Ok((statements, BlockEnd::Elif(line, parse_condition(line, args)?))),
            "else" => {
                if !args.is_empty() {
                    return Err(syntax(line, "'else' takes no arguments"));
                }
                return Ok((statements, BlockEnd::Else(line)));
            }
            "end" | "endif" => return Ok((statements, BlockEnd::End)),
            _ => statements.push(parse_statement(line, &keyword, args)?),
        }
    }

    Ok((statements, BlockEnd::Eof))
}

fn parse_if(lines: &mut Lines, if_line: usize, args: &[String]) -> Result<Statement, CompilerError> {
    let mut branches = Vec::new();
    let mut otherwise = Vec::new();
    let mut condition = parse_condition(if_line, args)?;

    loop {
        let (body, end) = parse_block(lines, true)?;
        branches.push((condition, body));
        match end {
            BlockEnd::Elif(_, next) => condition = next,
            BlockEnd::Else(else_line) => {
                let (body, end) = parse_block(lines, true)?;
                match end {
                    BlockEnd::End => {
                        otherwise = body;
                        break;
                    }
                    BlockEnd::Eof => {
                        return Err(syntax(if_line, "'if' block is never closed with 'end'"));
                    }
                    BlockEnd::Elif(..) | BlockEnd::Else(_) => {
                        return Err(syntax(
                            else_line,
                            "'else' must be the last branch of an 'if' block",
                        ));
                    }
                }
            }
            BlockEnd::End => break,
            BlockEnd::Eof => return Err(syntax(if_line, "'if' block is never closed with 'end'")),
        }
    }

    Ok(Statement::If {
        branches,
        otherwise,
    })
}

fn parse_condition(line: usize, args: &[String]) -> Result<Condition, CompilerError> {
    let Some((head, rest)) = args.split_first() else {
        return Err(syntax(line, "missing condition"));
    };
    match (head.to_ascii_lowercase().as_str(), rest) {
        ("not" | "!", _) => Ok(Condition::Not(Box::new(parse_condition(line, rest)?))),
        ("defined", [var]) => Ok(Condition::Defined(var.clone())),
        ("equal", [a, b]) => Ok(Condition::Equal(a.clone(), b.clone())),
        ("loaded", [module]) => Ok(Condition::Loaded(module.clone())),
        ("mode", [mode]) => mode
            .parse::<Mode>()
            .map(Condition::Mode)
            .map_err(|e| syntax(line, e)),
        ("defined" | "loaded" | "mode", _) => {
            Err(syntax(line, format!("'{}' takes exactly one argument", head)))
        }
        ("equal", _) => Err(syntax(line, "'equal' takes exactly two arguments")),
        (other, _) => Err(syntax(line, format!("unknown condition '{}'", other))),
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_valid_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `[A-Za-z0-9_]+`, appended to the package prefix.
fn is_valid_var_suffix(suffix: &str) -> bool {
    !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_statement(line: usize, keyword: &str, args: &[String]) -> Result<Statement, CompilerError> {
    let arity = |expected: &str| syntax(line, format!("'{}' expects {}", keyword, expected));
    let invalid_name = |name: &str| syntax(line, format!("'{}' is not a valid variable name", name));
    let at_least_one = |args: &[String]| -> Result<Vec<String>, CompilerError> {
        if args.is_empty() {
            Err(syntax(line, format!("'{}' expects at least one module", keyword)))
        } else {
            Ok(args.to_vec())
        }
    };

    let typed = |kind: PathKind| match args {
        [path] => Ok(Statement::SetTyped {
            kind,
            path: path.clone(),
        }),
        _ => Err(arity("a single directory")),
    };

    match keyword {
        "setvar" => match args {
            [_, name] if !is_valid_var_name(name) => Err(invalid_name(name.as_str())),
            [value, name] => Ok(Statement::SetVar {
                value: value.clone(),
                name: name.clone(),
            }),
            _ => Err(arity("<value> <name>")),
        },
        "setpkgvar" => match args {
            [_, suffix] if !is_valid_var_suffix(suffix) => Err(syntax(
                line,
                format!("'{}' is not a valid variable suffix", suffix),
            )),
            [value, suffix] => Ok(Statement::SetPkgVar {
                value: value.clone(),
                suffix: suffix.clone(),
            }),
            _ => Err(arity("<value> <suffix>")),
        },
        "setpath" => match args {
            [_, name] if !is_valid_var_name(name) => Err(invalid_name(name.as_str())),
            [value, name] => Ok(Statement::SetPath {
                value: value.clone(),
                name: name.clone(),
            }),
            _ => Err(arity("<value> <name>")),
        },
        "setall" => match args {
            [root] => Ok(Statement::SetAll(root.clone())),
            _ => Err(arity("a single root directory")),
        },
        "setbin" => typed(PathKind::Bin),
        "setlib" => typed(PathKind::Lib),
        "setman" => typed(PathKind::Man),
        "setinclude" => typed(PathKind::Include),
        "setpython" => typed(PathKind::Python),
        "prereq" => at_least_one(args).map(Statement::Prereq),
        "conflict" => at_least_one(args).map(Statement::Conflict),
        "load" => at_least_one(args).map(Statement::Load),
        "swap" => match args {
            [old, new] => Ok(Statement::Swap {
                old: old.clone(),
                new: new.clone(),
            }),
            _ => Err(arity("<old> <new>")),
        },
        "whatis" => {
            if args.is_empty() {
                Err(arity("a description"))
            } else {
                Ok(Statement::WhatIs(args.join(" ")))
            }
        }
        "setversionmatch" => match args {
            [policy] => policy
                .parse::<VersionMatch>()
                .map(Statement::SetVersionMatch)
                .map_err(|e| syntax(line, e)),
            _ => Err(arity("one of equal, atleast, atmost")),
        },
        other => Err(syntax(line, format!("unknown statement '{}'", other))),
    }
}
