//! Command templates.
//!
//! A template is a whitespace separated list of tokens. Tokens that are
//! exactly one of the placeholders below are substituted on expansion; every
//! other token is passed through unchanged. Expansion produces an argv
//! vector of OS strings, so paths that are not valid UTF-8 survive intact. No
//! shell is involved.
//!
//! | Placeholder      | Expands to                                        |
//! |------------------|---------------------------------------------------|
//! | `{apio-bin}`     | path of the provisioned apio binary               |
//! | `{env-flag}`     | `-e <env>`, or nothing for no env or `(default)`  |
//! | `{context-path}` | the selected file, or nothing when there is none  |

use std::ffi::OsString;
use std::path::PathBuf;

use super::ENV_DEFAULT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    ApioBin,
    EnvFlag,
    ContextPath,
}

impl Placeholder {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "{apio-bin}" => Some(Self::ApioBin),
            "{env-flag}" => Some(Self::EnvFlag),
            "{context-path}" => Some(Self::ContextPath),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Placeholder(Placeholder),
}

/// Values substituted for placeholders.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub apio_bin: PathBuf,
    /// Selected env; `None` and `(default)` both mean the project default.
    pub env: Option<String>,
    /// File the command acts on, relative to the project directory when
    /// possible.
    pub context_path: Option<PathBuf>,
}

impl TemplateContext {
    fn env_flag(&self) -> Option<&str> {
        self.env
            .as_deref()
            .map(str::trim)
            .filter(|env| !env.is_empty() && *env != ENV_DEFAULT)
    }
}

/// A parsed command template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTemplate {
    tokens: Vec<Token>,
}

impl CommandTemplate {
    /// Parses a template such as `{apio-bin} build {env-flag}`.
    #[must_use]
    pub fn parse(template: &str) -> Self {
        let tokens = template
            .split_whitespace()
            .map(|token| {
                Placeholder::parse(token)
                    .map_or_else(|| Token::Literal(token.to_string()), Token::Placeholder)
            })
            .collect();
        Self { tokens }
    }

    /// Appends arguments verbatim; they are never treated as placeholders.
    #[must_use]
    pub fn with_literal_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens
            .extend(args.into_iter().map(|arg| Token::Literal(arg.into())));
        self
    }

    /// Appends more template tokens.
    #[must_use]
    pub fn then(mut self, template: &str) -> Self {
        self.tokens.extend(Self::parse(template).tokens);
        self
    }

    /// Expands the template into an argv vector.
    #[must_use]
    pub fn expand(&self, ctx: &TemplateContext) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.tokens.len() + 1);
        for token in &self.tokens {
            match token {
                Token::Literal(text) => argv.push(OsString::from(text)),
                Token::Placeholder(Placeholder::ApioBin) => {
                    argv.push(ctx.apio_bin.clone().into_os_string());
                }
                Token::Placeholder(Placeholder::EnvFlag) => {
                    if let Some(env) = ctx.env_flag() {
                        argv.push(OsString::from("-e"));
                        argv.push(OsString::from(env));
                    }
                }
                Token::Placeholder(Placeholder::ContextPath) => {
                    if let Some(path) = &ctx.context_path {
                        argv.push(path.clone().into_os_string());
                    }
                }
            }
        }
        argv
    }
}
