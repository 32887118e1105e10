//! pandoc's `-f` / `-t` format tokens.
//!
//! The two enums list the readers and writers pandoc understands. They are a
//! convenience only: every conversion entry point takes `impl AsRef<str>`, so
//! a token missing here (a newer writer, or `markdown+smart` style extension
//! syntax) can be passed as a plain string and pandoc decides whether it is
//! valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! format_tokens {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $token:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// Every token, in pandoc's documentation order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// The token passed on the command line.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownFormat;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($name::$variant),)+
                    other => Err(UnknownFormat(other.to_string())),
                }
            }
        }
    };
}

/// A token that is not in [`InputFormat::ALL`] / [`OutputFormat::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pandoc format '{0}'")]
pub struct UnknownFormat(pub String);

format_tokens! {
    /// Formats pandoc can read (`-f`).
    InputFormat {
        Commonmark => "commonmark",
        Creole => "creole",
        Docbook => "docbook",
        Docx => "docx",
        Dokuwiki => "dokuwiki",
        Epub => "epub",
        Fb2 => "fb2",
        Gfm => "gfm",
        MarkdownGithub => "markdown_github",
        Haddock => "haddock",
        Html => "html",
        Ipynb => "ipynb",
        Jats => "jats",
        Json => "json",
        Latex => "latex",
        Markdown => "markdown",
        MarkdownMmd => "markdown_mmd",
        MarkdownPhpextra => "markdown_phpextra",
        MarkdownStrict => "markdown_strict",
        Mediawiki => "mediawiki",
        Man => "man",
        Muse => "muse",
        Native => "native",
        Odt => "odt",
        Opml => "opml",
        Org => "org",
        Rst => "rst",
        T2t => "t2t",
        Textile => "textile",
        Tikiwiki => "tikiwiki",
        Twiki => "twiki",
        Vimwiki => "vimwiki",
    }
}

format_tokens! {
    /// Formats pandoc can write (`-t`).
    OutputFormat {
        Asciidoc => "asciidoc",
        Asciidoctor => "asciidoctor",
        Beamer => "beamer",
        Commonmark => "commonmark",
        Context => "context",
        Docbook => "docbook",
        Docbook4 => "docbook4",
        Docbook5 => "docbook5",
        Docx => "docx",
        Dokuwiki => "dokuwiki",
        Dzslides => "dzslides",
        Epub => "epub",
        Epub2 => "epub2",
        Epub3 => "epub3",
        Fb2 => "fb2",
        Gfm => "gfm",
        Haddock => "haddock",
        Html => "html",
        Html4 => "html4",
        Html5 => "html5",
        Icml => "icml",
        Ipynb => "ipynb",
        Jats => "jats",
        Jira => "jira",
        Json => "json",
        Latex => "latex",
        Man => "man",
        Markdown => "markdown",
        MarkdownGithub => "markdown_github",
        MarkdownMmd => "markdown_mmd",
        MarkdownPhpextra => "markdown_phpextra",
        MarkdownStrict => "markdown_strict",
        Mediawiki => "mediawiki",
        Ms => "ms",
        Muse => "muse",
        Native => "native",
        Odt => "odt",
        Opendocument => "opendocument",
        Opml => "opml",
        Org => "org",
        Plain => "plain",
        Pptx => "pptx",
        Revealjs => "revealjs",
        Rst => "rst",
        Rtf => "rtf",
        S5 => "s5",
        Slideous => "slideous",
        Slidy => "slidy",
        Tei => "tei",
        Texinfo => "texinfo",
        Textile => "textile",
        Xwiki => "xwiki",
        Zimwiki => "zimwiki",
    }
}

impl OutputFormat {
    /// Writers that produce binary containers and therefore need `-o`;
    /// pandoc refuses to write them to a terminal or pipe.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            OutputFormat::Docx
                | OutputFormat::Epub
                | OutputFormat::Epub2
                | OutputFormat::Epub3
                | OutputFormat::Odt
                | OutputFormat::Pptx
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_from_str() {
        for f in InputFormat::ALL {
            assert_eq!(f.as_str().parse::<InputFormat>().unwrap(), *f);
        }
        for f in OutputFormat::ALL {
            assert_eq!(f.as_str().parse::<OutputFormat>().unwrap(), *f);
        }
    }

    #[test]
    fn unknown_token_is_an_error() {
        let err = "markdown+smart".parse::<InputFormat>().unwrap_err();
        assert_eq!(err, UnknownFormat("markdown+smart".into()));
        assert_eq!(err.to_string(), "unknown pandoc format 'markdown+smart'");
    }

    #[test]
    fn serde_uses_pandoc_tokens() {
        let json = serde_json::to_string(&OutputFormat::MarkdownGithub).unwrap();
        assert_eq!(json, "\"markdown_github\"");
        let back: InputFormat = serde_json::from_str("\"markdown_phpextra\"").unwrap();
        assert_eq!(back, InputFormat::MarkdownPhpextra);
    }

    #[test]
    fn display_matches_token() {
        assert_eq!(InputFormat::Markdown.to_string(), "markdown");
        assert_eq!(OutputFormat::Html5.to_string(), "html5");
        assert_eq!(OutputFormat::Html.as_ref(), "html");
    }

    #[test]
    fn enumerations_have_expected_sizes() {
        assert_eq!(InputFormat::ALL.len(), 32);
        assert_eq!(OutputFormat::ALL.len(), 53);
    }

    #[test]
    fn binary_writers() {
        assert!(OutputFormat::Docx.is_binary());
        assert!(!OutputFormat::Html.is_binary());
    }
}
