use clap::{ArgAction, Parser};

use crate::template::Mode;

#[derive(Debug, Parser)]
#[clap(version, about)]
pub struct Cli {
    #[clap(value_parser, help = "The schema file or URL")]
    pub input: String,

    #[clap(long, help = "Local name of the global element to compile [default: the first one]")]
    pub root: Option<String>,

    #[clap(
        long,
        value_enum,
        default_value = "edit",
        help = "Render an edit form or a read-only view"
    )]
    pub mode: Mode,

    #[clap(long, help = "Bind the template to this instance document and print the form")]
    pub instance: Option<String>,

    #[clap(long, help = "Allow a XML Document Type Definition (DTD) to occur")]
    pub allow_dtd: bool,

    #[clap(long, help = "Address instance nodes by local name only")]
    pub no_namespaces: bool,

    #[clap(
        long,
        default_value = "ns",
        help = "Instance prefix for a target namespace bound only as the default namespace"
    )]
    pub default_prefix: String,

    #[clap(
        short,
        long,
        action = ArgAction::Count,
        help = "Log more (-v debug, -vv trace); RUST_LOG takes precedence"
    )]
    pub verbose: u8,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from([
            "xsd-form-compiler",
            "record.xsd",
            "--root",
            "record",
            "--mode",
            "display",
            "-vv",
        ]);
        assert_eq!(cli.input, "record.xsd");
        assert_eq!(cli.root.as_deref(), Some("record"));
        assert_eq!(cli.mode, Mode::Display);
        assert_eq!(cli.default_prefix, "ns");
        assert_eq!(cli.log_level(), "trace");
        assert!(!cli.no_namespaces);
    }
}
