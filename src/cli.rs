//! Minimal CLI: load Go sources → emit one schema document.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

/// generate a JSON Schema document describing the wire shape of the exported
/// types declared in Go source files
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(required = true)]
    input: Vec<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// pretty-print the document
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let schema = crate::generate::from_args(&self.input)?;

        let schema_src = if self.pretty {
            serde_json::to_string_pretty(&schema)?
        } else {
            serde_json::to_string(&schema)?
        };

        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("create {}", parent.display()))?;
                    }
                }
                std::fs::write(out, &schema_src)
                    .with_context(|| format!("write {}", out.display()))?;
            }
            None => println!("{schema_src}"),
        }
        Ok(())
    }
}
