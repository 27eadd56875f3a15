use std::path::Path;

use anyhow::Context;
use jsdeob::codegen::{generate, GeneratorConfig};

use crate::{app::LayoutOptions, commands::common::load_program};

/// Build the printer layout from the command-line flags.
pub fn layout(opts: &LayoutOptions) -> GeneratorConfig {
    let config = if opts.tabs {
        GeneratorConfig::default().with_tabs()
    } else {
        GeneratorConfig::default().with_indent_width(opts.indent)
    };
    GeneratorConfig {
        ascii_only: opts.ascii,
        ..config
    }
}

pub fn run(path: &Path, output: Option<&Path>, config: &GeneratorConfig) -> anyhow::Result<()> {
    let program = load_program(path)?;
    let source = generate(&program, config)
        .with_context(|| format!("failed to print program: {}", path.display()))?;

    match output {
        Some(out) => std::fs::write(out, source)
            .with_context(|| format!("failed to write output: {}", out.display())),
        None => {
            print!("{source}");
            Ok(())
        }
    }
}
