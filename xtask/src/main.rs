//! Build automation tasks for orgpush
//!
//! Run with `cargo xtask <task>`.

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for orgpush", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference page from the clap definitions
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<orgpush_cli::Cli>();

    let content = format!(
        r#"# orgpush CLI Reference

Generated from the CLI source code on {}.

## Quick Start

```bash
export ORG_INSTANCE_URL=https://example.my.salesforce.com
export ORG_ACCESS_TOKEN=...

# Build the deploy archive locally
orgpush package --file RemoteSite.xml --output metadata.zip

# Deploy one metadata document and wait for the outcome
orgpush deploy --file RemoteSite.xml

# Insert records through a bulk ingest job
orgpush ingest --file accounts.csv --object Account

# Check a job without waiting
orgpush status deploy 0Afxx0000001
```

## Environment Variables

- `ORG_INSTANCE_URL` - Org base URL
- `ORG_ACCESS_TOKEN` - Bearer token for the org
- `ORG_API_VERSION` - REST API version (default: `61.0`)
- `ORGPUSH_POLL_INTERVAL_SECS` - Seconds between status checks (default: `3`)
- `ORGPUSH_POLL_MAX_WAIT_SECS` - Give up waiting after this many seconds (default: `300`)
- `ORGPUSH_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: `30`)
- `ORGPUSH_METADATA_MAP` - YAML file replacing the bundled metadata type table
- `LOG_LEVEL`, `LOG_OUTPUT`, `LOG_FORMAT`, `LOG_DIR` - Logging overrides

Values may also be placed in a `.env` file in the working directory.

{}

---

*To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
