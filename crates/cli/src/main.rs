use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rapidl_blob::Blob;
use rapidl_client::{
    backend_url_from_env_value, fetch_attempts_from_env_value, BackoffPolicy, ContentClient,
};
use rapidl_core::{
    config::{indent_step_from_env_value, utc_offset_from_env_value},
    question_label, render_outline, to_roman, ContentError, ContentService, CoreConfig, ViewState,
    LOAD_FAILURE_MESSAGE, PROCESSING_MESSAGE, ROMAN_MAX,
};
use rapidl_types::JobId;

#[derive(Parser)]
#[command(name = "rapidl")]
#[command(about = "Rapidl generated-content CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the label for a question position
    Label {
        /// Nesting depth, 0 for top-level questions
        #[arg(allow_negative_numbers = true)]
        depth: i64,
        /// Index among siblings, 0-based
        #[arg(
            allow_negative_numbers = true,
            value_parser = clap::value_parser!(i64).range(..ROMAN_MAX as i64),
        )]
        level: i64,
    },
    /// Print a number as lowercase roman numerals
    Roman {
        #[arg(value_parser = clap::value_parser!(u64).range(0..=ROMAN_MAX))]
        number: u64,
    },
    /// Render a backend payload saved as JSON
    View {
        /// Path to the payload JSON
        payload: PathBuf,
        /// Job id, used as the name when the job has no display name
        #[arg(long)]
        job_id: String,
        /// Print the rendered tree as JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
    /// Fetch a job from the backend and render it
    Fetch {
        job_id: String,
        /// Backend base URL (defaults to RAPIDL_BACKEND_URL)
        #[arg(long)]
        backend: Option<String>,
        /// Print the rendered tree as JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
    /// Decode a base64 blob file and print the question tree as JSON
    DecodeBlob { file: PathBuf },
    /// Encode a JSON question tree into base64 transport text
    EncodeBlob { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rapidl_core=warn".parse()?)
                .add_directive("rapidl_client=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Label { depth, level }) => {
            println!("{}", question_label(depth, level)?);
        }
        Some(Commands::Roman { number }) => {
            println!("{}", to_roman(number));
        }
        Some(Commands::View {
            payload,
            job_id,
            json,
        }) => {
            let job_id = parse_job_id(&job_id)?;
            let json_text = read_file(&payload)?;
            let state = content_service()?
                .load_json(&job_id, &json_text)
                .context(LOAD_FAILURE_MESSAGE)?;
            print_state(&state, json)?;
        }
        Some(Commands::Fetch {
            job_id,
            backend,
            json,
        }) => {
            let job_id = parse_job_id(&job_id)?;
            let backend = backend.unwrap_or_else(|| {
                backend_url_from_env_value(std::env::var("RAPIDL_BACKEND_URL").ok())
            });
            let attempts =
                fetch_attempts_from_env_value(std::env::var("RAPIDL_FETCH_ATTEMPTS").ok())?;

            let client = ContentClient::new(
                &backend,
                content_service()?,
                BackoffPolicy::with_attempts(attempts),
            )?;
            let state = client
                .load_document(&job_id)
                .await
                .context(LOAD_FAILURE_MESSAGE)?;
            print_state(&state, json)?;
        }
        Some(Commands::DecodeBlob { file }) => {
            let blob = Blob::decode(&read_file(&file)?).context(LOAD_FAILURE_MESSAGE)?;
            println!("{}", serde_json::to_string_pretty(&blob)?);
        }
        Some(Commands::EncodeBlob { file }) => {
            let blob: Blob = serde_json::from_str(&read_file(&file)?)
                .with_context(|| format!("{} is not a question tree", file.display()))?;
            println!("{}", blob.encode()?);
        }
        None => {
            println!("Use 'rapidl --help' for commands");
        }
    }

    Ok(())
}

fn content_service() -> anyhow::Result<ContentService> {
    let utc_offset = utc_offset_from_env_value(std::env::var("RAPIDL_UTC_OFFSET").ok())?;
    let indent_step = indent_step_from_env_value(std::env::var("RAPIDL_INDENT_STEP_REM").ok())?;
    let cfg = CoreConfig::new(utc_offset, indent_step)?;
    Ok(ContentService::new(Arc::new(cfg)))
}

fn parse_job_id(job_id: &str) -> Result<JobId, ContentError> {
    Ok(JobId::parse(job_id)?)
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_state(state: &ViewState, json: bool) -> anyhow::Result<()> {
    match state {
        _ if json => println!("{}", serde_json::to_string_pretty(state)?),
        ViewState::Processing {
            status,
            description,
        } => println!("{PROCESSING_MESSAGE} ({status:?}): {description}"),
        ViewState::Ready { document } => print!("{}", render_outline(document)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("rapidl").chain(args.iter().copied()))
    }

    #[test]
    fn roman_input_is_capped() {
        assert!(parse(&["roman", "3999"]).is_ok());
        assert!(parse(&["roman", "0"]).is_ok());
        assert!(parse(&["roman", "4000"]).is_err());
        assert!(parse(&["roman", "18446744073709551615"]).is_err());
    }

    #[test]
    fn label_level_is_capped_but_negatives_reach_validation() {
        assert!(parse(&["label", "2", "3998"]).is_ok());
        assert!(parse(&["label", "2", "9223372036854775806"]).is_err());

        let cli = parse(&["label", "-1", "-2"]).expect("negative position parses");
        let Some(Commands::Label { depth, level }) = cli.command else {
            panic!("expected label command");
        };
        assert!(question_label(depth, level).is_err());
    }

    #[test]
    fn invalid_job_id_is_a_content_error() {
        let err = parse_job_id("  ").expect_err("blank id");
        assert!(matches!(err, ContentError::InvalidJobId(_)));
        assert_eq!(parse_job_id("abc 123").expect("opaque id").as_str(), "abc 123");
    }
}
