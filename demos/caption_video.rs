//! Captions a video end to end.
//!
//! ```text
//! GEMINI_API_KEY=... cargo run --example caption_video -- <file-or-url> [context] [refine instruction]
//! ```

use std::process::ExitCode;

use clip_caption::prelude::*;
use display_error_chain::DisplayErrorChain;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

async fn load(input: &str, session: &mut Session) -> Result<(), MediaError> {
    let video = match Url::parse(input) {
        Ok(url) if url.scheme().starts_with("http") => {
            session.set_mode(InputMode::Url);
            fetch_video(&reqwest::Client::new(), &url).await?
        }
        _ => {
            session.set_mode(InputMode::Upload);
            encode_video_file(input).await?
        }
    };
    info!(mime.type = %video.mime_type(), bytes = video.encoded_len(), "video loaded");
    session.select_video(video);
    Ok(())
}

fn print_content(content: &GeneratedContent) {
    println!("Title:    {}", content.title);
    println!("Caption:  {}", content.caption);
    println!("Hashtags: {}", content.hashtag_line());
}

async fn do_main(args: &[String]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let Some(input) = args.first() else {
        eprintln!("usage: caption_video <file-or-url> [context] [refine instruction]");
        return Ok(ExitCode::FAILURE);
    };
    let context = args.get(1).map(String::as_str);
    let instruction = args.get(2);

    let studio = Studio::from_env()?;
    let mut session = Session::new();

    if let Err(err) = load(input, &mut session).await {
        eprintln!("{}", DisplayErrorChain::new(&err));
        eprintln!("{}", ErrorReport::for_kind(err.kind()));
        return Ok(ExitCode::FAILURE);
    }

    let pending = session.begin_generate()?;
    let result = studio.generate(&pending.video, context).await;
    if let Err(err) = &result {
        eprintln!("{}", DisplayErrorChain::new(err));
    }
    session.complete(pending.ticket, result);

    if let Some(instruction) = instruction {
        if session.content().is_some() {
            let pending = session.begin_refine()?;
            let result = studio
                .refine(&pending.video, &pending.prior, instruction)
                .await;
            if let Err(err) = &result {
                eprintln!("{}", DisplayErrorChain::new(err));
            }
            session.complete(pending.ticket, result);
        }
    }

    if let Some(report) = session.error() {
        eprintln!("{report}");
    }
    match session.content() {
        Some(content) => {
            print_content(content);
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::FAILURE),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match do_main(&args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", DisplayErrorChain::new(err.as_ref()));
            ExitCode::FAILURE
        }
    }
}
