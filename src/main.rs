use clap::{Arg, Command};
use dialect_live::{Broker, Outcome, Settings, SourceLanguage};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("dialect-live")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate text through the live translation broker")
        .arg(
            Arg::new("text")
                .help("Text to translate")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .short('b')
                .help("Backend id: google, libretranslate or mock"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .short('e')
                .help("Instance URL for backends that accept one"),
        )
        .arg(
            Arg::new("src")
                .long("src")
                .short('s')
                .default_value("auto")
                .help("Source language code, or auto to detect it"),
        )
        .arg(
            Arg::new("dest")
                .long("dest")
                .short('d')
                .help("Destination language code"),
        )
        .arg(
            Arg::new("fallback")
                .long("fallback")
                .short('f')
                .help("Language to translate into when the text is already in the destination language"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .short('c')
                .value_parser(clap::value_parser!(PathBuf))
                .help("JSON settings file"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the mock backend instead of a real service")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("type-ahead")
                .long("type-ahead")
                .short('t')
                .help("Submit every prefix of the text, as if typed, before fetching")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show debug logs")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let default_level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut settings = match matches.get_one::<PathBuf>("settings") {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.apply_env();

    if matches.get_flag("mock") {
        settings.backend = "mock".to_string();
    } else if let Some(backend) = matches.get_one::<String>("backend") {
        settings.backend = backend.clone();
    }
    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        settings.backend_endpoint_url = Some(endpoint.clone());
    }

    let fallback = matches
        .get_one::<String>("fallback")
        .cloned()
        .unwrap_or_else(|| settings.src_lang().to_string());
    let dest = matches
        .get_one::<String>("dest")
        .cloned()
        .unwrap_or_else(|| settings.dest_lang().to_string());
    let settings = settings.with_languages(&fallback, &dest);

    let source = matches
        .get_one::<String>("src")
        .map(|src| SourceLanguage::from(src.as_str()))
        .unwrap_or(SourceLanguage::Auto);

    let broker = Broker::new(settings)?;
    let translator = broker.translator();
    info!(
        provider = translator.provider_name(),
        "Translating {} -> {} (fallback {})",
        source.as_str(),
        dest,
        fallback
    );

    let Some(text) = matches.get_one::<String>("text") else {
        return Err("Missing text".into());
    };

    if matches.get_flag("type-ahead") {
        for (end, _) in text.char_indices().skip(1) {
            broker.submit_from(&text[..end], source.clone());
        }
    }
    broker.submit_from(text, source);

    let outcome = broker.fetch(text).await;
    let Some(shown) = outcome.text() else {
        eprintln!("Translation failed, see the log for details");
        std::process::exit(1);
    };

    match &outcome {
        Outcome::Translated {
            language, extra, ..
        } => {
            println!("[{}] {}", language, shown);
            if let Some(mistakes) = &extra.possible_mistakes {
                println!("Did you mean: {}", mistakes.corrected);
            }
            if let Some(pronunciation) = &extra.src_pronunciation {
                println!("Source pronunciation: {}", pronunciation);
            }
            if let Some(pronunciation) = &extra.dest_pronunciation {
                println!("Pronunciation: {}", pronunciation);
            }
        }
        _ => println!("(unchanged) {}", shown),
    }

    Ok(())
}
