/// Install the global tracing subscriber.
///
/// `RUST_LOG` supplies the base filter; `default_level` is always applied
/// to this crate. Set `LOG_FORMAT=json` for JSON lines.
pub fn init(default_level: &str) {
    let directive: tracing_subscriber::filter::Directive =
        format!("cwagent_confgen={default_level}")
            .parse()
            .unwrap_or_else(|_| "cwagent_confgen=info".parse().unwrap());
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(directive);

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let result = if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        eprintln!("logging already initialised: {e}");
    }
}
