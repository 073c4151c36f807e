use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use getopts::{Matches, Options};
use tokio::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

pub struct Args {
    pub address: SocketAddr,
    pub enable_cache: bool,
    pub cache_ttl: Duration,
    pub rules_file: PathBuf,
    pub model: String,
    pub body_limit: usize,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optflag(
        "c",
        "enable-cache",
        "Enable caching of analyzed roster images [Default: false]",
    );
    opts.optopt(
        "t",
        "cache-ttl",
        "Time-to-live for cached analyses [Default: 3600]",
        "SECONDS",
    );
    opts.optopt(
        "r",
        "rules-file",
        "JSON file holding the keyword mapping rules [Default: mapping-rules.json]",
        "PATH",
    );
    opts.optopt(
        "m",
        "model",
        "Vision model used to read roster images [Default: gpt-4o]",
        "MODEL",
    );
    opts.optopt(
        "b",
        "body-limit",
        "Maximum request body size in MiB [Default: 20]",
        "MIB",
    );
    opts
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    };

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        process::exit(0);
    }

    match args_from(&matches) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}

fn args_from(matches: &Matches) -> Result<Args, String> {
    let address = matches
        .opt_get_default("address", SocketAddr::from(([127, 0, 0, 1], 8080)))
        .map_err(|err| format!("Provided value for option 'address' is invalid: {err}"))?;

    let enable_cache = matches.opt_present("enable-cache");

    let cache_ttl = matches
        .opt_get_default("cache-ttl", 3600)
        .map(Duration::from_secs)
        .map_err(|err| format!("Provided value for option 'cache-ttl' is invalid: {err}"))?;

    let rules_file = matches
        .opt_str("rules-file")
        .map_or_else(|| PathBuf::from("mapping-rules.json"), PathBuf::from);

    let model = matches
        .opt_str("model")
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let body_limit = matches
        .opt_get_default("body-limit", 20usize)
        .map_err(|err| format!("Provided value for option 'body-limit' is invalid: {err}"))?
        .checked_mul(1024 * 1024)
        .ok_or_else(|| "Provided value for option 'body-limit' is too large".to_string())?;

    Ok(Args {
        address,
        enable_cache,
        cache_ttl,
        rules_file,
        model,
        body_limit,
    })
}

/// Upstream credentials, read from the environment so they never show up in `ps`.
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub supabase: Option<(String, String)>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let supabase = non_empty("SUPABASE_URL")
            .zip(non_empty("SUPABASE_ANON_KEY"))
            .filter(|(url, _)| !url.contains("placeholder"));

        Self {
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            supabase,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        let matches = opts()
            .parse(list.iter().map(|arg| arg.to_string()))
            .map_err(|err| err.to_string())?;
        args_from(&matches)
    }

    #[test]
    fn defaults() {
        let args = args(&[]).unwrap();
        assert_eq!(args.address, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert!(!args.enable_cache);
        assert_eq!(args.cache_ttl, Duration::from_secs(3600));
        assert_eq!(args.rules_file, PathBuf::from("mapping-rules.json"));
        assert_eq!(args.model, "gpt-4o");
        assert_eq!(args.body_limit, 20 * 1024 * 1024);
    }

    #[test]
    fn overrides() {
        let args = args(&[
            "-a", "0.0.0.0:3000", "-c", "-t", "60", "-r", "/tmp/rules.json", "-m", "gpt-4o-mini",
            "-b", "5",
        ])
        .unwrap();

        assert_eq!(args.address.port(), 3000);
        assert!(args.enable_cache);
        assert_eq!(args.cache_ttl, Duration::from_secs(60));
        assert_eq!(args.rules_file, PathBuf::from("/tmp/rules.json"));
        assert_eq!(args.model, "gpt-4o-mini");
        assert_eq!(args.body_limit, 5 * 1024 * 1024);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(args(&["-a", "localhost"]).is_err());
        assert!(args(&["-t", "soon"]).is_err());

        let huge = usize::MAX.to_string();
        assert!(args(&["-b", huge.as_str()]).is_err());
    }

    #[test]
    fn credentials_ignore_blank_and_placeholder_values() {
        let env = HashMap::from([
            ("OPENAI_API_KEY", "  "),
            ("SUPABASE_URL", "https://placeholder.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]);

        let credentials =
            Credentials::from_lookup(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(credentials.openai_api_key, None);
        assert_eq!(credentials.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert!(credentials.supabase.is_none());
    }

    #[test]
    fn credentials_pick_up_supabase() {
        let env = HashMap::from([
            ("OPENAI_API_KEY", "sk-test"),
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]);

        let credentials =
            Credentials::from_lookup(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(credentials.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            credentials.supabase,
            Some(("https://demo.supabase.co".into(), "anon".into()))
        );
    }
}
