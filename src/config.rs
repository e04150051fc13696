//! Node configuration from command-line flags, falling back to `MUSHROOM_*` environment
//! variables and then to defaults.

use anyhow::{Context, Result, bail};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::cache::group::DEFAULT_CACHE_BYTES;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:4000";
pub const DEFAULT_IMAGE_SRC: &str = "img/";
pub const DEFAULT_PEERS_PATH: &str = "/mushroom/peers";

pub const USAGE: &str = "Usage: mushroom [--listen <addr:port>] [--advertise <url>] \
[--store <addr> | --serve-store] [--image-src <dir>] [--cache-bytes <n>] \
[--hot-cache-bytes <n>] [--peers-path <path>]";

#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub listen: SocketAddr,
    /// Endpoint other peers use to reach this node; also its identity in the peer list.
    pub advertise: String,
    /// Remote coordination store. `None` runs an embedded one.
    pub store: Option<String>,
    /// Expose the embedded store so other nodes can use it.
    pub serve_store: bool,
    pub image_src: PathBuf,
    pub cache_bytes: usize,
    pub hot_cache_bytes: usize,
    pub peers_path: String,
}

impl NodeConfig {
    pub fn from_env_args() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::parse(&args, |name| std::env::var(name).ok())
    }

    /// Builds the configuration from `args` (program name excluded), consulting `env`
    /// for anything not given on the command line.
    pub fn parse(args: &[String], env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut listen = env("MUSHROOM_LISTEN");
        let mut advertise = env("MUSHROOM_ADVERTISE");
        let mut store = env("MUSHROOM_STORE");
        let mut serve_store = false;
        let mut image_src = env("MUSHROOM_IMAGE_SRC");
        let mut cache_bytes = env("MUSHROOM_CACHE_BYTES");
        let mut hot_cache_bytes = env("MUSHROOM_HOT_CACHE_BYTES");
        let mut peers_path = env("MUSHROOM_PEERS_PATH");

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let slot = match flag {
                "--listen" => &mut listen,
                "--advertise" => &mut advertise,
                "--store" => &mut store,
                "--image-src" => &mut image_src,
                "--cache-bytes" => &mut cache_bytes,
                "--hot-cache-bytes" => &mut hot_cache_bytes,
                "--peers-path" => &mut peers_path,
                "--serve-store" => {
                    serve_store = true;
                    i += 1;
                    continue;
                }
                _ => {
                    tracing::warn!("Ignoring unknown argument {}", flag);
                    i += 1;
                    continue;
                }
            };

            match args.get(i + 1) {
                Some(value) => *slot = Some(value.clone()),
                None => bail!("{} requires a value", flag),
            }
            i += 2;
        }

        let listen: SocketAddr = listen
            .as_deref()
            .unwrap_or(DEFAULT_LISTEN)
            .parse()
            .context("invalid listen address")?;

        let advertise = match advertise {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("http://{}", listen),
        };

        if store.is_some() && serve_store {
            bail!("--serve-store only applies to the embedded store, not with --store");
        }

        let cache_bytes = match cache_bytes {
            Some(n) => n.parse().context("invalid cache size")?,
            None => DEFAULT_CACHE_BYTES,
        };
        let hot_cache_bytes = match hot_cache_bytes {
            Some(n) => n.parse().context("invalid hot cache size")?,
            None => cache_bytes / 8,
        };

        let peers_path = peers_path.unwrap_or_else(|| DEFAULT_PEERS_PATH.to_string());
        if !peers_path.starts_with('/') {
            bail!("peers path must be absolute, got {}", peers_path);
        }

        Ok(Self {
            listen,
            advertise,
            store,
            serve_store,
            image_src: PathBuf::from(image_src.unwrap_or_else(|| DEFAULT_IMAGE_SRC.to_string())),
            cache_bytes,
            hot_cache_bytes,
            peers_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = NodeConfig::parse(&[], no_env).unwrap();

        assert_eq!(config.listen, "127.0.0.1:4000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.advertise, "http://127.0.0.1:4000");
        assert_eq!(config.store, None);
        assert!(!config.serve_store);
        assert_eq!(config.image_src, PathBuf::from("img/"));
        assert_eq!(config.cache_bytes, 64 << 20);
        assert_eq!(config.hot_cache_bytes, 8 << 20);
        assert_eq!(config.peers_path, "/mushroom/peers");
    }

    #[test]
    fn test_flags_override_env() {
        let env: HashMap<&str, &str> = [
            ("MUSHROOM_LISTEN", "0.0.0.0:5000"),
            ("MUSHROOM_CACHE_BYTES", "1000"),
            ("MUSHROOM_STORE", "10.0.0.1:4100"),
        ]
        .into_iter()
        .collect();

        let config = NodeConfig::parse(
            &args(&["--listen", "127.0.0.1:6000", "--advertise", "http://node-1:6000/"]),
            |name| env.get(name).map(|v| v.to_string()),
        )
        .unwrap();

        assert_eq!(config.listen, "127.0.0.1:6000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.advertise, "http://node-1:6000");
        assert_eq!(config.store.as_deref(), Some("10.0.0.1:4100"));
        assert_eq!(config.cache_bytes, 1000);
        assert_eq!(config.hot_cache_bytes, 125);
    }

    #[test]
    fn test_serve_store_flag() {
        let config = NodeConfig::parse(&args(&["--serve-store"]), no_env).unwrap();
        assert!(config.serve_store);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(NodeConfig::parse(&args(&["--listen", "nowhere"]), no_env).is_err());
        assert!(NodeConfig::parse(&args(&["--cache-bytes", "-1"]), no_env).is_err());
        assert!(NodeConfig::parse(&args(&["--peers-path", "peers"]), no_env).is_err());
        assert!(NodeConfig::parse(&args(&["--store"]), no_env).is_err());
        assert!(
            NodeConfig::parse(&args(&["--store", "a:1", "--serve-store"]), no_env).is_err()
        );
    }
}
